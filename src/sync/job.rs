use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::SyncError;
use super::store::{ReceivedInvoiceRecord, ReconciliationStore, Tenant};
use crate::anaf::{MessageKind, SubmissionClient, SubmissionRecord, SubmissionState, SyncConfig};

/// A tenant or record the run could not process. The run carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Tenant id, `tenant/message id` for a failed download, or tracking
    /// id (status sync).
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingReport {
    pub tenants_checked: usize,
    /// Tenants without a tax id.
    pub tenants_skipped: usize,
    /// Received-invoice messages seen across all tenants.
    pub listed: usize,
    pub created: usize,
    pub already_known: usize,
    pub failures: Vec<RunFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub polled: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub still_pending: usize,
    /// Tracking ids still pending after this poll and older than
    /// `stale_after_days`. The caller decides whether to force-close them.
    pub overdue: Vec<String>,
    pub failures: Vec<RunFailure>,
}

/// Clears the single-flight flag when the run ends, however it ends.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool, duty: &'static str) -> Result<Self, SyncError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::AlreadyRunning(duty))?;
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Periodic reconciliation against SPV.
///
/// Two duties on independent timers: ingesting invoices received by each
/// tenant, and polling the status of submitted documents. Each duty has a
/// single-flight guard; tenants and records are processed one at a time.
pub struct ReconciliationJob {
    client: SubmissionClient,
    store: Arc<dyn ReconciliationStore>,
    config: SyncConfig,
    incoming_running: AtomicBool,
    status_running: AtomicBool,
}

impl ReconciliationJob {
    pub fn new(
        client: SubmissionClient,
        store: Arc<dyn ReconciliationStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            client,
            store,
            config,
            incoming_running: AtomicBool::new(false),
            status_running: AtomicBool::new(false),
        }
    }

    /// Fetch each tenant's received invoices and create the ones not yet
    /// known. Re-running over the same window creates nothing.
    pub async fn run_incoming_sync(&self) -> Result<IncomingReport, SyncError> {
        let _guard = RunGuard::acquire(&self.incoming_running, "incoming")?;
        let tenants = self.store.tenants().await?;
        let mut report = IncomingReport::default();

        for tenant in &tenants {
            let Some(tax_id) = tenant
                .tax_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
            else {
                debug!(tenant = %tenant.id, "tenant has no tax id, skipping");
                report.tenants_skipped += 1;
                continue;
            };

            report.tenants_checked += 1;
            if let Err(e) = self.sync_tenant(tenant, tax_id, &mut report).await {
                warn!(tenant = %tenant.id, cif = %tax_id, error = %e, "incoming sync failed for tenant");
                report.failures.push(RunFailure {
                    key: tenant.id.clone(),
                    error: e.to_string(),
                });
            }
        }

        info!(
            tenants = report.tenants_checked,
            listed = report.listed,
            created = report.created,
            failures = report.failures.len(),
            "incoming sync finished"
        );
        Ok(report)
    }

    async fn sync_tenant(
        &self,
        tenant: &Tenant,
        tax_id: &str,
        report: &mut IncomingReport,
    ) -> Result<(), SyncError> {
        let messages = self
            .client
            .list_received(tax_id, self.config.lookback_days)
            .await?;

        for summary in messages
            .iter()
            .filter(|m| m.kind == MessageKind::ReceivedInvoice)
        {
            report.listed += 1;
            if self.store.has_received(&tenant.id, &summary.id).await? {
                report.already_known += 1;
                continue;
            }

            // Not recorded, so the next run retries the download.
            let details = match self.client.download_received(&summary.id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!(tenant = %tenant.id, message_id = %summary.id, error = %e, "download failed");
                    report.failures.push(RunFailure {
                        key: format!("{}/{}", tenant.id, summary.id),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let record = ReceivedInvoiceRecord::from_summary(&tenant.id, summary, Utc::now())
                .with_details(details);
            if self.store.create_received(record).await? {
                debug!(tenant = %tenant.id, authority_id = %summary.id, "received invoice recorded");
                report.created += 1;
            } else {
                report.already_known += 1;
            }
        }
        Ok(())
    }

    /// Poll every pending submission once.
    ///
    /// Records only change through the authority's answer. Those still
    /// pending past `stale_after_days` are listed in
    /// [`StatusReport::overdue`] for an explicit
    /// [`SubmissionRecord::force_close`].
    pub async fn run_status_sync(&self, now: DateTime<Utc>) -> Result<StatusReport, SyncError> {
        let _guard = RunGuard::acquire(&self.status_running, "status")?;
        let pending = self.store.pending_submissions().await?;
        let mut report = StatusReport::default();

        for mut record in pending {
            match self.poll(&mut record, now).await {
                Ok(state) => {
                    report.polled += 1;
                    match state {
                        SubmissionState::Accepted => report.accepted += 1,
                        SubmissionState::Rejected => report.rejected += 1,
                        _ => report.still_pending += 1,
                    }
                }
                Err(e) => {
                    warn!(tracking_id = %record.tracking_id, error = %e, "status sync failed for submission");
                    report.failures.push(RunFailure {
                        key: record.tracking_id.clone(),
                        error: e.to_string(),
                    });
                }
            }

            let age = record.age_days(now);
            if record.is_pending() && age > self.config.stale_after_days {
                warn!(tracking_id = %record.tracking_id, age_days = age, "submission overdue");
                report.overdue.push(record.tracking_id);
            }
        }

        info!(
            polled = report.polled,
            accepted = report.accepted,
            rejected = report.rejected,
            overdue = report.overdue.len(),
            failures = report.failures.len(),
            "status sync finished"
        );
        Ok(report)
    }

    async fn poll(
        &self,
        record: &mut SubmissionRecord,
        now: DateTime<Utc>,
    ) -> Result<SubmissionState, SyncError> {
        let state = self.client.check_status(record, now).await?;
        self.store.update_submission(record).await?;
        Ok(state)
    }

    /// Run both duties on their own intervals until `shutdown` receives a
    /// message or its sender is dropped.
    ///
    /// Each tick starts its run as a separate task, so a slow incoming sync
    /// never delays status polling; a tick that finds the previous run of
    /// the same duty still going is skipped.
    pub fn spawn(self: Arc<Self>, mut shutdown: mpsc::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("reconciliation job starting");

            let mut incoming =
                tokio::time::interval(Duration::from_secs(self.config.incoming_interval_secs));
            incoming.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut status =
                tokio::time::interval(Duration::from_secs(self.config.status_interval_secs));
            status.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = incoming.tick() => {
                        let job = Arc::clone(&self);
                        tokio::spawn(async move {
                            match job.run_incoming_sync().await {
                                Ok(_) => {}
                                Err(SyncError::AlreadyRunning(_)) => {
                                    debug!("incoming sync still running, tick skipped");
                                }
                                Err(e) => error!(error = %e, "incoming sync run failed"),
                            }
                        });
                    }

                    _ = status.tick() => {
                        let job = Arc::clone(&self);
                        tokio::spawn(async move {
                            match job.run_status_sync(Utc::now()).await {
                                Ok(_) => {}
                                Err(SyncError::AlreadyRunning(_)) => {
                                    debug!("status sync still running, tick skipped");
                                }
                                Err(e) => error!(error = %e, "status sync run failed"),
                            }
                        });
                    }

                    _ = shutdown.recv() => {
                        info!("reconciliation job shutting down");
                        break;
                    }
                }
            }

            info!("reconciliation job stopped");
        })
    }
}
