//! Runs the reconciliation job for a few seconds.
//!
//! With `EFACTURA_TOKEN` set the job talks to the SPV test endpoint (or the
//! one configured in `efactura.toml`); otherwise it runs against a canned
//! offline transport.
//!
//! ```text
//! RUST_LOG=efactura=debug cargo run --example reconcile --features sync
//! ```

use async_trait::async_trait;
use chrono::Utc;
use efactura::anaf::*;
use efactura::sync::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Offline stand-in: one received invoice, every submission accepted.
struct OfflineTransport;

#[async_trait]
impl AnafTransport for OfflineTransport {
    async fn upload(
        &self,
        _tax_id: &str,
        _standard: UploadStandard,
        _xml: &str,
    ) -> Result<UploadReceipt, TransportError> {
        Ok(UploadReceipt {
            tracking_id: "5001120362".into(),
        })
    }

    async fn status(&self, _tracking_id: &str) -> Result<StatusReply, TransportError> {
        Ok(StatusReply {
            status: AuthorityStatus::Ok,
            messages: Vec::new(),
            download_id: Some("3001293434".into()),
        })
    }

    async fn list_messages(
        &self,
        tax_id: &str,
        _days: u32,
    ) -> Result<Vec<ReceivedInvoiceSummary>, TransportError> {
        let json = format!(
            r#"{{"mesaje":[{{"data_creare":"202509011415","cif":"{tax_id}","id_solicitare":"5001130147","detalii":"Factura cu id_incarcare=5001130147 emisa de cif_emitent=18590117 pentru cif_beneficiar={tax_id}","tip":"FACTURA PRIMITA","id":"3001474425"}}]}}"#
        );
        parse_message_list(&json)
    }

    async fn download(&self, _message_id: &str) -> Result<ReceivedInvoiceDetails, TransportError> {
        parse_invoice_details(
            r#"<Invoice xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
         xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>BT-2025-118</cbc:ID>
  <cbc:IssueDate>2025-08-28</cbc:IssueDate>
  <cac:AccountingSupplierParty><cac:Party>
    <cac:PartyLegalEntity>
      <cbc:RegistrationName>Beta Trade SRL</cbc:RegistrationName>
      <cbc:CompanyID>18590117</cbc:CompanyID>
    </cac:PartyLegalEntity>
  </cac:Party></cac:AccountingSupplierParty>
  <cac:TaxTotal><cbc:TaxAmount currencyID="RON">237.50</cbc:TaxAmount></cac:TaxTotal>
  <cac:LegalMonetaryTotal><cbc:PayableAmount currencyID="RON">1487.50</cbc:PayableAmount></cac:LegalMonetaryTotal>
</Invoice>"#,
        )
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,efactura=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = EfacturaConfig::load("efactura.toml")?;
    config.sync.incoming_interval_secs = 2;
    config.sync.status_interval_secs = 1;

    let transport: Arc<dyn AnafTransport> = match std::env::var("EFACTURA_TOKEN") {
        Ok(token) => {
            if config.anaf.base_url == DEFAULT_BASE_URL {
                config.anaf.base_url = TEST_BASE_URL.to_string();
            }
            Arc::new(HttpTransport::new(&config.anaf, token)?)
        }
        Err(_) => Arc::new(OfflineTransport),
    };

    let store = Arc::new(MemoryStore::new());
    store
        .add_tenant(Tenant {
            id: "alfa".into(),
            name: "Alfa Soft SRL".into(),
            tax_id: Some("RO30834857".into()),
        })
        .await;
    store
        .add_submission(SubmissionRecord::new(
            "5001120362",
            "30834857",
            "FCT-2025-0042",
            Utc::now(),
        ))
        .await;

    let client = SubmissionClient::with_validator(
        transport,
        efactura::core::InvoiceValidator::new(config.rates.clone()),
    );
    let job = Arc::new(ReconciliationJob::new(client, store.clone(), config.sync.clone()));

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let handle = job.clone().spawn(shutdown_rx);

    tokio::time::sleep(Duration::from_secs(3)).await;
    shutdown_tx.send(()).await?;
    handle.await?;

    for record in store.received().await {
        println!(
            "received {} ({}) from {} dated {:?}: {} {}",
            record.authority_id,
            record.invoice_number.as_deref().unwrap_or("?"),
            record.issuer_tax_id.as_deref().unwrap_or("?"),
            record.issue_date,
            record.total.map(|t| t.to_string()).unwrap_or_default(),
            record.currency.as_deref().unwrap_or_default()
        );
    }
    let stale = job.run_status_sync(Utc::now()).await?;
    if !stale.overdue.is_empty() {
        println!("overdue submissions: {:?}", stale.overdue);
    }
    for record in store.submissions().await {
        println!("{} {} {}", record.document_number, record.tracking_id, record.state);
    }
    Ok(())
}
