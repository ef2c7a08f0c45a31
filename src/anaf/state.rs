//! Submission lifecycle.
//!
//! ```text
//! Draft ──validate ok──▶ Validated ──upload ok──▶ Submitted ──ok──▶ Accepted
//!   ▲                        │                      │  ▲
//!   └──── validate errors ───┘                      │  └── in processing / other
//!                                                   ├──nok──▶ Rejected
//!                        upload failed ──▶ Error ◀──┘ force close
//! ```
//!
//! Draft and Validated are never persisted: a document either comes out of
//! [`SubmissionClient::prepare`](super::SubmissionClient::prepare) as a
//! validated value or stays with the caller. Records start at `Submitted`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::transport::{AuthorityStatus, StatusReply};
use crate::core::EfacturaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionState {
    Draft,
    Validated,
    Submitted,
    Accepted,
    Rejected,
    Error,
}

impl SubmissionState {
    /// Accepted, Rejected and Error take no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Error)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Validated => "validated",
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One uploaded document as tracked by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Tracking id issued on upload (`index_incarcare`).
    pub tracking_id: String,
    /// Issuer CUI the document was uploaded under.
    pub tax_id: String,
    pub document_number: String,
    pub state: SubmissionState,
    pub submitted_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Authority messages accumulated across polls, oldest first.
    pub messages: Vec<String>,
    /// `id_descarcare` of the final answer.
    pub download_id: Option<String>,
}

impl SubmissionRecord {
    pub fn new(
        tracking_id: impl Into<String>,
        tax_id: impl Into<String>,
        document_number: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            tax_id: tax_id.into(),
            document_number: document_number.into(),
            state: SubmissionState::Submitted,
            submitted_at,
            last_checked_at: None,
            messages: Vec::new(),
            download_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == SubmissionState::Submitted
    }

    /// Apply a status answer. Only `Submitted` records take polls.
    ///
    /// `ok` accepts, `nok` rejects with the messages kept verbatim, while
    /// "in processing" and unrecognised answers leave the record submitted.
    /// An unrecognised answer's text is kept as a message.
    pub fn apply_status(
        &mut self,
        reply: &StatusReply,
        now: DateTime<Utc>,
    ) -> Result<SubmissionState, EfacturaError> {
        self.expect_pending("status poll")?;

        self.last_checked_at = Some(now);
        self.messages.extend(reply.messages.iter().cloned());
        if reply.download_id.is_some() {
            self.download_id = reply.download_id.clone();
        }

        match &reply.status {
            AuthorityStatus::Ok => self.state = SubmissionState::Accepted,
            AuthorityStatus::Nok => self.state = SubmissionState::Rejected,
            AuthorityStatus::InProcessing => {}
            AuthorityStatus::Other(text) => {
                if !text.is_empty() {
                    self.messages.push(text.clone());
                }
            }
        }
        Ok(self.state)
    }

    /// Give up on a submission that never reached a final answer.
    pub fn force_close(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), EfacturaError> {
        self.expect_pending("force close")?;
        self.state = SubmissionState::Error;
        self.last_checked_at = Some(now);
        self.messages.push(reason.into());
        Ok(())
    }

    /// Whole days since upload.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.submitted_at).num_days()
    }

    fn expect_pending(&self, event: &str) -> Result<(), EfacturaError> {
        if self.state != SubmissionState::Submitted {
            return Err(EfacturaError::InvalidTransition {
                from: self.state.to_string(),
                event: event.to_string(),
            });
        }
        Ok(())
    }
}
