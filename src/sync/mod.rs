//! Periodic reconciliation with ANAF SPV.
//!
//! [`ReconciliationJob`] runs two duties on independent timers:
//!
//! - **incoming**: for every tenant with a tax id, list the invoices
//!   received in the lookback window, download the unknown ones and create
//!   their records;
//! - **status**: poll each pending submission once and report the ones
//!   pending past the stale threshold.
//!
//! Persistence belongs to the host application and sits behind
//! [`ReconciliationStore`]. [`MemoryStore`] covers tests and demos.

mod error;
mod job;
mod store;

pub use error::*;
pub use job::*;
pub use store::*;
