use thiserror::Error;

use crate::core::EfacturaError;

/// Failures talking to ANAF SPV.
///
/// Captured verbatim for operator diagnosis; the client never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Connection, TLS or timeout failure.
    #[error("ANAF network error: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("ANAF HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The authority answered but refused the request (upload rejected,
    /// missing rights on the tax id, malformed query).
    #[error("ANAF rejected the request: {}", .0.join("; "))]
    Rejected(Vec<String>),

    /// The response did not have the expected shape.
    #[error("ANAF response parse error: {0}")]
    Parse(String),
}

/// Error from a client call: either the input or record cannot take the
/// call or the call itself failed.
#[derive(Debug, Error)]
pub enum AnafError {
    #[error(transparent)]
    Core(#[from] EfacturaError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
