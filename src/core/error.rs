use thiserror::Error;

/// Errors raised by the e-Factura core.
///
/// Document content problems are not errors: they are reported as a list of
/// [`ValidationError`] values. This enum covers caller mistakes and
/// generation failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EfacturaError {
    /// A document failed validation where a clean one was required.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Builder encountered invalid or missing configuration.
    #[error("builder error: {0}")]
    Builder(String),

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Credit note could not be derived from the original.
    #[error("credit note error: {0}")]
    CreditNote(String),

    /// A caller-supplied profile field is missing (e.g. issuer tax id).
    #[error("missing profile field: {0}")]
    MissingProfileField(&'static str),

    /// A submission record was asked to move along an edge the state
    /// machine does not have.
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A single validation finding: field path, stable rule code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot/bracket path to the offending field (e.g. "lines[2].vat_rate").
    pub field: String,
    /// Human-readable description.
    pub message: String,
    /// Stable rule code (e.g. "CIUS-RO-036").
    pub rule: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: rule.into(),
        }
    }
}

/// Join a list of findings into one line for logs and error messages.
pub fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
