use thiserror::Error;

/// Errors raised while driving a form-filling pass
///
/// Most variants are recovered from at the boundary of the component that
/// produced them and end up as log entries in the pass report. Only
/// [`FillError::SessionFailure`] aborts a whole pass.
#[derive(Debug, Error)]
pub enum FillError {
    /// No element matched the given locator
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A write completed but the element did not hold the expected value afterwards
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// The element reference no longer points at an attached node
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// The browser could not be launched, connected to, or navigated
    #[error("Browser session failure: {0}")]
    SessionFailure(String),

    /// A script evaluated in the page threw or returned an unexpected shape
    #[error("Script evaluation failed: {0}")]
    ScriptFailed(String),

    /// A polled wait ran out of time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Text or link extraction from a document failed
    #[error("Document extraction failed: {0}")]
    Extraction(String),

    /// The language model request failed
    #[error("Language model request failed: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FillError {
    /// Whether this error means the element handle must be re-acquired before retrying
    pub fn is_stale(&self) -> bool {
        matches!(self, FillError::StaleElement(_))
    }

    /// Whether this error ends the pass
    pub fn is_fatal(&self) -> bool {
        matches!(self, FillError::SessionFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, FillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(FillError::StaleElement("ref 4".into()).is_stale());
        assert!(!FillError::ElementNotFound("#x".into()).is_stale());
        assert!(FillError::SessionFailure("no chrome".into()).is_fatal());
        assert!(!FillError::WriteRejected("value mismatch".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = FillError::ElementNotFound("input[name=\"email\"]".into());
        assert_eq!(err.to_string(), "Element not found: input[name=\"email\"]");
    }
}
