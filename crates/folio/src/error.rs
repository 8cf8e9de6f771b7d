//! Error types for folio.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! is [`FolioError`]. The taxonomy distinguishes failures that make a whole
//! operation meaningless (unreachable source, unparsable document, unknown
//! id, bad bounds, malformed pattern) from per-item failures, which are
//! absorbed close to where they occur and degrade gracefully (an empty page
//! string, a missing outline page number, a skipped image) instead of
//! surfacing here.
use thiserror::Error;

/// Result type alias using [`FolioError`].
pub type Result<T> = std::result::Result<T, FolioError>;

/// Main error type for all folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The document bytes could not be fetched: network error, non-2xx
    /// response, or filesystem read failure.
    #[error("Source unavailable: {message}")]
    SourceUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The fetched bytes could not be opened by the document layer.
    #[error("Failed to parse document: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No loaded document is registered under the given id.
    #[error("No loaded document with id '{0}'")]
    NotFound(String),

    /// A page number outside `1..=page_count`.
    #[error("Invalid page number {page}: document has {page_count} page(s)")]
    InvalidPageNumber { page: i64, page_count: usize },

    /// A reversed or out-of-bounds page range.
    #[error("Invalid page range {start}..={end}: document has {page_count} page(s)")]
    InvalidRange {
        start: i64,
        end: i64,
        page_count: usize,
    },

    /// A search pattern that cannot be compiled or used.
    #[error("Invalid search pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Configuration file errors (missing file, invalid TOML).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FolioError {
    /// Create a SourceUnavailable error without an underlying cause.
    pub fn source_unavailable<S: Into<String>>(message: S) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a SourceUnavailable error with an underlying cause.
    pub fn source_unavailable_with<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SourceUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Parse error without an underlying cause.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Parse error with an underlying cause.
    pub fn parse_with<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an InvalidPattern error.
    pub fn invalid_pattern<P: Into<String>, M: Into<String>>(pattern: P, message: M) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Uniform human-readable message for the outer call boundary.
    ///
    /// The request/response layer above this crate reports every failure as
    /// a single descriptive text line; no structured error codes cross that
    /// boundary.
    pub fn user_message(&self) -> String {
        format!("Error: {}", self)
    }
}

impl From<crate::pdf::PdfError> for FolioError {
    fn from(err: crate::pdf::PdfError) -> Self {
        FolioError::Parse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_display() {
        let err = FolioError::source_unavailable("connection refused");
        assert_eq!(err.to_string(), "Source unavailable: connection refused");
    }

    #[test]
    fn test_source_unavailable_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = FolioError::source_unavailable_with("read failed", io_err);
        assert_eq!(err.to_string(), "Source unavailable: read failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_display() {
        let err = FolioError::parse("not a PDF");
        assert_eq!(err.to_string(), "Failed to parse document: not a PDF");
    }

    #[test]
    fn test_not_found_display() {
        let err = FolioError::NotFound("abc123".to_string());
        assert_eq!(err.to_string(), "No loaded document with id 'abc123'");
    }

    #[test]
    fn test_invalid_page_number_display() {
        let err = FolioError::InvalidPageNumber {
            page: 12,
            page_count: 4,
        };
        assert_eq!(
            err.to_string(),
            "Invalid page number 12: document has 4 page(s)"
        );
    }

    #[test]
    fn test_invalid_range_display() {
        let err = FolioError::InvalidRange {
            start: 5,
            end: 2,
            page_count: 9,
        };
        assert_eq!(
            err.to_string(),
            "Invalid page range 5..=2: document has 9 page(s)"
        );
    }

    #[test]
    fn test_invalid_pattern_display() {
        let err = FolioError::invalid_pattern("[", "unclosed character class");
        assert_eq!(
            err.to_string(),
            "Invalid search pattern '[': unclosed character class"
        );
    }

    #[test]
    fn test_user_message_prefix() {
        let err = FolioError::NotFound("x".to_string());
        assert_eq!(err.user_message(), "Error: No loaded document with id 'x'");
    }

    #[test]
    fn test_pdf_error_conversion() {
        let pdf_err = crate::pdf::PdfError::InvalidPdf("corrupt header".to_string());
        let err: FolioError = pdf_err.into();
        assert!(matches!(err, FolioError::Parse { .. }));
        assert!(err.to_string().contains("corrupt header"));
    }

    #[test]
    fn test_error_debug() {
        let err = FolioError::Config("bad toml".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Config"));
    }
}
