//! Error types for xmlschema-inventory
//!
//! Fatal conditions are variants of [`Error`]. Conditions the analysis can
//! recover from are also raised as `Error` values by the component that detects
//! them, and turned into a [`Warning`](crate::warnings::Warning) by the caller
//! that decides to carry on.

use std::fmt;
use thiserror::Error;

use crate::namespaces::QName;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema analysis
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not well-formed markup, or not an XSD document at all
    #[error("malformed schema: {0}")]
    MalformedSchema(#[from] ParseError),

    /// A schema construct outside the supported scope
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A cycle along the base-type derivation axis
    #[error("cyclic type derivation: {}", display_chain(.chain))]
    CyclicDerivation {
        /// The derivation path, ending with the type that closes the cycle
        chain: Vec<QName>,
    },

    /// A named type reference with no matching definition
    #[error("unresolved reference to type '{0}'")]
    UnresolvedReference(QName),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Notebook publishing error
    #[error("publish error: {0}")]
    Publish(String),
}

impl Error {
    /// Whether the analysis can record this error as a warning and go on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedConstruct(_) | Error::UnresolvedReference(_)
        )
    }
}

fn display_chain(chain: &[QName]) -> String {
    chain
        .iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Markup parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema source
    pub location: Option<String>,
    /// Schema source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, " (at {})", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
