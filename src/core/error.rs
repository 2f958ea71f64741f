use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    #[error("[{id}] malformed definition: {message}")]
    MalformedDefinition { id: String, message: String },

    #[error("[{id}] unresolved {kind} reference '{reference}' at {location}")]
    UnresolvedReference {
        id: String,
        kind: String,
        reference: String,
        location: String,
    },

    #[error("[{id}] cloud property '{name}': xpath '{xpath}' does not resolve")]
    UnresolvedXPath {
        id: String,
        xpath: String,
        name: String,
    },

    #[error("[{id}] validation failed: {}", violations.join(", "))]
    Validation { id: String, violations: Vec<String> },

    #[error("[{id}] duplicate widget id, claimed by {}", files.join(", "))]
    DuplicateId { id: String, files: Vec<String> },

    #[error("Widget '{0}' not found")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Batch(BatchError),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl WidgetError {
    /// Widget the error belongs to, when it is tied to a single definition.
    pub fn widget_id(&self) -> Option<&str> {
        match self {
            Self::MalformedDefinition { id, .. }
            | Self::UnresolvedReference { id, .. }
            | Self::UnresolvedXPath { id, .. }
            | Self::Validation { id, .. }
            | Self::DuplicateId { id, .. } => Some(id),
            Self::NotFound(id) => Some(id),
            _ => None,
        }
    }

    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedDefinition { .. } => "malformed_definition",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::UnresolvedXPath { .. } => "unresolved_xpath",
            Self::Validation { .. } => "validation_error",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::NotFound(_) => "not_found",
            Self::Io(_) => "io_error",
            Self::Config(_) => "config_error",
            Self::Batch(_) => "batch_error",
            Self::Lock(_) => "lock_error",
        }
    }

    /// HTTP status the error maps to when it reaches a request handler.
    ///
    /// A missing widget is the caller's mistake, so it is a 400 and not a 404
    /// or 500.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, WidgetError>;

impl<T> From<std::sync::PoisonError<T>> for WidgetError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<std::io::Error> for WidgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// All per-file failures of one load pass, joined into a single error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchError {
    pub failures: Vec<WidgetError>,
}

impl BatchError {
    pub fn new(failures: Vec<WidgetError>) -> Self {
        Self { failures }
    }

    /// IDs of the widgets that failed, in report order.
    pub fn ids(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter_map(|err| err.widget_id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.failures.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for BatchError {}
