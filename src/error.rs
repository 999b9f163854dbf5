//! Custom error types for the outlier-cleaning engine.
//!
//! This module provides an error hierarchy using `thiserror`.
//! Errors are serializable as `{code, message}` pairs so callers embedding
//! the library (UIs, services) can dispatch on a stable code.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for cleaning operations.
#[derive(Error, Debug)]
pub enum StatCleanError {
    /// Dataset with zero rows or zero columns passed to the constructor
    /// or `set_data`.
    #[error("Dataset is empty (zero rows or columns)")]
    EmptyDataset,

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Column exists but does not hold numeric data.
    #[error("Column '{0}' is not numeric")]
    NonNumericColumn(String),

    /// A detection parameter is out of its valid range.
    #[error("Invalid value for '{field}': {value}")]
    InvalidThreshold { field: String, value: f64 },

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StatCleanError>,
    },
}

impl StatCleanError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StatCleanError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NonNumericColumn(_) => "NON_NUMERIC_COLUMN",
            Self::InvalidThreshold { .. } => "INVALID_THRESHOLD",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a validation failure on caller input
    /// (as opposed to an internal computation failure).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyDataset
                | Self::ColumnNotFound(_)
                | Self::NonNumericColumn(_)
                | Self::InvalidThreshold { .. }
        )
    }
}

/// Serialize implementation exposing `{code, message}`.
impl Serialize for StatCleanError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("StatCleanError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, StatCleanError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| StatCleanError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(StatCleanError::EmptyDataset.error_code(), "EMPTY_DATASET");
        assert_eq!(
            StatCleanError::ColumnNotFound("price".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(StatCleanError::EmptyDataset.is_validation());
        assert!(StatCleanError::NonNumericColumn("name".to_string()).is_validation());
        let polars_err = polars::error::PolarsError::ComputeError("boom".into());
        assert!(!StatCleanError::Polars(polars_err).is_validation());
    }

    #[test]
    fn test_error_serialization() {
        let error = StatCleanError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = StatCleanError::ColumnNotFound("Age".to_string())
            .with_context("During distribution analysis");
        assert!(error.to_string().contains("During distribution analysis"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // preserves original code
    }
}
