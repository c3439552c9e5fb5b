//! Error definitions.
use std::result;

use thiserror::Error;

use crate::measure::SimMeasure;

/// A specialized Result type for this library.
pub type Result<T, E = SetSimJoinError> = result::Result<T, E>;

/// Error type returned by a [`Tokenizer`](crate::tokenizer::Tokenizer).
pub type TokenizeError = Box<dyn std::error::Error + Send + Sync>;

/// Errors in this library.
///
/// Every variant except [`SetSimJoinError::Tokenize`] is a configuration error and is raised
/// before any record is tokenized.
#[derive(Debug, Error)]
pub enum SetSimJoinError {
    /// The similarity measure name could not be parsed.
    #[error("unknown similarity measure: {0:?}")]
    UnknownMeasure(String),

    /// The comparison operator could not be parsed.
    #[error("unknown comparison operator: {0:?}")]
    UnknownCompOp(String),

    /// The threshold lies outside the domain of the measure.
    #[error("threshold {threshold} is invalid for {measure}")]
    InvalidThreshold {
        /// Measure the threshold was given for.
        measure: SimMeasure,
        /// Rejected threshold.
        threshold: f64,
    },

    /// A named attribute is missing from a table.
    #[error("column {column:?} not found in the {table} table")]
    ColumnNotFound {
        /// Table label, `left` or `right`.
        table: &'static str,
        /// Missing column name.
        column: String,
    },

    /// The key attribute has a missing or duplicate value.
    #[error("column {column:?} of the {table} table is not a key attribute")]
    InvalidKeyAttribute {
        /// Table label, `left` or `right`.
        table: &'static str,
        /// Offending column name.
        column: String,
    },

    /// Two output columns would have the same name.
    #[error("output column {0:?} appears more than once; choose different prefixes")]
    OutputColumnCollision(String),

    /// The table is malformed.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// The tokenizer configuration is invalid.
    #[error("invalid tokenizer: {0}")]
    InvalidTokenizer(String),

    /// The tokenizer failed on a record.
    #[error("failed to tokenize record {record} of the {table} table")]
    Tokenize {
        /// Table label, `left` or `right`.
        table: &'static str,
        /// Record id (row index).
        record: usize,
        /// Error raised by the tokenizer.
        #[source]
        source: TokenizeError,
    },
}
