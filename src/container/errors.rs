//! Error records accumulated by containers and collections.

use crate::codec::{CodecError, Format};
use crate::value::Value;
use thiserror::Error;
use tracing::warn;

const SNIPPET_LEN: usize = 64;

/// ErrorRecord describes one failed operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorRecord {
    /// A write was rejected by a validation rule.
    #[error("validation_mismatch: {key:?} rejected by {rule}")]
    ValidationMismatch { key: String, data: Value, rule: String },

    /// Input could not be decoded. `snippet` holds the start of the raw input.
    #[error("decode_failure ({kind}): {message}")]
    DecodeFailure {
        kind: Format,
        snippet: String,
        message: String,
    },

    #[error("encode_failure ({format}): {message}")]
    EncodeFailure { format: Format, message: String },

    #[error("unknown_accessor: {name:?}")]
    UnknownAccessor { name: String },

    /// A value cannot be joined into a flat string.
    #[error("not_flattenable: value under {key:?} is not a scalar")]
    NotFlattenable { key: String },
}

impl ErrorRecord {
    /// Creates a decode failure record from a codec error and the raw input.
    pub fn decode(err: CodecError, input: &str) -> Self {
        ErrorRecord::DecodeFailure {
            kind: err.format,
            snippet: input.chars().take(SNIPPET_LEN).collect(),
            message: err.message,
        }
    }

    /// Creates an encode failure record from a codec error.
    pub fn encode(err: CodecError) -> Self {
        ErrorRecord::EncodeFailure {
            format: err.format,
            message: err.message,
        }
    }

    /// Returns the short machine-readable name of the record kind.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorRecord::ValidationMismatch { .. } => "validation_mismatch",
            ErrorRecord::DecodeFailure { .. } => "decode_failure",
            ErrorRecord::EncodeFailure { .. } => "encode_failure",
            ErrorRecord::UnknownAccessor { .. } => "unknown_accessor",
            ErrorRecord::NotFlattenable { .. } => "not_flattenable",
        }
    }
}

/// ErrorLog is an append-only list of error records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLog {
    records: Vec<ErrorRecord>,
}

impl ErrorLog {
    /// Creates an empty ErrorLog.
    pub fn new() -> Self {
        ErrorLog::default()
    }

    pub fn push(&mut self, record: ErrorRecord) {
        warn!(kind = record.message(), "{record}");
        self.records.push(record);
    }

    pub fn has_errors(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ErrorRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_snippet_is_truncated() {
        let input = "é".repeat(100);
        let record = ErrorRecord::decode(CodecError::new(Format::Json, "bad"), &input);
        match &record {
            ErrorRecord::DecodeFailure { snippet, kind, .. } => {
                assert_eq!(snippet.chars().count(), SNIPPET_LEN);
                assert_eq!(*kind, Format::Json);
            }
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(record.message(), "decode_failure");
        assert_eq!(record.to_string(), "decode_failure (json): bad");
    }

    #[test]
    fn test_log() {
        let mut log = ErrorLog::new();
        assert!(!log.has_errors());
        log.push(ErrorRecord::UnknownAccessor { name: "frobnicate".into() });
        assert!(log.has_errors());
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).map(ErrorRecord::message), Some("unknown_accessor"));
        log.clear();
        assert!(log.is_empty());
    }
}
