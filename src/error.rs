// Batch-level errors and their process exit codes.

use crate::config::ConfigError;
use crate::schema::SchemaError;
use crate::validate::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

/// Exit code used when the CSV has a header but no data rows.
pub const EXIT_NO_ROWS: i32 = 1;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("[CONFIG ERROR] {0}")]
    Config(#[from] ConfigError),

    #[error("[CSV FILE NOT FOUND] Invalid filepath for body_args which is '{}': No such file or directory", .0.display())]
    CsvNotFound(PathBuf),

    #[error("[CSV FORMAT ERROR] Could not read {}: {source}", .path.display())]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("[SCHEMA ERROR] {0}")]
    Schema(#[from] SchemaError),

    #[error("[CSV FORMAT ERROR] Line {line} has {found} columns but the header declares {expected}")]
    RowFormat { line: u64, expected: usize, found: usize },

    #[error("[FILE PATH ERROR] Line {line}: file argument '{field}' contains an invalid filepath '{}': {source}", .path.display())]
    FilePath {
        line: u64,
        field: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {source}")]
    Validation {
        line: u64,
        #[source]
        source: ValidationError,
    },

    #[error("[OUTPUT ERROR] Could not write results to {}: {source}", .path.display())]
    ResultsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BatchError {
    /// Stable process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatchError::Config(_) => -1,
            BatchError::CsvNotFound(_) => -2,
            BatchError::CsvRead { .. } | BatchError::RowFormat { .. } => -3,
            BatchError::FilePath { .. } => -4,
            BatchError::Schema(SchemaError::EmptyField { .. }) => -5,
            BatchError::Schema(SchemaError::UnknownField { .. }) => -6,
            BatchError::Schema(SchemaError::DuplicateField { .. }) => -7,
            BatchError::ResultsWrite { .. } => -9,
            BatchError::Validation { source, .. } => source.code(),
        }
    }

    /// CSV line the error refers to, when it is tied to a data row.
    pub fn line(&self) -> Option<u64> {
        match self {
            BatchError::RowFormat { line, .. }
            | BatchError::FilePath { line, .. }
            | BatchError::Validation { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_table() {
        let dup = BatchError::from(SchemaError::DuplicateField { name: "target_type".into() });
        assert_eq!(dup.exit_code(), -7);
        let v = BatchError::Validation { line: 4, source: ValidationError::UnsupportedExtension("pdf".into()) };
        assert_eq!(v.exit_code(), -41);
        assert_eq!(v.line(), Some(4));
        assert!(v.to_string().contains("pdf"));
        assert_eq!(BatchError::CsvNotFound("x.csv".into()).exit_code(), -2);
        assert_eq!(
            BatchError::RowFormat { line: 3, expected: 2, found: 5 }.exit_code(),
            -3
        );
    }
}
