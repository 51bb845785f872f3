use thiserror::Error;

use crate::data::validate::ValidationFailure;

/// Why an upload was rejected. Every variant renders to one user-facing
/// message; the previously loaded experiments are never touched.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The file could not be read or tokenized.
    #[error("Failed to parse file: {0}")]
    Decode(String),

    #[error("CSV file is empty")]
    EmptyInput,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid CSV data: {}", .0.join(", "))]
    RowValidation(Vec<String>),

    /// Every row was dropped during coercion.
    #[error("No valid data found in CSV file")]
    NoValidData,

    #[error("Error processing dataset: {0}")]
    Processing(String),
}

impl PipelineError {
    /// Failures caused by the file's content rather than by the program.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, PipelineError::Processing(_))
    }
}

impl From<ValidationFailure> for PipelineError {
    fn from(failure: ValidationFailure) -> Self {
        match failure {
            ValidationFailure::EmptyInput => PipelineError::EmptyInput,
            ValidationFailure::MissingColumns(cols) => PipelineError::MissingColumns(cols),
            ValidationFailure::InvalidRows { defects, .. } => {
                PipelineError::RowValidation(defects.iter().map(ToString::to_string).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_single_line() {
        let err = PipelineError::MissingColumns(vec!["step".into(), "value".into()]);
        assert_eq!(err.to_string(), "Missing required columns: step, value");
        assert_eq!(PipelineError::NoValidData.to_string(), "No valid data found in CSV file");
    }

    #[test]
    fn processing_failures_are_not_user_errors() {
        assert!(PipelineError::EmptyInput.is_user_error());
        assert!(!PipelineError::Processing("worker stopped".into()).is_user_error());
    }
}
