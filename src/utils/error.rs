use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Transport error: request to {url} failed: {message}")]
    TransportError { url: String, message: String },

    #[error("Format error: response from {url} is not a list of objects: {message}")]
    FormatError { url: String, message: String },

    #[error("Not found: source file {path} does not exist")]
    NotFoundError { path: String },

    #[error("Transform error in '{output}': {message}")]
    TransformError { output: String, message: String },

    #[error("Destination error: {url} responded with {status}: {body}")]
    DestinationError {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Empty output: no records to write to {path}")]
    EmptyOutputError { path: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Transform,
    Destination,
    System,
}

impl EtlError {
    /// Stable name of the failure kind, printed alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::TransportError { .. } => "TransportError",
            EtlError::FormatError { .. } => "FormatError",
            EtlError::NotFoundError { .. } => "NotFoundError",
            EtlError::TransformError { .. } => "TransformError",
            EtlError::DestinationError { .. } => "DestinationError",
            EtlError::EmptyOutputError { .. } => "EmptyOutputError",
            EtlError::IoError(_) => "IoError",
            EtlError::CsvError(_) => "CsvError",
            EtlError::SerializationError(_) => "SerializationError",
            EtlError::ConfigError { .. } => "ConfigError",
            EtlError::InvalidConfigValueError { .. } => "InvalidConfigValueError",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EtlError::TransportError { .. }
            | EtlError::FormatError { .. }
            | EtlError::NotFoundError { .. } => ErrorCategory::Source,
            EtlError::TransformError { .. } => ErrorCategory::Transform,
            EtlError::DestinationError { .. } | EtlError::EmptyOutputError { .. } => {
                ErrorCategory::Destination
            }
            EtlError::IoError(_) | EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            _ => 1,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::TransportError { .. } => {
                "Check that the source URL is reachable and returns a 2xx status"
            }
            EtlError::FormatError { .. } => {
                "The API source must return a JSON array of objects"
            }
            EtlError::NotFoundError { .. } => {
                "Check the file_path of the CSV source and the working directory"
            }
            EtlError::TransformError { .. } => {
                "Make sure every field used by a transform is produced by the source mapping"
            }
            EtlError::DestinationError { .. } => {
                "Inspect the destination service logs; the payload was not accepted"
            }
            EtlError::EmptyOutputError { .. } => {
                "The sources produced no records, so no CSV header can be derived"
            }
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run again"
            }
            EtlError::IoError(_) | EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Check file permissions and disk space"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_and_category() {
        let err = EtlError::EmptyOutputError {
            path: "out.csv".to_string(),
        };
        assert_eq!(err.kind(), "EmptyOutputError");
        assert_eq!(err.category(), ErrorCategory::Destination);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("out.csv"));
    }

    #[test]
    fn test_config_errors_exit_with_two() {
        let err = EtlError::ConfigError {
            message: "bad".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
    }
}
