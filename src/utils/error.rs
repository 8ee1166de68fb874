use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API responded with an error ({code}): {message}")]
    ApiResponseError { code: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Rendering error: {message}")]
    RenderError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AccessError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::ApiResponseError { code, .. } if is_server_status(code) => ErrorCategory::Network,
            Self::ApiResponseError { code, .. } if code == "INVALID_JSON" || code == "XML" => {
                ErrorCategory::Data
            }
            Self::ApiResponseError { .. } => ErrorCategory::Configuration,
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) | Self::ZipError(_) => ErrorCategory::Storage,
            Self::RenderError { .. } => ErrorCategory::Rendering,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data | ErrorCategory::Rendering => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => {
                "Check the network connection or rerun with --offline to use sample data"
            }
            Self::ApiResponseError { code, .. } if is_server_status(code) => {
                "The portal is unavailable; retry later or rerun with --offline"
            }
            Self::ApiResponseError { .. } => {
                "Verify PUBLIC_DATA_API_KEY is registered for this API on data.go.kr"
            }
            Self::MissingConfigError { .. } => {
                "Set the value in access-config.toml or the matching environment variable"
            }
            Self::InvalidConfigValueError { .. } | Self::ConfigValidationError { .. } => {
                "Fix the reported field in access-config.toml"
            }
            Self::CsvError(_) | Self::SerializationError(_) => {
                "Rerun the collect stage to regenerate the data files"
            }
            Self::ProcessingError { .. } => "Inspect the input tables for missing columns",
            Self::IoError(_) | Self::ZipError(_) => {
                "Check that the data and results directories are writable"
            }
            Self::RenderError { .. } => "Check the results directory and chart dimensions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch public data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Storage => format!("File system problem: {}", self),
            ErrorCategory::Rendering => format!("Could not render output: {}", self),
        }
    }

    /// Logs the error with its category, prints the user-facing message and exits.
    pub fn exit(&self) -> ! {
        tracing::error!(
            "❌ Pipeline failed: {} (Category: {:?}, Severity: {:?})",
            self,
            self.category(),
            self.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", self.recovery_suggestion());
        eprintln!("❌ {}", self.user_friendly_message());
        eprintln!("💡 {}", self.recovery_suggestion());
        std::process::exit(self.exit_code())
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;

/// Three-digit HTTP 5xx status, the only API answer worth retrying.
pub fn is_server_status(code: &str) -> bool {
    code.len() == 3 && code.starts_with('5') && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_one() {
        let err = AccessError::MissingConfigError {
            field: "api.service_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().contains("api.service_key"));
    }

    fn api_error(code: &str) -> AccessError {
        AccessError::ApiResponseError {
            code: code.to_string(),
            message: "SERVICE_KEY_IS_NOT_REGISTERED_ERROR".to_string(),
        }
    }

    #[test]
    fn test_only_server_errors_exit_with_two() {
        let server = api_error("503");
        assert_eq!(server.category(), ErrorCategory::Network);
        assert_eq!(server.severity(), ErrorSeverity::Medium);
        assert_eq!(server.exit_code(), 2);

        for code in ["30", "404", "401"] {
            let err = api_error(code);
            assert_eq!(err.category(), ErrorCategory::Configuration, "code {}", code);
            assert_eq!(err.exit_code(), 1, "code {}", code);
        }
        assert_eq!(api_error("INVALID_JSON").category(), ErrorCategory::Data);
        assert_eq!(api_error("XML").exit_code(), 1);
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = AccessError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }
}
