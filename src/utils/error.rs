use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Unreadable document: {reason}")]
    UnreadableDocument { reason: String },

    #[error("Unsupported media type for '{filename}'")]
    UnsupportedMediaType { filename: String },

    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("Verification page unreachable: {url} ({reason})")]
    VerificationPageUnreachable { url: String, reason: String },

    #[error("Field '{field}' not found on the {platform} verification page")]
    VerificationFieldNotFound { platform: String, field: String },

    #[error("Could not determine the issuing platform")]
    UnknownPlatform,

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool timeout after {0} seconds")]
    ToolTimeout(u64),

    #[error("Tool execution failed: {0}")]
    ToolFailed(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Document,
    Platform,
    Reference,
    Tool,
    Config,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VerifyError {
    pub fn unreadable(reason: impl Into<String>) -> Self {
        VerifyError::UnreadableDocument {
            reason: reason.into(),
        }
    }

    pub fn malformed_payload(reason: impl Into<String>) -> Self {
        VerifyError::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            VerifyError::UnreadableDocument { .. }
            | VerifyError::UnsupportedMediaType { .. }
            | VerifyError::MalformedPayload { .. } => ErrorCategory::Document,
            VerifyError::UnknownPlatform => ErrorCategory::Platform,
            VerifyError::VerificationPageUnreachable { .. }
            | VerifyError::VerificationFieldNotFound { .. }
            | VerifyError::Http(_) => ErrorCategory::Reference,
            VerifyError::ToolNotFound(_)
            | VerifyError::ToolTimeout(_)
            | VerifyError::ToolFailed(_) => ErrorCategory::Tool,
            VerifyError::ConfigValidation { .. } | VerifyError::InvalidConfigValue { .. } => {
                ErrorCategory::Config
            }
            VerifyError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Reference => {
                if self.is_fatal() {
                    ErrorSeverity::Medium
                } else {
                    ErrorSeverity::Low
                }
            }
            ErrorCategory::Document | ErrorCategory::Platform | ErrorCategory::Config => {
                ErrorSeverity::High
            }
            ErrorCategory::Tool | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Field misses on the reference side only downgrade the verdict.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VerifyError::VerificationFieldNotFound { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Document | ErrorCategory::Platform => {
                format!("Could not process document: {}", self)
            }
            ErrorCategory::Reference => format!("Could not confirm with the issuer: {}", self),
            ErrorCategory::Tool => format!("A required helper tool failed: {}", self),
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
            ErrorCategory::System => "Verification failed due to an internal error".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            VerifyError::UnreadableDocument { .. } => {
                "Upload the original, unencrypted certificate file"
            }
            VerifyError::UnsupportedMediaType { .. } => {
                "Upload a PDF or an image (png, jpg, gif, bmp, tiff, webp)"
            }
            VerifyError::MalformedPayload { .. } => {
                "The QR code on the certificate is damaged or not an issuer credential"
            }
            VerifyError::UnknownPlatform => {
                "Only Coursera, Udemy, Alison, Saylor and Infosys certificates are supported"
            }
            VerifyError::VerificationPageUnreachable { .. } | VerifyError::Http(_) => {
                "Check network access or raise the renderer timeout, then retry"
            }
            VerifyError::VerificationFieldNotFound { .. } => {
                "Open the verification page manually and compare the details"
            }
            VerifyError::ToolNotFound(_) => {
                "Install the tool or set its path in the [tools] config section"
            }
            VerifyError::ToolTimeout(_) => "Raise tools.timeout_seconds in the configuration",
            VerifyError::ToolFailed(_) => "Run the tool manually to inspect its output",
            VerifyError::ConfigValidation { .. } | VerifyError::InvalidConfigValue { .. } => {
                "Fix the configuration value and retry"
            }
            VerifyError::Io(_) => "Retry; report the problem if it persists",
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_not_found_is_non_fatal() {
        let err = VerifyError::VerificationFieldNotFound {
            platform: "Alison".to_string(),
            field: "course".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Reference);
    }

    #[test]
    fn test_document_errors_use_processing_message() {
        let err = VerifyError::unreadable("bad xref table");
        assert!(err
            .user_friendly_message()
            .starts_with("Could not process document"));
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = VerifyError::UnknownPlatform;
        assert!(err
            .user_friendly_message()
            .starts_with("Could not process document"));
    }
}
