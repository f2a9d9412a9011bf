use thiserror::Error;

/// Failures raised by the input/browser primitives behind [`crate::platforms::InputEngine`].
#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum SenderError {
    /// The recipient file is missing or could not be parsed.
    #[error("Failed to read recipient source {path}: {message}")]
    SourceRead { path: String, message: String },

    #[error("Failed to rewrite recipient source {path}: {message}")]
    SourceWrite { path: String, message: String },

    /// One delivery attempt failed; the recipient keeps its status.
    #[error("Delivery to {destination} failed: {source}")]
    Delivery {
        destination: String,
        #[source]
        source: AutomationError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl SenderError {
    pub(crate) fn source_read(path: &std::path::Path, message: impl ToString) -> Self {
        SenderError::SourceRead {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn source_write(path: &std::path::Path, message: impl ToString) -> Self {
        SenderError::SourceWrite {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
