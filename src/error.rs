use thiserror::Error;

/// Shown when the backend gave no human-readable reason.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Checkout SDK failed to load: {0}")]
    SdkLoad(String),
    #[error(
        "Backend rejected the request{}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    Backend {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Payment verification failed: {message}")]
    Verification { message: String },
    #[error("Unknown race category '{0}'")]
    InvalidCategory(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

#[cfg(feature = "session-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Storage(err.into_string())
    }
}

impl PaymentError {
    /// The text a participant should see for this error.
    ///
    /// Backend messages are passed through verbatim. Errors raised on this side
    /// of the wire carry their own wording; transport failures get the generic
    /// fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Verification { message } => message.clone(),
            Self::Config(_) | Self::SdkLoad(_) => {
                "The payment gateway is unavailable right now. Please try again.".to_string()
            }
            Self::InvalidCategory(category) => format!("'{category}' is not an available race category."),
            Self::ValidationError(message) => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Whether the failure is about the transport rather than the request itself.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Backend {
                status: Some(status),
                ..
            } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
