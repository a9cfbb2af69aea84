use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to parse slot response: {message}")]
    ParseError {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Slot API request failed with status {status}")]
    UpstreamError { status: u16 },

    #[error("HTTP transport error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("State store error: {message}")]
    StateStoreError {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Slot response contained no slots")]
    EmptyResultError,

    #[error("Notification delivery failed: {message}")]
    NotificationError { message: String },

    #[error("Request template error: {message}")]
    TemplateError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
