//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The transport could not establish a connection to the collector
    #[error("Connection to '{hosts}' failed: {message}")]
    Connection { hosts: String, message: String },

    /// Append attempted without a live connection
    #[error("Cannot append: appender either closed or not configured")]
    NotConfigured,

    /// Close attempted without a live connection
    #[error("Appender already closed")]
    AlreadyClosed,

    /// An event could not be delivered to the collector
    #[error("Delivery to {endpoint} failed: {message}")]
    Delivery { endpoint: String, message: String },

    /// Releasing a connection failed
    #[error("Error while closing connection: {message}")]
    Close { message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Channel send error
    #[error("Failed to submit event to send worker")]
    ChannelSendError,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a connection error for the given hosts
    pub fn connection(hosts: impl Into<String>, message: impl ToString) -> Self {
        LoggerError::Connection {
            hosts: hosts.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error for the given endpoint
    pub fn delivery(endpoint: impl Into<String>, message: impl ToString) -> Self {
        LoggerError::Delivery {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create a close error
    pub fn close(message: impl ToString) -> Self {
        LoggerError::Close {
            message: message.to_string(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether the error is a lifecycle misuse rather than a transport fault
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, LoggerError::NotConfigured | LoggerError::AlreadyClosed)
    }
}
