//! Error types for the Redis handle library

use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, RedisHandleError>;

/// Main error type for the Redis handle library
#[derive(Error, Debug)]
pub enum RedisHandleError {
    /// The transport could not be created at all
    #[error("Connection error: {0}")]
    Connection(String),

    /// The transport exists but is in an error state
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Operation attempted on a closed handle
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Write or read failure in the middle of a session
    #[error("Transport error ({code}): {message}")]
    Transport {
        /// Category recorded by the transport
        code: ErrorCode,
        /// Message recorded by the transport
        message: String,
    },

    /// The server refused the command; the payload is the literal error text
    #[error("{}", String::from_utf8_lossy(.0))]
    Server(Bytes),

    /// Socket option access failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Argument list rejected at the boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RedisHandleError {
    /// Create a connection error
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a protocol error
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create a transport error
    pub fn transport_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Transport {
            code,
            message: message.into(),
        }
    }

    /// Create a server error from the raw error payload
    pub fn server_error(payload: impl Into<Bytes>) -> Self {
        Self::Server(payload.into())
    }

    /// Create an IO error
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            message.into(),
        ))
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Check if the server refused the command
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server(_))
    }

    /// Raw error text sent by the server, if this is a server error
    pub fn server_message(&self) -> Option<&[u8]> {
        match self {
            Self::Server(payload) => Some(payload),
            _ => None,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection(_) => ErrorCategory::Connection,
            Self::Protocol(_) => ErrorCategory::Protocol,
            Self::InvalidState(_) => ErrorCategory::InvalidState,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Server(_) => ErrorCategory::Server,
            Self::Io(_) => ErrorCategory::Io,
            Self::Config(_) => ErrorCategory::Config,
            Self::InvalidArgument(_) => ErrorCategory::Argument,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport could not be created
    Connection,
    /// Transport created but unusable
    Protocol,
    /// Handle closed
    InvalidState,
    /// Mid-session read/write failure
    Transport,
    /// Command refused by the server
    Server,
    /// Socket option failure
    Io,
    /// Configuration error
    Config,
    /// Rejected argument list
    Argument,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Protocol => write!(f, "protocol"),
            Self::InvalidState => write!(f, "invalid_state"),
            Self::Transport => write!(f, "transport"),
            Self::Server => write!(f, "server"),
            Self::Io => write!(f, "io"),
            Self::Config => write!(f, "config"),
            Self::Argument => write!(f, "argument"),
        }
    }
}

/// Symbolic category of the error last recorded by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Socket level failure, including timeouts
    Io,
    /// The server closed the connection
    Eof,
    /// Malformed reply stream
    Protocol,
    /// Anything else
    Other,
}

impl ErrorCode {
    /// Symbol name as exposed by hiredis-style bindings
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Io => "REDIS_ERR_IO",
            Self::Eof => "REDIS_ERR_EOF",
            Self::Protocol => "REDIS_ERR_PROTOCOL",
            Self::Other => "REDIS_ERR_OTHER",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
