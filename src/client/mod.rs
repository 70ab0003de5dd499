//! Redis connection handle
//!
//! A [`RedisHandle`] exclusively owns one [`Transport`]. Closing the handle,
//! explicitly or by dropping it, releases the transport exactly once; closing
//! an already closed handle does nothing.
//!
//! Command dispatch lives in [`dispatch`].

pub mod dispatch;

use crate::error::{ErrorCode, RedisHandleError, Result};
use crate::transport::{ConnectTarget, Transport, TransportOptions};
use crate::types::HandleState;
use crate::utils::{duration_to_timeval, timeval_to_duration};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Handle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    /// Timeout for establishing the TCP connection
    pub connect_timeout: Option<Duration>,
    /// Send/receive timeout applied right after connecting
    pub timeout: Option<Duration>,
    /// Maximum number of bytes of appended, unflushed commands
    pub max_output_buffer: usize,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            timeout: None,
            max_output_buffer: crate::config::DEFAULT_MAX_OUTPUT_BUFFER,
        }
    }
}

impl HandleConfig {
    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RedisHandleError::config_error(format!("invalid handle config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every limit is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_output_buffer == 0 {
            return Err(RedisHandleError::config_error("max_output_buffer must be positive"));
        }
        if matches!(self.connect_timeout, Some(t) if t.is_zero()) {
            return Err(RedisHandleError::config_error("connect_timeout must be positive"));
        }
        Ok(())
    }

    fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: self.connect_timeout,
            max_output_buffer: self.max_output_buffer,
        }
    }
}

/// Owning handle around one Redis connection
///
/// Every operation blocks the calling thread until the socket operation
/// completes or fails; use [`RedisHandle::set_timeout`] to bound the wait.
/// A handle must not be used from several threads at once. All operations
/// take `&mut self`, so sharing one across threads requires external
/// serialization such as a `Mutex`.
#[derive(Debug)]
pub struct RedisHandle {
    transport: Option<Transport>,
    config: HandleConfig,
}

impl RedisHandle {
    /// Connect to `host:port`
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_config(ConnectTarget::tcp(host, port), HandleConfig::default())
    }

    /// Connect to `host` on the default Redis port
    pub fn connect_default(host: &str) -> Result<Self> {
        Self::connect(host, crate::config::DEFAULT_PORT)
    }

    /// Connect to a Unix domain socket
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_with_config(
            ConnectTarget::unix(path.as_ref()),
            HandleConfig::default(),
        )
    }

    /// Connect to `target` with a custom configuration
    ///
    /// Fails with [`RedisHandleError::Connection`] when no transport can be
    /// created for the target, and with [`RedisHandleError::Protocol`] when
    /// the transport was created but failed to connect.
    pub fn connect_with_config(target: ConnectTarget, config: HandleConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!("Connecting to Redis at {}", target);

        let transport = Transport::open(target, config.transport_options())?;
        if let Some(fault) = transport.error() {
            return Err(RedisHandleError::protocol_error(format!(
                "error connecting to redis server: {}",
                fault.message
            )));
        }

        let mut handle = Self {
            transport: Some(transport),
            config,
        };
        if let Some(timeout) = handle.config.timeout {
            handle.set_timeout_duration(timeout)?;
        }

        tracing::info!("Connected to Redis");
        Ok(handle)
    }

    /// Re-establish the connection to the stored target
    ///
    /// Works on an errored handle; a closed handle cannot be reconnected.
    pub fn reconnect(&mut self) -> Result<()> {
        let transport = self.transport.as_mut().ok_or_else(|| {
            RedisHandleError::invalid_state("this connection was closed, unable to reconnect")
        })?;

        tracing::info!("Reconnecting to Redis at {}", transport.target());
        transport.reconnect().map_err(|fault| {
            RedisHandleError::connection_error(format!(
                "error reconnecting to redis server: {}",
                fault.message
            ))
        })
    }

    /// Release the connection; does nothing if already closed
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            tracing::info!("Closing connection to {}", transport.target());
            drop(transport);
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> HandleState {
        match &self.transport {
            None => HandleState::Closed,
            Some(t) if t.error().is_some() => HandleState::Errored,
            Some(_) => HandleState::Open,
        }
    }

    /// Check if the handle has been closed
    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Set the send and receive timeout; zero disables it
    ///
    /// `microseconds` above one second carry into `seconds`.
    pub fn set_timeout(&mut self, seconds: u64, microseconds: u64) -> Result<&mut Self> {
        self.set_timeout_duration(timeval_to_duration(seconds, microseconds))?;
        Ok(self)
    }

    /// Set the send and receive timeout from a [`Duration`]
    pub fn set_timeout_duration(&mut self, timeout: Duration) -> Result<()> {
        let transport = self.ready_mut()?;
        transport.set_timeout(Some(timeout)).map_err(|e| {
            RedisHandleError::Io(std::io::Error::new(
                e.kind(),
                format!("unable to set timeout: {}", e),
            ))
        })
    }

    /// Receive timeout as `(seconds, microseconds)`; `(0, 0)` means none
    ///
    /// This reads the receive timeout back from the socket itself. The send
    /// timeout is not consulted; both are only ever set together through
    /// [`RedisHandle::set_timeout`].
    pub fn get_timeout(&self) -> Result<(u64, u64)> {
        let transport = self.ready()?;
        let timeout = transport.read_timeout().map_err(|e| {
            RedisHandleError::Io(std::io::Error::new(
                e.kind(),
                format!("unable to get previously set timeout on socket: {}", e),
            ))
        })?;
        Ok(timeout.map(duration_to_timeval).unwrap_or((0, 0)))
    }

    /// Message of the last recorded transport error, if any
    pub fn error_message(&self) -> Result<Option<String>> {
        Ok(self.open_transport()?.error().map(|f| f.message.clone()))
    }

    /// Category of the last recorded transport error, if any
    pub fn error_code(&self) -> Result<Option<ErrorCode>> {
        Ok(self.open_transport()?.error().map(|f| f.code))
    }

    /// Appended commands whose replies have not been drained
    pub fn pending_replies(&self) -> usize {
        self.transport.as_ref().map_or(0, Transport::pending)
    }

    /// Target this handle connects to, unless closed
    pub fn target(&self) -> Option<&ConnectTarget> {
        self.transport.as_ref().map(Transport::target)
    }

    /// Configuration the handle was created with
    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    fn open_transport(&self) -> Result<&Transport> {
        self.transport
            .as_ref()
            .ok_or_else(|| RedisHandleError::invalid_state("connection closed"))
    }

    fn ready(&self) -> Result<&Transport> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| RedisHandleError::invalid_state("redis context is disconnected"))?;
        if let Some(fault) = transport.error() {
            return Err(Self::errored(&fault.message));
        }
        Ok(transport)
    }

    fn ready_mut(&mut self) -> Result<&mut Transport> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| RedisHandleError::invalid_state("redis context is disconnected"))?;
        if let Some(fault) = transport.error() {
            return Err(Self::errored(&fault.message));
        }
        Ok(transport)
    }

    fn errored(message: &str) -> RedisHandleError {
        RedisHandleError::protocol_error(format!(
            "context has previously encountered an error: '{}'",
            message
        ))
    }
}

impl Drop for RedisHandle {
    fn drop(&mut self) {
        self.close();
    }
}
