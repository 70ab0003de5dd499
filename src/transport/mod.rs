//! Blocking transport underneath the handle
//!
//! A [`Transport`] owns one socket, an outgoing pipeline buffer and the
//! error it last recorded. Commands are packed with [`redis::Cmd`] and
//! replies are read with a per-connection [`redis::Parser`], so the wire
//! format is entirely the `redis` crate's business.
//!
//! Every failure is recorded on the transport before it is returned, so
//! callers can always inspect what went wrong through [`Transport::error`]. Once an error is recorded the transport refuses to
//! read further replies until [`Transport::reconnect`] succeeds.
//!
//! The transport is not internally synchronized.

use crate::error::{ErrorCode, RedisHandleError, Result};
use bytes::BytesMut;
use redis::{Parser, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

/// Where a transport connects to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectTarget {
    /// TCP host and port
    Tcp {
        /// Host name or IP address
        host: String,
        /// TCP port
        port: u16,
    },
    /// Unix domain socket
    Unix {
        /// Socket path
        path: PathBuf,
    },
}

impl ConnectTarget {
    /// TCP target
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        ConnectTarget::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Unix domain socket target
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        ConnectTarget::Unix { path: path.into() }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ConnectTarget::Tcp { host, .. } if host.is_empty() => {
                Err(RedisHandleError::connection_error("empty host name"))
            }
            ConnectTarget::Tcp { port: 0, .. } => {
                Err(RedisHandleError::connection_error("port 0 is not connectable"))
            }
            ConnectTarget::Unix { path } if path.as_os_str().is_empty() => {
                Err(RedisHandleError::connection_error("empty socket path"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectTarget::Tcp { host, port } => write!(f, "{}:{}", host, port),
            ConnectTarget::Unix { path } => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Limits and socket settings for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Timeout for establishing the TCP connection
    pub connect_timeout: Option<Duration>,
    /// Maximum number of unflushed bytes in the pipeline buffer
    pub max_output_buffer: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            max_output_buffer: crate::config::DEFAULT_MAX_OUTPUT_BUFFER,
        }
    }
}

/// Error recorded on a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFault {
    /// Symbolic category
    pub code: ErrorCode,
    /// Human readable message
    pub message: String,
}

impl TransportFault {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<TransportFault> for RedisHandleError {
    fn from(fault: TransportFault) -> Self {
        RedisHandleError::Transport {
            code: fault.code,
            message: fault.message,
        }
    }
}

enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => {
                s.set_read_timeout(timeout)?;
                s.set_write_timeout(timeout)
            }
            #[cfg(unix)]
            Stream::Unix(s) => {
                s.set_read_timeout(timeout)?;
                s.set_write_timeout(timeout)
            }
        }
    }

    // Reads SO_RCVTIMEO back from the socket.
    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        match self {
            Stream::Tcp(s) => s.read_timeout(),
            #[cfg(unix)]
            Stream::Unix(s) => s.read_timeout(),
        }
    }

    fn shutdown(&self) {
        let _ = match self {
            Stream::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Stream::Unix(s) => s.shutdown(Shutdown::Both),
        };
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// One blocking connection to a Redis server
pub struct Transport {
    target: ConnectTarget,
    options: TransportOptions,
    stream: Option<BufReader<Stream>>,
    obuf: BytesMut,
    parser: Parser,
    pending: usize,
    timeout: Option<Duration>,
    err: Option<TransportFault>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("target", &self.target)
            .field("connected", &self.stream.is_some())
            .field("pending", &self.pending)
            .field("buffered", &self.obuf.len())
            .field("err", &self.err)
            .finish()
    }
}

impl Transport {
    /// Allocate a transport for `target` without connecting it
    ///
    /// Fails only when the target itself is unusable.
    pub fn new(target: ConnectTarget, options: TransportOptions) -> Result<Self> {
        target.validate()?;
        Ok(Self {
            target,
            options,
            stream: None,
            obuf: BytesMut::with_capacity(1024),
            parser: Parser::new(),
            pending: 0,
            timeout: None,
            err: None,
        })
    }

    /// Allocate and connect in one step
    ///
    /// A connect failure does not fail this call: the returned transport
    /// carries the recorded error instead.
    pub fn open(target: ConnectTarget, options: TransportOptions) -> Result<Self> {
        let mut transport = Self::new(target, options)?;
        let _ = transport.connect();
        Ok(transport)
    }

    /// Establish the connection to the stored target
    pub fn connect(&mut self) -> std::result::Result<(), TransportFault> {
        tracing::debug!("Connecting to {}", self.target);
        let stream = match self.dial() {
            Ok(stream) => stream,
            Err(fault) => return Err(self.record(fault)),
        };
        if let Err(e) = stream.set_timeouts(self.timeout) {
            return Err(self.record(TransportFault::new(ErrorCode::Io, e.to_string())));
        }
        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    /// Drop the current socket and connect again
    ///
    /// Clears the recorded error, discards buffered commands and pending
    /// replies, and restores the previously set timeout.
    pub fn reconnect(&mut self) -> std::result::Result<(), TransportFault> {
        if let Some(stream) = self.stream.take() {
            stream.get_ref().shutdown();
        }
        self.err = None;
        self.obuf.clear();
        self.pending = 0;
        self.parser = Parser::new();
        self.connect()
    }

    fn dial(&self) -> std::result::Result<Stream, TransportFault> {
        match &self.target {
            ConnectTarget::Tcp { host, port } => {
                let addrs = (host.as_str(), *port)
                    .to_socket_addrs()
                    .map_err(|e| TransportFault::new(ErrorCode::Other, e.to_string()))?;

                let mut last_err = None;
                for addr in addrs {
                    let attempt = match self.options.connect_timeout {
                        Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                        None => TcpStream::connect(addr),
                    };
                    match attempt {
                        Ok(stream) => {
                            stream
                                .set_nodelay(true)
                                .map_err(|e| TransportFault::new(ErrorCode::Io, e.to_string()))?;
                            return Ok(Stream::Tcp(stream));
                        }
                        Err(e) => last_err = Some(e),
                    }
                }

                Err(match last_err {
                    Some(e) => TransportFault::new(ErrorCode::Io, e.to_string()),
                    None => TransportFault::new(
                        ErrorCode::Other,
                        format!("no addresses resolved for {}", host),
                    ),
                })
            }
            #[cfg(unix)]
            ConnectTarget::Unix { path } => UnixStream::connect(path)
                .map(Stream::Unix)
                .map_err(|e| TransportFault::new(ErrorCode::Io, e.to_string())),
            #[cfg(not(unix))]
            ConnectTarget::Unix { .. } => Err(TransportFault::new(
                ErrorCode::Other,
                "unix domain sockets are not supported on this platform",
            )),
        }
    }

    /// Queue one command without reading its reply
    ///
    /// `argl[i]` is the number of bytes of `argv[i]` to send.
    pub fn append_command_argv(
        &mut self,
        argv: &[&[u8]],
        argl: &[usize],
    ) -> std::result::Result<(), TransportFault> {
        if argv.len() != argl.len() || argv.iter().zip(argl).any(|(a, &l)| l > a.len()) {
            return Err(self.record(TransportFault::new(
                ErrorCode::Other,
                "argument lengths do not match arguments",
            )));
        }

        let mut cmd = redis::Cmd::new();
        for (arg, &len) in argv.iter().zip(argl) {
            cmd.arg(&arg[..len]);
        }
        let packed = cmd.get_packed_command();
        if self.obuf.len().saturating_add(packed.len()) > self.options.max_output_buffer {
            return Err(self.record(TransportFault::new(
                ErrorCode::Other,
                format!(
                    "output buffer limit of {} bytes exceeded",
                    self.options.max_output_buffer
                ),
            )));
        }

        self.obuf.extend_from_slice(&packed);
        self.pending += 1;
        Ok(())
    }

    /// Flush queued commands, then block until one reply is read
    ///
    /// Error replies come back as [`Value::ServerError`]; only socket and
    /// framing failures are faults.
    pub fn get_reply(&mut self) -> std::result::Result<Value, TransportFault> {
        if let Some(fault) = &self.err {
            return Err(fault.clone());
        }

        let result = match self.stream.as_mut() {
            None => Err(TransportFault::new(ErrorCode::Other, "not connected")),
            Some(stream) => Self::flush_into(&mut self.obuf, stream.get_mut())
                .map_err(|e| TransportFault::new(ErrorCode::Io, e.to_string()))
                .and_then(|()| {
                    let mut reader = EofAware::new(stream);
                    let parsed = self.parser.parse_value(&mut reader);
                    parsed.map_err(|e| reply_fault(&e, reader.hit_eof))
                }),
        };

        match result {
            Ok(reply) => {
                self.pending = self.pending.saturating_sub(1);
                Ok(reply)
            }
            Err(fault) => Err(self.record(fault)),
        }
    }

    /// Queue one command and block until the next reply is read
    pub fn command_argv(
        &mut self,
        argv: &[&[u8]],
        argl: &[usize],
    ) -> std::result::Result<Value, TransportFault> {
        self.append_command_argv(argv, argl)?;
        self.get_reply()
    }

    fn flush_into(obuf: &mut BytesMut, stream: &mut Stream) -> io::Result<()> {
        if obuf.is_empty() {
            return Ok(());
        }
        stream.write_all(obuf)?;
        stream.flush()?;
        obuf.clear();
        Ok(())
    }

    /// Set both the receive and the send timeout of the socket
    ///
    /// `None` or a zero duration disables the timeout.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout = timeout.filter(|d| !d.is_zero());
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))?;
        if let Err(e) = stream.get_ref().set_timeouts(timeout) {
            self.record(TransportFault::new(ErrorCode::Io, e.to_string()));
            return Err(e);
        }
        self.timeout = timeout;
        Ok(())
    }

    /// Receive timeout as reported by the operating system
    pub fn read_timeout(&self) -> io::Result<Option<Duration>> {
        match &self.stream {
            Some(stream) => stream.get_ref().read_timeout(),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "not connected")),
        }
    }

    /// Last recorded error
    pub fn error(&self) -> Option<&TransportFault> {
        self.err.as_ref()
    }

    /// Commands queued or in flight whose reply has not been read
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Stored connection target
    pub fn target(&self) -> &ConnectTarget {
        &self.target
    }

    fn record(&mut self, fault: TransportFault) -> TransportFault {
        tracing::warn!("Transport to {} failed ({}): {}", self.target, fault.code, fault.message);
        self.err = Some(fault.clone());
        fault
    }
}

/// Reader that remembers whether the peer closed the stream
struct EofAware<'a, R> {
    inner: &'a mut R,
    hit_eof: bool,
}

impl<'a, R: Read> EofAware<'a, R> {
    fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            hit_eof: false,
        }
    }
}

impl<R: Read> Read for EofAware<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.hit_eof = true;
        }
        Ok(n)
    }
}

fn reply_fault(err: &redis::RedisError, hit_eof: bool) -> TransportFault {
    if hit_eof || err.is_connection_dropped() {
        TransportFault::new(ErrorCode::Eof, "Server closed the connection")
    } else if err.is_io_error() {
        TransportFault::new(ErrorCode::Io, err.to_string())
    } else {
        TransportFault::new(ErrorCode::Protocol, format!("Protocol error, {}", err))
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            tracing::debug!("Releasing connection to {}", self.target);
            stream.get_ref().shutdown();
        }
    }
}
