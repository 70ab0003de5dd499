//! Redis Handle - a thin, blocking Redis connection handle
//!
//! This library exposes one Redis connection as a small set of primitives:
//! - **Connection handle**: connect over TCP or a Unix socket, reconnect, close
//! - **Commands**: send a command and wait for its reply, with binary-safe arguments
//! - **Pipelining**: queue commands and drain their replies in order
//! - **Typed replies**: every reply decodes into a [`ReplyValue`] tree
//! - **Introspection**: last transport error, socket timeouts
//!
//! # Features
//!
//! - **Blocking I/O**: every call completes (or fails) before returning
//! - **Binary safe**: arguments and replies are byte strings, `\0` included
//! - **Error handling**: server refusals are distinct from transport failures
//! - **Exclusive ownership**: the connection is released exactly once
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use redis_handle_rs::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut handle = RedisHandle::connect("127.0.0.1", 6379)?;
//!
//!     handle.command(["SET", "k", "v"])?;
//!     let value = handle.command(["GET", "k"])?;
//!     println!("GET k -> {}", value);
//!
//!     // Pipelining
//!     handle.append(["INCR", "counter"])?;
//!     handle.append(["INCR", "counter"])?;
//!     let first = handle.get_reply()?;
//!     let second = handle.get_reply()?;
//!     println!("{} then {}", first, second);
//!
//!     match handle.command(["GET"]) {
//!         Err(RedisHandleError::Server(msg)) => {
//!             println!("refused: {}", String::from_utf8_lossy(&msg));
//!         }
//!         other => println!("{:?}", other),
//!     }
//!
//!     handle.close();
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`client`]: the connection handle and command dispatch
//! - [`command`]: typed argument lists and their wire layout
//! - [`reply`]: reply decoding
//! - [`transport`]: the blocking socket layer, speaking RESP through the `redis` crate
//! - [`types`]: reply values and handle states
//! - [`error`]: error handling and result types
//! - [`utils`]: helpers

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

// Re-export commonly used types and traits
pub use client::{HandleConfig, RedisHandle};
pub use error::{ErrorCode, RedisHandleError, Result};
pub use types::{HandleState, ReplyValue};

// Public modules
pub mod error;
pub mod types;
pub mod utils;
pub mod transport;
pub mod command;
pub mod reply;
pub mod client;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library version information
pub fn version() -> &'static str {
    VERSION
}

/// Library configuration defaults
pub mod config {
    /// Default Redis TCP port
    pub const DEFAULT_PORT: u16 = 6379;

    /// Default limit for appended but unflushed command bytes
    pub const DEFAULT_MAX_OUTPUT_BUFFER: usize = 64 * 1024 * 1024; // 64MB

    /// Largest argument count encoded without a heap allocation
    pub const FAST_PATH_ARGS: usize = crate::command::FAST_PATH_ARGS;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits

    pub use crate::client::{HandleConfig, RedisHandle};
    pub use crate::command::{CommandArgs, IntoArg, ToCommandArgs};
    pub use crate::error::{ErrorCode, RedisHandleError, Result};
    pub use crate::transport::ConnectTarget;
    pub use crate::types::{HandleState, ReplyValue};
}

/// Initialize logging with a default `tracing` subscriber
///
/// Does nothing if a global subscriber is already installed.
pub fn init() {
    let _ = tracing_subscriber::fmt().try_init();
}

/// Initialize logging with a custom tracing subscriber
pub fn init_with_subscriber<S>(subscriber: S) -> Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        RedisHandleError::config_error(format!("failed to set tracing subscriber: {}", e))
    })
}
