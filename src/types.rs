//! Reply values and handle states

use crate::error::{RedisHandleError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded server reply
///
/// Every reply read from the transport is converted into exactly one
/// `ReplyValue`. Arrays nest; every other variant is a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyValue {
    /// Status reply (`+OK`), raw bytes
    Status(Bytes),
    /// Error reply (`-ERR ...`), raw bytes
    Error(Bytes),
    /// Integer reply
    Integer(i64),
    /// Null bulk string, null array or any reply kind without a mapping
    Nil,
    /// Bulk string, binary safe
    BulkString(Bytes),
    /// Array reply, element order preserved
    Array(Vec<ReplyValue>),
}

impl ReplyValue {
    /// Check if this is an error reply
    pub fn is_error(&self) -> bool {
        matches!(self, ReplyValue::Error(_))
    }

    /// Check if this is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, ReplyValue::Nil)
    }

    /// Payload of a status, error or bulk string reply
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ReplyValue::Status(b) | ReplyValue::Error(b) | ReplyValue::BulkString(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to integer if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ReplyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to array if this is an array
    pub fn as_array(&self) -> Option<&[ReplyValue]> {
        match self {
            ReplyValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            ReplyValue::Status(_) => "status",
            ReplyValue::Error(_) => "error",
            ReplyValue::Integer(_) => "integer",
            ReplyValue::Nil => "nil",
            ReplyValue::BulkString(_) => "bulk_string",
            ReplyValue::Array(_) => "array",
        }
    }

    /// Promote an error reply into [`RedisHandleError::Server`]
    pub fn into_result(self) -> Result<ReplyValue> {
        match self {
            ReplyValue::Error(payload) => Err(RedisHandleError::Server(payload)),
            other => Ok(other),
        }
    }
}

impl fmt::Display for ReplyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyValue::Status(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            ReplyValue::Error(b) => write!(f, "(error) {}", String::from_utf8_lossy(b)),
            ReplyValue::Integer(i) => write!(f, "(integer) {}", i),
            ReplyValue::Nil => write!(f, "(nil)"),
            ReplyValue::BulkString(b) => {
                write!(f, "{}", crate::utils::bytes_repr(b))
            }
            ReplyValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Lifecycle state of a [`RedisHandle`](crate::client::RedisHandle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleState {
    /// Connected with no recorded error
    Open,
    /// Connected, but the transport recorded an error
    Errored,
    /// Transport released
    Closed,
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleState::Open => write!(f, "open"),
            HandleState::Errored => write!(f, "errored"),
            HandleState::Closed => write!(f, "closed"),
        }
    }
}
