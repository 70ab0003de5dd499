//! Reply decoding
//!
//! Converts a [`redis::Value`] read by the transport into a [`ReplyValue`].
//! The value is consumed, so it is released exactly once when decoding
//! returns, whether or not the reply turns out to be an error.

use crate::error::Result;
use crate::types::ReplyValue;
use bytes::Bytes;
use redis::Value;

/// Convert one reply into a [`ReplyValue`]
///
/// Reply kinds without a mapping (RESP3 doubles, booleans, maps, sets,
/// pushes, big numbers, verbatim strings and attributes) become
/// [`ReplyValue::Nil`].
pub fn decode_reply(raw: Value) -> ReplyValue {
    match raw {
        Value::Nil => ReplyValue::Nil,
        Value::Int(i) => ReplyValue::Integer(i),
        Value::BulkString(data) => ReplyValue::BulkString(Bytes::from(data)),
        Value::SimpleString(status) => ReplyValue::Status(Bytes::from(status)),
        Value::Okay => ReplyValue::Status(Bytes::from_static(b"OK")),
        Value::Array(elements) => {
            ReplyValue::Array(elements.into_iter().map(decode_reply).collect())
        }
        Value::ServerError(err) => ReplyValue::Error(server_error_text(err)),
        other => {
            tracing::trace!("No mapping for reply {:?}, decoding as nil", other);
            ReplyValue::Nil
        }
    }
}

/// Decode a reply and promote a top-level error reply to a server error
pub fn decode_checked(raw: Value) -> Result<ReplyValue> {
    decode_reply(raw).into_result()
}

// The parser splits "-ERR some text" into a code and a detail; join them back
// into the line the server sent.
fn server_error_text(err: impl Into<redis::RedisError>) -> Bytes {
    let err: redis::RedisError = err.into();
    let text = match (err.code(), err.detail()) {
        (Some(code), Some(detail)) => format!("{} {}", code, detail),
        (Some(code), None) => code.to_string(),
        (None, _) => err.to_string(),
    };
    Bytes::from(text)
}
