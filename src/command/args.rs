//! Typed command argument lists
//!
//! Arguments are opaque byte strings. Text, integers and floats are turned
//! into their decimal/UTF-8 byte form at this boundary so the rest of the
//! crate only ever sees bytes.

use crate::error::{RedisHandleError, Result};
use bytes::Bytes;
use std::fmt;

/// Conversion of one value into a command argument
pub trait IntoArg {
    /// Convert into the bytes sent on the wire
    fn into_arg(self) -> Bytes;
}

impl IntoArg for Bytes {
    fn into_arg(self) -> Bytes {
        self
    }
}

impl IntoArg for Vec<u8> {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoArg for &Vec<u8> {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl IntoArg for &[u8] {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl<const N: usize> IntoArg for &[u8; N] {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl IntoArg for &str {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for String {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoArg for &String {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

macro_rules! numeric_into_arg {
    ($($t:ty),*) => {
        $(
            impl IntoArg for $t {
                fn into_arg(self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

numeric_into_arg!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Ordered, non-empty list of binary-safe command arguments
///
/// The first argument is the command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs {
    args: Vec<Bytes>,
}

impl CommandArgs {
    /// Start a command with its name
    pub fn command(name: impl IntoArg) -> Self {
        Self {
            args: vec![name.into_arg()],
        }
    }

    /// Build from any sequence of arguments
    ///
    /// Fails with [`RedisHandleError::InvalidArgument`] when the sequence is empty.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        let args: Vec<Bytes> = args.into_iter().map(IntoArg::into_arg).collect();
        if args.is_empty() {
            return Err(RedisHandleError::invalid_argument(
                "a command needs at least its name",
            ));
        }
        Ok(Self { args })
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl IntoArg) -> Self {
        self.args.push(arg.into_arg());
        self
    }

    /// Command name (first argument)
    pub fn name(&self) -> &[u8] {
        &self.args[0]
    }

    /// Number of arguments, including the command name
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Check if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Iterate over the arguments
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.args.iter()
    }

    /// Borrow the arguments
    pub fn as_slice(&self) -> &[Bytes] {
        &self.args
    }
}

impl fmt::Display for CommandArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", crate::utils::bytes_repr(arg))?;
        }
        Ok(())
    }
}

/// Anything that can be turned into a [`CommandArgs`]
pub trait ToCommandArgs {
    /// Validate and convert
    fn to_command_args(self) -> Result<CommandArgs>;
}

impl ToCommandArgs for CommandArgs {
    fn to_command_args(self) -> Result<CommandArgs> {
        Ok(self)
    }
}

impl ToCommandArgs for &CommandArgs {
    fn to_command_args(self) -> Result<CommandArgs> {
        Ok(self.clone())
    }
}

impl<T: IntoArg, const N: usize> ToCommandArgs for [T; N] {
    fn to_command_args(self) -> Result<CommandArgs> {
        CommandArgs::from_args(self)
    }
}

impl<T: IntoArg> ToCommandArgs for Vec<T> {
    fn to_command_args(self) -> Result<CommandArgs> {
        CommandArgs::from_args(self)
    }
}

impl<T: IntoArg + Clone> ToCommandArgs for &[T] {
    fn to_command_args(self) -> Result<CommandArgs> {
        CommandArgs::from_args(self.iter().cloned())
    }
}
