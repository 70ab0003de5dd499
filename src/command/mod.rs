//! Command arguments and their wire layout
//!
//! [`CommandArgs`] is the validated, binary-safe argument list handed to the
//! handle; [`ArgVector`] is the short-lived pointer/length layout the
//! transport consumes.

pub mod args;
pub mod encoder;

pub use args::{CommandArgs, IntoArg, ToCommandArgs};
pub use encoder::{ArgVector, FAST_PATH_ARGS};
