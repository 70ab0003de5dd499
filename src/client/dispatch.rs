//! Command dispatch
//!
//! Two ways to issue a command: [`RedisHandle::command`] writes it and waits
//! for its reply, [`RedisHandle::append`] only queues it. Queued replies are
//! drained one at a time with [`RedisHandle::get_reply`], in the order the
//! commands were appended.
//!
//! An error reply from the server is returned as
//! [`RedisHandleError::Server`](crate::error::RedisHandleError::Server),
//! never as a transport error, so callers can tell a refused command from a
//! broken connection.

use super::RedisHandle;
use crate::command::{ArgVector, CommandArgs, ToCommandArgs};
use crate::error::Result;
use crate::reply::decode_checked;
use crate::types::ReplyValue;
use crate::utils::bytes_repr;

impl RedisHandle {
    /// Send one command and wait for its reply
    pub fn command<A: ToCommandArgs>(&mut self, args: A) -> Result<ReplyValue> {
        let args = args.to_command_args()?;
        let transport = self.ready_mut()?;
        log_dispatch("Sending", &args);

        let raw = {
            let vector = ArgVector::new(&args);
            let (argv, argl) = vector.as_parts();
            transport.command_argv(argv, argl)?
        };
        decode_checked(raw)
    }

    /// Queue one command without reading its reply
    pub fn append<A: ToCommandArgs>(&mut self, args: A) -> Result<()> {
        let args = args.to_command_args()?;
        let transport = self.ready_mut()?;
        log_dispatch("Appending", &args);

        let vector = ArgVector::new(&args);
        let (argv, argl) = vector.as_parts();
        transport.append_command_argv(argv, argl)?;
        Ok(())
    }

    /// Block until the next queued reply is available and return it
    pub fn get_reply(&mut self) -> Result<ReplyValue> {
        let transport = self.ready_mut()?;
        let raw = transport.get_reply()?;
        decode_checked(raw)
    }
}

fn log_dispatch(action: &str, args: &CommandArgs) {
    tracing::debug!(
        "{} command {} with {} argument(s)",
        action,
        bytes_repr(args.name()),
        args.len() - 1
    );
}
