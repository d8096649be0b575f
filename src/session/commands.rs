//! The protocol command surface.

use crate::engine::Command;
use crate::error::ProtocolError;
use tracing::{debug, trace};

pub(crate) mod sealed {
    use crate::engine::Engine;

    pub trait EngineHandle {
        /// The engine commands are sent through.
        fn engine_handle(&mut self) -> &mut dyn Engine;
    }
}

/// Protocol commands, one method per engine primitive.
///
/// Implemented by [`Session`](crate::Session) and by the handler
/// [`Context`](crate::Context), so the same calls work inside and outside
/// dispatch. Every method checks its required arguments are non-empty
/// before anything reaches the engine.
///
/// The trait is sealed: the engine behind it is only reachable through
/// [`Commands::send`].
///
/// ```compile_fail
/// use slirc_client::Commands;
///
/// struct Bypass;
/// impl Commands for Bypass {}
/// ```
pub trait Commands: sealed::EngineHandle {
    /// Validate and send one command.
    fn send(&mut self, command: Command<'_>) -> Result<(), ProtocolError> {
        command.validate()?;
        match self.engine_handle().send(&command) {
            Ok(()) => {
                trace!(command = command.name(), "Command sent");
                Ok(())
            }
            Err(err) => {
                debug!(command = command.name(), code = err.code, error = %err, "Command failed");
                Err(ProtocolError::Engine(err))
            }
        }
    }

    fn join(&mut self, channel: &str, key: Option<&str>) -> Result<(), ProtocolError> {
        self.send(Command::Join { channel, key })
    }

    fn part(&mut self, channel: &str) -> Result<(), ProtocolError> {
        self.send(Command::Part { channel })
    }

    fn invite(&mut self, nick: &str, channel: &str) -> Result<(), ProtocolError> {
        self.send(Command::Invite { nick, channel })
    }

    fn names(&mut self, channel: &str) -> Result<(), ProtocolError> {
        self.send(Command::Names { channel })
    }

    fn list(&mut self, channel: &str) -> Result<(), ProtocolError> {
        self.send(Command::List { channel })
    }

    /// Query the topic, or set it.
    fn topic(&mut self, channel: &str, topic: Option<&str>) -> Result<(), ProtocolError> {
        self.send(Command::Topic { channel, topic })
    }

    /// Query channel modes, or change them.
    fn channel_mode(&mut self, channel: &str, mode: Option<&str>) -> Result<(), ProtocolError> {
        self.send(Command::ChannelMode { channel, mode })
    }

    fn kick(&mut self, nick: &str, channel: &str, reason: Option<&str>) -> Result<(), ProtocolError> {
        self.send(Command::Kick {
            nick,
            channel,
            reason,
        })
    }

    fn msg(&mut self, target: &str, text: &str) -> Result<(), ProtocolError> {
        self.send(Command::Msg { target, text })
    }

    fn me(&mut self, target: &str, text: &str) -> Result<(), ProtocolError> {
        self.send(Command::Me { target, text })
    }

    fn notice(&mut self, target: &str, text: &str) -> Result<(), ProtocolError> {
        self.send(Command::Notice { target, text })
    }

    fn quit(&mut self, reason: Option<&str>) -> Result<(), ProtocolError> {
        self.send(Command::Quit { reason })
    }

    /// Query our user modes, or change them.
    fn user_mode(&mut self, mode: Option<&str>) -> Result<(), ProtocolError> {
        self.send(Command::UserMode { mode })
    }

    fn nick(&mut self, nick: &str) -> Result<(), ProtocolError> {
        self.send(Command::Nick { nick })
    }

    fn whois(&mut self, nick: &str) -> Result<(), ProtocolError> {
        self.send(Command::Whois { nick })
    }

    fn ctcp_reply(&mut self, nick: &str, reply: &str) -> Result<(), ProtocolError> {
        self.send(Command::CtcpReply { nick, reply })
    }

    fn ctcp_request(&mut self, nick: &str, request: &str) -> Result<(), ProtocolError> {
        self.send(Command::CtcpRequest { nick, request })
    }

    /// Send a preformatted protocol line.
    fn raw(&mut self, line: &str) -> Result<(), ProtocolError> {
        self.send(Command::Raw { line })
    }
}
