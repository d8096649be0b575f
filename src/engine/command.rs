//! Protocol commands understood by the engine.

use crate::error::ProtocolError;

/// One protocol command, borrowed from the caller.
///
/// Each variant corresponds to one engine primitive. `None` fields are
/// optional protocol arguments and are left out of the wire message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Join {
        channel: &'a str,
        key: Option<&'a str>,
    },
    Part {
        channel: &'a str,
    },
    Invite {
        nick: &'a str,
        channel: &'a str,
    },
    Names {
        channel: &'a str,
    },
    List {
        channel: &'a str,
    },
    /// Query the topic, or set it when `topic` is given.
    Topic {
        channel: &'a str,
        topic: Option<&'a str>,
    },
    /// Query channel modes, or change them when `mode` is given.
    ChannelMode {
        channel: &'a str,
        mode: Option<&'a str>,
    },
    Kick {
        nick: &'a str,
        channel: &'a str,
        reason: Option<&'a str>,
    },
    Msg {
        target: &'a str,
        text: &'a str,
    },
    /// CTCP ACTION.
    Me {
        target: &'a str,
        text: &'a str,
    },
    Notice {
        target: &'a str,
        text: &'a str,
    },
    Quit {
        reason: Option<&'a str>,
    },
    /// Query our user modes, or change them when `mode` is given.
    UserMode {
        mode: Option<&'a str>,
    },
    Nick {
        nick: &'a str,
    },
    Whois {
        nick: &'a str,
    },
    CtcpReply {
        nick: &'a str,
        reply: &'a str,
    },
    CtcpRequest {
        nick: &'a str,
        request: &'a str,
    },
    /// A preformatted protocol line, sent as-is.
    Raw {
        line: &'a str,
    },
}

impl Command<'_> {
    /// The protocol verb, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "JOIN",
            Self::Part { .. } => "PART",
            Self::Invite { .. } => "INVITE",
            Self::Names { .. } => "NAMES",
            Self::List { .. } => "LIST",
            Self::Topic { .. } => "TOPIC",
            Self::ChannelMode { .. } | Self::UserMode { .. } => "MODE",
            Self::Kick { .. } => "KICK",
            Self::Msg { .. } => "PRIVMSG",
            Self::Me { .. } => "ACTION",
            Self::Notice { .. } => "NOTICE",
            Self::Quit { .. } => "QUIT",
            Self::Nick { .. } => "NICK",
            Self::Whois { .. } => "WHOIS",
            Self::CtcpReply { .. } => "CTCP_REPLY",
            Self::CtcpRequest { .. } => "CTCP_REQUEST",
            Self::Raw { .. } => "RAW",
        }
    }

    /// Check that every required argument is non-empty.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let command = self.name();
        match *self {
            Self::Join { channel, .. }
            | Self::Part { channel }
            | Self::Names { channel }
            | Self::List { channel }
            | Self::Topic { channel, .. }
            | Self::ChannelMode { channel, .. } => require(command, &[("channel", channel)]),
            Self::Invite { nick, channel } | Self::Kick { nick, channel, .. } => {
                require(command, &[("nick", nick), ("channel", channel)])
            }
            Self::Msg { target, text } | Self::Me { target, text } | Self::Notice { target, text } => {
                require(command, &[("target", target), ("text", text)])
            }
            Self::Nick { nick } | Self::Whois { nick } => require(command, &[("nick", nick)]),
            Self::CtcpReply { nick, reply } => require(command, &[("nick", nick), ("reply", reply)]),
            Self::CtcpRequest { nick, request } => {
                require(command, &[("nick", nick), ("request", request)])
            }
            Self::Raw { line } => require(command, &[("line", line)]),
            Self::Quit { .. } | Self::UserMode { .. } => Ok(()),
        }
    }
}

fn require(command: &'static str, args: &[(&'static str, &str)]) -> Result<(), ProtocolError> {
    match args.iter().find(|(_, value)| value.is_empty()) {
        Some(&(argument, _)) => Err(ProtocolError::MissingArgument { command, argument }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_arguments_must_be_non_empty() {
        let err = Command::Join {
            channel: "",
            key: None,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MissingArgument {
                command: "JOIN",
                argument: "channel"
            }
        ));

        let err = Command::Kick {
            nick: "bob",
            channel: "",
            reason: Some("bye"),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MissingArgument {
                argument: "channel",
                ..
            }
        ));
    }

    #[test]
    fn optional_arguments_may_be_absent() {
        assert!(Command::Quit { reason: None }.validate().is_ok());
        assert!(Command::UserMode { mode: None }.validate().is_ok());
        assert!(
            Command::Topic {
                channel: "#rust",
                topic: None
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn message_text_is_required() {
        let err = Command::Msg {
            target: "#rust",
            text: "",
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "PRIVMSG: missing text");
    }
}
