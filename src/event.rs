//! Event kinds, handler names and dispatch envelopes.
//!
//! Every callback the engine can raise maps to one [`EventKind`]. Each kind
//! carries the identifier the engine uses for it and the normalized handler
//! name derived from that identifier (`"on"` + identifier without
//! underscores, lower-cased). The derivation itself is exposed as
//! [`handler_name`] so hosts binding handlers by name get exactly the same
//! mapping.

use crate::origin::Origin;
use std::fmt;

/// Identifier of a DCC session inside the engine.
pub type DccId = u32;

/// Every event the engine reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Registration with the server completed.
    Connect,
    /// Someone (possibly us) changed nickname.
    Nick,
    /// Someone quit IRC.
    Quit,
    /// Someone (possibly us) joined a channel.
    Join,
    /// Someone (possibly us) left a channel.
    Part,
    /// Channel mode change.
    Mode,
    /// Our own user mode changed.
    Umode,
    /// Channel topic change.
    Topic,
    /// Someone was kicked from a channel.
    Kick,
    /// Message to a channel.
    Channel,
    /// Private message to us.
    Privmsg,
    /// Notice to us.
    Notice,
    /// Notice to a channel.
    ChannelNotice,
    /// We were invited to a channel.
    Invite,
    /// CTCP request.
    CtcpReq,
    /// CTCP reply.
    CtcpRep,
    /// CTCP ACTION (`/me`).
    CtcpAction,
    /// A command the engine does not know.
    Unknown,
    /// Numeric server reply.
    Numeric,
    /// Incoming DCC CHAT request.
    DccChatReq,
    /// Incoming DCC SEND request.
    DccSendReq,
}

impl EventKind {
    /// All kinds, in engine callback table order.
    pub const ALL: [EventKind; 21] = [
        EventKind::Connect,
        EventKind::Nick,
        EventKind::Quit,
        EventKind::Join,
        EventKind::Part,
        EventKind::Mode,
        EventKind::Umode,
        EventKind::Topic,
        EventKind::Kick,
        EventKind::Channel,
        EventKind::Privmsg,
        EventKind::Notice,
        EventKind::ChannelNotice,
        EventKind::Invite,
        EventKind::CtcpReq,
        EventKind::CtcpRep,
        EventKind::CtcpAction,
        EventKind::Unknown,
        EventKind::Numeric,
        EventKind::DccChatReq,
        EventKind::DccSendReq,
    ];

    /// The identifier the engine uses for this callback.
    pub const fn engine_name(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Nick => "nick",
            Self::Quit => "quit",
            Self::Join => "join",
            Self::Part => "part",
            Self::Mode => "mode",
            Self::Umode => "umode",
            Self::Topic => "topic",
            Self::Kick => "kick",
            Self::Channel => "channel",
            Self::Privmsg => "privmsg",
            Self::Notice => "notice",
            Self::ChannelNotice => "channel_notice",
            Self::Invite => "invite",
            Self::CtcpReq => "ctcp_req",
            Self::CtcpRep => "ctcp_rep",
            Self::CtcpAction => "ctcp_action",
            Self::Unknown => "unknown",
            Self::Numeric => "numeric",
            Self::DccChatReq => "dcc_chat_req",
            Self::DccSendReq => "dcc_send_req",
        }
    }

    /// The normalized handler name, e.g. `"onctcpreq"`.
    pub const fn handler_name(self) -> &'static str {
        match self {
            Self::Connect => "onconnect",
            Self::Nick => "onnick",
            Self::Quit => "onquit",
            Self::Join => "onjoin",
            Self::Part => "onpart",
            Self::Mode => "onmode",
            Self::Umode => "onumode",
            Self::Topic => "ontopic",
            Self::Kick => "onkick",
            Self::Channel => "onchannel",
            Self::Privmsg => "onprivmsg",
            Self::Notice => "onnotice",
            Self::ChannelNotice => "onchannelnotice",
            Self::Invite => "oninvite",
            Self::CtcpReq => "onctcpreq",
            Self::CtcpRep => "onctcprep",
            Self::CtcpAction => "onctcpaction",
            Self::Unknown => "onunknown",
            Self::Numeric => "onnumeric",
            Self::DccChatReq => "ondccchatreq",
            Self::DccSendReq => "ondccsendreq",
        }
    }

    /// Look up a kind by engine identifier, case-insensitively.
    pub fn from_engine_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.engine_name().eq_ignore_ascii_case(name))
    }

    /// Look up a kind by handler name.
    ///
    /// The name is normalized first, so `"onNotice"`, `"onNOTICE"` and
    /// `"on_notice"` all resolve to [`EventKind::Notice`].
    pub fn from_handler_name(name: &str) -> Option<Self> {
        let normalized = normalize(name);
        Self::ALL
            .into_iter()
            .find(|kind| kind.handler_name() == normalized)
    }

    /// Returns `true` for the kinds delivered as [`Envelope::Message`].
    pub const fn is_named(self) -> bool {
        !matches!(self, Self::Numeric | Self::DccChatReq | Self::DccSendReq)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.handler_name())
    }
}

/// Derive the handler name for an engine event identifier.
///
/// `"on"` followed by the identifier with underscores removed, lower-cased:
/// `ctcp_req` becomes `onctcpreq`, `NOTICE` becomes `onnotice`.
pub fn handler_name(identifier: &str) -> String {
    let mut name = String::with_capacity(identifier.len() + 2);
    name.push_str("on");
    name.extend(
        identifier
            .chars()
            .filter(|&c| c != '_')
            .map(|c| c.to_ascii_lowercase()),
    );
    name
}

fn normalize(name: &str) -> String {
    let name: String = name
        .chars()
        .filter(|&c| c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if name.starts_with("on") {
        name
    } else {
        handler_name(&name)
    }
}

/// A generic named event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message<'a> {
    pub kind: EventKind,
    /// The engine's identifier string; for [`EventKind::Unknown`] this is
    /// the raw command.
    pub event: &'a str,
    pub origin: Option<&'a str>,
    pub params: &'a [&'a str],
}

/// A numeric server reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Numeric<'a> {
    pub code: u32,
    pub origin: Option<&'a str>,
    pub params: &'a [&'a str],
}

/// Incoming DCC CHAT request metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DccChatRequest<'a> {
    pub nick: &'a str,
    pub remote_addr: &'a str,
    pub dcc_id: DccId,
}

/// Incoming DCC SEND request metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DccSendRequest<'a> {
    pub nick: &'a str,
    pub remote_addr: &'a str,
    pub filename: &'a str,
    pub filesize: u64,
    pub dcc_id: DccId,
}

/// The value a handler receives for one dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Envelope<'a> {
    Message(Message<'a>),
    Numeric(Numeric<'a>),
    DccChat(DccChatRequest<'a>),
    DccSend(DccSendRequest<'a>),
}

impl<'a> Envelope<'a> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message(msg) => msg.kind,
            Self::Numeric(_) => EventKind::Numeric,
            Self::DccChat(_) => EventKind::DccChatReq,
            Self::DccSend(_) => EventKind::DccSendReq,
        }
    }

    /// The raw origin string. DCC requests carry a nick instead.
    pub fn origin(&self) -> Option<&'a str> {
        match self {
            Self::Message(msg) => msg.origin,
            Self::Numeric(num) => num.origin,
            Self::DccChat(_) | Self::DccSend(_) => None,
        }
    }

    /// The origin split into nick, user and host.
    pub fn origin_parts(&self) -> Origin<'a> {
        self.origin().map(Origin::parse).unwrap_or_default()
    }

    /// Nickname of the sender, if known.
    pub fn nick(&self) -> Option<&'a str> {
        match self {
            Self::DccChat(req) => Some(req.nick),
            Self::DccSend(req) => Some(req.nick),
            _ => self.origin_parts().nick,
        }
    }

    /// Positional parameters; empty for DCC requests.
    pub fn params(&self) -> &'a [&'a str] {
        match self {
            Self::Message(msg) => msg.params,
            Self::Numeric(num) => num.params,
            Self::DccChat(_) | Self::DccSend(_) => &[],
        }
    }

    pub fn param(&self, index: usize) -> Option<&'a str> {
        self.params().get(index).copied()
    }

    /// The reply code of a numeric event.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Numeric(num) => Some(num.code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_names_follow_derivation_rule() {
        for kind in EventKind::ALL {
            assert_eq!(
                handler_name(kind.engine_name()),
                kind.handler_name(),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        for kind in EventKind::ALL {
            let first = handler_name(kind.engine_name());
            let second = handler_name(kind.engine_name());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn derivation_examples() {
        assert_eq!(handler_name("ctcp_req"), "onctcpreq");
        assert_eq!(handler_name("dcc_send_req"), "ondccsendreq");
        assert_eq!(handler_name("NOTICE"), "onnotice");
        assert_eq!(handler_name("ERROR"), "onerror");
    }

    #[test]
    fn handler_names_are_unique() {
        let mut names: Vec<_> = EventKind::ALL.iter().map(|k| k.handler_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EventKind::ALL.len());
    }

    #[test]
    fn lookup_by_handler_name_normalizes() {
        assert_eq!(EventKind::from_handler_name("onNOTICE"), Some(EventKind::Notice));
        assert_eq!(EventKind::from_handler_name("onnotice"), Some(EventKind::Notice));
        assert_eq!(EventKind::from_handler_name("onCtcpReq"), Some(EventKind::CtcpReq));
        assert_eq!(EventKind::from_handler_name("on_ctcp_req"), Some(EventKind::CtcpReq));
        assert_eq!(EventKind::from_handler_name("ctcp_req"), Some(EventKind::CtcpReq));
        assert_eq!(EventKind::from_handler_name("onDccSendReq"), Some(EventKind::DccSendReq));
        assert_eq!(EventKind::from_handler_name("onerror"), None);
    }

    #[test]
    fn lookup_by_engine_name() {
        assert_eq!(EventKind::from_engine_name("JOIN"), Some(EventKind::Join));
        assert_eq!(EventKind::from_engine_name("ctcp_action"), Some(EventKind::CtcpAction));
        assert_eq!(EventKind::from_engine_name("PONG"), None);
    }

    #[test]
    fn only_callback_specific_kinds_are_unnamed() {
        let unnamed: Vec<_> = EventKind::ALL.into_iter().filter(|k| !k.is_named()).collect();
        assert_eq!(
            unnamed,
            [EventKind::Numeric, EventKind::DccChatReq, EventKind::DccSendReq]
        );
    }

    #[test]
    fn envelope_accessors() {
        let params = ["#rust", "hello"];
        let env = Envelope::Message(Message {
            kind: EventKind::Channel,
            event: "CHANNEL",
            origin: Some("alice!al@example.org"),
            params: &params,
        });
        assert_eq!(env.kind(), EventKind::Channel);
        assert_eq!(env.nick(), Some("alice"));
        assert_eq!(env.param(1), Some("hello"));
        assert_eq!(env.param(2), None);
        assert_eq!(env.code(), None);

        let env = Envelope::DccSend(DccSendRequest {
            nick: "bob",
            remote_addr: "10.0.0.2",
            filename: "notes.txt",
            filesize: 42,
            dcc_id: 7,
        });
        assert_eq!(env.kind(), EventKind::DccSendReq);
        assert_eq!(env.nick(), Some("bob"));
        assert!(env.params().is_empty());
        assert_eq!(env.origin(), None);
    }
}
