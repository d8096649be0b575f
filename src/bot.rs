//! A channel-keeping bot built on [`Session`].
//!
//! The bot joins its configured channels once registered and gives `+o` to
//! users whose mask matches a channel's `oper` pattern. Users already in a
//! channel are checked when the bot itself gains `+o`: it lists the channel
//! with NAMES and queues one WHOIS per user, issued one at a time from
//! [`Bot::work`] so the server's flood limits are respected. `ERROR` lines
//! from the server are logged and kept for [`Bot::server_error`].

use crate::config::{Config, ValidationError, validate};
use crate::engine::Engine;
use crate::error::ProtocolError;
use crate::event::{Envelope, EventKind};
use crate::numeric::{self, RPL_ENDOFNAMES, RPL_NAMREPLY, RPL_WHOISUSER};
use crate::session::{Commands, Session};
use regex::Regex;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Prefix characters servers put in front of nicks in NAMES replies.
const NAMES_PREFIXES: &[char] = &['@', '+', '%', '&', '~'];

/// The configuration was rejected.
#[derive(Debug, Error)]
#[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct InvalidConfig(pub Vec<ValidationError>);

/// Queued follow-up commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Work {
    Whois(String),
}

/// The bot. Clones share state.
#[derive(Clone)]
pub struct Bot {
    state: Rc<RefCell<BotState>>,
}

struct BotState {
    config: Config,
    opers: HashMap<String, Regex>,
    connected: bool,
    joined: Vec<String>,
    names: HashMap<String, Vec<String>>,
    work: VecDeque<Work>,
    /// Lower-cased nick to the channels it was listed in.
    pending: HashMap<String, Vec<String>>,
    server_error: Option<String>,
}

impl Bot {
    pub fn new(config: Config) -> Result<Self, InvalidConfig> {
        let opers = compile_opers(&config)?;
        Ok(Self {
            state: Rc::new(RefCell::new(BotState {
                config,
                opers,
                connected: false,
                joined: Vec::new(),
                names: HashMap::new(),
                work: VecDeque::new(),
                pending: HashMap::new(),
                server_error: None,
            })),
        })
    }

    /// Bind the bot's handlers on `session`.
    pub fn install<E: Engine>(&self, session: &mut Session<E>) {
        let state = self.state.clone();
        session.on(EventKind::Connect, move |ctx, event| {
            let mut state = state.borrow_mut();
            state.connected = true;
            info!(
                server = event.origin(),
                nick = event.param(0),
                "Connected"
            );
            state.sync_channels(ctx)?;
            Ok(())
        });

        let state = self.state.clone();
        session.on(EventKind::Join, move |ctx, event| {
            let mut state = state.borrow_mut();
            let (Some(channel), Some(nick)) = (event.param(0), sender(event)) else {
                return Ok(());
            };
            if state.is_me(nick) {
                info!(channel, "Joined");
                if !state.joined.iter().any(|c| c.eq_ignore_ascii_case(channel)) {
                    state.joined.push(channel.to_string());
                }
            } else if let Some(origin) = event.origin() {
                debug!(origin, channel, "User joined");
                state.op(ctx, channel, nick, origin)?;
            }
            Ok(())
        });

        let state = self.state.clone();
        session.on(EventKind::Part, move |_ctx, event| {
            let mut state = state.borrow_mut();
            if let (Some(channel), Some(nick)) = (event.param(0), sender(event))
                && state.is_me(nick)
            {
                info!(channel, "Left");
                state.joined.retain(|c| !c.eq_ignore_ascii_case(channel));
            }
            Ok(())
        });

        let state = self.state.clone();
        session.on(EventKind::Mode, move |ctx, event| {
            let state = state.borrow();
            let params = event.params();
            if let [channel, "+o", targets @ ..] = params
                && targets.iter().any(|nick| state.is_me(nick))
            {
                info!(channel, "Got +o");
                ctx.names(channel)?;
            }
            Ok(())
        });

        let state = self.state.clone();
        session.on(EventKind::Unknown, move |_ctx, event| {
            if let Envelope::Message(msg) = event
                && msg.event.eq_ignore_ascii_case("ERROR")
            {
                let reason = msg.params.join(" ");
                warn!(origin = msg.origin, reason = %reason, "Server error");
                state.borrow_mut().server_error = Some(reason);
            }
            Ok(())
        });

        let state = self.state.clone();
        session.on(EventKind::Numeric, move |ctx, event| {
            let Some(code) = event.code() else {
                return Ok(());
            };
            debug!(
                origin = event.origin(),
                code,
                name = numeric::name(code),
                params = ?event.params(),
                "Numeric"
            );
            state.borrow_mut().numeric(ctx, code, event.params())?;
            Ok(())
        });
    }

    /// Issue the next queued command, if any. Returns `true` if one was
    /// sent.
    pub fn work(&self, commands: &mut dyn Commands) -> Result<bool, ProtocolError> {
        let next = self.state.borrow_mut().work.pop_front();
        match next {
            Some(Work::Whois(nick)) => {
                debug!(nick = %nick, remaining = self.pending_work(), "Working queue");
                commands.whois(&nick)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply a new configuration. Once connected, joins channels that were
    /// added and parts channels that were removed.
    pub fn reload(&self, config: Config, commands: &mut dyn Commands) -> Result<(), anyhow::Error> {
        let opers = compile_opers(&config)?;
        let mut state = self.state.borrow_mut();
        state.config = config;
        state.opers = opers;
        info!(channels = state.config.channels.len(), "Configuration reloaded");
        if state.connected {
            state.sync_channels(commands)?;
        }
        Ok(())
    }

    /// Request NAMES for every joined channel.
    pub fn update(&self, commands: &mut dyn Commands) -> Result<(), ProtocolError> {
        let joined = self.joined();
        for channel in &joined {
            commands.names(channel)?;
        }
        Ok(())
    }

    /// Forget the connection; called when the session goes away.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.joined.clear();
        state.names.clear();
        state.work.clear();
        state.pending.clear();
        state.server_error = None;
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    pub fn joined(&self) -> Vec<String> {
        self.state.borrow().joined.clone()
    }

    /// The reason given by the last `ERROR` line from the server.
    pub fn server_error(&self) -> Option<String> {
        self.state.borrow().server_error.clone()
    }

    pub fn pending_work(&self) -> usize {
        self.state.borrow().work.len()
    }

    pub fn config(&self) -> Config {
        self.state.borrow().config.clone()
    }
}

impl BotState {
    fn is_me(&self, nick: &str) -> bool {
        nick.eq_ignore_ascii_case(&self.config.identity.nick)
    }

    fn sync_channels(&mut self, commands: &mut dyn Commands) -> Result<(), ProtocolError> {
        for channel in &self.config.channels {
            info!(channel = %channel.name, "Joining");
            commands.join(&channel.name, channel.join_key())?;
        }
        let stale: Vec<String> = self
            .joined
            .iter()
            .filter(|c| self.config.channel(c).is_none())
            .cloned()
            .collect();
        for channel in stale {
            info!(channel = %channel, "Leaving");
            commands.part(&channel)?;
        }
        Ok(())
    }

    /// Give `nick` `+o` on `channel` if `origin` matches the channel's
    /// pattern.
    fn op(&self, commands: &mut dyn Commands, channel: &str, nick: &str, origin: &str) -> Result<(), ProtocolError> {
        let Some(pattern) = self.opers.get(&channel.to_ascii_lowercase()) else {
            return Ok(());
        };
        if pattern.is_match(origin) {
            info!(channel, nick, "Set +o");
            let mode = format!("+o {nick}");
            commands.channel_mode(channel, Some(mode.as_str()))?;
        }
        Ok(())
    }

    fn numeric(&mut self, commands: &mut dyn Commands, code: u32, params: &[&str]) -> Result<(), ProtocolError> {
        match (code, params) {
            (RPL_NAMREPLY, [_, _, channel, names, ..]) => {
                let listed = names
                    .split_whitespace()
                    .map(|nick| nick.trim_start_matches(NAMES_PREFIXES))
                    .filter(|nick| !nick.is_empty())
                    .map(str::to_string);
                self.names
                    .entry(channel.to_ascii_lowercase())
                    .or_default()
                    .extend(listed);
            }
            (RPL_ENDOFNAMES, [_, channel, ..]) => {
                let listed = self.names.remove(&channel.to_ascii_lowercase()).unwrap_or_default();
                for nick in listed {
                    if self.is_me(&nick) {
                        continue;
                    }
                    let channels = self.pending.entry(nick.to_ascii_lowercase()).or_default();
                    if !channels.iter().any(|c| c.eq_ignore_ascii_case(channel)) {
                        channels.push(channel.to_string());
                    }
                    let work = Work::Whois(nick);
                    if !self.work.contains(&work) {
                        debug!(?work, "Adding work");
                        self.work.push_back(work);
                    }
                }
            }
            (RPL_WHOISUSER, [_, nick, user, host, ..]) => {
                let origin = format!("{nick}!{user}@{host}");
                let channels = self.pending.remove(&nick.to_ascii_lowercase()).unwrap_or_default();
                for channel in channels {
                    self.op(commands, &channel, nick, &origin)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Nick of whoever caused `event`. With `STRIP_NICKS` the origin is the
/// bare nick.
fn sender<'a>(event: &Envelope<'a>) -> Option<&'a str> {
    event.nick().or_else(|| event.origin().filter(|o| !o.contains(['!', '@'])))
}

fn compile_opers(config: &Config) -> Result<HashMap<String, Regex>, InvalidConfig> {
    validate(config).map_err(InvalidConfig)?;
    let mut opers = HashMap::new();
    for channel in &config.channels {
        if let Some(pattern) = &channel.oper {
            let regex = Regex::new(pattern).map_err(|error| {
                InvalidConfig(vec![ValidationError::InvalidOperPattern {
                    channel: channel.name.clone(),
                    error,
                }])
            })?;
            opers.insert(channel.name.to_ascii_lowercase(), regex);
        }
    }
    Ok(opers)
}
