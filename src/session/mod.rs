//! The session facade.
//!
//! A [`Session`] owns one engine together with everything needed to drive
//! it: the client identity, the option bits, the handler cache and the
//! descriptor wait primitive. Commands come from the [`Commands`] trait;
//! events reach the host through handlers bound with [`Session::on`] and
//! friends, dispatched from inside [`Session::step`].

mod commands;
mod options;

pub use commands::Commands;
pub(crate) use commands::sealed::EngineHandle;
pub use options::Options;

use crate::engine::{ConnectRequest, Engine};
use crate::error::{HandlerResult, ProtocolError};
use crate::event::{Envelope, EventKind};
use crate::handlers::{Context, Handler, HandlerCache, HandlerRef, HandlerSource, handler_ref};
use crate::mux::{Select, Waiter};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Port used when a [`Target`] does not name one.
pub const DEFAULT_PORT: u16 = 6667;

/// Who the client registers as.
///
/// Unset or empty fields are passed to the engine as absent and the engine
/// picks its own defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub nick: Option<String>,
    pub user: Option<String>,
    pub real: Option<String>,
}

impl Identity {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: Some(nick.into()),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_real(mut self, real: impl Into<String>) -> Self {
        self.real = Some(real.into());
        self
    }
}

/// The server to connect to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub ipv6: bool,
}

impl Target {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            password: None,
            ipv6: false,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn ipv6(mut self, ipv6: bool) -> Self {
        self.ipv6 = ipv6;
        self
    }
}

/// An IRC client session over engine `E`.
///
/// The session is single-threaded: handlers are shared through `Rc`, so a
/// `Session` is neither `Send` nor `Sync`.
pub struct Session<E: Engine> {
    pub(crate) engine: E,
    identity: Identity,
    pub(crate) options: Options,
    pub(crate) handlers: HandlerCache,
    pub(crate) waiter: Box<dyn Waiter>,
    connected_once: bool,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self::with_identity(engine, Identity::default())
    }

    pub fn with_identity(engine: E, identity: Identity) -> Self {
        Self {
            engine,
            identity,
            options: Options::empty(),
            handlers: HandlerCache::new(),
            waiter: Box::new(Select),
            connected_once: false,
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Replace the identity. After the first successful connect this only
    /// affects later connects.
    pub fn set_identity(&mut self, identity: Identity) {
        self.note_identity_change();
        self.identity = identity;
    }

    pub fn set_nick(&mut self, nick: impl Into<String>) {
        self.note_identity_change();
        self.identity.nick = Some(nick.into());
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.note_identity_change();
        self.identity.user = Some(user.into());
    }

    pub fn set_real(&mut self, real: impl Into<String>) {
        self.note_identity_change();
        self.identity.real = Some(real.into());
    }

    fn note_identity_change(&self) {
        if self.connected_once {
            debug!("Identity changed after connect; applies to the next connect only");
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start connecting to `target` with the current identity.
    pub fn connect(&mut self, target: &Target) -> Result<(), ProtocolError> {
        if target.host.is_empty() {
            return Err(ProtocolError::MissingArgument {
                command: "CONNECT",
                argument: "host",
            });
        }

        let identity = self.identity.clone();
        let request = ConnectRequest {
            host: &target.host,
            port: target.port,
            password: non_empty(target.password.as_deref()),
            ipv6: target.ipv6,
            nick: non_empty(identity.nick.as_deref()),
            user: non_empty(identity.user.as_deref()),
            real: non_empty(identity.real.as_deref()),
        };

        match self.engine.connect(&request) {
            Ok(()) => {
                debug!(host = %target.host, port = target.port, ipv6 = target.ipv6, "Connecting");
                self.connected_once = true;
                Ok(())
            }
            Err(err) => {
                debug!(host = %target.host, code = err.code, error = %err, "Connect failed");
                Err(ProtocolError::Engine(err))
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.engine.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Set or clear option bits, forwarding each bit to the engine.
    pub fn set_option(&mut self, option: Options, enabled: bool) {
        self.options.set(option, enabled);
        for bit in option.iter_bits() {
            self.engine.set_option(bit, enabled);
        }
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    /// Bind a closure to `kind`. Returns the shared handler so the host can
    /// bind it elsewhere too.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerRef
    where
        F: FnMut(&mut Context<'_>, &Envelope<'_>) -> HandlerResult + 'static,
    {
        let handler: HandlerRef = Rc::new(RefCell::new(handler));
        self.handlers.bind(kind, handler.clone());
        handler
    }

    /// Bind a closure by handler name (`"onjoin"`, `"onNOTICE"`, `"ctcp_req"`).
    pub fn on_named<F>(&mut self, name: &str, handler: F) -> Result<HandlerRef, ProtocolError>
    where
        F: FnMut(&mut Context<'_>, &Envelope<'_>) -> HandlerResult + 'static,
    {
        let kind = EventKind::from_handler_name(name)
            .ok_or_else(|| ProtocolError::UnknownHandler(name.to_string()))?;
        Ok(self.on(kind, handler))
    }

    /// Bind a [`Handler`] value to `kind`.
    pub fn bind(&mut self, kind: EventKind, handler: impl Handler + 'static) -> HandlerRef {
        let handler = handler_ref(handler);
        self.handlers.bind(kind, handler.clone());
        handler
    }

    /// Bind an already shared handler to `kind`.
    pub fn bind_ref(&mut self, kind: EventKind, handler: HandlerRef) -> Option<HandlerRef> {
        self.handlers.bind(kind, handler)
    }

    /// Remove the binding for `kind`. Returns `true` if one existed.
    pub fn off(&mut self, kind: EventKind) -> bool {
        self.handlers.unbind(kind).is_some()
    }

    /// Install a host lookup for kinds without an explicit binding.
    pub fn set_handler_source(&mut self, source: impl HandlerSource + 'static) {
        self.handlers.set_source(Box::new(source));
    }

    pub fn handlers(&self) -> &HandlerCache {
        &self.handlers
    }

    // ------------------------------------------------------------------
    // Engine and wait primitive
    // ------------------------------------------------------------------

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Replace the descriptor wait primitive used by [`Session::step`].
    pub fn set_waiter(&mut self, waiter: impl Waiter + 'static) {
        self.waiter = Box::new(waiter);
    }
}

impl<E: Engine> EngineHandle for Session<E> {
    fn engine_handle(&mut self) -> &mut dyn Engine {
        &mut self.engine
    }
}

impl<E: Engine> Commands for Session<E> {}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        self.handlers.clear();
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
