//! The IRC engine interface.
//!
//! The engine owns the connection: it frames and parses protocol lines,
//! encodes commands and tracks registration state. A [`Session`] drives it
//! through the [`Engine`] trait and receives events through the
//! [`Callbacks`] it passes into [`Engine::process_ready_descriptors`].
//!
//! ## Callback contract
//!
//! - Callbacks fire only from inside `process_ready_descriptors`, in the
//!   order the engine parsed the events.
//! - Each callback receives the engine itself as `&mut dyn Engine`, so a
//!   handler can issue commands while its event is being dispatched.
//! - Callbacks return nothing. The callbacks object decides on its own
//!   whether later events are still delivered after a failure.
//!
//! [`Session`]: crate::Session

mod command;
#[cfg(feature = "libircclient")]
pub mod native;

pub use command::Command;

use crate::error::EngineError;
use crate::event::{DccId, EventKind};
use crate::mux::DescriptorSet;

/// Everything the engine needs to open a connection.
///
/// Identity fields are `None` when the session has no value for them; the
/// engine applies its own defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectRequest<'a> {
    pub host: &'a str,
    pub port: u16,
    pub password: Option<&'a str>,
    pub ipv6: bool,
    pub nick: Option<&'a str>,
    pub user: Option<&'a str>,
    pub real: Option<&'a str>,
}

/// An IRC client engine.
pub trait Engine {
    /// Start connecting. The engine finishes the handshake while processing
    /// descriptors and reports [`EventKind::Connect`] once registered.
    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), EngineError>;

    fn disconnect(&mut self);

    /// `true` while connecting or connected.
    fn is_connected(&self) -> bool;

    /// Set or clear one engine option bit.
    fn set_option(&mut self, option: u32, enabled: bool);

    fn send(&mut self, command: &Command<'_>) -> Result<(), EngineError>;

    /// Add the descriptors the engine wants to wait on.
    fn want_descriptors(
        &mut self,
        read: &mut DescriptorSet,
        write: &mut DescriptorSet,
    ) -> Result<(), EngineError>;

    /// Handle the ready descriptors, invoking `callbacks` for every event
    /// parsed along the way.
    fn process_ready_descriptors(
        &mut self,
        read: &DescriptorSet,
        write: &DescriptorSet,
        callbacks: &mut dyn Callbacks,
    ) -> Result<(), EngineError>;
}

/// The fixed callback table an engine reports events through.
pub trait Callbacks {
    /// A named event. `event` is the engine's identifier for it; for
    /// [`EventKind::Unknown`] it is the raw command.
    fn event(
        &mut self,
        engine: &mut dyn Engine,
        kind: EventKind,
        event: &str,
        origin: Option<&str>,
        params: &[&str],
    );

    fn numeric(&mut self, engine: &mut dyn Engine, code: u32, origin: Option<&str>, params: &[&str]);

    fn dcc_chat_request(&mut self, engine: &mut dyn Engine, nick: &str, remote_addr: &str, dcc_id: DccId);

    fn dcc_send_request(
        &mut self,
        engine: &mut dyn Engine,
        nick: &str,
        remote_addr: &str,
        filename: &str,
        filesize: u64,
        dcc_id: DccId,
    );
}
