//! slirc-client - Straylight IRC client sessions
//!
//! Drives an IRC client engine from the host's own event loop. The engine
//! speaks the protocol; this crate gives it a typed command surface, turns
//! its callbacks into per-event handler dispatch, and folds its sockets
//! into a single [`Session::step`] wait alongside the host's descriptors.
//!
//! ```no_run
//! # #[cfg(feature = "libircclient")]
//! # fn main() -> anyhow::Result<()> {
//! use slirc_client::engine::native::NativeEngine;
//! use slirc_client::{Commands, EventKind, Identity, Interest, Session, Target};
//! use std::time::Duration;
//!
//! let mut session = Session::with_identity(NativeEngine::new()?, Identity::new("slirc"));
//! session.on(EventKind::Connect, |ctx, _| {
//!     ctx.join("#rust", None)?;
//!     Ok(())
//! });
//! session.connect(&Target::new("irc.example.net"))?;
//! while session.is_connected() {
//!     session.step(&Interest::new(), Some(Duration::from_secs(1)))?;
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "libircclient"))]
//! # fn main() {}
//! ```

pub mod bot;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod handlers;
pub mod mux;
pub mod numeric;
pub mod origin;
pub mod session;

pub use config::Config;
pub use engine::{Callbacks, Command, ConnectRequest, Engine};
pub use error::{EngineError, HandlerResult, ProtocolError, SessionError};
pub use event::{Envelope, EventKind, handler_name};
pub use handlers::{Context, Handler, HandlerCache, HandlerRef, HandlerSource, HandlerTable};
pub use mux::{DescriptorSet, Interest, Ready, Select, Waiter};
pub use origin::{Origin, parse_origin};
pub use session::{Commands, DEFAULT_PORT, Identity, Options, Session, Target};
