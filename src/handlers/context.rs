//! The value a handler receives alongside its event.

use crate::engine::Engine;
use crate::session::{Commands, EngineHandle, Options};

/// Reentrant access to the session while an event is being dispatched.
///
/// Commands issued through a `Context` reach the engine before the handler
/// returns, in the order they were issued.
pub struct Context<'a> {
    engine: &'a mut dyn Engine,
    options: Options,
}

impl<'a> Context<'a> {
    pub(crate) fn new(engine: &'a mut dyn Engine, options: Options) -> Self {
        Self { engine, options }
    }

    /// Option bits of the owning session.
    pub fn options(&self) -> Options {
        self.options
    }

    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    pub fn disconnect(&mut self) {
        self.engine.disconnect();
    }
}

impl EngineHandle for Context<'_> {
    fn engine_handle(&mut self) -> &mut dyn Engine {
        &mut *self.engine
    }
}

impl Commands for Context<'_> {}
