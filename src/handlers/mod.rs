//! Host event handlers and their dispatch.
//!
//! A handler is anything implementing [`Handler`]; closures of the right
//! shape qualify through a blanket impl. Handlers are shared as
//! [`HandlerRef`] so one handler value can serve several events and stay
//! reachable from the host after it is bound.
//!
//! ## Dispatch flow
//!
//! ```text
//! Engine ──callback──► Dispatcher ──resolve──► HandlerCache
//!                          │                      │
//!                          └──── Envelope ──► Handler(Context)
//! ```

mod cache;
mod context;
pub(crate) mod dispatch;

pub use cache::{HandlerCache, HandlerSource, HandlerTable};
pub use context::Context;

use crate::error::HandlerResult;
use crate::event::Envelope;
use std::cell::RefCell;
use std::rc::Rc;

/// Handles one dispatched event.
pub trait Handler {
    fn handle(&mut self, ctx: &mut Context<'_>, event: &Envelope<'_>) -> HandlerResult;
}

impl<F> Handler for F
where
    F: FnMut(&mut Context<'_>, &Envelope<'_>) -> HandlerResult,
{
    fn handle(&mut self, ctx: &mut Context<'_>, event: &Envelope<'_>) -> HandlerResult {
        self(ctx, event)
    }
}

/// A shared, resolved handler.
pub type HandlerRef = Rc<RefCell<dyn Handler>>;

/// Wrap a handler for binding.
pub fn handler_ref(handler: impl Handler + 'static) -> HandlerRef {
    Rc::new(RefCell::new(handler))
}

/// Wrap a closure for binding. The explicit bound lets the compiler infer
/// the closure's argument types.
pub fn handler_fn<F>(handler: F) -> HandlerRef
where
    F: FnMut(&mut Context<'_>, &Envelope<'_>) -> HandlerResult + 'static,
{
    Rc::new(RefCell::new(handler))
}
