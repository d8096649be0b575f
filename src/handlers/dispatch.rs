//! Translates engine callbacks into handler dispatch.

use super::{Context, HandlerCache};
use crate::engine::{Callbacks, Engine};
use crate::error::SessionError;
use crate::event::{DccChatRequest, DccId, DccSendRequest, Envelope, EventKind, Message, Numeric};
use crate::session::Options;
use tracing::debug;

/// Dispatches the events of one engine processing pass.
///
/// After the first handler failure every later event of the pass is
/// skipped; [`Dispatcher::finish`] hands the failure back to the caller.
pub(crate) struct Dispatcher<'c> {
    cache: &'c mut HandlerCache,
    options: Options,
    dispatched: usize,
    failure: Option<SessionError>,
}

impl<'c> Dispatcher<'c> {
    pub(crate) fn new(cache: &'c mut HandlerCache, options: Options) -> Self {
        Self {
            cache,
            options,
            dispatched: 0,
            failure: None,
        }
    }

    fn dispatch(&mut self, engine: &mut dyn Engine, envelope: Envelope<'_>) {
        let kind = envelope.kind();
        let name = kind.handler_name();

        if self.failure.is_some() {
            debug!(handler = name, "Skipping event after handler failure");
            return;
        }

        let Some(handler) = self.cache.resolve(kind) else {
            return;
        };

        if self.options.contains(Options::DEBUG) {
            debug!(
                handler = name,
                origin = envelope.origin(),
                params = envelope.params().len(),
                "Dispatching event"
            );
        }

        let Ok(mut handler) = handler.try_borrow_mut() else {
            self.failure = Some(SessionError::Handler {
                handler: name,
                source: "handler re-entered while running".into(),
            });
            return;
        };

        self.dispatched += 1;
        let mut ctx = Context::new(engine, self.options);
        if let Err(err) = handler.handle(&mut ctx, &envelope) {
            debug!(handler = name, error = %err, "Handler failed");
            self.failure = Some(SessionError::Handler {
                handler: name,
                source: err.into(),
            });
        }
    }

    /// Number of handlers invoked so far, or the first handler failure.
    pub(crate) fn finish(self) -> Result<usize, SessionError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.dispatched),
        }
    }
}

impl Callbacks for Dispatcher<'_> {
    fn event(
        &mut self,
        engine: &mut dyn Engine,
        kind: EventKind,
        event: &str,
        origin: Option<&str>,
        params: &[&str],
    ) {
        self.dispatch(
            engine,
            Envelope::Message(Message {
                kind,
                event,
                origin,
                params,
            }),
        );
    }

    fn numeric(&mut self, engine: &mut dyn Engine, code: u32, origin: Option<&str>, params: &[&str]) {
        self.dispatch(
            engine,
            Envelope::Numeric(Numeric {
                code,
                origin,
                params,
            }),
        );
    }

    fn dcc_chat_request(&mut self, engine: &mut dyn Engine, nick: &str, remote_addr: &str, dcc_id: DccId) {
        self.dispatch(
            engine,
            Envelope::DccChat(DccChatRequest {
                nick,
                remote_addr,
                dcc_id,
            }),
        );
    }

    fn dcc_send_request(
        &mut self,
        engine: &mut dyn Engine,
        nick: &str,
        remote_addr: &str,
        filename: &str,
        filesize: u64,
        dcc_id: DccId,
    ) {
        self.dispatch(
            engine,
            Envelope::DccSend(DccSendRequest {
                nick,
                remote_addr,
                filename,
                filesize,
                dcc_id,
            }),
        );
    }
}
