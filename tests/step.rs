//! Integration tests for `Session::step`: waiting on engine and caller
//! descriptors together.

mod common;

use common::{Scripted, ScriptedEngine};
use slirc_client::{EngineError, EventKind, Interest, Session, SessionError};
use std::cell::Cell;
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[test]
fn test_disconnected_engine_without_interest_returns_at_once() {
    let mut session = Session::new(ScriptedEngine::new());
    let started = Instant::now();
    let ready = session.step(&Interest::new(), None).unwrap();
    assert!(ready.is_empty());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.engine().passes, 0);
}

#[test]
fn test_idle_engine_times_out() {
    let mut session = Session::new(ScriptedEngine::connected());
    let ready = session
        .step(&Interest::new(), Some(Duration::from_millis(20)))
        .unwrap();
    assert!(ready.is_empty());
    // The engine is still handed the (empty) ready sets.
    assert_eq!(session.engine().passes, 1);
}

#[test]
fn test_caller_and_engine_ready_together() {
    let (mine, mut peer) = UnixStream::pair().unwrap();
    let (quiet, _quiet_peer) = UnixStream::pair().unwrap();
    peer.write_all(b"input\n").unwrap();

    let mut session = Session::new(ScriptedEngine::connected());
    let joins = Rc::new(Cell::new(0));
    let count = joins.clone();
    session.on(EventKind::Join, move |_ctx, _event| {
        count.set(count.get() + 1);
        Ok(())
    });
    session
        .engine_mut()
        .push(Scripted::event(EventKind::Join, "a!b@c", &["#x"]));

    let interest = Interest::new().read(&quiet).read(&mine).write(&peer);
    let ready = session
        .step(&interest, Some(Duration::from_secs(1)))
        .unwrap();

    assert_eq!(joins.get(), 1);
    assert_eq!(ready.read, [mine.as_raw_fd()]);
    assert_eq!(ready.write, [peer.as_raw_fd()]);
    // The engine's own descriptor never shows up in the caller's result.
    let engine_fd = session.engine().fd();
    assert!(!ready.read.contains(&engine_fd));
}

#[test]
fn test_engine_descriptors_skipped_after_disconnect() {
    let mut session = Session::new(ScriptedEngine::connected());
    session.engine_mut().push(Scripted::Close);
    session
        .step(&Interest::new(), Some(Duration::from_secs(1)))
        .unwrap();
    assert!(!session.is_connected());

    // Nothing left to wait on.
    let started = Instant::now();
    let ready = session.step(&Interest::new(), None).unwrap();
    assert!(ready.is_empty());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.engine().passes, 1);
}

struct BrokenDescriptors;

impl slirc_client::Engine for BrokenDescriptors {
    fn connect(&mut self, _request: &slirc_client::ConnectRequest<'_>) -> Result<(), EngineError> {
        Ok(())
    }
    fn disconnect(&mut self) {}
    fn is_connected(&self) -> bool {
        true
    }
    fn set_option(&mut self, _option: u32, _enabled: bool) {}
    fn send(&mut self, _command: &slirc_client::Command<'_>) -> Result<(), EngineError> {
        Ok(())
    }
    fn want_descriptors(
        &mut self,
        _read: &mut slirc_client::DescriptorSet,
        _write: &mut slirc_client::DescriptorSet,
    ) -> Result<(), EngineError> {
        Err(EngineError::new(12, "Invalid state"))
    }
    fn process_ready_descriptors(
        &mut self,
        _read: &slirc_client::DescriptorSet,
        _write: &slirc_client::DescriptorSet,
        _callbacks: &mut dyn slirc_client::Callbacks,
    ) -> Result<(), EngineError> {
        Ok(())
    }
}

#[test]
fn test_descriptor_collection_failure_is_reported() {
    let mut session = Session::new(BrokenDescriptors);
    let err = session.step(&Interest::new(), None).unwrap_err();
    assert!(matches!(err, SessionError::Protocol(_)));
    assert_eq!(err.to_string(), "Invalid state");
}

#[test]
fn test_descriptor_beyond_select_limit_is_a_wait_error() {
    let mut session = Session::new(ScriptedEngine::new());
    let mut interest = Interest::new();
    interest.add_read(1 << 20);

    let err = session.step(&interest, Some(Duration::ZERO)).unwrap_err();
    assert_eq!(err.error_code(), "wait");
}

#[test]
fn test_many_steps_drain_queued_events() {
    let mut session = Session::new(ScriptedEngine::connected());
    let seen = Rc::new(Cell::new(0));
    let count = seen.clone();
    session.on(EventKind::Privmsg, move |_ctx, _event| {
        count.set(count.get() + 1);
        Ok(())
    });

    for i in 0..5 {
        let text = format!("message {i}");
        session
            .engine_mut()
            .push(Scripted::event(EventKind::Privmsg, "a!b@c", &["me", &text]));
        session
            .step(&Interest::new(), Some(Duration::from_secs(1)))
            .unwrap();
    }
    assert_eq!(seen.get(), 5);

    // Nothing queued: a poll dispatches nothing more.
    session
        .step(&Interest::new(), Some(Duration::ZERO))
        .unwrap();
    assert_eq!(seen.get(), 5);
}
