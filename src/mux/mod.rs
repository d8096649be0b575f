//! I/O multiplexing: fold the engine's sockets into the host's wait.
//!
//! [`Session::step`] performs one iteration of the host's loop:
//!
//! 1. collect the engine's wanted descriptors (only while connected)
//! 2. union them with the caller's [`Interest`]
//! 3. wait once, bounded by the timeout
//! 4. let the engine process its ready descriptors, dispatching events
//! 5. return which of the caller's descriptors are ready
//!
//! An interrupted wait is an empty step, not an error.

mod fdset;
mod select;

pub use fdset::DescriptorSet;
#[cfg(feature = "libircclient")]
pub(crate) use fdset::empty_fd_set;
pub use select::{Select, Waiter};

use crate::engine::Engine;
use crate::error::{ProtocolError, SessionError};
use crate::handlers::dispatch::Dispatcher;
use crate::session::Session;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::trace;

/// Descriptors the caller wants to wait on alongside the engine.
///
/// Each descriptor is listed at most once per direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interest {
    read: Vec<RawFd>,
    write: Vec<RawFd>,
}

impl Interest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `source` to become readable.
    pub fn read(mut self, source: &impl AsRawFd) -> Self {
        self.add_read(source.as_raw_fd());
        self
    }

    /// Wait for `source` to become writable.
    pub fn write(mut self, source: &impl AsRawFd) -> Self {
        self.add_write(source.as_raw_fd());
        self
    }

    pub fn add_read(&mut self, fd: RawFd) {
        if !self.read.contains(&fd) {
            self.read.push(fd);
        }
    }

    pub fn add_write(&mut self, fd: RawFd) {
        if !self.write.contains(&fd) {
            self.write.push(fd);
        }
    }

    pub fn read_fds(&self) -> &[RawFd] {
        &self.read
    }

    pub fn write_fds(&self) -> &[RawFd] {
        &self.write
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty()
    }
}

/// The caller's descriptors found ready by one step, in the order they
/// were given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ready {
    pub read: Vec<RawFd>,
    pub write: Vec<RawFd>,
}

impl Ready {
    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty()
    }

    pub fn is_readable(&self, source: &impl AsRawFd) -> bool {
        self.read.contains(&source.as_raw_fd())
    }

    pub fn is_writable(&self, source: &impl AsRawFd) -> bool {
        self.write.contains(&source.as_raw_fd())
    }
}

impl<E: Engine> Session<E> {
    /// Wait once on the engine's sockets and the caller's `interest`, then
    /// dispatch whatever the engine parsed.
    ///
    /// `timeout` of `None` blocks; `Some(Duration::ZERO)` polls. Handlers
    /// run inside this call. If a handler fails, the rest of the events
    /// from this step are dropped and the failure is returned; it takes
    /// precedence over an engine error from the same step.
    pub fn step(&mut self, interest: &Interest, timeout: Option<Duration>) -> Result<Ready, SessionError> {
        let mut read = DescriptorSet::new();
        let mut write = DescriptorSet::new();

        let engine_active = self.engine.is_connected();
        if engine_active {
            self.engine.want_descriptors(&mut read, &mut write)?;
        }
        read.extend(interest.read.iter().copied());
        write.extend(interest.write.iter().copied());

        if read.is_empty() && write.is_empty() {
            trace!("Nothing to wait on");
            return Ok(Ready::default());
        }

        match self.waiter.wait(&mut read, &mut write, timeout) {
            Ok(count) => trace!(ready = count, "Wait finished"),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                trace!("Wait interrupted");
                return Ok(Ready::default());
            }
            Err(err) => return Err(ProtocolError::Wait(err).into()),
        }

        if engine_active {
            let mut dispatcher = Dispatcher::new(&mut self.handlers, self.options);
            let processed = self
                .engine
                .process_ready_descriptors(&read, &write, &mut dispatcher);
            let dispatched = dispatcher.finish()?;
            processed?;
            trace!(dispatched, "Engine processed ready descriptors");
        }

        Ok(Ready {
            read: ready_subset(&interest.read, &read),
            write: ready_subset(&interest.write, &write),
        })
    }
}

fn ready_subset(wanted: &[RawFd], ready: &DescriptorSet) -> Vec<RawFd> {
    wanted.iter().copied().filter(|fd| ready.contains(*fd)).collect()
}
