//! The blocking wait primitive.

#![allow(unsafe_code)]

use super::fdset::DescriptorSet;
use std::io;
use std::ptr;
use std::time::Duration;

/// Blocks until one of the descriptors is ready or the timeout expires.
///
/// On success both sets are narrowed to the ready descriptors and the
/// number of ready descriptors is returned. A wait cut short by a signal
/// must fail with [`io::ErrorKind::Interrupted`].
pub trait Waiter {
    fn wait(
        &mut self,
        read: &mut DescriptorSet,
        write: &mut DescriptorSet,
        timeout: Option<Duration>,
    ) -> io::Result<usize>;
}

/// `select(2)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Select;

impl Waiter for Select {
    fn wait(
        &mut self,
        read: &mut DescriptorSet,
        write: &mut DescriptorSet,
        timeout: Option<Duration>,
    ) -> io::Result<usize> {
        let max_fd = read.max().max(write.max()).unwrap_or(-1);
        let mut read_raw = read.to_fd_set()?;
        let mut write_raw = write.to_fd_set()?;
        let mut tv = timeout.map(to_timeval);
        let tv_ptr = tv
            .as_mut()
            .map_or(ptr::null_mut(), |tv| tv as *mut libc::timeval);

        // SAFETY: both fd_sets are initialized and only hold descriptors
        // below FD_SETSIZE; tv_ptr is null or points at a live timeval.
        let rc = unsafe {
            libc::select(
                max_fd + 1,
                &mut read_raw,
                &mut write_raw,
                ptr::null_mut(),
                tv_ptr,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        *read = DescriptorSet::from_fd_set(&read_raw, max_fd);
        *write = DescriptorSet::from_fd_set(&write_raw, max_fd);
        Ok(rc as usize)
    }
}

fn to_timeval(timeout: Duration) -> libc::timeval {
    libc::timeval {
        tv_sec: timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_usec: timeout.subsec_micros() as libc::suseconds_t,
    }
}
