//! Descriptor sets and their conversion to `fd_set`.

#![allow(unsafe_code)]

use std::collections::BTreeSet;
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::RawFd;

const FD_SETSIZE: usize = libc::FD_SETSIZE as usize;

/// An ordered set of file descriptors.
///
/// Kept sorted so the highest descriptor, which `select(2)` needs, is
/// always at hand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptorSet {
    fds: BTreeSet<RawFd>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Negative descriptors are ignored.
    pub fn insert(&mut self, fd: RawFd) -> bool {
        fd >= 0 && self.fds.insert(fd)
    }

    pub fn remove(&mut self, fd: RawFd) -> bool {
        self.fds.remove(&fd)
    }

    pub fn contains(&self, fd: RawFd) -> bool {
        self.fds.contains(&fd)
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fds.len()
    }

    pub fn clear(&mut self) {
        self.fds.clear();
    }

    /// The highest descriptor in the set.
    pub fn max(&self) -> Option<RawFd> {
        self.fds.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.fds.iter().copied()
    }

    /// Keep only the descriptors also present in `other`.
    pub fn retain_in(&mut self, other: &DescriptorSet) {
        self.fds.retain(|fd| other.contains(*fd));
    }

    /// Build a `libc::fd_set` holding the same descriptors.
    ///
    /// Fails with `InvalidInput` for descriptors `select(2)` cannot
    /// represent.
    pub fn to_fd_set(&self) -> io::Result<libc::fd_set> {
        let mut raw = empty_fd_set();
        for fd in self.iter() {
            if fd as usize >= FD_SETSIZE {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("descriptor {fd} exceeds FD_SETSIZE"),
                ));
            }
            // SAFETY: fd is in 0..FD_SETSIZE and raw is initialized.
            unsafe { libc::FD_SET(fd, &mut raw) };
        }
        Ok(raw)
    }

    /// Collect the descriptors set in `raw`, scanning up to `max_fd`.
    pub fn from_fd_set(raw: &libc::fd_set, max_fd: RawFd) -> Self {
        let limit = (max_fd.max(-1) + 1).min(FD_SETSIZE as RawFd);
        let mut set = Self::new();
        for fd in 0..limit {
            // SAFETY: fd is in 0..FD_SETSIZE.
            if unsafe { libc::FD_ISSET(fd, raw) } {
                set.insert(fd);
            }
        }
        set
    }
}

impl Extend<RawFd> for DescriptorSet {
    fn extend<I: IntoIterator<Item = RawFd>>(&mut self, iter: I) {
        for fd in iter {
            self.insert(fd);
        }
    }
}

impl FromIterator<RawFd> for DescriptorSet {
    fn from_iter<I: IntoIterator<Item = RawFd>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// A zeroed `fd_set`.
pub(crate) fn empty_fd_set() -> libc::fd_set {
    let mut raw = MaybeUninit::<libc::fd_set>::uninit();
    // SAFETY: FD_ZERO initializes the whole set.
    unsafe {
        libc::FD_ZERO(raw.as_mut_ptr());
        raw.assume_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_maximum() {
        let set: DescriptorSet = [7, 3, 11].into_iter().collect();
        assert_eq!(set.max(), Some(11));
        assert_eq!(set.len(), 3);
        assert_eq!(DescriptorSet::new().max(), None);
    }

    #[test]
    fn ignores_negative_descriptors() {
        let mut set = DescriptorSet::new();
        assert!(!set.insert(-1));
        assert!(set.is_empty());
    }

    #[test]
    fn fd_set_round_trip() {
        let set: DescriptorSet = [0, 4, 9].into_iter().collect();
        let raw = set.to_fd_set().unwrap();
        assert_eq!(DescriptorSet::from_fd_set(&raw, 9), set);
        // scanning stops at max_fd
        let partial = DescriptorSet::from_fd_set(&raw, 4);
        assert_eq!(partial.iter().collect::<Vec<_>>(), [0, 4]);
    }

    #[test]
    fn rejects_descriptor_beyond_fd_setsize() {
        let set: DescriptorSet = [FD_SETSIZE as RawFd].into_iter().collect();
        let err = set.to_fd_set().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn retain_in_intersects() {
        let mut set: DescriptorSet = [1, 2, 3].into_iter().collect();
        let other: DescriptorSet = [2, 3, 4].into_iter().collect();
        set.retain_in(&other);
        assert_eq!(set.iter().collect::<Vec<_>>(), [2, 3]);
    }
}
