//! Engine option bits.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of engine option bits.
///
/// The values match the engine's own option constants, so bits are
/// forwarded unchanged.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Options(u32);

impl Options {
    /// Engine debug output, and `debug`-level tracing of every dispatched
    /// event.
    pub const DEBUG: Self = Self(1 << 1);
    /// Strip `!user@host` from origins before they reach handlers.
    pub const STRIP_NICKS: Self = Self(1 << 2);
    /// Accept TLS certificates that fail verification.
    pub const SSL_NO_VERIFY: Self = Self(1 << 3);

    const NAMED: [(Self, &'static str); 3] = [
        (Self::DEBUG, "DEBUG"),
        (Self::STRIP_NICKS, "STRIP_NICKS"),
        (Self::SSL_NO_VERIFY, "SSL_NO_VERIFY"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Keep any bit, including ones without a named constant.
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Each set bit on its own, lowest first.
    pub fn iter_bits(self) -> impl Iterator<Item = u32> {
        (0..u32::BITS)
            .map(|shift| 1u32 << shift)
            .filter(move |bit| self.0 & bit != 0)
    }
}

impl BitOr for Options {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        let mut rest = self.0;
        for (flag, name) in Self::NAMED {
            if self.contains(flag) {
                names.push(name.to_string());
                rest &= !flag.0;
            }
        }
        if rest != 0 {
            names.push(format!("{rest:#x}"));
        }
        write!(f, "Options({})", names.join(" | "))
    }
}
