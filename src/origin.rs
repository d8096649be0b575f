//! IRC origin parsing.
//!
//! The origin of an event is the message prefix, usually a user mask of the
//! form `nick!user@host`, sometimes a bare server name. Servers and bouncers
//! also send the partial forms `user@host` and `nick!user`.
//!
//! # Example
//!
//! ```
//! use slirc_client::parse_origin;
//!
//! let origin = parse_origin("alice!~al@example.org");
//! assert_eq!(origin.nick, Some("alice"));
//! assert_eq!(origin.user, Some("~al"));
//! assert_eq!(origin.host, Some("example.org"));
//! ```

use std::fmt;

/// The components of an origin string.
///
/// Every field is `None` unless the corresponding segment is present and
/// non-empty in the parsed string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Origin<'a> {
    /// Nickname, the segment before `!`.
    pub nick: Option<&'a str>,
    /// Username, the segment between `!` and `@`.
    pub user: Option<&'a str>,
    /// Hostname, or the whole string when it has no separators.
    pub host: Option<&'a str>,
}

impl<'a> Origin<'a> {
    /// Split an origin string into its components.
    ///
    /// Separators are evaluated left to right and never reset: once a `!`
    /// has assigned the nick, only an `@` can end the user segment, and once
    /// an `@` has been seen everything after it belongs to the host.
    pub fn parse(origin: &'a str) -> Self {
        let Some(pos) = origin.find(['!', '@']) else {
            return Self {
                host: segment(origin),
                ..Self::default()
            };
        };

        let (head, tail) = (&origin[..pos], &origin[pos + 1..]);
        if origin.as_bytes()[pos] == b'@' {
            return Self {
                nick: None,
                user: segment(head),
                host: segment(tail),
            };
        }

        match tail.split_once('@') {
            Some((user, host)) => Self {
                nick: segment(head),
                user: segment(user),
                host: segment(host),
            },
            None => Self {
                nick: segment(head),
                user: segment(tail),
                host: None,
            },
        }
    }

    /// Returns `true` if no component was found.
    pub fn is_empty(&self) -> bool {
        self.nick.is_none() && self.user.is_none() && self.host.is_none()
    }
}

/// Writes the origin back in a form that parses to the same parts.
impl fmt::Display for Origin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(nick) = self.nick {
            write!(f, "{nick}!")?;
        }
        match self.user {
            Some(user) => {
                f.write_str(user)?;
                if self.host.is_some() || self.nick.is_none() {
                    f.write_str("@")?;
                }
            }
            None if self.nick.is_some() && self.host.is_some() => f.write_str("@")?,
            None => {}
        }
        if let Some(host) = self.host {
            f.write_str(host)?;
        }
        Ok(())
    }
}

/// Split an origin string into nick, user and host.
///
/// Shorthand for [`Origin::parse`].
pub fn parse_origin(origin: &str) -> Origin<'_> {
    Origin::parse(origin)
}

#[inline]
fn segment(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mask() {
        let origin = parse_origin("nick!user@host");
        assert_eq!(origin.nick, Some("nick"));
        assert_eq!(origin.user, Some("user"));
        assert_eq!(origin.host, Some("host"));
    }

    #[test]
    fn bare_host() {
        let origin = parse_origin("irc.example.org");
        assert_eq!(
            origin,
            Origin {
                nick: None,
                user: None,
                host: Some("irc.example.org"),
            }
        );
    }

    #[test]
    fn nick_and_user_without_host() {
        let origin = parse_origin("nick!user");
        assert_eq!(origin.nick, Some("nick"));
        assert_eq!(origin.user, Some("user"));
        assert_eq!(origin.host, None);
    }

    #[test]
    fn user_and_host_without_nick() {
        let origin = parse_origin("user@host");
        assert_eq!(origin.nick, None);
        assert_eq!(origin.user, Some("user"));
        assert_eq!(origin.host, Some("host"));
    }

    #[test]
    fn empty_string_is_all_absent() {
        let origin = parse_origin("");
        assert!(origin.is_empty());
        assert_eq!(origin, Origin::default());
    }

    #[test]
    fn empty_segments_are_absent_not_empty() {
        let origin = parse_origin("!user@host");
        assert_eq!(origin.nick, None);
        assert_eq!(origin.user, Some("user"));

        let origin = parse_origin("nick!@host");
        assert_eq!(origin.nick, Some("nick"));
        assert_eq!(origin.user, None);
        assert_eq!(origin.host, Some("host"));

        let origin = parse_origin("nick!");
        assert_eq!(origin.nick, Some("nick"));
        assert_eq!(origin.user, None);
        assert_eq!(origin.host, None);
    }

    #[test]
    fn later_separators_do_not_reset() {
        // '!' after '@' is part of the host
        let origin = parse_origin("user@ho!st");
        assert_eq!(origin.nick, None);
        assert_eq!(origin.user, Some("user"));
        assert_eq!(origin.host, Some("ho!st"));

        // a second '!' is part of the user segment
        let origin = parse_origin("a!b!c@d");
        assert_eq!(origin.nick, Some("a"));
        assert_eq!(origin.user, Some("b!c"));
        assert_eq!(origin.host, Some("d"));
    }

    #[test]
    fn display_rebuilds_mask() {
        for mask in ["nick!user@host", "user@host", "nick!user", "host"] {
            assert_eq!(parse_origin(mask).to_string(), mask);
        }
    }

    #[test]
    fn display_keeps_separators_for_missing_parts() {
        for mask in ["nick!@host", "nick!", "user@"] {
            let origin = parse_origin(mask);
            assert_eq!(origin.to_string(), mask);
        }

        let nick_only = Origin {
            nick: Some("nick"),
            ..Origin::default()
        };
        assert_eq!(parse_origin(&nick_only.to_string()), nick_only);
    }
}
