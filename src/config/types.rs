//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::default_port;
use crate::session::{Identity, Options, Target};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Who to register as.
    pub identity: IdentityConfig,
    /// Where to connect.
    pub server: ServerConfig,
    /// Engine option flags.
    #[serde(default)]
    pub options: OptionsConfig,
    /// Channels to join, in order.
    #[serde(default, rename = "channel")]
    pub channels: Vec<ChannelConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            nick: Some(self.identity.nick.clone()),
            user: self.identity.user.clone(),
            real: self.identity.real.clone(),
        }
    }

    pub fn target(&self) -> Target {
        let target = Target::new(&self.server.host)
            .port(self.server.port)
            .ipv6(self.server.ipv6);
        match &self.server.password {
            Some(password) => target.password(password),
            None => target,
        }
    }

    /// The configured channel named `name`, compared case-insensitively.
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels
            .iter()
            .find(|channel| channel.name.eq_ignore_ascii_case(name))
    }
}

/// Client identity.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Nickname (required).
    pub nick: String,
    /// Username; the engine defaults it when absent.
    pub user: Option<String>,
    /// Real name; the engine defaults it when absent.
    pub real: Option<String>,
}

/// Server to connect to.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Hostname or address.
    pub host: String,
    /// Port (default: 6667).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Server password.
    pub password: Option<String>,
    /// Connect over IPv6.
    #[serde(default)]
    pub ipv6: bool,
}

/// Engine option flags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub strip_nicks: bool,
    #[serde(default)]
    pub ssl_no_verify: bool,
}

impl OptionsConfig {
    pub fn options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::DEBUG, self.debug);
        options.set(Options::STRIP_NICKS, self.strip_nicks);
        options.set(Options::SSL_NO_VERIFY, self.ssl_no_verify);
        options
    }
}

/// A channel to join.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Channel name including its prefix (e.g., "#rust").
    pub name: String,
    /// Channel key.
    pub key: Option<String>,
    /// Regex over `nick!user@host`; matching users are given `+o`.
    pub oper: Option<String>,
}

impl ChannelConfig {
    /// The key to join with; empty keys count as none.
    pub fn join_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.is_empty())
    }
}
