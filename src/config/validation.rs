//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

/// Channel name prefixes from RFC 2811.
const CHANNEL_PREFIXES: &[char] = &['#', '&', '+', '!'];

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("identity.nick is required")]
    MissingNick,
    #[error("server.host is required")]
    MissingHost,
    #[error("server.port must not be 0")]
    InvalidPort,
    #[error("channel name must start with one of '#&+!', got '{0}'")]
    InvalidChannelName(String),
    #[error("channel '{0}' is configured more than once")]
    DuplicateChannel(String),
    #[error("channel '{channel}' has an invalid oper pattern: {error}")]
    InvalidOperPattern {
        channel: String,
        #[source]
        error: regex::Error,
    },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.identity.nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    }
    if config.server.host.is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if config.server.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    // Channels
    let mut seen = HashSet::new();
    for channel in &config.channels {
        if !channel.name.starts_with(CHANNEL_PREFIXES) {
            errors.push(ValidationError::InvalidChannelName(channel.name.clone()));
        }
        if !seen.insert(channel.name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateChannel(channel.name.clone()));
        }
        if let Some(pattern) = &channel.oper
            && let Err(error) = Regex::new(pattern)
        {
            errors.push(ValidationError::InvalidOperPattern {
                channel: channel.name.clone(),
                error,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
