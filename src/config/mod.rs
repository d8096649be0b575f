//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: config struct definitions and loading
//! - [`validation`]: checks run after parsing, reporting every problem
//! - [`defaults`]: serde default value functions

mod defaults;
mod types;
mod validation;

pub use types::{ChannelConfig, Config, ConfigError, IdentityConfig, OptionsConfig, ServerConfig};
pub use validation::{ValidationError, validate};
