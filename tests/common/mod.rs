//! Integration test common infrastructure.
//!
//! Provides a scripted engine that drives a real `Session`, plus helpers
//! for loading test configurations.

pub mod engine;

#[allow(unused_imports)]
pub use engine::{Scripted, ScriptedEngine};

use slirc_client::{Config, Interest, Session, SessionError};
use std::io::Write;
use std::time::Duration;

/// Load a configuration from TOML text through a real file.
#[allow(dead_code)]
pub fn config_from(toml: &str) -> Config {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(toml.as_bytes()).expect("write config");
    Config::load(file.path()).expect("load config")
}

/// One step with a short timeout and no caller descriptors.
#[allow(dead_code)]
pub fn pump(session: &mut Session<ScriptedEngine>) -> Result<(), SessionError> {
    session
        .step(&Interest::new(), Some(Duration::from_millis(500)))
        .map(|_| ())
}
