//! Default value functions for configuration.

use crate::session::DEFAULT_PORT;

pub fn default_port() -> u16 {
    DEFAULT_PORT
}
