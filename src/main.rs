//! slirc-bot - channel-keeping IRC bot over libircclient.
//!
//! Usage: `slirc-bot [config.toml]`. While running, lines on stdin are
//! commands: `quit`, `reload` (re-read the config), `update` (re-check
//! every joined channel); anything else is sent to the server verbatim.

use slirc_client::bot::Bot;
use slirc_client::engine::native::NativeEngine;
use slirc_client::{Commands, Config, Interest, Session, SessionError};
use std::io::{self, Read};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STEP_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "bot.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;
    let bot = Bot::new(config.clone())?;

    let mut session = Session::with_identity(NativeEngine::new()?, config.identity());
    session.set_option(config.options.options(), true);
    bot.install(&mut session);

    let target = config.target();
    info!(host = %target.host, port = target.port, ipv6 = target.ipv6, "Connecting");
    session.connect(&target)?;

    let stdin = io::stdin();
    let interest = Interest::new().read(&stdin);
    let mut input = LineBuffer::default();

    'run: while session.is_connected() {
        let ready = match session.step(&interest, Some(STEP_TIMEOUT)) {
            Ok(ready) => ready,
            Err(err @ SessionError::Handler { .. }) => {
                warn!(error = %err, "Handler failed");
                continue;
            }
            Err(err) => {
                error!(code = err.error_code(), error = %err, "Session failed");
                break;
            }
        };

        if !ready.is_readable(&stdin) {
            if let Err(err) = bot.work(&mut session) {
                warn!(error = %err, "Queued command failed");
            }
            continue;
        }

        let Some(lines) = input.fill(&mut stdin.lock())? else {
            info!("stdin closed");
            session.disconnect();
            break;
        };
        for line in lines {
            match line.as_str() {
                "" => {}
                "quit" => {
                    session.disconnect();
                    break 'run;
                }
                "reload" => match Config::load(&config_path) {
                    Ok(config) => {
                        if let Err(err) = bot.reload(config, &mut session) {
                            warn!(error = %err, "Reload failed");
                        }
                    }
                    Err(err) => warn!(path = %config_path, error = %err, "Reload failed"),
                },
                "update" => {
                    if let Err(err) = bot.update(&mut session) {
                        warn!(error = %err, "Update failed");
                    }
                }
                raw => {
                    if let Err(err) = session.raw(raw) {
                        warn!(error = %err, "Raw command failed");
                    }
                }
            }
        }
    }

    bot.reset();
    info!("Bye!");
    Ok(())
}

/// Splits raw reads into lines without blocking past what `select` saw.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Read once and return the complete lines. `None` at end of input.
    fn fill(&mut self, reader: &mut impl Read) -> io::Result<Option<Vec<String>>> {
        let mut chunk = [0u8; 8192];
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Ok(None);
        }
        self.pending.extend_from_slice(&chunk[..n]);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        }
        Ok(Some(lines))
    }
}
