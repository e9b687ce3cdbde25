use std::io::Write;

use anyhow::{Context, Result};

/// Install a stderr logger writing `[LEVEL] message`, filtered by
/// `MATCHUP_LOG` (env_logger syntax, default warn).
pub fn init() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("MATCHUP_LOG", "warn"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .try_init()
        .context("install logger")
}
