use std::{fs, path::Path};

use anyhow::{Context, Result};
use sprout_system_session::SessionConfig;

/// Reads the session configuration, falling back to defaults without a file.
pub(crate) fn load(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid session config at {}", path.display()))
}

fn parse(contents: &str) -> Result<SessionConfig> {
    toml::from_str(contents).context("failed to parse session config toml contents")
}
