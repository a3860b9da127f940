//! TOML parsing for `graft.toml`.

use std::path::Path;

use anyhow::Context;

use super::GraftConfig;

pub fn parse_graft_toml(path: &Path) -> anyhow::Result<GraftConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_graft_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_graft_toml_str(content: &str) -> anyhow::Result<GraftConfig> {
    let config: GraftConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn to_toml(config: &GraftConfig) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
