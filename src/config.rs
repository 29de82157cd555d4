//! User configuration (`~/.config/mkunit/config.toml`) and the well-known
//! directories the tool reads from and installs into.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::request::Scope;

pub const SYSTEM_UNIT_DIR: &str = "/etc/systemd/system";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default install scope when `--system` is not given.
    #[serde(default)]
    pub scope: Option<Scope>,
    /// Extra directory searched for `<name>.service` / `<name>.timer` templates.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// Editor used by `--edit`; falls back to $VISUAL, then $EDITOR.
    #[serde(default)]
    pub editor: Option<String>,
    /// Description used when `--description` is omitted.
    #[serde(default)]
    pub description: Option<String>,
}

impl Config {
    /// Load from `path`, or from the default location when `path` is None.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Ok(p) => p,
                Err(_) => return Ok(Config::default()),
            },
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

/// `$XDG_CONFIG_HOME`, or `$HOME/.config` when unset.
pub fn config_home() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg));
    }
    let home = std::env::var_os("HOME").context("Could not determine HOME directory")?;
    Ok(PathBuf::from(home).join(".config"))
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(config_home()?.join("mkunit"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn default_template_dir() -> Result<PathBuf> {
    Ok(config_dir()?.join("templates"))
}

pub fn user_unit_dir() -> Result<PathBuf> {
    Ok(config_home()?.join("systemd").join("user"))
}

pub fn unit_dir(scope: Scope) -> Result<PathBuf> {
    match scope {
        Scope::User => user_unit_dir(),
        Scope::System => Ok(PathBuf::from(SYSTEM_UNIT_DIR)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
scope = "system"
template_dir = "/srv/templates"
editor = "nano"
description = "managed by ops"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scope, Some(Scope::System));
        assert_eq!(config.template_dir, Some(PathBuf::from("/srv/templates")));
        assert_eq!(config.editor.as_deref(), Some("nano"));
        assert_eq!(config.description.as_deref(), Some("managed by ops"));
    }

    #[test]
    fn parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.scope.is_none());
        assert!(config.template_dir.is_none());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<Config>("colour = \"red\"").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert!(config.editor.is_none());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "scope = \"user\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scope, Some(Scope::User));
    }

    #[test]
    fn system_scope_uses_etc() {
        assert_eq!(unit_dir(Scope::System).unwrap(), PathBuf::from("/etc/systemd/system"));
    }
}
