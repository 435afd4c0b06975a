//! Server preferences
//!
//! Loaded from `SHELFMARK_CONFIG` when set, otherwise
//! `~/.shelfmark/preferences.json`. A missing file means defaults. Environment
//! variables are applied on top.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shelfmark_core::ServerConfig;
use std::path::{Path, PathBuf};
use tokio::fs;

const PREF_FILE: &str = "preferences.json";

/// All fields use #[serde(default)] so older preferences files keep loading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// JSON library snapshot; an empty library is served when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Preferences {
    /// Apply `SHELFMARK_PORT`, `SHELFMARK_ALLOW_REMOTE` and `SHELFMARK_LIBRARY`
    ///
    /// `lookup` stands in for `std::env::var` so tests can supply values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("SHELFMARK_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid SHELFMARK_PORT: {}", port))?;
        }

        if let Some(flag) = lookup("SHELFMARK_ALLOW_REMOTE") {
            self.server.allow_remote = match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => anyhow::bail!("Invalid SHELFMARK_ALLOW_REMOTE: {}", other),
            };
        }

        if let Some(path) = lookup("SHELFMARK_LIBRARY") {
            self.library_path = Some(PathBuf::from(path));
        }

        Ok(())
    }
}

/// Preferences file location
///
/// `SHELFMARK_CONFIG` wins; otherwise `~/.shelfmark/preferences.json`.
pub fn preferences_path() -> anyhow::Result<PathBuf> {
    if let Ok(env_path) = std::env::var("SHELFMARK_CONFIG") {
        tracing::info!("Using preferences from SHELFMARK_CONFIG: {}", env_path);
        return Ok(PathBuf::from(env_path));
    }

    let home_dir = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home_dir.join(".shelfmark").join(PREF_FILE))
}

/// Load preferences from `path`, or defaults if it does not exist
pub async fn load_preferences(path: &Path) -> anyhow::Result<Preferences> {
    if !path.exists() {
        return Ok(Preferences::default());
    }

    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read preferences: {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse preferences: {}", path.display()))
}

/// Load preferences from the default location and apply environment overrides
pub async fn load() -> anyhow::Result<Preferences> {
    let path = preferences_path()?;
    let mut prefs = load_preferences(&path).await?;
    prefs.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(prefs)
}
