/// `load_config` module: reads the wiki credentials and optional sync settings the CLI needs.
///
/// Credentials come from a small JSON file (`{"token": …, "url": …}`, by default
/// `wiki.secret` in the working directory). `WIKI_SYNC_TOKEN` and `WIKI_SYNC_URL`
/// override the file, so CI can run without a secret file at all. The binary
/// loads `.env` through `dotenvy` once at startup, before any of this runs.
///
/// Sync settings are an optional YAML file deserialised straight into
/// [`SyncConfig`]; every key is optional and defaults to the built-in constants.
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use wiki_sync_core::SyncConfig;

pub const DEFAULT_CREDENTIALS_PATH: &str = "wiki.secret";
pub const TOKEN_ENV: &str = "WIKI_SYNC_TOKEN";
pub const URL_ENV: &str = "WIKI_SYNC_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawCredentials {
    token: Option<String>,
    url: Option<String>,
}

/// Load credentials from `path` (falling back to [`DEFAULT_CREDENTIALS_PATH`]),
/// with environment variables taking precedence over file values.
///
/// A missing file is only an error if the environment does not supply both values.
pub fn load_credentials(path: Option<&Path>) -> Result<Credentials> {
    let path_ref: PathBuf = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH));
    info!(credentials_path = ?path_ref, "Loading wiki credentials");

    let raw = match fs::read_to_string(&path_ref) {
        Ok(content) => match serde_json::from_str::<RawCredentials>(&content) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = ?e, credentials_path = ?path_ref, "Failed to parse credentials JSON");
                bail!("Failed to parse credentials file {:?}: {e}", path_ref);
            }
        },
        Err(e) => {
            info!(error = %e, credentials_path = ?path_ref, "Credentials file not readable, relying on environment");
            RawCredentials::default()
        }
    };

    let token = env::var(TOKEN_ENV).ok().filter(|v| !v.is_empty()).or(raw.token);
    let url = env::var(URL_ENV).ok().filter(|v| !v.is_empty()).or(raw.url);

    match (token, url) {
        (Some(token), Some(url)) if !token.is_empty() && !url.is_empty() => {
            info!(url = %url, token_set = true, "Wiki credentials loaded");
            Ok(Credentials { token, url })
        }
        (token, _) => {
            let missing = if token.as_deref().is_some_and(|t| !t.is_empty()) {
                "url"
            } else {
                "token"
            };
            error!(missing, credentials_path = ?path_ref, "Wiki credentials incomplete");
            bail!(
                "Missing wiki {missing}: set it in {:?} or via {TOKEN_ENV}/{URL_ENV}",
                path_ref
            )
        }
    }
}

/// Load sync settings from an optional YAML file. `None` yields the defaults.
pub fn load_sync_config(path: Option<&Path>) -> Result<SyncConfig> {
    let Some(path_ref) = path else {
        info!("No settings file given, using built-in sync settings");
        return Ok(SyncConfig::default());
    };
    info!(config_path = ?path_ref, "Loading sync settings from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            bail!("Failed to read config file {:?}: {}", path_ref, e);
        }
    };

    if config_content.trim().is_empty() {
        return Ok(SyncConfig::default());
    }

    match serde_yaml::from_str::<SyncConfig>(&config_content) {
        Ok(config) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            bail!("Failed to parse config YAML: {e}")
        }
    }
}

/// Read the sync input: the inline JSON argument, or the contents of `file`.
pub fn load_content(inline: Option<&str>, file: Option<&Path>) -> Result<serde_json::Value> {
    let (source, text) = match (inline, file) {
        (Some(inline), None) => ("argument".to_owned(), inline.to_owned()),
        (None, Some(file)) => match fs::read_to_string(file) {
            Ok(text) => (format!("{}", file.display()), text),
            Err(e) => {
                error!(error = ?e, content_path = ?file, "Failed to read content file");
                bail!("Failed to read content file {:?}: {e}", file);
            }
        },
        (Some(_), Some(_)) => bail!("Pass the content either inline or with --content-file, not both"),
        (None, None) => bail!("No content given: pass the JSON inline or with --content-file"),
    };

    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            error!(error = ?e, source = %source, "Content is not valid JSON");
            bail!("Content from {source} is not valid JSON: {e}")
        }
    }
}
