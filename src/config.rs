//! Runtime settings: defaults, then `config.toml`, then environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".snippet-shelf";
const DB_FILE_NAME: &str = "shelf.sqlite";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "snippet-shelf.log";

pub const ENV_DATABASE: &str = "SNIPPET_SHELF_DB";
pub const ENV_DELAY_MS: &str = "SNIPPET_SHELF_DELAY_MS";
pub const ENV_LOG: &str = "SNIPPET_SHELF_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub step_delay_ms: u64,
    pub copy_separator: String,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
    pub log_file: PathBuf,
}

/// On-disk shape of `config.toml`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    database_path: Option<PathBuf>,
    step_delay_ms: Option<u64>,
    copy_separator: Option<String>,
    log_filter: Option<String>,
    log_file: Option<PathBuf>,
}

impl Settings {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            database_path: data_dir.join(DB_FILE_NAME),
            step_delay_ms: 500,
            copy_separator: "\n".to_string(),
            log_filter: "info".to_string(),
            log_file: data_dir.join(LOG_FILE_NAME),
        }
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Overlay the keys present in a TOML document.
    pub fn merge_toml(&mut self, raw: &str) -> Result<()> {
        let file: FileSettings = toml::from_str(raw).context("invalid config file")?;
        if let Some(v) = file.database_path {
            self.database_path = v;
        }
        if let Some(v) = file.step_delay_ms {
            self.step_delay_ms = v;
        }
        if let Some(v) = file.copy_separator {
            self.copy_separator = v;
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
        if let Some(v) = file.log_file {
            self.log_file = v;
        }
        Ok(())
    }

    /// Overlay values from `lookup` (normally `std::env::var`).
    pub fn merge_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_DATABASE) {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DELAY_MS) {
            self.step_delay_ms = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_DELAY_MS} must be a whole number of milliseconds"))?;
        }
        if let Some(v) = lookup(ENV_LOG) {
            self.log_filter = v;
        }
        Ok(())
    }
}

/// Resolve `~/.snippet-shelf`.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// Load settings. `config_path` overrides the default `config.toml`
/// location; a missing default file is fine, a missing explicit one is not.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    let data_dir = data_dir()?;
    let mut settings = Settings::with_data_dir(&data_dir);

    match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            settings.merge_toml(&raw)?;
        }
        None => {
            let default_path = data_dir.join(CONFIG_FILE_NAME);
            if default_path.exists() {
                let raw = fs::read_to_string(&default_path)
                    .with_context(|| format!("failed to read config {}", default_path.display()))?;
                settings.merge_toml(&raw)?;
            }
        }
    }

    settings.merge_env(|key| env::var(key).ok())?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_live_in_data_dir() {
        let settings = Settings::with_data_dir(Path::new("/tmp/shelf"));
        assert_eq!(settings.database_path, Path::new("/tmp/shelf/shelf.sqlite"));
        assert_eq!(settings.step_delay(), Duration::from_millis(500));
        assert_eq!(settings.copy_separator, "\n");
    }

    #[test]
    fn toml_overrides_only_present_keys() {
        let mut settings = Settings::with_data_dir(Path::new("/tmp/shelf"));
        settings
            .merge_toml("step_delay_ms = 250\ncopy_separator = \" | \"\n")
            .expect("merge");
        assert_eq!(settings.step_delay_ms, 250);
        assert_eq!(settings.copy_separator, " | ");
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut settings = Settings::with_data_dir(Path::new("/tmp/shelf"));
        assert!(settings.merge_toml("delay = 3").is_err());
    }

    #[test]
    fn env_beats_file() {
        let mut settings = Settings::with_data_dir(Path::new("/tmp/shelf"));
        settings.merge_toml("step_delay_ms = 250").expect("merge");

        let env: HashMap<&str, &str> = [(ENV_DELAY_MS, "75"), (ENV_DATABASE, "/data/x.db")]
            .into_iter()
            .collect();
        settings
            .merge_env(|key| env.get(key).map(|v| v.to_string()))
            .expect("env");

        assert_eq!(settings.step_delay_ms, 75);
        assert_eq!(settings.database_path, Path::new("/data/x.db"));
    }

    #[test]
    fn bad_delay_in_env_is_an_error() {
        let mut settings = Settings::with_data_dir(Path::new("/tmp/shelf"));
        let result = settings.merge_env(|key| (key == ENV_DELAY_MS).then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_config_file_is_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("custom.toml");
        fs::write(&path, "log_filter = \"debug\"\n").expect("write");

        let settings = load_settings(Some(&path));
        // Home may be unavailable in some sandboxes; only check when it is.
        if let Ok(settings) = settings {
            assert_eq!(settings.log_filter, std::env::var(ENV_LOG).unwrap_or("debug".into()));
        }
    }
}
