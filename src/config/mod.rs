use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::highlight::HighlightMarker;
use crate::storage::{DEFAULT_NOTES_KEY, DEFAULT_THEME_KEY};

pub mod themes;

pub use themes::ThemeName;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Scribbly";
const APP_NAME: &str = "scribbly";

const DEFAULT_LABEL_REFRESH_SECS: u64 = 60;
const DEFAULT_TOAST_MS: u64 = 2_000;

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths);
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("SCRIBBLY_CONFIG").ok().map(PathBuf::from);
        let override_data = env::var("SCRIBBLY_DATA").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let database_path = data_dir.join("notes.db");

        Ok(Self {
            config_dir,
            config_file,
            data_dir,
            database_path,
        })
    }

    /// Layout rooted at a single directory, for tests and portable installs.
    pub fn rooted(root: &Path) -> Self {
        let config_dir = root.join("config");
        let data_dir = root.join("data");
        Self {
            config_file: config_dir.join("config.toml"),
            database_path: data_dir.join("notes.db"),
            config_dir,
            data_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Forces the system colour-scheme hint used when no theme is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefer_dark: Option<bool>,
    pub label_refresh_secs: u64,
    pub toast: ToastConfig,
    pub highlight: HighlightMarker,
    pub storage: StorageOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefer_dark: None,
            label_refresh_secs: DEFAULT_LABEL_REFRESH_SECS,
            toast: ToastConfig::default(),
            highlight: HighlightMarker::default(),
            storage: StorageOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.storage.resolve(paths);
        if self.label_refresh_secs == 0 {
            tracing::warn!(
                "label_refresh_secs must be positive, using {DEFAULT_LABEL_REFRESH_SECS}"
            );
            self.label_refresh_secs = DEFAULT_LABEL_REFRESH_SECS;
        }
        if self.toast.duration_ms == 0 {
            tracing::warn!("toast.duration_ms must be positive, using {DEFAULT_TOAST_MS}");
            self.toast.duration_ms = DEFAULT_TOAST_MS;
        }
    }

    pub fn label_refresh(&self) -> Duration {
        Duration::from_secs(self.label_refresh_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub duration_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_TOAST_MS,
        }
    }
}

impl ToastConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub database_path: PathBuf,
    pub notes_key: String,
    pub theme_key: String,
    pub wal_autocheckpoint: u32,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            database_path: PathBuf::new(),
            notes_key: DEFAULT_NOTES_KEY.into(),
            theme_key: DEFAULT_THEME_KEY.into(),
            wal_autocheckpoint: 1000,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
        if self.notes_key.trim().is_empty() {
            tracing::warn!("empty storage.notes_key, using {DEFAULT_NOTES_KEY}");
            self.notes_key = DEFAULT_NOTES_KEY.into();
        }
        if self.theme_key.trim().is_empty() {
            tracing::warn!("empty storage.theme_key, using {DEFAULT_THEME_KEY}");
            self.theme_key = DEFAULT_THEME_KEY.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_run_writes_default_config() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::from_paths(ConfigPaths::rooted(temp.path()));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert_eq!(cfg.storage.notes_key, "scribblyNotes");
        assert_eq!(cfg.storage.database_path, temp.path().join("data").join("notes.db"));

        let reloaded = loader.load()?;
        assert_eq!(reloaded.label_refresh_secs, 60);
        assert_eq!(reloaded.toast.duration(), Duration::from_secs(2));
        assert_eq!(reloaded.highlight, HighlightMarker::default());
        assert_eq!(reloaded.prefer_dark, None);
        Ok(())
    }

    #[test]
    fn invalid_values_are_corrected() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            r#"
prefer_dark = true
label_refresh_secs = 0

[toast]
duration_ms = 0

[highlight]
open = "**"

[storage]
notes_key = " "
"#,
        )?;
        let cfg = ConfigLoader::from_paths(paths).load()?;
        assert_eq!(cfg.prefer_dark, Some(true));
        assert_eq!(cfg.label_refresh_secs, 60);
        assert_eq!(cfg.toast.duration_ms, 2_000);
        assert_eq!(cfg.highlight.open, "**");
        assert_eq!(cfg.highlight.close, "</mark>");
        assert_eq!(cfg.storage.notes_key, "scribblyNotes");
        assert_eq!(cfg.storage.theme_key, "scribblyTheme");
        Ok(())
    }
}
