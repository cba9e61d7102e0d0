use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::exec::PermissionLevel;
use crate::host;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub permission_level: PermissionSetting,
    /// Initial session directory; empty means the process cwd.
    #[serde(default)]
    pub start_dir: String,
}

/// `permission_level` as written in config: a fixed level or detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionSetting {
    #[default]
    Auto,
    Admin,
    Standard,
}

impl PermissionSetting {
    pub fn resolve(self) -> PermissionLevel {
        match self {
            PermissionSetting::Auto => host::detect_permission_level(),
            PermissionSetting::Admin => PermissionLevel::Admin,
            PermissionSetting::Standard => PermissionLevel::Standard,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: default_level(),
            file: String::new(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl Settings {
    /// `start_dir` with `~` and `$VARS` expanded, or `None` when unset.
    pub fn start_dir(&self) -> Option<PathBuf> {
        expand_path(&self.start_dir)
    }
}

impl LoggingConfig {
    pub fn file(&self) -> Option<PathBuf> {
        expand_path(&self.file)
    }

    /// `level` as a log filter; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

fn expand_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let expanded = shellexpand::full(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| shellexpand::tilde(raw).into_owned());
    Some(PathBuf::from(expanded))
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    permission_level: Option<PermissionSetting>,
    start_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    enabled: Option<bool>,
    level: Option<String>,
    file: Option<String>,
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        // The embedded file is covered by `default_config_parses`.
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            eprintln!("nexshell: embedded config parse error: {e}");
            Self {
                settings: Settings::default(),
                logging: LoggingConfig::default(),
            }
        })
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/nexshell/config.toml (if exists)
    ///
    /// Keys present in the overlay override; absent keys keep the default.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/nexshell/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/nexshell/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("nexshell: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        if let Some(v) = s.permission_level {
            self.settings.permission_level = v;
        }
        if let Some(v) = s.start_dir {
            self.settings.start_dir = v;
        }

        let l = overlay.logging;
        if let Some(v) = l.enabled {
            self.logging.enabled = v;
        }
        if let Some(v) = l.level {
            self.logging.level = v;
        }
        if let Some(v) = l.file {
            self.logging.file = v;
        }
    }

    /// The merged configuration as TOML, for `--dump-config`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
