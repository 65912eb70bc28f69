//! Configuration management (config.toml)
//!
//! Settings live in TOML in the platform-specific config directory. Missing sections and
//! fields fall back to defaults; an unreadable or invalid file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use crate::error::ConfigError;
use crate::input::InputConfig;
use crate::session::JoinPolicy;
use crate::vm::{AspectRatio, RenderBackend};

const CONFIG_FILE: &str = "config.toml";

/// Front-end configuration, one field per TOML section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Session and VM settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound for joining the execution thread in milliseconds; 0 waits forever
    pub join_timeout_ms: u64,
    /// Platform version reported to the engine at setup
    pub platform_version: i32,
    pub render_backend: RenderBackend,
    pub aspect_ratio: AspectRatio,
    /// Slot used by the save/load hotkeys
    pub save_slot: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: 10_000,
            platform_version: 33,
            render_backend: RenderBackend::default(),
            aspect_ratio: AspectRatio::default(),
            save_slot: 0,
        }
    }
}

impl SessionConfig {
    pub fn join_policy(&self) -> JoinPolicy {
        JoinPolicy::from_millis(self.join_timeout_ms)
    }
}

/// Window hotkeys handled by the launcher rather than the pad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    #[serde(with = "crate::input::keycode_serde")]
    pub save_state: KeyCode,
    #[serde(with = "crate::input::keycode_serde")]
    pub next_slot: KeyCode,
    #[serde(with = "crate::input::keycode_serde")]
    pub load_state: KeyCode,
    #[serde(with = "crate::input::keycode_serde")]
    pub pause_toggle: KeyCode,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            save_state: KeyCode::F1,
            next_slot: KeyCode::F2,
            load_state: KeyCode::F3,
            pause_toggle: KeyCode::F5,
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory handed to the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Directory holding bundled assets; no provisioning when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_source: Option<PathBuf>,
    /// Asset subdirectories copied into the data directory
    pub asset_dirs: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            asset_source: None,
            asset_dirs: vec!["bios".to_string(), "resources".to_string()],
        }
    }
}

impl StorageConfig {
    /// Data directory: the override if set, the platform default otherwise
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(data_dir)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io.vmhost", "", "vmhost")
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/vmhost`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory (engine storage, BIOS, saves).
///
/// On Linux: `~/.local/share/vmhost`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    match config_dir() {
        Some(dir) => load_from(&dir.join(CONFIG_FILE)),
        None => Config::default(),
    }
}

/// Loads the configuration from `path`, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    match try_load_from(path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", path.display(), e);
            Config::default()
        }
    }
}

pub fn try_load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to the platform config directory.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = config_dir() {
        save_to(&dir.join(CONFIG_FILE), config)?;
    }
    Ok(())
}

/// Writes `config` as pretty TOML, creating parent directories.
pub fn save_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Report keys bound more than once across the pad mapping and hotkeys.
pub fn validate_keybindings(config: &Config) -> Vec<String> {
    let mut warnings: Vec<String> = config
        .input
        .keyboard
        .conflicts()
        .into_iter()
        .map(|key| format!("key {:?} is bound to more than one pad button", key))
        .collect();

    let hotkeys = [
        (config.hotkeys.save_state, "hotkeys.save_state"),
        (config.hotkeys.next_slot, "hotkeys.next_slot"),
        (config.hotkeys.load_state, "hotkeys.load_state"),
        (config.hotkeys.pause_toggle, "hotkeys.pause_toggle"),
    ];
    for (i, (key, name)) in hotkeys.iter().enumerate() {
        if config.input.keyboard.lookup(*key).is_some() || *key == config.input.keyboard.back {
            warnings.push(format!("{} key {:?} conflicts with the pad mapping", name, key));
        }
        if hotkeys[..i].iter().any(|(other, _)| other == key) {
            warnings.push(format!("{} key {:?} conflicts with another hotkey", name, key));
        }
    }
    warnings
}
