use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::pdf::{BoundaryPolicy, CoordinatorConfig, DEFAULT_WORKERS};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "dualslide";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Pages per slide step
    #[serde(default = "default_navigation_step")]
    pub navigation_step: usize,

    /// How far the notes display starts ahead of the main display
    #[serde(default = "default_display_offset")]
    pub display_offset: usize,

    #[serde(default)]
    pub boundary_policy: BoundaryPolicy,

    /// Window fill around the letterboxed page, `#RRGGBB`
    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_true")]
    pub show_elapsed_time: bool,

    #[serde(default = "default_true")]
    pub prefetch: bool,

    #[serde(default = "default_render_workers")]
    pub render_workers: usize,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_navigation_step() -> usize {
    2
}

fn default_display_offset() -> usize {
    1
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_render_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            navigation_step: default_navigation_step(),
            display_offset: default_display_offset(),
            boundary_policy: BoundaryPolicy::default(),
            background: default_background(),
            show_elapsed_time: true,
            prefetch: true,
            render_workers: default_render_workers(),
        }
    }
}

impl Settings {
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            display_offset: self.display_offset,
            step: self.navigation_step,
            policy: self.boundary_policy,
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load the user's configuration, writing defaults on first run
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Replace the global settings with the contents of `path`.
/// Unreadable or malformed files leave the current settings in place.
pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Pages per slide. 2 for decks that alternate slide and notes pages.\n");
    content.push_str(&format!("navigation_step: {}\n", settings.navigation_step));
    content.push_str("# Page the notes display starts on, relative to the main display.\n");
    content.push_str(&format!("display_offset: {}\n", settings.display_offset));
    content.push_str("# What a step past the first or last page does: clamp | reject\n");
    content.push_str(&format!(
        "boundary_policy: {}\n",
        settings.boundary_policy.as_str()
    ));
    content.push('\n');
    content.push_str(&format!("background: \"{}\"\n", settings.background));
    content.push_str(&format!(
        "show_elapsed_time: {}\n",
        settings.show_elapsed_time
    ));
    content.push_str(&format!("prefetch: {}\n", settings.prefetch));
    content.push_str(&format!("render_workers: {}\n", settings.render_workers));

    content
}

// Public API for accessing settings

/// Snapshot of the current settings
pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

/// Apply command-line overrides on top of the loaded file.
/// Not persisted.
pub fn update(apply: impl FnOnce(&mut Settings)) {
    if let Ok(mut settings) = SETTINGS.write() {
        apply(&mut settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn reset() {
        update(|s| *s = Settings::default());
    }

    #[test]
    fn defaults_match_interleaved_decks() {
        let settings = Settings::default();
        assert_eq!(settings.navigation_step, 2);
        assert_eq!(settings.display_offset, 1);
        assert_eq!(settings.boundary_policy, BoundaryPolicy::Clamp);
        assert_eq!(settings.coordinator_config(), CoordinatorConfig::default());
    }

    #[test]
    fn generated_yaml_parses_back() {
        let settings = Settings {
            boundary_policy: BoundaryPolicy::Reject,
            background: "#202020".to_string(),
            render_workers: 3,
            ..Settings::default()
        };

        let yaml = generate_settings_yaml(&settings);
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: Settings = serde_yaml::from_str("navigation_step: 1\n").unwrap();
        assert_eq!(parsed.navigation_step, 1);
        assert_eq!(parsed.display_offset, 1);
        assert!(parsed.prefetch);
        assert_eq!(parsed.version, CURRENT_VERSION);
    }

    #[test]
    #[serial]
    fn loads_from_file() {
        reset();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "version: 1\nnavigation_step: 1\nboundary_policy: reject\nprefetch: false\n",
        )
        .unwrap();

        load_settings_from_path(&path);

        let settings = current();
        let config = settings.coordinator_config();
        assert_eq!(config.step, 1);
        assert_eq!(config.policy, BoundaryPolicy::Reject);
        assert!(!settings.prefetch);
        reset();
    }

    #[test]
    #[serial]
    fn malformed_file_keeps_current_settings() {
        reset();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "navigation_step: [not a number\n").unwrap();

        load_settings_from_path(&path);

        assert_eq!(current(), Settings::default());
    }

    #[test]
    #[serial]
    fn old_version_is_migrated_and_rewritten() {
        reset();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\nrender_workers: 2\n").unwrap();

        load_settings_from_path(&path);

        assert_eq!(current().version, CURRENT_VERSION);
        assert_eq!(current().render_workers, 2);
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.starts_with(&format!("version: {CURRENT_VERSION}")));
        reset();
    }
}
