//! Editor configuration.
//!
//! Defaults, optionally a JSON file, then environment overrides:
//!
//! - `COMPOSER_HISTORY_DEPTH`: undo steps kept (default: 50)
//! - `COMPOSER_NUDGE_STEP`: arrow-key nudge distance (default: 1)
//! - `COMPOSER_COARSE_NUDGE_STEP`: Shift+arrow nudge distance (default: 10)
//! - `COMPOSER_AUTOSAVE_ENABLED`: `true`/`false` (default: true)
//! - `COMPOSER_AUTOSAVE_DEBOUNCE_MS`: quiet period before a save (default: 1000)
//! - `COMPOSER_AUTOSAVE_INTERVAL_MS`: periodic backup interval (default: 5000)

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::{DEFAULT_CANVAS_BACKGROUND, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::history::DEFAULT_MAX_DEPTH;
use crate::selection::{DEFAULT_COARSE_NUDGE_STEP, DEFAULT_DUPLICATE_OFFSET, DEFAULT_NUDGE_STEP};
use crate::{ComposerResult, DocumentState};

/// Default autosave debounce in milliseconds.
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 1000;

/// Default periodic backup interval in milliseconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 5000;

/// Autosave timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Whether autosave runs at all.
    pub enabled: bool,
    /// Quiet period after the last change before saving.
    pub debounce_ms: u64,
    /// Interval of the periodic backup save.
    pub interval_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
        }
    }
}

impl AutosaveConfig {
    /// Debounce as a duration.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Backup interval as a duration (at least one millisecond).
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// Canvas used for new documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasDefaults {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Background color as hex.
    pub background_color: String,
}

impl Default for CanvasDefaults {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background_color: DEFAULT_CANVAS_BACKGROUND.to_string(),
        }
    }
}

impl CanvasDefaults {
    /// An empty document with these settings.
    #[must_use]
    pub fn document(&self) -> DocumentState {
        DocumentState::new(self.width, self.height).with_background(self.background_color.clone())
    }
}

/// Settings for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum undo steps retained.
    pub history_depth: usize,
    /// Default nudge distance.
    pub nudge_step: f32,
    /// Coarse nudge distance.
    pub coarse_nudge_step: f32,
    /// Offset of duplicates from their original.
    pub duplicate_offset: f32,
    /// New-document canvas.
    pub canvas: CanvasDefaults,
    /// Autosave timing.
    pub autosave: AutosaveConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_MAX_DEPTH,
            nudge_step: DEFAULT_NUDGE_STEP,
            coarse_nudge_step: DEFAULT_COARSE_NUDGE_STEP,
            duplicate_offset: DEFAULT_DUPLICATE_OFFSET,
            canvas: CanvasDefaults::default(),
            autosave: AutosaveConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Defaults with process environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Read a JSON config file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> ComposerResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        override_from(&lookup, "COMPOSER_HISTORY_DEPTH", &mut self.history_depth);
        override_from(&lookup, "COMPOSER_NUDGE_STEP", &mut self.nudge_step);
        override_from(&lookup, "COMPOSER_COARSE_NUDGE_STEP", &mut self.coarse_nudge_step);
        override_from(&lookup, "COMPOSER_AUTOSAVE_ENABLED", &mut self.autosave.enabled);
        override_from(
            &lookup,
            "COMPOSER_AUTOSAVE_DEBOUNCE_MS",
            &mut self.autosave.debounce_ms,
        );
        override_from(
            &lookup,
            "COMPOSER_AUTOSAVE_INTERVAL_MS",
            &mut self.autosave.interval_ms,
        );
        self
    }
}

fn override_from<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!("Ignoring {key}={raw:?}: not a valid value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, 50);
        assert!((config.coarse_nudge_step - 10.0).abs() < f32::EPSILON);
        assert_eq!(config.autosave.debounce(), Duration::from_millis(1000));
        assert_eq!(config.autosave.interval(), Duration::from_millis(5000));
        assert_eq!(config.canvas.document(), DocumentState::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = EditorConfig::default().with_env_overrides(lookup(&[
            ("COMPOSER_HISTORY_DEPTH", "5"),
            ("COMPOSER_NUDGE_STEP", "2.5"),
            ("COMPOSER_AUTOSAVE_ENABLED", "false"),
            ("COMPOSER_AUTOSAVE_DEBOUNCE_MS", " 250 "),
        ]));
        assert_eq!(config.history_depth, 5);
        assert!((config.nudge_step - 2.5).abs() < f32::EPSILON);
        assert!(!config.autosave.enabled);
        assert_eq!(config.autosave.debounce_ms, 250);
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let config = EditorConfig::default()
            .with_env_overrides(lookup(&[("COMPOSER_HISTORY_DEPTH", "lots")]));
        assert_eq!(config.history_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_from_json_file_fills_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("composer.json");
        std::fs::write(&path, r#"{"history_depth": 10, "autosave": {"enabled": false}}"#)
            .expect("write");

        let config = EditorConfig::from_json_file(&path).expect("load");
        assert_eq!(config.history_depth, 10);
        assert!(!config.autosave.enabled);
        assert_eq!(config.autosave.interval_ms, DEFAULT_AUTOSAVE_INTERVAL_MS);
        assert!((config.duplicate_offset - DEFAULT_DUPLICATE_OFFSET).abs() < f32::EPSILON);
    }
}
