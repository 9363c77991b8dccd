use crate::wordlist::WordList;
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How a test ends: after a fixed time, or after a fixed number of words.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Time,
    Words,
}

/// How the rendered passage marks the typing position. Display-only; the
/// session logic never looks at it.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HighlightStyle {
    Character,
    Word,
    Caret,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("test duration must be a positive number of seconds")]
    InvalidDuration,
    #[error("words target must be a positive number of words")]
    InvalidWordsTarget,
}

/// Passage length used for time-mode tests, where no word target applies.
pub const TIME_MODE_PASSAGE_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub mode: Mode,
    pub duration_secs: u64,
    pub words_target: usize,
    pub word_list: WordList,
    pub highlight_style: HighlightStyle,
    pub highlight_input_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Time,
            duration_secs: 60,
            words_target: 25,
            word_list: WordList::Simple,
            highlight_style: HighlightStyle::Character,
            highlight_input_on_error: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        if self.words_target == 0 {
            return Err(ConfigError::InvalidWordsTarget);
        }
        Ok(())
    }

    /// Passage length implied by the current mode.
    pub fn passage_len(&self) -> usize {
        match self.mode {
            Mode::Time => TIME_MODE_PASSAGE_LEN,
            Mode::Words => self.words_target,
        }
    }

    pub fn merged(&self, patch: &ConfigPatch) -> Config {
        Config {
            mode: patch.mode.unwrap_or(self.mode),
            duration_secs: patch.duration_secs.unwrap_or(self.duration_secs),
            words_target: patch.words_target.unwrap_or(self.words_target),
            word_list: patch.word_list.unwrap_or(self.word_list),
            highlight_style: patch.highlight_style.unwrap_or(self.highlight_style),
            highlight_input_on_error: patch
                .highlight_input_on_error
                .unwrap_or(self.highlight_input_on_error),
        }
    }

    /// True when `other` differs in a field that invalidates the current
    /// passage. Highlight settings only affect rendering.
    pub fn passage_config_differs(&self, other: &Config) -> bool {
        self.mode != other.mode
            || self.duration_secs != other.duration_secs
            || self.words_target != other.words_target
            || self.word_list != other.word_list
    }
}

/// Per-field overrides handed to `Session::reset`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    pub mode: Option<Mode>,
    pub duration_secs: Option<u64>,
    pub words_target: Option<usize>,
    pub word_list: Option<WordList>,
    pub highlight_style: Option<HighlightStyle>,
    pub highlight_input_on_error: Option<bool>,
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typometer") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typometer_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            mode: Mode::Words,
            duration_secs: 120,
            words_target: 50,
            word_list: WordList::Advanced,
            highlight_style: HighlightStyle::Caret,
            highlight_input_on_error: false,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn load_missing_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn load_corrupt_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let cfg = Config {
            duration_secs: 0,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::InvalidDuration));
    }

    #[test]
    fn validate_rejects_zero_words_target() {
        let cfg = Config {
            words_target: 0,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::InvalidWordsTarget));
    }

    #[test]
    fn validate_accepts_unusual_positive_values() {
        // Observed presets are 15/30/60/120/300 and 10/25/50/100, but any
        // positive value is valid.
        let cfg = Config {
            duration_secs: 7,
            words_target: 3,
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn merged_applies_only_given_fields() {
        let base = Config::default();
        let patch = ConfigPatch {
            mode: Some(Mode::Words),
            words_target: Some(10),
            ..ConfigPatch::default()
        };
        let merged = base.merged(&patch);

        assert_eq!(merged.mode, Mode::Words);
        assert_eq!(merged.words_target, 10);
        assert_eq!(merged.duration_secs, base.duration_secs);
        assert_eq!(merged.word_list, base.word_list);
    }

    #[test]
    fn passage_config_ignores_highlight_changes() {
        let base = Config::default();
        let highlight_only = Config {
            highlight_style: HighlightStyle::Word,
            highlight_input_on_error: false,
            ..base.clone()
        };
        assert!(!base.passage_config_differs(&highlight_only));

        let list_change = Config {
            word_list: WordList::Advanced,
            ..base.clone()
        };
        assert!(base.passage_config_differs(&list_change));
    }

    #[test]
    fn passage_len_follows_mode() {
        let time = Config::default();
        assert_eq!(time.passage_len(), TIME_MODE_PASSAGE_LEN);

        let words = Config {
            mode: Mode::Words,
            words_target: 25,
            ..Config::default()
        };
        assert_eq!(words.passage_len(), 25);
    }
}
