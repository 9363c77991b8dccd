use crate::app_dirs::AppDirs;
use crate::config::{HighlightStyle, Mode};
use crate::wordlist::WordList;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Most results kept on disk; the oldest fall off the end.
pub const RESULT_HISTORY_CAP: usize = 100;

/// A finished session as the session hands it over, before the log stamps
/// identity onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub mode: Mode,
    pub duration: Option<u64>,
    pub words_target: Option<usize>,
    pub wpm: f64,
    pub accuracy: f64,
    pub raw_wpm: f64,
    pub net_wpm: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_chars: usize,
    pub completed_words: usize,
    pub word_list: WordList,
    pub highlight_style: HighlightStyle,
}

/// One persisted result. Field names and the epoch-millisecond timestamp
/// match the on-disk history format; there is no schema version field, and
/// unreadable histories degrade to empty rather than migrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingResult {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words_target: Option<usize>,
    pub wpm: f64,
    pub accuracy: f64,
    pub raw_wpm: f64,
    pub net_wpm: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_chars: usize,
    pub completed_words: usize,
    pub word_list: WordList,
    pub highlight_style: HighlightStyle,
}

impl TypingResult {
    fn from_summary(summary: ResultSummary, id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            mode: summary.mode,
            duration: summary.duration,
            words_target: summary.words_target,
            wpm: summary.wpm,
            accuracy: summary.accuracy,
            raw_wpm: summary.raw_wpm,
            net_wpm: summary.net_wpm,
            correct_chars: summary.correct_chars,
            incorrect_chars: summary.incorrect_chars,
            total_chars: summary.total_chars,
            completed_words: summary.completed_words,
            word_list: summary.word_list,
            highlight_style: summary.highlight_style,
        }
    }
}

pub trait ResultStore {
    /// All stored results, newest first. Unreadable or corrupt storage
    /// yields an empty list.
    fn load(&self) -> Vec<TypingResult>;
    fn save(&self, results: &[TypingResult]) -> io::Result<()>;
}

/// JSON-file-backed store. Writes go through a temp file and a rename so a
/// crash mid-write cannot truncate the history.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    path: PathBuf,
}

impl FileResultStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::results_path().unwrap_or_else(|| PathBuf::from("typometer_results.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for FileResultStore {
    fn load(&self) -> Vec<TypingResult> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn save(&self, results: &[TypingResult]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(results).unwrap_or_default();
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)
    }
}

/// Append-only history of finished sessions, capped at
/// [`RESULT_HISTORY_CAP`] entries, newest first. Storage failures are
/// reported on stderr and swallowed; the caller never sees them.
pub struct ResultLog<S: ResultStore> {
    store: S,
}

impl<S: ResultStore> ResultLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stamp a fresh id and timestamp onto `summary`, prepend it, and trim
    /// to the cap. Returns the stored record.
    pub fn record(&self, summary: ResultSummary) -> TypingResult {
        // Truncate to millisecond precision up front so the returned record
        // equals what a reload from disk yields
        let now = Utc::now();
        let timestamp = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        let result = TypingResult::from_summary(summary, fresh_id(), timestamp);

        let mut results = self.store.load();
        results.insert(0, result.clone());
        results.truncate(RESULT_HISTORY_CAP);
        if let Err(e) = self.store.save(&results) {
            eprintln!("typometer: failed to save typing result: {e}");
        }
        result
    }

    /// All stored results, newest first.
    pub fn list(&self) -> Vec<TypingResult> {
        self.store.load()
    }

    /// Remove one entry. Unknown ids are not an error.
    pub fn delete(&self, id: &str) {
        let mut results = self.store.load();
        results.retain(|r| r.id != id);
        if let Err(e) = self.store.save(&results) {
            eprintln!("typometer: failed to delete typing result: {e}");
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.save(&[]) {
            eprintln!("typometer: failed to clear typing results: {e}");
        }
    }
}

fn fresh_id() -> String {
    let mut rng = rand::thread_rng();
    format!("{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>())
}

pub fn by_mode(results: &[TypingResult], mode: Mode) -> Vec<TypingResult> {
    results.iter().filter(|r| r.mode == mode).cloned().collect()
}

pub fn by_word_list(results: &[TypingResult], word_list: WordList) -> Vec<TypingResult> {
    results
        .iter()
        .filter(|r| r.word_list == word_list)
        .cloned()
        .collect()
}

pub fn average_wpm(results: &[TypingResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.wpm).sum::<f64>() / results.len() as f64
}

pub fn best_wpm(results: &[TypingResult]) -> f64 {
    results.iter().map(|r| r.wpm).fold(0.0, f64::max)
}

pub fn average_accuracy(results: &[TypingResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.accuracy).sum::<f64>() / results.len() as f64
}
