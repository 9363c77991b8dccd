use crate::config::{Config, ConfigError, ConfigPatch, Mode};
use crate::generator;
use crate::metrics;
use crate::results::ResultSummary;
use crate::runtime::{Clock, SystemClock};
use crate::time_series::WpmSample;
use crate::wordlist::WordList;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::time::SystemTime;

/// A keystroke the session reacts to. Anything else (modifiers, navigation,
/// multi-codepoint paste) is dropped before it gets here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyStroke {
    Char(char),
    Backspace,
}

/// Position within the passage: current word and character offset inside it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub word: usize,
    pub char: usize,
}

/// Running keystroke counters. `typed == correct + incorrect` always, and
/// none of the three ever decreases within a run (backspace edits text, not
/// history).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub correct: usize,
    pub incorrect: usize,
    pub typed: usize,
}

/// One run of the typing test, from configuration to finish or reset.
///
/// Owns the passage, the per-word typed text, the cursor, timing, and the
/// counters; external readers only get accessor views. Time and randomness
/// are injected so the whole machine is deterministic under test.
pub struct Session {
    config: Config,
    passage: Vec<String>,
    typed: Vec<String>,
    cursor: Cursor,
    started_at: Option<SystemTime>,
    elapsed_ms: u64,
    is_running: bool,
    is_finished: bool,
    stats: Stats,
    wpm_series: Vec<WpmSample>,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore>,
}

impl Session {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_deps(
            config,
            Box::new(SystemClock),
            Box::new(StdRng::from_entropy()),
        )
    }

    pub fn with_deps(
        config: Config,
        clock: Box<dyn Clock>,
        rng: Box<dyn RngCore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let word_list = config.word_list;
        let count = config.passage_len();
        let mut session = Self {
            config,
            passage: Vec::new(),
            typed: Vec::new(),
            cursor: Cursor::default(),
            started_at: None,
            elapsed_ms: 0,
            is_running: false,
            is_finished: false,
            stats: Stats::default(),
            wpm_series: Vec::new(),
            clock,
            rng,
        };
        session.load_passage(word_list, count);
        Ok(session)
    }

    /// Generate a fresh passage and return to the ready state. Valid at any
    /// point; discards the current run.
    pub fn load_passage(&mut self, word_list: WordList, count: usize) {
        let set = word_list.word_set();
        self.passage = generator::generate(self.rng.as_mut(), &set, count);
        self.typed = vec![String::new(); self.passage.len()];
        self.cursor = Cursor::default();
        self.started_at = None;
        self.elapsed_ms = 0;
        self.is_running = false;
        self.is_finished = false;
        self.stats = Stats::default();
        self.wpm_series.clear();
    }

    /// Begin the run. No-op without a passage or outside the ready state;
    /// `handle_key` calls this on the first accepted keystroke.
    pub fn start(&mut self) {
        if self.passage.is_empty() || self.is_running || self.is_finished {
            return;
        }
        self.started_at = Some(self.clock.now());
        self.elapsed_ms = 0;
        self.is_running = true;
        self.is_finished = false;
    }

    pub fn handle_key(&mut self, key: KeyStroke) {
        if self.is_finished || self.passage.is_empty() {
            return;
        }
        if !self.is_running {
            self.start();
        }
        match key {
            KeyStroke::Backspace => self.backspace(),
            KeyStroke::Char(c) => self.write(c),
        }
    }

    fn backspace(&mut self) {
        if self.cursor.char > 0 {
            self.typed[self.cursor.word].pop();
            self.cursor.char -= 1;
        } else if self.cursor.word > 0 {
            // Crossing the boundary backward only repositions the cursor;
            // the previous word's typed text and all counters stay as-is.
            self.cursor.word -= 1;
            let typed_len = self.typed[self.cursor.word].chars().count();
            let word_len = self.passage[self.cursor.word].chars().count();
            self.cursor.char = typed_len.min(word_len);
        }
    }

    fn write(&mut self, c: char) {
        if c.is_control() {
            return;
        }

        let word_len = self.passage[self.cursor.word].chars().count();
        let expected = self.passage[self.cursor.word].chars().nth(self.cursor.char);
        if expected == Some(c) {
            self.stats.correct += 1;
        } else {
            self.stats.incorrect += 1;
        }
        self.stats.typed += 1;

        self.typed[self.cursor.word].push(c);
        self.cursor.char = (self.cursor.char + 1).min(word_len);

        if self.cursor.char >= word_len {
            if self.cursor.word + 1 < self.passage.len() {
                self.cursor.word += 1;
                self.cursor.char = 0;
            } else {
                // Passage exhausted; this ends the test regardless of the
                // configured time or word limit.
                self.stop();
            }
        }
    }

    /// Re-read the clock and update elapsed time, finishing the run when the
    /// configured limit is reached. Driven externally at a short cadence;
    /// no-op unless running.
    pub fn tick(&mut self) {
        if !self.is_running {
            return;
        }
        let Some(started_at) = self.started_at else {
            return;
        };

        // Always derived from the clock, never accumulated, so a stalled or
        // delayed tick cannot drift the elapsed time.
        let elapsed_ms = self
            .clock
            .now()
            .duration_since(started_at)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        match self.config.mode {
            Mode::Time => {
                if elapsed_ms >= self.config.duration_secs * 1000 {
                    self.stop();
                    return;
                }
            }
            Mode::Words => {
                if self.cursor.word >= self.config.words_target {
                    self.stop();
                    return;
                }
            }
        }

        let prev_whole_secs = self.elapsed_ms / 1000;
        self.elapsed_ms = elapsed_ms;

        let whole_secs = elapsed_ms / 1000;
        if whole_secs > prev_whole_secs {
            self.wpm_series.push(WpmSample::new(
                whole_secs,
                metrics::wpm(self.stats.correct, elapsed_ms),
            ));
        }
    }

    pub fn stop(&mut self) {
        self.is_running = false;
        self.is_finished = true;
    }

    /// Merge configuration overrides and clear the run. A passage is only
    /// regenerated when a field that shapes it actually changed, so a plain
    /// `reset` leaves the session without a passage until `load_passage`.
    pub fn reset(&mut self, patch: &ConfigPatch) -> Result<(), ConfigError> {
        let new_config = self.config.merged(patch);
        new_config.validate()?;
        let reload = self.config.passage_config_differs(&new_config);
        self.config = new_config;

        self.passage.clear();
        self.typed.clear();
        self.cursor = Cursor::default();
        self.started_at = None;
        self.elapsed_ms = 0;
        self.is_running = false;
        self.is_finished = false;
        self.stats = Stats::default();
        self.wpm_series.clear();

        if reload {
            self.load_passage(self.config.word_list, self.config.passage_len());
        }
        Ok(())
    }

    /// Snapshot of a finished run, or `None` when unfinished or untouched.
    /// An abandoned or empty session never produces a record.
    pub fn summary(&self) -> Option<ResultSummary> {
        if !self.is_finished || self.stats.typed == 0 {
            return None;
        }
        Some(ResultSummary {
            mode: self.config.mode,
            duration: (self.config.mode == Mode::Time).then_some(self.config.duration_secs),
            words_target: (self.config.mode == Mode::Words).then_some(self.config.words_target),
            wpm: metrics::wpm(self.stats.correct, self.elapsed_ms),
            accuracy: metrics::accuracy(self.stats.correct, self.stats.typed),
            raw_wpm: metrics::raw_wpm(self.stats.typed, self.elapsed_ms),
            net_wpm: metrics::net_wpm(self.stats.correct, self.stats.incorrect, self.elapsed_ms),
            correct_chars: self.stats.correct,
            incorrect_chars: self.stats.incorrect,
            total_chars: self.stats.typed,
            completed_words: self.completed_words(),
            word_list: self.config.word_list,
            highlight_style: self.config.highlight_style,
        })
    }

    /// Words whose typed text exactly matches the target.
    pub fn completed_words(&self) -> usize {
        self.typed
            .iter()
            .zip(self.passage.iter())
            .filter(|(typed, target)| typed == target)
            .count()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn passage(&self) -> &[String] {
        &self.passage
    }

    pub fn typed(&self) -> &[String] {
        &self.typed
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn wpm_series(&self) -> &[WpmSample] {
        &self.wpm_series
    }
}
