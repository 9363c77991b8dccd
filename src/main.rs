mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use typometer::config::{ConfigPatch, ConfigStore, FileConfigStore, HighlightStyle, Mode};
use typometer::results::{FileResultStore, ResultLog, TypingResult};
use typometer::runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner};
use typometer::session::{KeyStroke, Session};
use typometer::wordlist::WordList;

const TICK_RATE_MS: u64 = 100;

/// terminal typing speed test
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test with live wpm and accuracy, a per-second wpm chart, and a local history of your last hundred results."
)]
pub struct Cli {
    /// finish after a fixed time or a fixed number of words
    #[clap(short, long, value_enum)]
    mode: Option<Mode>,

    /// number of seconds for time mode
    #[clap(short = 's', long)]
    duration: Option<u64>,

    /// number of words for words mode
    #[clap(short = 'w', long)]
    words: Option<usize>,

    /// word list to draw the passage from
    #[clap(short = 'l', long, value_enum)]
    word_list: Option<WordList>,

    /// how the current typing position is marked
    #[clap(long, value_enum)]
    highlight: Option<HighlightStyle>,
}

impl Cli {
    fn to_patch(&self) -> ConfigPatch {
        ConfigPatch {
            mode: self.mode,
            duration_secs: self.duration,
            words_target: self.words,
            word_list: self.word_list,
            highlight_style: self.highlight,
            highlight_input_on_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

pub struct App {
    pub session: Session,
    pub state: AppState,
    pub history: Vec<TypingResult>,
    pub history_selected: usize,
    pub last_result: Option<TypingResult>,
    result_log: ResultLog<FileResultStore>,
    config_store: FileConfigStore,
    observed_finish: bool,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        Self::with_stores(
            FileConfigStore::new(),
            FileResultStore::new(),
            cli.to_patch(),
        )
    }

    fn with_stores(
        config_store: FileConfigStore,
        result_store: FileResultStore,
        overrides: ConfigPatch,
    ) -> Result<Self, Box<dyn Error>> {
        let config = config_store.load().merged(&overrides);
        config.validate()?;
        let _ = config_store.save(&config);
        let session = Session::new(config)?;
        Ok(Self {
            session,
            state: AppState::Typing,
            history: Vec::new(),
            history_selected: 0,
            last_result: None,
            result_log: ResultLog::new(result_store),
            config_store,
            observed_finish: false,
        })
    }

    #[cfg(test)]
    fn for_tests(config: typometer::config::Config) -> Self {
        let dir = tempfile::tempdir().unwrap().into_path();
        let config_store = FileConfigStore::with_path(dir.join("config.json"));
        config_store.save(&config).unwrap();
        Self::with_stores(
            config_store,
            FileResultStore::with_path(dir.join("results.json")),
            ConfigPatch::default(),
        )
        .unwrap()
    }

    /// Fresh passage, same configuration.
    pub fn new_test(&mut self) {
        // reset alone only clears; an unchanged config does not reload
        let _ = self.session.reset(&ConfigPatch::default());
        self.ensure_passage();
        self.last_result = None;
        self.observed_finish = false;
        self.state = AppState::Typing;
    }

    /// Apply configuration overrides, persist them, and start a fresh test.
    pub fn apply_patch(&mut self, patch: ConfigPatch) {
        if self.session.reset(&patch).is_err() {
            return;
        }
        self.ensure_passage();
        if let Err(e) = self.config_store.save(self.session.config()) {
            eprintln!("typometer: failed to save config: {e}");
        }
        self.last_result = None;
        self.observed_finish = false;
        self.state = AppState::Typing;
    }

    fn ensure_passage(&mut self) {
        if self.session.passage().is_empty() {
            let list = self.session.config().word_list;
            let len = self.session.config().passage_len();
            self.session.load_passage(list, len);
        }
    }

    /// Record a finished session exactly once and move to the results
    /// screen. A finish without any typed characters is shown but never
    /// persisted.
    pub fn observe_finish(&mut self) {
        if !self.session.is_finished() || self.observed_finish {
            return;
        }
        self.observed_finish = true;
        if let Some(summary) = self.session.summary() {
            self.last_result = Some(self.result_log.record(summary));
        }
        self.state = AppState::Results;
    }

    pub fn open_history(&mut self) {
        self.history = self.result_log.list();
        self.history_selected = 0;
        self.state = AppState::History;
    }

    pub fn delete_selected(&mut self) {
        if let Some(result) = self.history.get(self.history_selected) {
            self.result_log.delete(&result.id);
            self.history = self.result_log.list();
            if self.history_selected >= self.history.len() && self.history_selected > 0 {
                self.history_selected -= 1;
            }
        }
    }

    pub fn clear_history(&mut self) {
        self.result_log.clear();
        self.history.clear();
        self.history_selected = 0;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    // Surface configuration errors before touching the terminal
    let mut app = match App::new(&cli) {
        Ok(app) => app,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, e).exit();
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => {
                app.session.tick();
                app.observe_finish();
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if handle_key(app, key) {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns true when the app should exit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match app.state {
        AppState::Typing => match key.code {
            KeyCode::Esc => return true,
            KeyCode::Tab => app.new_test(),
            KeyCode::Backspace => {
                app.session.handle_key(KeyStroke::Backspace);
                app.observe_finish();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.session.handle_key(KeyStroke::Char(c));
                app.observe_finish();
            }
            _ => {}
        },
        AppState::Results => match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('r') | KeyCode::Char('n') => app.new_test(),
            KeyCode::Char('h') => app.open_history(),
            KeyCode::Char('m') => {
                let next = match app.session.config().mode {
                    Mode::Time => Mode::Words,
                    Mode::Words => Mode::Time,
                };
                app.apply_patch(ConfigPatch {
                    mode: Some(next),
                    ..ConfigPatch::default()
                });
            }
            KeyCode::Char('w') => {
                let next = match app.session.config().word_list {
                    WordList::Simple => WordList::Advanced,
                    WordList::Advanced => WordList::Simple,
                };
                app.apply_patch(ConfigPatch {
                    word_list: Some(next),
                    ..ConfigPatch::default()
                });
            }
            KeyCode::Char('g') => {
                let next = match app.session.config().highlight_style {
                    HighlightStyle::Character => HighlightStyle::Word,
                    HighlightStyle::Word => HighlightStyle::Caret,
                    HighlightStyle::Caret => HighlightStyle::Character,
                };
                app.apply_patch(ConfigPatch {
                    highlight_style: Some(next),
                    ..ConfigPatch::default()
                });
            }
            _ => {}
        },
        AppState::History => match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('b') => app.state = AppState::Results,
            KeyCode::Up => {
                app.history_selected = app.history_selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if app.history_selected + 1 < app.history.len() {
                    app.history_selected += 1;
                }
            }
            KeyCode::Char('d') => app.delete_selected(),
            KeyCode::Char('c') => app.clear_history(),
            KeyCode::Char('r') | KeyCode::Char('n') => app.new_test(),
            _ => {}
        },
    }
    false
}
