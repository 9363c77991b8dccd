use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use typometer::config::{HighlightStyle, Mode};
use typometer::metrics;
use typometer::results;
use typometer::session::Session;
use typometer::time_series::WpmSample;
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const CARET: &str = "|";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            AppState::History => render_history(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = session.passage().join(" ").width();
    let mut prompt_occupied_lines =
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;
    if prompt_width <= max_chars_per_line as usize {
        prompt_occupied_lines = 1;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(
                (area.height.saturating_sub(prompt_occupied_lines) as f64 / 2.0) as u16,
            ),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(1),
        ])
        .split(area);

    let stats = session.stats();
    let progress = match session.config().mode {
        Mode::Time => {
            let remaining = session
                .config()
                .duration_secs
                .saturating_sub(session.elapsed_ms() / 1000);
            format!("{remaining}s left")
        }
        Mode::Words => format!(
            "word {}/{}",
            (session.cursor().word + 1).min(session.passage().len().max(1)),
            session.passage().len()
        ),
    };
    let stats_line = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {}",
            metrics::format_wpm(metrics::wpm(stats.correct, session.elapsed_ms())),
            metrics::format_accuracy(metrics::accuracy(stats.correct, stats.typed)),
            progress,
        ),
        bold(),
    ))
    .alignment(Alignment::Center);
    stats_line.render(chunks[1], buf);

    let passage = Paragraph::new(Line::from(passage_spans(session)))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });
    passage.render(chunks[2], buf);
}

/// One span per passage character, styled by its typed outcome, plus the
/// configured cursor highlight.
fn passage_spans(session: &Session) -> Vec<Span<'static>> {
    let green_bold = bold().fg(Color::Green);
    let red_bold = bold().fg(Color::Red);
    let dim_bold = bold().add_modifier(Modifier::DIM);
    let caret_style = Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD);

    let config = session.config();
    let cursor = session.cursor();
    let mut spans = Vec::new();

    for (w, word) in session.passage().iter().enumerate() {
        let typed = &session.typed()[w];
        let word_len = word.chars().count();
        let on_cursor_word = w == cursor.word;

        for (i, expected) in word.chars().enumerate() {
            let at_cursor = on_cursor_word && i == cursor.char;
            if at_cursor && config.highlight_style == HighlightStyle::Caret {
                spans.push(Span::styled(CARET, caret_style));
            }

            let typed_char = typed.chars().nth(i);
            let mut style = match typed_char {
                Some(t) if t == expected => green_bold,
                Some(_) => red_bold,
                None => dim_bold,
            };
            match config.highlight_style {
                HighlightStyle::Character if at_cursor => {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                HighlightStyle::Word if on_cursor_word => {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                _ => {}
            }

            // A wrong keystroke can optionally show what was actually typed
            let display = match typed_char {
                Some(t) if t != expected && config.highlight_input_on_error => {
                    if t == ' ' {
                        '·'
                    } else {
                        t
                    }
                }
                _ => expected,
            };
            spans.push(Span::styled(display.to_string(), style));
        }

        if on_cursor_word
            && cursor.char >= word_len
            && config.highlight_style == HighlightStyle::Caret
        {
            spans.push(Span::styled(CARET, caret_style));
        }

        if w + 1 < session.passage().len() {
            spans.push(Span::styled(" ", dim_bold));
        }
    }
    spans
}

/// X (seconds) and Y (wpm) bounds for the results chart.
fn chart_params(series: &[WpmSample]) -> (f64, f64) {
    let highest_wpm = series.iter().map(|p| p.wpm).fold(0.0, f64::max);
    let overall_duration = series.last().map(|p| p.t as f64).unwrap_or(1.0).max(1.0);
    (overall_duration, highest_wpm.round())
}

fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // test settings
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
            Constraint::Length(1), // settings legend
        ])
        .split(area);

    let (overall_duration, highest_wpm) = chart_params(session.wpm_series());

    let points: Vec<(f64, f64)> = session.wpm_series().iter().map(|&p| p.into()).collect();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(format_label(overall_duration), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(format_label(highest_wpm), bold()),
                ]),
        );
    chart.render(chunks[0], buf);

    // Prefer the recorded result; an untouched timed-out session has none
    let stats = session.stats();
    let (wpm, accuracy, raw, net) = match &app.last_result {
        Some(r) => (r.wpm, r.accuracy, r.raw_wpm, r.net_wpm),
        None => (
            metrics::wpm(stats.correct, session.elapsed_ms()),
            metrics::accuracy(stats.correct, stats.typed),
            metrics::raw_wpm(stats.typed, session.elapsed_ms()),
            metrics::net_wpm(stats.correct, stats.incorrect, session.elapsed_ms()),
        ),
    };
    let stats_line = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} raw   {} net",
            metrics::format_wpm(wpm),
            metrics::format_accuracy(accuracy),
            metrics::format_wpm(raw),
            metrics::format_wpm(net),
        ),
        bold(),
    ))
    .alignment(Alignment::Center);
    stats_line.render(chunks[1], buf);

    let config = session.config();
    let test_detail = match config.mode {
        Mode::Time => format!("time {}s", config.duration_secs),
        Mode::Words => format!("words {}", config.words_target),
    };
    let settings_line = Paragraph::new(Span::styled(
        format!(
            "{} · {} list · {} highlight",
            test_detail, config.word_list, config.highlight_style
        ),
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    settings_line.render(chunks[2], buf);

    let legend = Paragraph::new(Span::styled(
        "(r)etry / (h)istory / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    legend.render(chunks[4], buf);

    let settings_legend = Paragraph::new(Span::styled(
        "(m)ode / (w)ord list / (g) highlight style",
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    settings_legend.render(chunks[5], buf);
}

fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // padding
            Constraint::Min(1),    // rows
            Constraint::Length(1), // aggregates
            Constraint::Length(1), // legend
        ])
        .split(area);

    let header = Paragraph::new(Span::styled("result history", bold()));
    header.render(chunks[0], buf);

    let visible = chunks[2].height as usize;
    let mut lines: Vec<Line> = Vec::new();
    if app.history.is_empty() {
        lines.push(Line::from(Span::styled(
            "no results yet — finish a test to record one",
            Style::default().add_modifier(Modifier::DIM),
        )));
    }
    for (i, result) in app.history.iter().enumerate().take(visible) {
        let detail = match result.mode {
            Mode::Time => format!("time {}s", result.duration.unwrap_or_default()),
            Mode::Words => format!("words {}", result.words_target.unwrap_or_default()),
        };
        let text = format!(
            "{:<24} {:>4} wpm  {:>5}% acc  {:<10} {}",
            humanized_age(result),
            metrics::format_wpm(result.wpm),
            metrics::format_accuracy(result.accuracy),
            detail,
            result.word_list,
        );
        let style = if i == app.history_selected {
            bold().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }
    Paragraph::new(lines).render(chunks[2], buf);

    let aggregates = Paragraph::new(Span::styled(
        format!(
            "{} tests · avg {} wpm · best {} wpm · avg acc {}%",
            app.history.len(),
            metrics::format_wpm(results::average_wpm(&app.history)),
            metrics::format_wpm(results::best_wpm(&app.history)),
            metrics::format_accuracy(results::average_accuracy(&app.history)),
        ),
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    ));
    aggregates.render(chunks[3], buf);

    let legend = Paragraph::new(Span::styled(
        "(up/down) select / (d)elete / (c)lear all / (b)ack / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    legend.render(chunks[4], buf);
}

fn humanized_age(result: &typometer::results::TypingResult) -> String {
    let age = (chrono::Utc::now() - result.timestamp)
        .to_std()
        .unwrap_or_default();
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}

#[cfg(test)]
mod tests {
    use super::*;
    use typometer::config::{Config, ConfigPatch};
    use typometer::session::KeyStroke;

    fn buffer_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "));
            }
            out.push('\n');
        }
        out
    }

    fn render_to_text(app: &App) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        buffer_text(&buf)
    }

    #[test]
    fn test_typing_screen_shows_live_stats() {
        let app = App::for_tests(Config::default());
        let text = render_to_text(&app);

        assert!(text.contains("wpm"));
        assert!(text.contains("% acc"));
        assert!(text.contains("s left"));
    }

    #[test]
    fn test_words_mode_shows_word_progress() {
        let config = Config {
            mode: Mode::Words,
            words_target: 10,
            ..Config::default()
        };
        let app = App::for_tests(config);
        let text = render_to_text(&app);

        assert!(text.contains("word 1/10"));
    }

    #[test]
    fn test_results_screen_shows_all_metrics() {
        let mut app = App::for_tests(Config {
            mode: Mode::Words,
            words_target: 2,
            ..Config::default()
        });
        for word in app.session.passage().to_vec() {
            for c in word.chars() {
                app.session.handle_key(KeyStroke::Char(c));
            }
        }
        app.observe_finish();
        assert_eq!(app.state, AppState::Results);

        let text = render_to_text(&app);
        assert!(text.contains("raw"));
        assert!(text.contains("net"));
        assert!(text.contains("(r)etry"));
    }

    #[test]
    fn test_history_screen_renders_empty_and_filled() {
        let mut app = App::for_tests(Config::default());
        app.open_history();
        let text = render_to_text(&app);
        assert!(text.contains("no results yet"));

        // Finish a quick words test and revisit
        app.apply_patch(ConfigPatch {
            mode: Some(Mode::Words),
            words_target: Some(2),
            ..ConfigPatch::default()
        });
        for word in app.session.passage().to_vec() {
            for c in word.chars() {
                app.session.handle_key(KeyStroke::Char(c));
            }
        }
        app.observe_finish();
        app.open_history();

        let text = render_to_text(&app);
        assert!(!text.contains("no results yet"));
        assert!(text.contains("1 tests"));
    }

    #[test]
    fn test_passage_spans_cover_every_character() {
        let app = App::for_tests(Config {
            mode: Mode::Words,
            words_target: 5,
            ..Config::default()
        });
        let spans = passage_spans(&app.session);
        let char_count: usize = app
            .session
            .passage()
            .iter()
            .map(|w| w.chars().count())
            .sum();
        // one span per character plus one separator between words
        assert_eq!(spans.len(), char_count + app.session.passage().len() - 1);
    }

    #[test]
    fn test_caret_style_adds_marker_span() {
        let app = App::for_tests(Config {
            mode: Mode::Words,
            words_target: 5,
            highlight_style: HighlightStyle::Caret,
            ..Config::default()
        });
        let spans = passage_spans(&app.session);
        assert!(spans.iter().any(|s| s.content == CARET));
    }

    #[test]
    fn test_chart_params() {
        assert_eq!(chart_params(&[]), (1.0, 0.0));
        let series = [WpmSample::new(1, 30.0), WpmSample::new(5, 62.2)];
        assert_eq!(chart_params(&series), (5.0, 62.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
