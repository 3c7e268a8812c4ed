use crate::engine::VocabAssessment;
use crate::error::Result;
use crate::scoring::ordered_proportions;
use crate::types::*;
use ratatui::layout::Alignment;
use ratatui::widgets::{Axis, Row, Table};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};
use tracing::{debug, info};

pub struct App {
    pub state: AppState,
    pub engine: VocabAssessment,
    pub should_quit: bool,
    first_session: u32,
}

impl App {
    pub fn new(engine: VocabAssessment, test_mode: TestMode, user_id: String) -> Self {
        Self {
            state: AppState::new(test_mode, user_id),
            engine,
            should_quit: false,
            first_session: 1,
        }
    }

    pub fn set_first_session(&mut self, session: u32) {
        self.first_session = session;
    }

    pub fn start(&mut self) -> Result<()> {
        self.state.answers.clear();
        self.state.history = self.engine.get_user_history(&self.state.user_id)?;

        match self.state.test_mode {
            TestMode::Quick => {
                let num_words = self.engine.config().quick.num_words;
                let test = self.engine.generate_quick_test(num_words);
                info!(test_id = test.test_id, words = test.words.len(), "Starting quick test");
                self.state.active = Some(ActiveTest::Quick { test, position: 0 });
            }
            TestMode::Adaptive => {
                let adaptive = &self.engine.config().adaptive;
                let state = self
                    .engine
                    .generate_adaptive_test(&adaptive.initial_level, adaptive.max_questions)?;
                info!(test_id = state.test_id, "Starting adaptive test");
                self.state.active = Some(ActiveTest::Adaptive { state, position: 0 });
            }
            TestMode::Bands => {
                self.start_band_session(self.first_session)?;
            }
            TestMode::History => {
                self.state.mode = AppMode::Finished;
                return Ok(());
            }
        }

        if self.current_word().is_none() {
            self.state.status = Some("No words available for this test".to_string());
            self.state.mode = AppMode::Finished;
        }
        Ok(())
    }

    fn start_band_session(&mut self, session: u32) -> Result<()> {
        let words = self.engine.get_test_words(session)?;
        info!(session, words = words.len(), "Starting band test session");
        self.state.active = Some(ActiveTest::Bands {
            session,
            words,
            position: 0,
        });
        Ok(())
    }

    pub fn current_word(&self) -> Option<&str> {
        match self.state.active.as_ref()? {
            ActiveTest::Quick { test, position } => test.words.get(*position).map(|w| w.word.as_str()),
            ActiveTest::Adaptive { state, position } => {
                if state.complete {
                    None
                } else {
                    state.words.get(*position).map(|w| w.word.as_str())
                }
            }
            ActiveTest::Bands { words, position, .. } => words.get(*position).map(|w| w.word.as_str()),
        }
    }

    pub fn progress(&self) -> Option<(usize, usize)> {
        match self.state.active.as_ref()? {
            ActiveTest::Quick { test, position } => Some((position + 1, test.words.len())),
            ActiveTest::Adaptive { state, position } => Some((position + 1, state.max_questions)),
            ActiveTest::Bands { words, position, .. } => Some((position + 1, words.len())),
        }
    }

    pub fn handle_enter(&mut self) -> Result<()> {
        match self.state.mode {
            AppMode::Initial => {
                if self.current_word().is_some() {
                    self.state.mode = AppMode::Asking;
                }
            }
            AppMode::Asking => {}
            AppMode::Finished => {
                if let Some(ActiveTest::Bands { session, .. }) = self.state.active {
                    if session < self.engine.layout().sessions() {
                        self.start_band_session(session + 1)?;
                        if self.current_word().is_some() {
                            self.state.mode = AppMode::Asking;
                        }
                        return Ok(());
                    }
                }
                self.should_quit = true;
            }
        }
        Ok(())
    }

    pub fn answer(&mut self, known: bool) -> Result<()> {
        if self.state.mode != AppMode::Asking {
            return Ok(());
        }
        let Some(word) = self.current_word().map(str::to_string) else {
            return Ok(());
        };
        debug!(word = %word, known, "Answer");

        let mut finished = false;
        match self.state.active.as_mut() {
            Some(ActiveTest::Quick { test, position }) => {
                self.state.answers.insert(word, known);
                *position += 1;
                finished = *position >= test.words.len();
            }
            Some(ActiveTest::Adaptive { state, position }) => {
                self.state.answers.insert(word, known);
                if *position + 1 < state.words.len() {
                    // Still working through the opening words.
                    *position += 1;
                } else {
                    self.engine.next_adaptive_question(state, known)?;
                    if state.complete {
                        finished = true;
                    } else {
                        *position = state.next_question_index;
                    }
                }
            }
            Some(ActiveTest::Bands { session, words, position }) => {
                let band = words[*position].band;
                self.state
                    .band_answers
                    .entry(*session)
                    .or_default()
                    .push(AnswerRecord::new(word, band, known));
                *position += 1;
                finished = *position >= words.len();
            }
            None => {}
        }

        if finished {
            self.finish()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let result = match self.state.active.as_ref() {
            Some(ActiveTest::Quick { test, .. }) => {
                Some(self.engine.score_quick_test(test, &self.state.answers))
            }
            Some(ActiveTest::Adaptive { state, .. }) => {
                Some(self.engine.score_adaptive_test(state, &self.state.answers))
            }
            Some(ActiveTest::Bands { .. }) => {
                let estimate = self.engine.calculate_vocab_size(&self.state.band_answers);
                info!(
                    sessions = self.state.band_answers.len(),
                    total_vocab_size = estimate.total_vocab_size,
                    "Band test estimate"
                );
                self.state.last_estimate = Some(estimate);
                None
            }
            None => None,
        };

        if let Some(result) = result {
            self.state.history = self.engine.save_result(&self.state.user_id, result.clone())?;
            self.state.last_result = self.state.history.results.last().cloned().or(Some(result));
        }
        self.state.mode = AppMode::Finished;
        Ok(())
    }

    pub fn render(&self, f: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(10),  // Title and progress
                Constraint::Percentage(40),  // Current word or result
                Constraint::Percentage(45),  // History or band breakdown
                Constraint::Percentage(5),   // Help information
            ])
            .split(f.area());

        self.render_header(f, main_chunks[0]);
        match self.state.mode {
            AppMode::Finished => self.render_result(f, main_chunks[1]),
            _ => self.render_word(f, main_chunks[1]),
        }
        match self.state.test_mode {
            TestMode::Bands => self.render_band_results(f, main_chunks[2]),
            _ => self.render_history_chart(f, main_chunks[2]),
        }
        self.render_help(f, main_chunks[3]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let title = match self.state.test_mode {
            TestMode::Quick => "Quick test",
            TestMode::Adaptive => "Adaptive test",
            TestMode::Bands => "Frequency band test",
            TestMode::History => "History",
        };
        let mut spans = vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))];
        if let Some(ActiveTest::Bands { session, .. }) = &self.state.active {
            spans.push(Span::raw(format!("  session {}/{}", session, self.engine.layout().sessions())));
        }
        if let (AppMode::Asking, Some((current, total))) = (self.state.mode, self.progress()) {
            spans.push(Span::raw(format!("  question {} of {}", current, total)));
        }
        spans.push(Span::styled(
            format!("  user {}", self.state.user_id),
            Style::default().fg(Color::Gray),
        ));

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_word(&self, f: &mut Frame, area: Rect) {
        let text = match self.state.mode {
            AppMode::Initial => "Press Enter to start",
            _ => self.current_word().unwrap_or("Loading..."),
        };

        let block = Block::default()
            .title("Do you know this word?")
            .borders(Borders::ALL);

        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled(text, Style::default().fg(Color::Cyan))
        ]))
        .block(block)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD));

        f.render_widget(paragraph, area);
    }

    fn render_result(&self, f: &mut Frame, area: Rect) {
        let mut text = Vec::new();
        if let Some(status) = &self.state.status {
            text.push(Line::from(Span::styled(status.as_str(), Style::default().fg(Color::Yellow))));
        }

        if let Some(result) = &self.state.last_result {
            text.push(Line::from(vec![
                Span::raw("Estimated vocabulary: "),
                Span::styled(
                    format!("{} words", result.vocabulary_size),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
            ]));
            text.push(Line::from(format!("Level: {}", result.cefr_level)));
            text.push(Line::from(format!("Confidence: {}%", result.confidence)));
            text.push(Line::from(""));
            for (level, proportion) in ordered_proportions(self.engine.scale(), result) {
                text.push(Line::from(format!("  {:<4} {:>5.1}%", level, proportion * 100.0)));
            }
        }

        if let Some(estimate) = &self.state.last_estimate {
            text.push(Line::from(vec![
                Span::raw("Estimated vocabulary: "),
                Span::styled(
                    format!("{} words", estimate.total_vocab_size),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
            ]));
            text.push(Line::from(format!(
                "Based on {} completed session(s)",
                self.state.band_answers.len()
            )));
        }

        if let (Some(size), Some(level)) = (
            self.state.history.average_vocabulary_size,
            self.state.history.average_cefr_level.as_ref(),
        ) {
            text.push(Line::from(""));
            text.push(Line::from(format!(
                "Recent average: {} words ({}) over {} test(s)",
                size,
                level,
                self.state.history.results.len()
            )));
        } else if self.state.test_mode == TestMode::History {
            text.push(Line::from("No saved results yet"));
        }

        let paragraph = Paragraph::new(text)
            .block(Block::default().title("Result").borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_history_chart(&self, f: &mut Frame, area: Rect) {
        let points: Vec<(f64, f64)> = self
            .state
            .history
            .results
            .iter()
            .enumerate()
            .map(|(idx, r)| (idx as f64 + 1.0, f64::from(r.vocabulary_size)))
            .collect();

        let block = Block::default()
            .title("Vocabulary Size History")
            .borders(Borders::ALL);
        if points.is_empty() {
            f.render_widget(Paragraph::new("No history yet").block(block), area);
            return;
        }

        let y_max = points.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(100.0) * 1.1;
        let y_step = y_max / 5.0;
        let y_labels: Vec<Span> = (0..=5)
            .map(|i| Span::from(format!("{:.0}", y_step * i as f64)))
            .collect();

        let x_max = points.len() as f64 + 1.0;
        let x_labels: Vec<Span> = (0..=4)
            .map(|i| Span::from(format!("{:.0}", x_max * i as f64 / 4.0)))
            .collect();

        let dataset = Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Test")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("Words")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, y_max])
                    .labels(y_labels),
            );

        f.render_widget(chart, area);
    }

    fn render_band_results(&self, f: &mut Frame, area: Rect) {
        let block = Block::default().title("By Frequency Band").borders(Borders::ALL);
        let Some(estimate) = &self.state.last_estimate else {
            f.render_widget(Paragraph::new("Finish a session to see results").block(block), area);
            return;
        };

        let header = Row::new(vec!["Band", "Ranks", "Known", "%", "Estimate"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = estimate
            .band_results
            .iter()
            .map(|band| {
                let color = if band.percentage >= 80.0 {
                    Color::Green
                } else if band.percentage >= 50.0 {
                    Color::Yellow
                } else {
                    Color::Red
                };
                Row::new(vec![
                    band.band.to_string(),
                    band.range.clone(),
                    format!("{}/{}", band.known, band.tested),
                    format!("{:.1}", band.percentage),
                    band.estimated_known.to_string(),
                ])
                .style(Style::default().fg(color))
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(13),
                Constraint::Length(8),
                Constraint::Length(7),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(block);

        f.render_widget(table, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help = match self.state.mode {
            AppMode::Initial => "Enter to start | ESC to quit",
            AppMode::Asking => "y / → known | n / ← unknown | ESC to quit",
            AppMode::Finished => match &self.state.active {
                Some(ActiveTest::Bands { session, .. }) if *session < self.engine.layout().sessions() => {
                    "Enter for the next session | ESC to quit"
                }
                _ => "Enter or ESC to quit",
            },
        };

        let help = Paragraph::new(Line::from(vec![Span::raw(help)]))
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(help, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssessmentConfig;
    use crate::corpus::FrequencyCorpus;
    use crate::levels::WordPool;

    fn app(test_mode: TestMode, corpus_words: usize) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AssessmentConfig {
            data_dir: dir.path().to_path_buf(),
            ..AssessmentConfig::default()
        };
        config.bands.total_words = 300;
        config.quick.num_words = 18;
        config.adaptive.max_questions = 8;

        let corpus = FrequencyCorpus::from_words((1..=corpus_words).map(|i| format!("w{i}")));
        let engine = VocabAssessment::with_parts(config, corpus, WordPool::builtin()).unwrap();
        let mut app = App::new(engine, test_mode, "tester".to_string());
        app.start().unwrap();
        app.handle_enter().unwrap();
        (dir, app)
    }

    #[test]
    fn quick_test_runs_to_a_saved_result() {
        let (_dir, mut app) = app(TestMode::Quick, 0);
        assert_eq!(app.state.mode, AppMode::Asking);
        assert_eq!(app.progress(), Some((1, 18)));

        while app.state.mode == AppMode::Asking {
            app.answer(true).unwrap();
        }

        let result = app.state.last_result.as_ref().unwrap();
        assert_eq!(result.vocabulary_size, 31_500);
        assert_eq!(app.state.history.results.len(), 1);
        assert_eq!(app.engine.get_user_history("tester").unwrap().results.len(), 1);
    }

    #[test]
    fn adaptive_test_asks_opening_words_then_adapts() {
        let (_dir, mut app) = app(TestMode::Adaptive, 0);
        for _ in 0..5 {
            app.answer(true).unwrap();
        }
        match &app.state.active {
            Some(ActiveTest::Adaptive { state, position }) => {
                assert_eq!(state.words.len(), 6);
                assert_eq!(*position, 5);
                assert_eq!(state.words[5].level, "B2");
            }
            other => panic!("unexpected test {other:?}"),
        }

        while app.state.mode == AppMode::Asking {
            app.answer(false).unwrap();
        }
        assert!(app.state.last_result.is_some());
        assert_eq!(app.state.answers.len(), 8);
    }

    #[test]
    fn band_sessions_chain_and_pool_answers() {
        let (_dir, mut app) = app(TestMode::Bands, 300);
        while app.state.mode == AppMode::Asking {
            app.answer(true).unwrap();
        }
        let first = app.state.last_estimate.clone().unwrap();
        assert_eq!(first.total_vocab_size, 300);

        app.handle_enter().unwrap();
        assert_eq!(app.state.mode, AppMode::Asking);
        while app.state.mode == AppMode::Asking {
            app.answer(false).unwrap();
        }
        let pooled = app.state.last_estimate.as_ref().unwrap();
        assert_eq!(app.state.band_answers.len(), 2);
        assert_eq!(pooled.band_results[0].tested, 20);
        assert_eq!(pooled.total_vocab_size, 150);
    }

    #[test]
    fn empty_corpus_finishes_immediately() {
        let (_dir, app) = app(TestMode::Bands, 0);
        assert_eq!(app.state.mode, AppMode::Finished);
        assert!(app.state.status.is_some());
    }
}
