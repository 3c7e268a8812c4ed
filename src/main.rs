use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::env;
use std::path::PathBuf;
use std::{
    io,
    time::{Duration, Instant},
};
use vocab_assess::app::App;
use vocab_assess::config::load_config_from;
use vocab_assess::types::{AppMode, TestMode};
use vocab_assess::{Result, VocabAssessment, VocabError};

use tracing::{debug, error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn setup_logging() -> Result<()> {
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        "logs",
        "vocab_assess.log",
    );

    // RUST_LOG wins; otherwise debug builds log at debug, release at info
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .init();

    info!("Logging system initialized");
    debug!("Debug logging {}", if cfg!(debug_assertions) { "enabled" } else { "disabled" });

    Ok(())
}

fn parse_test_mode(arg: &str) -> Option<TestMode> {
    let arg = arg.trim_start_matches('-').to_lowercase();

    match arg.as_str() {
        "q" | "qu" | "qui" | "quic" | "quick" => Some(TestMode::Quick),
        "a" | "ad" | "ada" | "adap" | "adaptive" => Some(TestMode::Adaptive),
        "b" | "ba" | "ban" | "band" | "bands" => Some(TestMode::Bands),
        "h" | "hi" | "his" | "hist" | "history" => Some(TestMode::History),
        _ => None,
    }
}

struct Args {
    mode: TestMode,
    user_id: Option<String>,
    config: Option<PathBuf>,
    session: u32,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        mode: TestMode::Quick,
        user_id: None,
        config: None,
        session: 1,
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--user" | "-u" => args.user_id = iter.next(),
            "--config" | "-c" => args.config = iter.next().map(PathBuf::from),
            "--session" | "-s" => {
                let value = iter.next().unwrap_or_default();
                args.session = value
                    .parse()
                    .map_err(|_| VocabError::InvalidConfig(format!("invalid session number '{value}'")))?;
            }
            other => match parse_test_mode(other) {
                Some(mode) => {
                    info!("Selected {:?} mode from argument '{}'", mode, other);
                    args.mode = mode;
                }
                None => warn!("Ignoring unknown argument '{}'", other),
            },
        }
    }

    Ok(args)
}

fn main() -> Result<()> {
    setup_logging()?;
    info!("Starting vocabulary assessment");

    let args = parse_args()?;
    let config = load_config_from(args.config.as_deref())?;
    let engine = VocabAssessment::new(config)?;

    // Validate before touching the terminal so the error is readable.
    if args.mode == TestMode::Bands {
        let max = engine.layout().sessions();
        if args.session < 1 || args.session > max {
            let err = VocabError::InvalidSession { session: args.session, max };
            error!("{}", err);
            return Err(err);
        }
    }

    let user_id = args.user_id.unwrap_or_else(|| {
        let id = uuid::Uuid::new_v4().to_string();
        println!("No --user given, results are saved under {}", id);
        id
    });

    let mut app = App::new(engine, args.mode, user_id);
    app.set_first_session(args.session);
    app.start()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(250);
    let res = run_app(&mut terminal, &mut app, tick_rate);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {}", err);
        println!("Error: {}", err);
    }

    if let Some(result) = &app.state.last_result {
        println!(
            "Estimated vocabulary: {} words ({}), confidence {}%",
            result.vocabulary_size, result.cefr_level, result.confidence
        );
    }
    if let Some(estimate) = &app.state.last_estimate {
        println!("Estimated vocabulary: {} words", estimate.total_vocab_size);
    }

    info!("Application terminated");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Right => {
                        if app.state.mode == AppMode::Asking {
                            app.answer(true)?;
                        }
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Left => {
                        if app.state.mode == AppMode::Asking {
                            app.answer(false)?;
                        }
                    }
                    KeyCode::Enter => {
                        app.handle_enter()?;
                    }
                    KeyCode::Esc => {
                        app.should_quit = true;
                    }
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
