//! Green Garden High Story terminal client.
//!
//! A vim-style chat interface for the Green Garden High Story game server.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripts:
//!
//! ```bash
//! echo "Hi there" | greengarden --headless --server http://127.0.0.1:5000
//! ```

mod app;
mod cli;
mod events;
mod headless;
mod ui;

use std::fs::File;
use std::io::{self, stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use greengarden_api::GameClient;
use greengarden_core::{Controller, GameBackend};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

/// Redraw often enough for the 50 ms reveal and the tweens.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const DEFAULT_LOG_DIRECTIVE: &str = "greengarden=info,greengarden_core=info,greengarden_api=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = cli::parse();
    init_logging(&args.log_file, args.log_level.as_deref())?;

    let client = Arc::new(GameClient::with_config(args.client_config())?);
    info!(server = client.base_url(), "client configured");

    if args.headless {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        return headless::run_headless(client, stdin.lock(), &mut stdout).await;
    }

    let controller = Controller::new(Arc::clone(&client))
        .with_portrait_base(client.base_url())
        .with_layout(args.layout());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(controller)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!("terminal loop failed: {e}");
        eprintln!("Error: {e}");
    }

    Ok(())
}

/// `--log-level`, then `RUST_LOG`, then the crate defaults.
fn log_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Send logs to a file; the terminal belongs to the UI.
fn init_logging(path: &Path, level: Option<&str>) -> io::Result<()> {
    let filter = log_filter(level);
    let file = File::options().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_app<B, G>(terminal: &mut Terminal<B>, mut app: App<G>) -> io::Result<()>
where
    B: ratatui::backend::Backend,
    G: GameBackend,
{
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    loop {
        app.tick(Instant::now());
        terminal.draw(|f| render(f, &app, Instant::now()))?;

        if event::poll(FRAME_INTERVAL)? {
            let ev = event::read()?;
            if handle_event(&mut app, ev, Instant::now()) == EventResult::Quit {
                return Ok(());
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
