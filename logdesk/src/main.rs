//! logdesk - LogCollector operations console
//!
//! Terminal UI for triaging logs and incidents, curating the knowledge base,
//! and exercising the backend.

mod app;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use logdesk_core::{ApiClient, Config};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        logdesk_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(api = %config.api.base_url, "logdesk TUI starting up");

    let client = ApiClient::new(&config.api).context("invalid API configuration")?;
    let mut app = App::new(Arc::new(client), config).context("failed to start request runtime")?;
    app.start();

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("logdesk TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply finished requests and drive live refresh
        app.tick();

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Windows reports releases too
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
