use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;

use quill::app::App;
use quill::config::Config;
use quill::services::analysis::HttpProvider;
use quill::services::store::JsonFileStore;
use quill::services::tracing_setup;

/// A terminal-based prose editor with inline style analysis and
/// AI-assisted edits
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Document file (JSON snapshot; created on first save)
    file: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Analysis provider base URL (overrides the config)
    #[arg(long)]
    provider_url: Option<String>,
}

fn default_document_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("story.json")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args
        .log_file
        .unwrap_or_else(tracing_setup::default_log_path);
    tracing_setup::init_global(&log_path)?;

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(url) = args.provider_url {
        config.provider.base_url = url;
    }

    let document_path = args.file.unwrap_or_else(default_document_path);
    tracing::info!(
        "starting quill: document {}, provider {}",
        document_path.display(),
        config.provider.base_url
    );

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let provider = Arc::new(HttpProvider::new(
        config.provider.base_url.clone(),
        config.provider.timeout_secs,
    ));
    let store = Box::new(JsonFileStore::new(document_path));

    let mut app = App::new(config, provider, store, runtime.handle().clone())?;

    let mut terminal = ratatui::init();
    execute!(io::stdout(), EnableMouseCapture).context("enabling mouse capture")?;

    let result = run(&mut terminal, &mut app);

    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}

/// The single UI loop: draw, poll for input with a short timeout so
/// provider completions get drained promptly, repeat.
fn run(terminal: &mut ratatui::DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        if crossterm::event::poll(Duration::from_millis(50))? {
            let event = crossterm::event::read()?;
            app.handle_event(event);
        }
        app.on_tick();

        if app.should_quit() {
            tracing::info!("quit requested");
            return Ok(());
        }
    }
}
