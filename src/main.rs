use std::sync::Arc;
use anyhow::Result;
use clap::{Parser, Subcommand};
use furnish_core::{Config, HttpBackend};
use tracing::{info, warn};

mod app;
mod cli;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "furnish", version)]
#[command(about = "Chat with the AI furniture recommender and browse catalog analytics")]
struct Cli {
    /// Backend base URL (overrides FURNISH_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,
    /// Ask for recommendations once and print them
    Ask {
        /// What you are looking for, e.g. "leather sofa for a small apartment"
        prompt: String,
    },
    /// Print the catalog analytics dashboard
    Analytics,
    /// Check that the backend is up
    Status,
    /// Show the settings in effect, or save new ones
    Config {
        /// Save a new backend base URL
        #[arg(long)]
        set_url: Option<String>,
        /// Save a request timeout in seconds (0 for the transport default)
        #[arg(long)]
        set_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    logging::init(matches!(command, Commands::Tui))?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    let api_url = config.resolve_api_url(cli.api_url.as_deref());

    match command {
        Commands::Tui => run_tui(build_backend(&config, &api_url)?, api_url).await,
        Commands::Ask { prompt } => cli::ask(&build_backend(&config, &api_url)?, &prompt).await,
        Commands::Analytics => cli::analytics(&build_backend(&config, &api_url)?).await,
        Commands::Status => cli::status(&build_backend(&config, &api_url)?).await,
        Commands::Config { set_url, set_timeout } => {
            cli::config(cli.api_url.as_deref(), set_url, set_timeout)
        }
    }
}

fn build_backend(config: &Config, api_url: &str) -> Result<HttpBackend> {
    let backend = match config.request_timeout() {
        Some(timeout) => HttpBackend::with_timeout(api_url, timeout)?,
        None => HttpBackend::new(api_url),
    };
    Ok(backend)
}

async fn run_tui(backend: HttpBackend, api_url: String) -> Result<()> {
    info!(%api_url, "starting furnish");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(Arc::new(backend), api_url);
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
        app.poll_tasks().await;
    }
    Ok(())
}
