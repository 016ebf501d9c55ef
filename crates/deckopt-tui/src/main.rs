// Deck optimizer entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the card catalog
// 4. Build the deck service client and app state
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use deckopt_core::app::{self, AppState};
use deckopt_core::catalog::Catalog;
use deckopt_core::client::{DeckApi, HttpDeckClient};
use deckopt_core::config;
use deckopt_core::telemetry::{Telemetry, TracingTelemetry};
use deckopt_tui::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Deck optimizer starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!("Config loaded: deck service at {}", config.server.base_url);

    // 3. Load the card catalog
    let catalog = Catalog::load(Path::new(&config.catalog.path))
        .with_context(|| format!("failed to load card catalog {}", config.catalog.path))?;

    // 4. Build the deck service client and app state
    let api: Arc<dyn DeckApi> = Arc::new(HttpDeckClient::new(&config.server));
    let telemetry: Arc<dyn Telemetry> = Arc::new(TracingTelemetry);

    // 5. Create mpsc channels
    let (net_tx, net_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let app_state = AppState::new(config, catalog.clone(), api, telemetry, net_tx);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(net_rx, cmd_rx, ui_tx, app_state).await {
            error!("App loop error: {}", e);
        }
    });

    // 7. Run the TUI until the user quits
    if let Err(e) = tui::run(ui_rx, cmd_tx, catalog).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: in-flight requests are abandoned; their results have no
    // receiver once the app loop exits.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Deck optimizer shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("deckopt.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("deckopt_core=info,deckopt_tui=info,deckopt=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
