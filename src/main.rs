use anyhow::{Context, Result};
use file_explorer::app::{self, opener::SystemOpener, state::AppState};
use file_explorer::config::{self, AppConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Serves JSON-lines requests on stdin and writes one response line per
/// request to stdout. Logs go to stderr.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });
    let timeout = Duration::from_secs(config.command_timeout_secs.max(1));
    let config_dir = config::settings::get_config_directory();

    let state = AppState::new(config, config_dir);
    tracing::info!("Session started in {}", state.current_path.display());
    let state = Arc::new(Mutex::new(state));
    let opener: Arc<dyn app::opener::Opener> = Arc::new(SystemOpener);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read request from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }
        let response = app::dispatch(line, state.clone(), opener.clone(), timeout).await;
        let mut encoded = serde_json::to_string(&response).context("Failed to encode response")?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("Input closed. Saving final session state...");
    let state_guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let saved = config::settings::save_config(&state_guard.config, state_guard.config_dir.as_deref());
    if let Err(e) = saved {
        tracing::error!("Failed to save config on exit: {}", e);
    }
    Ok(())
}
