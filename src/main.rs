use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use lurk::api::ApiClient;
use lurk::app::{App, AppEvent};
use lurk::config::Config;
use lurk::form::FilterForm;
use lurk::ui;

/// Get the config directory path (~/.config/lurk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("lurk"))
}

#[derive(Parser, Debug)]
#[command(name = "lurk", about = "Terminal client for a self-hosted reddit reader")]
struct Args {
    /// Reader server base URL (overrides config file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Subreddit to open with (overrides config file)
    #[arg(long, value_name = "NAME")]
    subreddit: Option<String>,

    /// Maximum post age filter, passed to the server verbatim
    #[arg(long, value_name = "AGE")]
    age: Option<String>,

    /// Config file path (defaults to ~/.config/lurk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    let server_url = args.server.unwrap_or(config.server_url);

    // Connection pooling and a request ceiling; a toggle that outlives
    // the timeout takes the transport-failure path and stays optimistic.
    let http_client = reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .tcp_keepalive(std::time::Duration::from_secs(60))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let api = ApiClient::new(http_client, &server_url)
        .with_context(|| format!("Invalid server URL: {}", server_url))?;

    let mut form = FilterForm::new(
        args.subreddit.unwrap_or(config.subreddit),
        args.age.unwrap_or(config.max_age),
    );
    form.show_unread = config.show_unread;
    form.ignore_filtered = config.ignore_filtered;

    let mut app = App::new(api.clone(), form);

    // Initial feed load before entering the TUI; a failure is not fatal,
    // the feed can be reloaded interactively.
    match api.feed_more(&app.form.feed_params()).await {
        Ok(resp) if resp.success => {
            if let Some(html) = resp.html {
                app.replace_feed(html);
            }
        }
        Ok(_) => {
            tracing::warn!(server = %server_url, "Server refused initial feed request");
            app.set_status("Server refused initial feed request");
        }
        Err(e) => {
            tracing::warn!(error = %e, server = %server_url, "Initial feed load failed");
            app.set_status("Could not reach reader server - R to retry");
        }
    }

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;

    Ok(())
}
