use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use cascade_server::config::{loader, watcher::ConfigWatcher, ServerConfig};
use cascade_server::http::HttpServer;
use cascade_server::lifecycle::{signals, Shutdown};
use cascade_server::net;
use cascade_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cascade-server")]
#[command(about = "Filesystem-pipeline web server", long_about = None)]
struct Cli {
    /// Path to the server configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the web root directory.
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(root) = cli.root {
        config.pipeline.web_root = root;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("cascade-server v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        web_root = %config.pipeline.web_root.display(),
        stage_timeout_secs = config.timeouts.stage_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Watch the config file for hot reload when one was given. The watcher
    // handle must stay alive for the watch to keep running.
    let (config_updates, _watcher_handle) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (rx, Some(watcher.run()?))
        }
        None => {
            let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let listener = net::listener::bind(&config.listener).await?;

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_listener(shutdown.clone());
    let server_shutdown = shutdown.subscribe();

    let server = HttpServer::new(config);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
