//! tubefilter-host - runs the background coordinator over stdio.
//!
//! A host shim feeds newline-delimited JSON events on stdin and executes the
//! actions written to stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubefilter::config::BackendKind;
use tubefilter::host::stdio::{self, StdioHost};
use tubefilter::{
    Background, BackgroundConfig, CommandRouter, Config, SettingsRegistry, TabEventRouter,
};

#[derive(Parser)]
#[command(name = "tubefilter-host")]
#[command(about = "Background coordinator for the tubefilter extension", long_about = None)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keep settings in memory only
    #[arg(long)]
    memory: bool,

    /// Print the default filter settings as JSON and exit
    #[arg(long)]
    print_defaults: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load(),
    };
    if cli.memory {
        config.storage.backend = BackendKind::Memory;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = Arc::new(SettingsRegistry::standard());

    if cli.print_defaults {
        println!("{}", serde_json::to_string_pretty(&registry.filter_defaults())?);
        return Ok(());
    }

    let store = config
        .storage
        .open_store(registry)
        .context("opening settings storage")?;
    tracing::info!(backend = ?config.storage.backend, "settings storage ready");

    let (host, actions) = StdioHost::new();
    let router = TabEventRouter::new(CommandRouter::new(store), Arc::new(host));
    let (background, handle) = Background::new(
        router,
        BackgroundConfig {
            channel_capacity: config.events.channel_capacity,
        },
    );

    let writer = tokio::spawn(stdio::write_actions(actions, tokio::io::stdout()));
    let event_loop = tokio::spawn(background.run());

    let reader_handle = handle.clone();
    stdio::read_events(BufReader::new(tokio::io::stdin()), |event| {
        let handle = reader_handle.clone();
        async move { handle.dispatch(event).await.is_ok() }
    })
    .await
    .context("reading host events")?;

    tracing::info!("host closed stdin, shutting down");
    // The loop may already be gone if it stopped on its own.
    let _ = handle.shutdown().await;
    drop(handle);
    drop(reader_handle);

    let stats = event_loop.await.context("event loop task")?;
    tracing::debug!(?stats, "final counters");

    writer.await.context("writer task")??;
    Ok(())
}
