use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use klinegate::{AppState, Kline, ServiceConfig, VendorConnector as _, VendorKind, router};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Candlestick bar gateway for the charting front-end")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Listening port; overrides the file.
    #[arg(long)]
    port: Option<u16>,
    /// Vendor backing the service; overrides the file.
    #[arg(long)]
    vendor: Option<VendorKind>,
    /// Front-end bundle directory; overrides the file.
    #[arg(long, value_name = "DIR")]
    web_root: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ServiceConfig::default(),
    };
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    if let Some(vendor) = cli.vendor {
        cfg.vendor = vendor;
    }
    if let Some(dir) = &cli.web_root {
        cfg.web_root.clone_from(dir);
    }
    Ok(cfg)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,klinegate=debug")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    let connector = klinegate::connector_from_config(&cfg)?;
    tracing::info!(connector = %connector.key(), "connector ready");
    let engine = klinegate::engine_from_config(&cfg)?;
    let kline = Kline::builder()
        .with_connector(connector)
        .engine(engine)
        .analysis(cfg.analysis.clone())
        .bar_count(cfg.bar_count)
        .fetch_timeout(Duration::from_secs(cfg.http_timeout_secs))
        .build()?;

    let state = Arc::new(AppState {
        kline,
        web_root: cfg.web_root.clone(),
    });
    let app = router(state);

    let addr = format!("{}:{}", cfg.bind, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, vendor = ?cfg.vendor, web_root = %cfg.web_root.display(), "serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
