//! appkit-web - HTTP service running the application request pipeline

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use appkit_common::config::{AppConfig, CliOverrides};
use appkit_common::{Catalog, I18n};
use appkit_web::session::spawn_purge_task;
use appkit_web::{build_router, AppState};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Command-line arguments for appkit-web
#[derive(Parser, Debug)]
#[command(name = "appkit-web")]
#[command(about = "Web application service with locale-aware request pipeline")]
#[command(version)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5790
    #[arg(short, long)]
    bind: Option<String>,

    /// Path to config.toml
    #[arg(short, long, env = "APPKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of <locale>.toml translation files
    #[arg(long)]
    locales_dir: Option<PathBuf>,

    /// Default locale, must be one of the available locales
    #[arg(long)]
    default_locale: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cli = CliOverrides {
        bind_address: args.bind,
        config_file: args.config,
        locales_dir: args.locales_dir,
        default_locale: args.default_locale,
    };

    // Config loading logs before the real subscriber (and its level) exists
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, || AppConfig::resolve(cli))
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting appkit-web v{} on {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_address
    );
    info!(
        "Locales: [{}], default '{}'",
        config.locale.available_locales().join(", "),
        config.locale.default_locale()
    );

    let mut catalog = Catalog::builtin().context("Failed to load built-in translations")?;
    if let Some(dir) = &config.locales_dir {
        catalog
            .load_dir(dir)
            .with_context(|| format!("Failed to load translations from {}", dir.display()))?;
    }

    let state = AppState::new(I18n::new(config.locale.clone(), catalog));
    spawn_purge_task(state.sessions.clone(), SESSION_PURGE_INTERVAL);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .context("Failed to bind to address")?;
    info!("appkit-web listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
