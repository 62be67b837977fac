pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod moderation;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, cmd_restore_reputation, cmd_score_text};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        api::observability::describe_metrics();
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, prometheus_handle).await,
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Created config.toml");
            } else {
                println!("config.toml already exists, leaving it unchanged");
            }
            Ok(())
        }
        Commands::Restore { username } => cmd_restore_reputation(&config, &username).await,
        Commands::Score { text } => cmd_score_text(&config, &text.join(" ")).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key, value)?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("gramguard v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;

    if api_state.classifier().is_degraded() {
        warn!("Bullying classifier is degraded; every comment will score 0.0");
    }

    let app = api::router(api_state).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
