use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobflow::api::{self, ApiState};
use jobflow::config::Config;
use jobflow::db;
use jobflow::jobs::{JobRunner, JobsRepo, RunnerConfig};
use jobflow::notify::WebhookNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the filter below reads RUST_LOG.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobflow=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env();
    tracing::info!(
        listen_addr = %cfg.listen_addr,
        database_url = %cfg.database_url,
        webhook_configured = cfg.webhook_url.is_some(),
        run_delay_ms = cfg.run_delay_ms,
        "Loaded configuration"
    );

    let pool = db::make_pool(&cfg.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let jobs = JobsRepo::new(pool);
    let notifier = WebhookNotifier::new(cfg.webhook_url.clone());
    let runner = JobRunner::new(
        jobs.clone(),
        notifier,
        RunnerConfig {
            completion_delay: Duration::from_millis(cfg.run_delay_ms),
        },
    );

    let app = api::router(ApiState {
        jobs,
        runner: runner.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop outstanding completion timers before the runtime unwinds.
    let dropped = runner.abort_pending();
    if dropped > 0 {
        tracing::warn!(dropped, "Shutdown dropped scheduled completions");
    }
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
