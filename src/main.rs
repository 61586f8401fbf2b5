use std::path::Path;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

use call_explorer::config::ExplorerConfig;
use call_explorer::explorer::Explorer;
use call_explorer::telephony::webhook::webhook_routes;

/// Capacity of the notification queue between the listener and the explorer.
const EVENT_QUEUE_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ExplorerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  required: EXPLORER_API_TOKEN, OPENAI_API_KEY, EXPLORER_PHONE_NUMBER, EXPLORER_PUBLIC_URL");
        std::process::exit(1);
    });

    let _log_guard = init_tracing(&config.output_dir)?;

    eprintln!("📞 Call Explorer v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Target: {}", config.phone_number);
    eprintln!("   Model: {} (stt: {})", config.model, config.stt_model);
    eprintln!("   Webhook: {}", config.webhook_url());
    eprintln!("   Listening: http://0.0.0.0:{}", config.port);
    eprintln!("   Output: {}", config.output_dir.display());
    match config.max_calls {
        Some(max) => eprintln!("   Call budget: {max}"),
        None => eprintln!("   Call budget: unbounded"),
    }
    if let Some(seed) = &config.seed_tree {
        eprintln!("   Seed: {}", seed.display());
    }
    eprintln!();

    // Seed, collaborators, output directory
    let explorer = Explorer::from_config(&config).await?;

    // ── Inbound listener ──────────────────────────────────────────────────
    let (notifications_tx, notifications_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind webhook listener on port {}", config.port))?;
    let app = webhook_routes(notifications_tx);
    tokio::spawn(async move {
        tracing::info!("Webhook listener started");
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Webhook listener stopped");
        }
    });

    // First Ctrl-C → orderly termination with summary; second → exit now.
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down... (Ctrl-C again to exit immediately)");
            trigger.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Forced exit");
            std::process::exit(130);
        }
    });

    // ── Explore ───────────────────────────────────────────────────────────
    let summary = explorer.run(notifications_rx, shutdown).await;

    println!("\n{summary}\n");
    Ok(())
}

/// Log to stderr and to a daily-rolling file in the output directory.
fn init_tracing(output_dir: &Path) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(output_dir, "explorer.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}
