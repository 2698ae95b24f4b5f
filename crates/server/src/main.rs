//! studyhall daemon: migrates the store, seeds seats and runs the lockout sweep.

use std::sync::Arc;
use std::time::Duration;

use studyhall_common::{Config, SystemClock, config::LoggingConfig};
use studyhall_core::{AccessService, MembershipEngine};
use tokio::{signal, time::MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(logging: LoggingConfig) {
    let fmt_layer = if logging.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyhall=debug,sea_orm=info".into()),
        )
        .init();
}

/// Run the lockout sweep every `period` until the task is dropped.
async fn run_sweeps(access: AccessService, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = access.sweep().await {
            error!(error = %e, code = e.error_code(), "Lockout sweep failed");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;
    init_tracing(config.logging);

    info!("Starting studyhall daemon...");

    // Connect to database
    let db = studyhall_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    studyhall_db::migrate(&db).await?;
    info!("Migrations completed");

    let engine = MembershipEngine::new(Arc::new(db), &config, Arc::new(SystemClock));

    let seeded = engine.seats.seed_if_empty(&config.seats).await?;
    if seeded > 0 {
        info!(seats = seeded, "Seeded seat inventory");
    }

    let violations = engine.seats.audit().await?;
    for violation in &violations {
        warn!(?violation, "Seat map inconsistency");
    }

    let sweeper = if config.sweep.enabled {
        let period = Duration::from_secs(config.sweep.interval_secs.max(1));
        info!(interval_secs = period.as_secs(), "Starting lockout sweep");
        Some(tokio::spawn(run_sweeps(engine.access.clone(), period)))
    } else {
        info!("Lockout sweep disabled");
        None
    };

    shutdown_signal().await;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("Shutdown complete");

    Ok(())
}
