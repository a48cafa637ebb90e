// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc};

use sns_server::{
    alarm::{AlarmDispatcher, AlarmWorker, DeliveryMode, DeliveryReport},
    api::router,
    auth::{PasswordEncoder, TokenCodec},
    config::AppConfig,
    state::AppState,
    storage::Store,
    telemetry::init_tracing,
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);
    info!(?config, "Starting SNS server");

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server stopped with error");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(Store::open_in(&config.data_dir)?);
    info!(data_dir = %config.data_dir.display(), "Database opened");

    let shutdown = CancellationToken::new();

    let (alarms, worker): (AlarmDispatcher, Option<JoinHandle<DeliveryReport>>) = match config.alarm_delivery {
        DeliveryMode::Inline => (AlarmDispatcher::inline(store.clone()), None),
        DeliveryMode::Queued => {
            let (dispatcher, receiver) = AlarmDispatcher::queued(store.clone());
            let worker = AlarmWorker::new(store.clone(), receiver, config.alarm_max_attempts);
            let handle = tokio::spawn(worker.run(shutdown.clone()));
            info!(max_attempts = config.alarm_max_attempts, "Alarm worker started");
            (dispatcher, Some(handle))
        }
    };

    let tokens = TokenCodec::new(&config.jwt_secret, config.token_ttl);
    let state = AppState::new(store, tokens, PasswordEncoder::default(), alarms)
        .with_dev_routes(config.dev_routes);
    if config.dev_routes {
        warn!("Developer routes enabled under /api-dev/v1");
    }
    let app = router(state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "Listening (docs at /docs)");

    let signal = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            signal.cancel();
        })
        .await;

    // Stop the worker even when the server failed before the signal
    shutdown.cancel();
    if let Some(handle) = worker {
        match handle.await {
            Ok(report) => info!(
                delivered = report.delivered,
                dropped = report.dropped,
                "Alarm worker stopped"
            ),
            Err(e) => error!(error = %e, "Alarm worker terminated abnormally"),
        }
    }

    served?;
    info!("Server stopped");
    Ok(())
}
