//! Splitway Gateway binary
//!
//! Loads configuration, seeds the weight store, starts the control-plane
//! poller and serves HTTP until interrupted.

use std::sync::Arc;

use splitway_control::{spawn_weight_poller, KubeApiSource};
use splitway_core::WeightStore;
use splitway_gateway::{server, GatewayConfig, GatewayState, RefreshMode};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes logging, wires the gateway together and runs it until Ctrl-C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("splitway gateway starting");

    let config = GatewayConfig::from_env()?;
    let store = Arc::new(WeightStore::from_env());
    let source = KubeApiSource::connect(&config.control_plane).await;
    let state = Arc::new(GatewayState::new(&config, store, source));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = match config.refresh {
        RefreshMode::Interval(period) => Some(spawn_weight_poller(
            Arc::clone(&state.sync),
            period,
            shutdown_rx.clone(),
        )),
        RefreshMode::PerRequest => {
            tracing::info!("refreshing weights on every request");
            None
        }
    };

    let mut server = tokio::spawn(server::start_server(config.listen_addr, state, shutdown_rx));

    tokio::select! {
        result = &mut server => {
            // Only a failed bind ends the listener before shutdown.
            let _ = shutdown_tx.send(true);
            if let Some(poller) = poller {
                poller.await?;
            }
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => tracing::info!("shutdown requested"),
            Err(err) => {
                tracing::warn!(%err, "cannot listen for Ctrl-C, serving until the listener stops");
                server.await??;
                return Ok(());
            }
        }
    }

    let _ = shutdown_tx.send(true);
    server.await??;
    if let Some(poller) = poller {
        poller.await?;
    }

    tracing::info!("shut down gracefully");
    Ok(())
}
