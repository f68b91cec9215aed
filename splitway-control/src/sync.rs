//! Keeps the weight store in step with the control plane.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use splitway_core::{ServiceId, WeightPair, WeightSnapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::reader::WeightReader;

/// Publishes control-plane reads into the weight store.
#[derive(Debug)]
pub struct WeightSync {
    reader: WeightReader,
}

impl WeightSync {
    /// Create a sync driver around `reader`.
    pub fn new(reader: WeightReader) -> Self {
        Self { reader }
    }

    /// The underlying reader.
    pub fn reader(&self) -> &WeightReader {
        &self.reader
    }

    /// Read every service concurrently and publish the pairs that were read.
    ///
    /// Services whose read fails keep whatever pair the store holds when the
    /// merge is applied, including updates made while the reads were in flight.
    pub async fn refresh_snapshot(&self) -> Arc<WeightSnapshot> {
        let reads = join_all(ServiceId::ALL.map(|service| self.reader.read(service))).await;
        let fresh: Vec<WeightPair> = reads.into_iter().flatten().collect();
        self.reader.store().update(|current| {
            fresh
                .iter()
                .fold(current.clone(), |snapshot, pair| snapshot.with_pair(*pair))
        })
    }

    /// Read one service and publish its pair, leaving the others untouched.
    pub async fn refresh_service(&self, service: ServiceId) -> WeightPair {
        let pair = self.reader.refresh(service).await;
        self.reader.store().update(|current| current.with_pair(pair));
        pair
    }
}

/// Spawns a background task refreshing all weights every `period` until
/// `shutdown` flips to `true` or its sender is dropped.
///
/// The first refresh runs immediately.
pub fn spawn_weight_poller(
    sync: Arc<WeightSync>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(?period, "weight poller started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = sync.refresh_snapshot().await;
                    tracing::debug!(weights = ?snapshot, "weights refreshed");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("weight poller stopped");
    })
}
