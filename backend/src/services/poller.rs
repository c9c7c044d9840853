//! Periodic poll of the sky sensor

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::external::SkySensorClient;
use crate::services::ingestion::IngestionCoordinator;

/// Poll the sensor every `interval` and feed each result into a cycle.
///
/// A failed fetch keeps the previous sky snapshot; the cycle still runs on
/// what is known.
pub fn spawn_sky_poller(
    client: SkySensorClient,
    coordinator: Arc<IngestionCoordinator>,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "Polling sky sensor at {} every {}s",
            client.url(),
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match client.fetch().await {
                Ok(snapshot) => {
                    coordinator.ingest_sky(snapshot).await;
                }
                Err(e) => {
                    tracing::warn!("Sky sensor poll failed, keeping last snapshot: {}", e);
                    coordinator.run_cycle_if_station_known().await;
                }
            }
        }
    })
}
