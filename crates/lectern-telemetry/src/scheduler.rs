use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::hub::MetricsHub;
use crate::sampler::MetricsSampler;

/// Runs `sampler` every `period` and hands each sample to `hub`.
///
/// The first capture happens one period after start. A failed capture is
/// logged and skipped; it is not broadcast and the schedule carries on.
/// Ticks missed while a capture is slow are skipped, not replayed.
pub fn spawn_sampler(
    mut sampler: MetricsSampler,
    hub: MetricsHub,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = period.as_secs(), "Metrics sampler started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => match sampler.capture().await {
                    Ok(sample) => {
                        hub.broadcast(sample);
                    }
                    Err(e) => warn!(error = %e, "Metrics sample failed"),
                },
            }
        }

        info!("Metrics sampler stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use lectern_config::MetricsConfig;
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::sampler::testing::{FixedProbe, MemoryStore, reading};

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_is_skipped_and_schedule_continues() {
        let cancel = CancellationToken::new();
        let (hub, _hub_task) = MetricsHub::spawn(&MetricsConfig::default(), cancel.clone());
        let mut subscription = hub.subscribe().await.unwrap();

        let calls = Arc::new(Mutex::new(0));
        let store = Arc::new(MemoryStore::default());
        let probe = FixedProbe {
            reading: reading(),
            fail_on: vec![1],
            calls: calls.clone(),
        };
        let sampler = MetricsSampler::new(Box::new(probe), store.clone(), "/");
        let task = spawn_sampler(sampler, hub.clone(), Duration::from_secs(5), cancel.clone());

        sleep(Duration::from_secs(11)).await;

        let delivered = timeout(Duration::from_secs(1), subscription.receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered.disk_used_bytes, 750);
        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(store.samples.lock().unwrap().len(), 1);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_capture_before_first_period() {
        let cancel = CancellationToken::new();
        let (hub, _hub_task) = MetricsHub::spawn(&MetricsConfig::default(), cancel.clone());

        let calls = Arc::new(Mutex::new(0));
        let probe = FixedProbe {
            reading: reading(),
            fail_on: vec![],
            calls: calls.clone(),
        };
        let sampler =
            MetricsSampler::new(Box::new(probe), Arc::new(MemoryStore::default()), "/");
        let task = spawn_sampler(sampler, hub, Duration::from_secs(5), cancel.clone());

        sleep(Duration::from_secs(4)).await;
        assert_eq!(*calls.lock().unwrap(), 0);

        cancel.cancel();
        task.await.unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
