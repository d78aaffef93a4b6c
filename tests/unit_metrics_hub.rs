use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lectern_config::MetricsConfig;
use lectern_models::MetricSample;
use lectern_telemetry::{
    MetricsHub, MetricsSampler, ResourceProbe, ResourceReading, SampleStore, SamplerError,
    spawn_sampler,
};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Reports a process RSS that grows by one byte per reading.
struct CountingProbe {
    next: u64,
}

impl ResourceProbe for CountingProbe {
    fn read(&mut self, _disk_path: &Path) -> Result<ResourceReading, SamplerError> {
        self.next += 1;
        Ok(ResourceReading {
            process_rss_bytes: self.next,
            process_cpu_percent: 50.0,
            system_cpu_percent: 25.0,
            cpu_count: 2,
            memory_total_bytes: 1000,
            memory_available_bytes: 400,
            disk_total_bytes: 2000,
            disk_available_bytes: 500,
        })
    }
}

#[derive(Default)]
struct VecStore {
    samples: Mutex<Vec<MetricSample>>,
}

#[async_trait]
impl SampleStore for VecStore {
    async fn append(&self, sample: &MetricSample) -> Result<(), SamplerError> {
        self.samples.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn latest(&self, limit: i64) -> Result<Vec<MetricSample>, SamplerError> {
        let samples = self.samples.lock().unwrap();
        let skip = samples.len().saturating_sub(limit.max(0) as usize);
        Ok(samples[skip..].to_vec())
    }
}

async fn next_heap(receiver: &mut tokio::sync::mpsc::Receiver<MetricSample>) -> Option<i64> {
    timeout(Duration::from_secs(60), receiver.recv())
        .await
        .ok()
        .flatten()
        .map(|s| s.heap_used_bytes)
}

#[tokio::test(start_paused = true)]
async fn test_samples_reach_every_subscriber_in_capture_order() {
    let cancel = CancellationToken::new();
    let (hub, hub_task) = MetricsHub::spawn(&MetricsConfig::default(), cancel.child_token());
    let mut first = hub.subscribe().await.unwrap();
    let mut second = hub.subscribe().await.unwrap();

    let store = Arc::new(VecStore::default());
    let sampler = MetricsSampler::new(Box::new(CountingProbe { next: 0 }), store.clone(), "/");
    let sampler_task = spawn_sampler(sampler, hub.clone(), Duration::from_secs(5), cancel.child_token());

    for expected in 1..=5 {
        assert_eq!(next_heap(&mut first.receiver).await, Some(expected));
        assert_eq!(next_heap(&mut second.receiver).await, Some(expected));
    }

    cancel.cancel();
    sampler_task.await.unwrap();
    hub_task.await.unwrap();

    let stored = store.latest(100).await.unwrap();
    assert!(stored.len() >= 5);
    assert_eq!(stored[0].heap_used_bytes, 1);
    assert_eq!(stored[0].system_memory_used_bytes, 600);
    assert_eq!(stored[0].disk_used_bytes, 1500);
    assert_eq!(stored[0].process_cpu_load, 0.25);
    assert_eq!(stored[0].system_cpu_load, 0.25);
}

#[tokio::test(start_paused = true)]
async fn test_removed_subscriber_stops_receiving() {
    let cancel = CancellationToken::new();
    let (hub, _hub_task) = MetricsHub::spawn(&MetricsConfig::default(), cancel.child_token());
    let mut stays = hub.subscribe().await.unwrap();
    let mut leaves = hub.subscribe().await.unwrap();

    let sampler = MetricsSampler::new(
        Box::new(CountingProbe { next: 0 }),
        Arc::new(VecStore::default()),
        "/",
    );
    let _sampler_task = spawn_sampler(sampler, hub.clone(), Duration::from_secs(5), cancel.child_token());

    assert_eq!(next_heap(&mut leaves.receiver).await, Some(1));
    assert!(hub.unsubscribe(leaves.id).await.unwrap());

    for expected in 1..=3 {
        assert_eq!(next_heap(&mut stays.receiver).await, Some(expected));
    }
    assert_eq!(leaves.receiver.recv().await, None);
    assert_eq!(hub.subscriber_count().await.unwrap(), 1);

    cancel.cancel();
}

#[tokio::test]
async fn test_dropped_receiver_is_pruned_without_affecting_others() {
    let (hub, _task) = MetricsHub::spawn(&MetricsConfig::default(), CancellationToken::new());
    let gone = hub.subscribe().await.unwrap();
    let mut stays = hub.subscribe().await.unwrap();
    drop(gone);

    let sample = |heap| MetricSample {
        captured_at: chrono::Utc::now(),
        heap_used_bytes: heap,
        heap_max_bytes: 0,
        system_memory_total_bytes: 0,
        system_memory_used_bytes: 0,
        disk_total_bytes: 0,
        disk_used_bytes: 0,
        process_cpu_load: 0.0,
        system_cpu_load: 0.0,
    };
    assert!(hub.broadcast(sample(1)));
    assert!(hub.broadcast(sample(2)));

    assert_eq!(next_heap(&mut stays.receiver).await, Some(1));
    assert_eq!(next_heap(&mut stays.receiver).await, Some(2));
    assert_eq!(hub.subscriber_count().await.unwrap(), 1);
    assert_eq!(hub.dropped(), 0);
}
