//! Live fan-out of metric samples.
//!
//! [`MetricsHub`] is a cheap, cloneable handle to an actor task. The actor is
//! the only owner of the subscriber set; the handle talks to it over two
//! channels:
//!
//! - a bounded sample queue. [`MetricsHub::broadcast`] never waits; when the
//!   queue is full the new sample is dropped and counted.
//! - a command queue for subscribe, unsubscribe and count requests, each
//!   answered over a oneshot.
//!
//! Every subscriber gets its own bounded buffer. Samples are handed to each
//! buffer in arrival order; a subscriber whose buffer is full or whose
//! receiver is gone is removed on the spot, without affecting the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lectern_config::MetricsConfig;
use lectern_models::MetricSample;
use lectern_observability::{set_hub_subscribers, track_hub_dropped};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::HubError;

pub type SubscriberId = u64;

/// A live subscriber's end of the hub.
///
/// `receiver` yields `None` once the subscriber is removed or the hub stops.
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<MetricSample>,
}

enum Command {
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    Unsubscribe {
        id: SubscriberId,
        reply: oneshot::Sender<bool>,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
}

#[derive(Clone)]
pub struct MetricsHub {
    samples: mpsc::Sender<MetricSample>,
    commands: mpsc::Sender<Command>,
    dropped: Arc<AtomicU64>,
}

impl std::fmt::Debug for MetricsHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsHub")
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

impl MetricsHub {
    /// Starts the actor. It runs until `cancel` fires.
    pub fn spawn(config: &MetricsConfig, cancel: CancellationToken) -> (Self, JoinHandle<()>) {
        let (samples_tx, samples_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (commands_tx, commands_rx) = mpsc::channel(32);

        let actor = HubActor {
            samples: samples_rx,
            commands: commands_rx,
            subscribers: HashMap::new(),
            next_id: 1,
            buffer: config.subscriber_buffer.max(1),
            cancel,
        };
        let handle = tokio::spawn(actor.run());

        let hub = Self {
            samples: samples_tx,
            commands: commands_tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (hub, handle)
    }

    /// Queues `sample` for delivery. Returns `false` if it was dropped.
    pub fn broadcast(&self, sample: MetricSample) -> bool {
        match self.samples.try_send(sample) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                track_hub_dropped();
                warn!("Metrics hub queue full, dropping sample");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub async fn subscribe(&self) -> Result<Subscription, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Subscribe { reply })
            .await
            .map_err(|_| HubError::Closed)?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Returns whether `id` was still registered.
    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<bool, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Unsubscribe { id, reply })
            .await
            .map_err(|_| HubError::Closed)?;
        rx.await.map_err(|_| HubError::Closed)
    }

    pub async fn subscriber_count(&self) -> Result<usize, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Count { reply })
            .await
            .map_err(|_| HubError::Closed)?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Samples dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

struct HubActor {
    samples: mpsc::Receiver<MetricSample>,
    commands: mpsc::Receiver<Command>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<MetricSample>>,
    next_id: SubscriberId,
    buffer: usize,
    cancel: CancellationToken,
}

impl HubActor {
    async fn run(mut self) {
        info!("Metrics hub started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(command) = self.commands.recv() => self.handle(command),
                Some(sample) = self.samples.recv() => self.deliver(sample),
                else => break,
            }
        }

        // Dropping the senders ends every subscriber's stream.
        self.subscribers.clear();
        set_hub_subscribers(0);
        info!("Metrics hub stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Subscribe { reply } => {
                let id = self.next_id;
                self.next_id += 1;

                let (tx, rx) = mpsc::channel(self.buffer);
                let subscription = Subscription { id, receiver: rx };
                if reply.send(subscription).is_ok() {
                    self.subscribers.insert(id, tx);
                    debug!(subscriber_id = id, "Subscriber added");
                }
            }
            Command::Unsubscribe { id, reply } => {
                let removed = self.subscribers.remove(&id).is_some();
                if removed {
                    debug!(subscriber_id = id, "Subscriber removed");
                }
                let _ = reply.send(removed);
            }
            Command::Count { reply } => {
                let _ = reply.send(self.subscribers.len());
            }
        }
        set_hub_subscribers(self.subscribers.len());
    }

    fn deliver(&mut self, sample: MetricSample) {
        let mut failed = Vec::new();

        for (id, tx) in &self.subscribers {
            if let Err(e) = tx.try_send(sample.clone()) {
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "buffer full",
                    mpsc::error::TrySendError::Closed(_) => "connection closed",
                };
                debug!(subscriber_id = id, reason, "Dropping subscriber");
                failed.push(*id);
            }
        }

        if !failed.is_empty() {
            for id in failed {
                self.subscribers.remove(&id);
            }
            set_hub_subscribers(self.subscribers.len());
        }
    }
}
