//! # Lectern Telemetry
//!
//! Periodic server resource sampling and live fan-out of the samples.
//!
//! ```text
//! scheduler tick ─▶ MetricsSampler::capture ─▶ SampleStore::append
//!                                   │
//!                                   ▼
//!                       MetricsHub::broadcast (non-blocking)
//!                                   │
//!                     hub actor ────┼──▶ subscriber 1
//!                                   ├──▶ subscriber 2
//!                                   └──▶ ...
//! ```
//!
//! - [`probe`]: reads process and host resources through `sysinfo`
//! - [`sampler`]: turns a probe reading into a [`MetricSample`] and persists it
//! - [`store`]: append-only sample storage
//! - [`hub`]: the actor that owns the live subscriber set
//! - [`scheduler`]: the fixed-interval sampling task
//!
//! The hub and scheduler both stop when their `CancellationToken` fires.
//!
//! [`MetricSample`]: lectern_models::MetricSample

pub mod error;
pub mod hub;
pub mod probe;
pub mod sampler;
pub mod scheduler;
pub mod store;

pub use error::{HubError, SamplerError};
pub use hub::{MetricsHub, SubscriberId, Subscription};
pub use probe::{ResourceProbe, ResourceReading, SystemProbe};
pub use sampler::MetricsSampler;
pub use scheduler::spawn_sampler;
pub use store::{PgSampleStore, SampleStore};
