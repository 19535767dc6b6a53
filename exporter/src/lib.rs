//! # Sentry exporter core
//!
//! Turns the organization/team/project hierarchy of a Sentry instance into a
//! snapshot of Prometheus samples.
//!
//! ## Architecture
//!
//! - **`walker`**: pages through organizations and queues one `FetchJob` per project
//! - **`pool`**: fixed set of workers draining the bounded job queue
//! - **`fetcher`**: fetches every statistic of a project and keeps the latest point
//! - **`exporter`**: runs a scrape end to end and reports `up`, scrape count and duration
//! - **`exposition`**: renders a snapshot in the Prometheus text format

#[macro_use]
extern crate tracing;

pub mod exporter;
pub mod exposition;
pub mod fetcher;
pub mod metrics;
pub mod pool;
pub mod stats;
pub mod walker;

#[cfg(test)]
mod testing;

pub use exporter::{
    Exporter,
    ExporterSettings,
    ScrapeOutcome,
    Snapshot,
};
pub use metrics::{
    MetricDescriptor,
    MetricSample,
    MetricType,
};
pub use stats::{
    StatKind,
    StatTable,
    StatWindow,
};
pub use walker::{
    Entity,
    FetchJob,
    HierarchyWalker,
    WalkSummary,
};
