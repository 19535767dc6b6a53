use crate::metrics::{
    MetricDescriptor,
    MetricType,
};
use chrono::{
    DateTime,
    TimeDelta,
    Utc,
};
use eyre::{
    ensure,
    Result,
};
use sentry_api_client::StatQuery;
use std::{
    sync::Arc,
    time::Duration,
};
use strum::IntoEnumIterator as _;

/// Labels of every per-project sample, in exposition order.
pub const PROJECT_LABELS: &[&str] = &[
    "organization_slug",
    "organization_id",
    "team_slug",
    "team_id",
    "project_slug",
    "project_id",
    "type",
];

/// A statistic collected per project: the `type` label value, the query sent
/// to Sentry and the metric it is reported under.
#[derive(Debug, Clone)]
pub struct StatKind {
    pub name: &'static str,
    pub query: StatQuery,
    pub descriptor: Arc<MetricDescriptor>,
}

/// The closed set of statistics fetched for every project. Built once and
/// shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct StatTable {
    kinds: Arc<[StatKind]>,
}

impl StatTable {
    /// Every statistic Sentry offers, reported as `<namespace>_project_events_count`.
    pub fn new(namespace: &str) -> Result<Self> {
        Self::with_queries(namespace, StatQuery::iter())
    }

    pub fn with_queries(namespace: &str, queries: impl IntoIterator<Item = StatQuery>) -> Result<Self> {
        let descriptor = Arc::new(MetricDescriptor::new(
            namespace,
            "project",
            "events_count",
            "project count for received events of a given type",
            MetricType::Gauge,
            PROJECT_LABELS,
        )?);

        let mut kinds: Vec<StatKind> = Vec::new();
        for query in queries {
            if kinds.iter().any(|kind| kind.query == query) {
                continue;
            }
            kinds.push(StatKind {
                name: query.as_str(),
                query,
                descriptor: descriptor.clone(),
            });
        }
        ensure!(!kinds.is_empty(), "at least one statistic must be collected");

        Ok(Self { kinds: kinds.into() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatKind> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Distinct descriptors referenced by the table.
    pub fn descriptors(&self) -> Vec<Arc<MetricDescriptor>> {
        let mut descriptors: Vec<Arc<MetricDescriptor>> = Vec::new();
        for kind in self.kinds.iter() {
            if !descriptors.iter().any(|known| known.name == kind.descriptor.name) {
                descriptors.push(kind.descriptor.clone());
            }
        }
        descriptors
    }
}

/// The trailing time range requested for every statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatWindow {
    resolution: Duration,
    lookback: TimeDelta,
}

impl StatWindow {
    pub fn new(resolution: Duration, lookback: Duration) -> Result<Self> {
        ensure!(
            resolution.as_secs() > 0,
            "stat resolution must be at least one second, got {resolution:?}"
        );
        ensure!(
            resolution.subsec_nanos() == 0,
            "stat resolution must be a whole number of seconds, got {resolution:?}"
        );
        ensure!(!lookback.is_zero(), "stat lookback must be positive");
        Ok(Self {
            resolution,
            lookback: TimeDelta::from_std(lookback)?,
        })
    }

    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// `(since, until)` of the window ending at `until`.
    pub fn bounds(&self, until: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let since = until.checked_sub_signed(self.lookback).unwrap_or(DateTime::<Utc>::MIN_UTC);
        (since, until)
    }
}

impl Default for StatWindow {
    /// Ten second buckets over the last minute.
    fn default() -> Self {
        Self {
            resolution: Duration::from_secs(10),
            lookback: TimeDelta::minutes(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_table_covers_all_stats() {
        let table = StatTable::new("sentry").unwrap();
        let names: Vec<_> = table.iter().map(|kind| kind.name).collect();
        assert_eq!(names, vec!["received", "rejected", "blacklisted"]);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert_eq!(table.descriptors().len(), 1);
        assert_eq!(table.descriptors()[0].name, "sentry_project_events_count");
    }

    #[test]
    fn duplicate_queries_are_collapsed() {
        let table =
            StatTable::with_queries("sentry", [StatQuery::Rejected, StatQuery::Received, StatQuery::Rejected]).unwrap();
        let names: Vec<_> = table.iter().map(|kind| kind.name).collect();
        assert_eq!(names, vec!["rejected", "received"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(StatTable::with_queries("sentry", []).is_err());
    }

    #[test]
    fn window_bounds() {
        let window = StatWindow::new(Duration::from_secs(10), Duration::from_secs(60)).unwrap();
        let until = Utc.timestamp_opt(1_000, 0).unwrap();
        let (since, end) = window.bounds(until);
        assert_eq!(since.timestamp(), 940);
        assert_eq!(end, until);
        assert_eq!(window, StatWindow::default());
    }

    #[test]
    fn invalid_windows() {
        assert!(StatWindow::new(Duration::from_millis(500), Duration::from_secs(60)).is_err());
        assert!(StatWindow::new(Duration::from_millis(1500), Duration::from_secs(60)).is_err());
        assert!(StatWindow::new(Duration::from_secs(10), Duration::ZERO).is_err());
    }
}
