use crate::{
    fetcher::StatFetcher,
    metrics::{
        MetricDescriptor,
        MetricSample,
        MetricType,
    },
    pool::WorkerPool,
    stats::{
        StatTable,
        StatWindow,
    },
    walker::{
        HierarchyWalker,
        WalkSummary,
    },
};
use eyre::Result;
use prometheus::{
    Gauge,
    IntCounter,
};
use sentry_api_client::SentryApi;
use std::{
    num::NonZeroUsize,
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct ExporterSettings {
    /// Prefix of every metric name.
    pub namespace: String,
    /// Number of stat workers, which is also the number of stat requests in flight.
    pub concurrency: NonZeroUsize,
    pub window: StatWindow,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            namespace: "sentry".to_string(),
            concurrency: NonZeroUsize::new(40).unwrap_or(NonZeroUsize::MIN),
            window: StatWindow::default(),
        }
    }
}

/// Bookkeeping of one scrape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrapeOutcome {
    pub up: bool,
    pub duration: Duration,
    /// Scrapes performed by this exporter so far, including this one.
    pub scrapes_total: u64,
    pub walk: WalkSummary,
}

/// Everything a single scrape produced.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub samples: Vec<MetricSample>,
    pub outcome: ScrapeOutcome,
}

/// Scrapes the Sentry hierarchy into metric samples.
pub struct Exporter {
    api: Arc<dyn SentryApi>,
    table: StatTable,
    window: StatWindow,
    concurrency: NonZeroUsize,
    up: Arc<MetricDescriptor>,
    scrape_duration: Arc<MetricDescriptor>,
    scrapes: Arc<MetricDescriptor>,
    scrape_duration_seconds: Gauge,
    scrapes_total: IntCounter,
}

impl Exporter {
    pub fn new(api: Arc<dyn SentryApi>, table: StatTable, settings: ExporterSettings) -> Result<Self> {
        let namespace = settings.namespace.as_str();
        let up = MetricDescriptor::new(
            namespace,
            "",
            "up",
            "boolean, 1 if the sentry instance was reachable, zero if not",
            MetricType::Gauge,
            &[],
        )?;
        let scrape_duration = MetricDescriptor::new(
            namespace,
            "",
            "scrape_duration_seconds",
            "duration of the last scrape of the sentry instance",
            MetricType::Gauge,
            &[],
        )?;
        let scrapes = MetricDescriptor::new(
            namespace,
            "",
            "scrapes_total",
            "total number of scrapes of the sentry instance",
            MetricType::Counter,
            &[],
        )?;

        debug!(
            namespace,
            stats = table.len(),
            concurrency = settings.concurrency.get(),
            "exporter configured"
        );

        Ok(Self {
            api,
            table,
            window: settings.window,
            concurrency: settings.concurrency,
            scrape_duration_seconds: Gauge::new(scrape_duration.name.clone(), scrape_duration.help.clone())?,
            scrapes_total: IntCounter::new(scrapes.name.clone(), scrapes.help.clone())?,
            up: Arc::new(up),
            scrape_duration: Arc::new(scrape_duration),
            scrapes: Arc::new(scrapes),
        })
    }

    /// Every metric a scrape can produce, in exposition order.
    pub fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        let mut descriptors = self.table.descriptors();
        descriptors.extend([self.up.clone(), self.scrape_duration.clone(), self.scrapes.clone()]);
        descriptors
    }

    /// Runs one full scrape, sending every sample to `sink`.
    ///
    /// Project samples arrive in no particular order. The `up`, scrape count and
    /// scrape duration samples follow once every worker has finished. Failures
    /// only shrink the snapshot; they never abort the scrape.
    pub async fn collect(&self, sink: mpsc::Sender<MetricSample>) -> ScrapeOutcome {
        let start = Instant::now();
        debug!("spawning organization walk");

        let fetcher = Arc::new(StatFetcher::new(self.api.clone(), self.table.clone(), self.window));
        let (jobs, pool) = WorkerPool::start(self.concurrency, fetcher, sink.clone());
        let walk = HierarchyWalker::new(self.api.as_ref()).walk(&jobs).await;
        drop(jobs);
        let processed = pool.join().await;
        debug!(
            pages = walk.pages,
            organizations = walk.organizations,
            jobs = processed,
            "finished organizations"
        );

        if !walk.completed {
            error!("organization walk did not complete, reporting sentry as down");
        }
        self.emit(&sink, MetricSample::new(self.up.clone(), if walk.completed { 1.0 } else { 0.0 }))
            .await;

        self.scrapes_total.inc();
        let scrapes_total = self.scrapes_total.get();
        self.emit(&sink, MetricSample::new(self.scrapes.clone(), scrapes_total as f64))
            .await;

        let duration = start.elapsed();
        self.scrape_duration_seconds.set(duration.as_secs_f64());
        self.emit(
            &sink,
            MetricSample::new(self.scrape_duration.clone(), self.scrape_duration_seconds.get()),
        )
        .await;

        ScrapeOutcome {
            up: walk.completed,
            duration,
            scrapes_total,
            walk,
        }
    }

    /// Runs [`Exporter::collect`] while draining its samples.
    pub async fn scrape(&self) -> Snapshot {
        let (sink, mut receiver) = mpsc::channel(self.concurrency.get());
        let drain = async move {
            let mut samples = Vec::new();
            while let Some(sample) = receiver.recv().await {
                samples.push(sample);
            }
            samples
        };
        let (outcome, samples) = tokio::join!(self.collect(sink), drain);
        Snapshot { samples, outcome }
    }

    async fn emit(&self, sink: &mpsc::Sender<MetricSample>, sample: MetricSample) {
        if sink.send(sample).await.is_err() {
            debug!("sample receiver dropped before the scrape finished");
        }
    }
}
