use crate::{
    fetcher::StatFetcher,
    metrics::MetricSample,
    walker::FetchJob,
};
use std::{
    num::NonZeroUsize,
    sync::Arc,
};
use tokio::{
    sync::{
        mpsc,
        Mutex,
    },
    task::JoinSet,
};

/// Fixed set of workers draining a bounded [`FetchJob`] queue.
///
/// The queue holds as many jobs as there are workers, so producers block once
/// every worker is busy and another `size` jobs are waiting.
pub struct WorkerPool {
    workers: JoinSet<usize>,
}

impl WorkerPool {
    /// Spawns `size` workers and returns the sending half of their queue.
    /// Dropping every sender lets the workers run out once the queue is drained.
    pub fn start(
        size: NonZeroUsize,
        fetcher: Arc<StatFetcher>,
        sink: mpsc::Sender<MetricSample>,
    ) -> (mpsc::Sender<FetchJob>, Self) {
        let (jobs, queue) = mpsc::channel(size.get());
        let queue = Arc::new(Mutex::new(queue));

        let mut workers = JoinSet::new();
        for worker in 0..size.get() {
            workers.spawn(run_worker(worker, queue.clone(), fetcher.clone(), sink.clone()));
        }

        (jobs, Self { workers })
    }

    /// Waits for every worker to exit. Returns the number of jobs processed.
    pub async fn join(mut self) -> usize {
        let mut processed = 0;
        while let Some(result) = self.workers.join_next().await {
            match result {
                Ok(jobs) => processed += jobs,
                Err(err) => error!("stat worker failed: {err}"),
            }
        }
        processed
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<Mutex<mpsc::Receiver<FetchJob>>>,
    fetcher: Arc<StatFetcher>,
    sink: mpsc::Sender<MetricSample>,
) -> usize {
    let mut processed = 0;
    loop {
        // the lock only guards the dequeue, never the fetch
        let job = queue.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };
        fetcher.fetch(&job, &sink).await;
        processed += 1;
    }
    trace!(worker, processed, "stat worker finished");
    processed
}
