use crate::{
    metrics::MetricSample,
    stats::{
        StatKind,
        StatTable,
        StatWindow,
    },
    walker::FetchJob,
};
use chrono::{
    DateTime,
    Utc,
};
use sentry_api_client::{
    ProjectStatsRequest,
    SentryApi,
    StatSample,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Turns a [`FetchJob`] into one sample per statistic that has data.
pub struct StatFetcher {
    api: Arc<dyn SentryApi>,
    table: StatTable,
    window: StatWindow,
}

impl StatFetcher {
    pub fn new(api: Arc<dyn SentryApi>, table: StatTable, window: StatWindow) -> Self {
        Self { api, table, window }
    }

    /// Fetches every statistic of the job's project, one request at a time.
    ///
    /// Failed or empty statistics are logged and skipped. Returns the number
    /// of samples sent.
    pub async fn fetch(&self, job: &FetchJob, sink: &mpsc::Sender<MetricSample>) -> usize {
        debug!(
            "spawning project stats pull for organization {}, team {}, project {}",
            job.organization.slug, job.team.slug, job.project.slug
        );
        let (since, until) = self.window.bounds(Utc::now());

        let mut sent = 0;
        for kind in self.table.iter() {
            let request = ProjectStatsRequest {
                organization: &job.organization.slug,
                project: &job.project.slug,
                stat: kind.query,
                since,
                until,
                resolution: self.window.resolution(),
            };
            let series = match self.api.project_stats(request).await {
                Ok(series) => series,
                Err(err) => {
                    warn!(
                        "failed fetching stat type {} for project {}; err {err}",
                        kind.name, job.project.slug
                    );
                    continue;
                }
            };

            // the series is assumed to be in chronological order
            let Some(last) = series.last() else {
                warn!(
                    "requested stat type {} for project {} returned no results",
                    kind.name, job.project.slug
                );
                continue;
            };
            trace!(stat = kind.name, project = %job.project.slug, points = series.len(), "stat series");

            let Some(sample) = project_sample(job, kind, last) else {
                warn!(
                    "stat type {} for project {} has an unrepresentable timestamp {}",
                    kind.name, job.project.slug, last.timestamp
                );
                continue;
            };
            if sink.send(sample).await.is_err() {
                debug!("sample receiver dropped, stopping stats pull for {}", job.project.slug);
                break;
            }
            sent += 1;
        }

        debug!(
            "finished project stats pull for organization {}, team {}, project {}",
            job.organization.slug, job.team.slug, job.project.slug
        );
        sent
    }
}

fn project_sample(job: &FetchJob, kind: &StatKind, point: &StatSample) -> Option<MetricSample> {
    let timestamp = DateTime::<Utc>::from_timestamp(point.timestamp, 0)?;
    Some(MetricSample {
        descriptor: kind.descriptor.clone(),
        labels: vec![
            ("organization_slug", job.organization.slug.clone()),
            ("organization_id", job.organization.id.to_string()),
            ("team_slug", job.team.slug.clone()),
            ("team_id", job.team.id.to_string()),
            ("project_slug", job.project.slug.clone()),
            ("project_id", job.project.id.to_string()),
            ("type", kind.name.to_string()),
        ],
        value: point.value,
        timestamp: Some(timestamp),
    })
}
