//! In-memory [`SentryApi`] for exercising the walker, the workers and the exporter.

use sentry_api_client::{
    ApiError,
    ApiFuture,
    LinkTarget,
    Organization,
    Page,
    PageLink,
    Project,
    ProjectStatsRequest,
    SentryApi,
    StatQuery,
    StatSample,
    Team,
};
use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Mutex,
    },
    time::Duration,
};
use url::Url;

pub(crate) fn organization(slug: &str, id: u64, teams: &[(&str, u64, &[(&str, u64)])]) -> Organization {
    Organization {
        id,
        slug: slug.to_string(),
        name: slug.to_string(),
        teams: teams
            .iter()
            .map(|(team, team_id, projects)| Team {
                id: *team_id,
                slug: team.to_string(),
                name: team.to_string(),
                projects: projects
                    .iter()
                    .map(|(project, project_id)| Project {
                        id: *project_id,
                        slug: project.to_string(),
                        name: project.to_string(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn point(timestamp: i64, value: f64) -> StatSample {
    StatSample { timestamp, value }
}

fn server_error(path: &str) -> ApiError {
    ApiError::Status {
        url: Url::parse("https://sentry.test/api/0/")
            .and_then(|base| base.join(path))
            .expect("valid test url"),
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedStatsRequest {
    pub organization: String,
    pub project: String,
    pub stat: StatQuery,
    pub since: i64,
    pub until: i64,
    pub resolution: Duration,
}

type StatsKey = (String, String, StatQuery);

/// Pages of organizations plus canned stats series. Stats that were not
/// configured answer with an empty series.
#[derive(Default)]
pub(crate) struct FakeSentry {
    pages: Vec<Vec<Organization>>,
    failing_pages: HashSet<usize>,
    failing_details: HashSet<String>,
    stats: HashMap<StatsKey, Option<Vec<StatSample>>>,
    stats_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<RecordedStatsRequest>>,
}

impl FakeSentry {
    pub fn page(mut self, organizations: Vec<Organization>) -> Self {
        self.pages.push(organizations);
        self
    }

    /// The `index`th listing request (0 is the initial listing) fails.
    pub fn failing_page(mut self, index: usize) -> Self {
        self.failing_pages.insert(index);
        self
    }

    pub fn failing_detail(mut self, slug: &str) -> Self {
        self.failing_details.insert(slug.to_string());
        self
    }

    pub fn stats(mut self, organization: &str, project: &str, stat: StatQuery, series: Vec<StatSample>) -> Self {
        self.stats
            .insert((organization.to_string(), project.to_string(), stat), Some(series));
        self
    }

    pub fn failing_stats(mut self, organization: &str, project: &str, stat: StatQuery) -> Self {
        self.stats
            .insert((organization.to_string(), project.to_string(), stat), None);
        self
    }

    pub fn stats_delay(mut self, delay: Duration) -> Self {
        self.stats_delay = Some(delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedStatsRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn serve_page(&self, index: usize) -> Result<Page<Organization>, ApiError> {
        if self.failing_pages.contains(&index) {
            return Err(server_error("organizations/"));
        }
        // the listing endpoint never embeds teams
        let items = self
            .pages
            .get(index)
            .map(|page| {
                page.iter()
                    .map(|org| Organization {
                        teams: Vec::new(),
                        ..org.clone()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let next_index = index + 1;
        let cursor = format!("{next_index}:0:0");
        let next = LinkTarget {
            url: Url::parse(&format!("https://sentry.test/api/0/organizations/?cursor={cursor}")).expect("valid test url"),
            results: next_index < self.pages.len(),
            cursor,
        };
        Ok(Page {
            items,
            link: PageLink {
                previous: None,
                next: Some(next),
            },
        })
    }
}

impl SentryApi for FakeSentry {
    fn list_organizations(&self) -> ApiFuture<'_, Page<Organization>> {
        Box::pin(async move { self.serve_page(0) })
    }

    fn next_page<'a>(&'a self, link: &'a PageLink) -> ApiFuture<'a, Page<Organization>> {
        Box::pin(async move {
            let next = link.next_with_results().ok_or(ApiError::NoNextPage)?;
            let index = next
                .cursor
                .split(':')
                .next()
                .and_then(|index| index.parse().ok())
                .ok_or_else(|| ApiError::InvalidLink(next.cursor.clone()))?;
            self.serve_page(index)
        })
    }

    fn organization<'a>(&'a self, slug: &'a str) -> ApiFuture<'a, Organization> {
        Box::pin(async move {
            let path = format!("organizations/{slug}/");
            if self.failing_details.contains(slug) {
                return Err(server_error(&path));
            }
            self.pages
                .iter()
                .flatten()
                .find(|org| org.slug == slug)
                .cloned()
                .ok_or_else(|| server_error(&path))
        })
    }

    fn project_stats<'a>(&'a self, request: ProjectStatsRequest<'a>) -> ApiFuture<'a, Vec<StatSample>> {
        Box::pin(async move {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.stats_delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.requests.lock().expect("requests lock").push(RecordedStatsRequest {
                organization: request.organization.to_string(),
                project: request.project.to_string(),
                stat: request.stat,
                since: request.since.timestamp(),
                until: request.until.timestamp(),
                resolution: request.resolution,
            });

            let key = (request.organization.to_string(), request.project.to_string(), request.stat);
            match self.stats.get(&key) {
                Some(Some(series)) => Ok(series.clone()),
                Some(None) => Err(server_error(&format!(
                    "projects/{}/{}/stats/",
                    request.organization, request.project
                ))),
                None => Ok(Vec::new()),
            }
        })
    }
}
