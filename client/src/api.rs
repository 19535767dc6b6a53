use crate::{
    ApiError,
    Organization,
    Page,
    PageLink,
    StatQuery,
    StatSample,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::Duration,
};

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Parameters of a single project stats request.
#[derive(Debug, Clone)]
pub struct ProjectStatsRequest<'a> {
    pub organization: &'a str,
    pub project: &'a str,
    pub stat: StatQuery,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    /// Width of the buckets the series is aggregated into.
    pub resolution: Duration,
}

/// The subset of the Sentry web API the exporter relies on.
///
/// Every call performs exactly one request; retrying is up to the caller.
pub trait SentryApi: Send + Sync {
    /// First page of the organizations visible to the token.
    fn list_organizations(&self) -> ApiFuture<'_, Page<Organization>>;

    /// Follows the `next` target of `link`.
    fn next_page<'a>(&'a self, link: &'a PageLink) -> ApiFuture<'a, Page<Organization>>;

    /// Organization detail including its teams and their projects.
    fn organization<'a>(&'a self, slug: &'a str) -> ApiFuture<'a, Organization>;

    fn project_stats<'a>(&'a self, request: ProjectStatsRequest<'a>) -> ApiFuture<'a, Vec<StatSample>>;
}

impl<T: SentryApi + ?Sized> SentryApi for Arc<T> {
    fn list_organizations(&self) -> ApiFuture<'_, Page<Organization>> {
        (**self).list_organizations()
    }

    fn next_page<'a>(&'a self, link: &'a PageLink) -> ApiFuture<'a, Page<Organization>> {
        (**self).next_page(link)
    }

    fn organization<'a>(&'a self, slug: &'a str) -> ApiFuture<'a, Organization> {
        (**self).organization(slug)
    }

    fn project_stats<'a>(&'a self, request: ProjectStatsRequest<'a>) -> ApiFuture<'a, Vec<StatSample>> {
        (**self).project_stats(request)
    }
}
