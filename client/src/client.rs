use crate::{
    api::{
        ApiFuture,
        ProjectStatsRequest,
        SentryApi,
    },
    ApiError,
    Organization,
    Page,
    PageLink,
    StatSample,
};
use reqwest::header::{
    HeaderMap,
    HeaderValue,
    AUTHORIZATION,
    LINK,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// `reqwest` backed [`SentryApi`] talking to `<sentry url>/api/0/`.
#[derive(Debug, Clone)]
pub struct SentryClient {
    http: reqwest::Client,
    base: Url,
}

impl SentryClient {
    pub fn new(sentry_url: &Url, auth_token: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = api_base(sentry_url)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {auth_token}")).map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<(T, HeaderMap), ApiError> {
        trace!(%url, "GET");
        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(source) => return Err(ApiError::Transport { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { url, status, body });
        }

        let headers = response.headers().clone();
        match response.json::<T>().await {
            Ok(body) => Ok((body, headers)),
            Err(source) => Err(ApiError::Decode { url, source }),
        }
    }

    async fn get_page(&self, url: Url) -> Result<Page<Organization>, ApiError> {
        let (items, headers) = self.get::<Vec<Organization>>(url).await?;
        let link = match headers.get(LINK) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| ApiError::InvalidLink(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
                PageLink::parse(value)?
            }
            None => PageLink::default(),
        };
        Ok(Page { items, link })
    }
}

impl SentryApi for SentryClient {
    fn list_organizations(&self) -> ApiFuture<'_, Page<Organization>> {
        Box::pin(async move {
            let url = self.base.join("organizations/")?;
            self.get_page(url).await
        })
    }

    fn next_page<'a>(&'a self, link: &'a PageLink) -> ApiFuture<'a, Page<Organization>> {
        Box::pin(async move {
            let next = link.next_with_results().ok_or(ApiError::NoNextPage)?;
            self.get_page(next.url.clone()).await
        })
    }

    fn organization<'a>(&'a self, slug: &'a str) -> ApiFuture<'a, Organization> {
        Box::pin(async move {
            let url = self.base.join(&format!("organizations/{slug}/"))?;
            let (organization, _) = self.get(url).await?;
            Ok(organization)
        })
    }

    fn project_stats<'a>(&'a self, request: ProjectStatsRequest<'a>) -> ApiFuture<'a, Vec<StatSample>> {
        Box::pin(async move {
            let mut url = self
                .base
                .join(&format!("projects/{}/{}/stats/", request.organization, request.project))?;
            url.query_pairs_mut()
                .append_pair("stat", request.stat.as_str())
                .append_pair("since", &request.since.timestamp().to_string())
                .append_pair("until", &request.until.timestamp().to_string())
                .append_pair("resolution", &format!("{}s", request.resolution.as_secs()));
            let (series, _) = self.get(url).await?;
            Ok(series)
        })
    }
}

/// `https://sentry.example.com/sub` becomes `https://sentry.example.com/sub/api/0/`.
/// Query and fragment of the instance url are dropped.
fn api_base(sentry_url: &Url) -> Result<Url, ApiError> {
    let mut root = sentry_url.clone();
    root.set_query(None);
    root.set_fragment(None);
    let root = root.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{root}/api/0/"))?)
}
