use crate::error::AppError;
use axum::{
    extract::State,
    http::header,
    response::{
        Html,
        IntoResponse,
        Response,
    },
    routing::get,
    Router,
};
use sentry_exporter_core::{
    exposition,
    Exporter,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub exporter: Arc<Exporter>,
    pub telemetry_path: String,
}

pub fn create_router(exporter: Arc<Exporter>, telemetry_path: &str) -> Router {
    let state = AppState {
        exporter,
        telemetry_path: telemetry_path.to_string(),
    };

    Router::new()
        .route(telemetry_path, get(metrics))
        .route("/healthz", get(healthz))
        .route("/", get(index))
        .with_state(state)
}

/// Every request runs a full scrape of the Sentry instance.
async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let snapshot = state.exporter.scrape().await;
    debug!(
        samples = snapshot.samples.len(),
        up = snapshot.outcome.up,
        duration = ?snapshot.outcome.duration,
        "scrape finished"
    );

    let body = exposition::encode(&state.exporter.describe(), &snapshot.samples)
        .map_err(|err| AppError::Encode(err.into()))?;
    Ok(([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body).into_response())
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let path = &state.telemetry_path;
    Html(format!(
        "\
<html>
	<head><title>sentry-exporter</title></head>
	<body>
		<li>prometheus metrics endpoint: <a href=\"{path}\"><code>{path}</code></a></li>
	</body>
</html>
"
    ))
}

async fn healthz() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use sentry_api_client::{
        ApiError,
        ApiFuture,
        Organization,
        Page,
        PageLink,
        Project,
        ProjectStatsRequest,
        SentryApi,
        StatSample,
        Team,
    };
    use sentry_exporter_core::{
        ExporterSettings,
        StatTable,
    };

    struct SingleProject;

    fn acme() -> Organization {
        Organization {
            id: 1,
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            teams: vec![Team {
                id: 2,
                slug: "core".to_string(),
                name: "Core".to_string(),
                projects: vec![Project {
                    id: 3,
                    slug: "api".to_string(),
                    name: "API".to_string(),
                }],
            }],
        }
    }

    impl SentryApi for SingleProject {
        fn list_organizations(&self) -> ApiFuture<'_, Page<Organization>> {
            Box::pin(async move {
                Ok(Page {
                    items: vec![acme()],
                    link: PageLink::default(),
                })
            })
        }

        fn next_page<'a>(&'a self, _link: &'a PageLink) -> ApiFuture<'a, Page<Organization>> {
            Box::pin(async move { Err(ApiError::NoNextPage) })
        }

        fn organization<'a>(&'a self, _slug: &'a str) -> ApiFuture<'a, Organization> {
            Box::pin(async move { Ok(acme()) })
        }

        fn project_stats<'a>(&'a self, _request: ProjectStatsRequest<'a>) -> ApiFuture<'a, Vec<StatSample>> {
            Box::pin(async move {
                Ok(vec![StatSample {
                    timestamp: 100,
                    value: 5.0,
                }])
            })
        }
    }

    fn state() -> AppState {
        let exporter = Exporter::new(
            Arc::new(SingleProject),
            StatTable::new("sentry").unwrap(),
            ExporterSettings::default(),
        )
        .unwrap();
        AppState {
            exporter: Arc::new(exporter),
            telemetry_path: "/metrics".to_string(),
        }
    }

    async fn body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_scrape() {
        let response = metrics(State(state())).await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            exposition::CONTENT_TYPE
        );

        let text = body(response).await;
        assert!(text.contains("# TYPE sentry_project_events_count gauge"), "{text}");
        for kind in ["received", "rejected", "blacklisted"] {
            let line = format!(
                "sentry_project_events_count{{organization_slug=\"acme\",organization_id=\"1\",team_slug=\"core\",team_id=\"2\",project_slug=\"api\",project_id=\"3\",type=\"{kind}\"}} 5 100000"
            );
            assert!(text.contains(&line), "missing {line} in {text}");
        }
        assert!(text.contains("sentry_up 1\n"), "{text}");
        assert!(text.contains("sentry_scrapes_total 1\n"), "{text}");
        assert!(text.contains("# TYPE sentry_scrape_duration_seconds gauge"), "{text}");
    }

    #[tokio::test]
    async fn index_links_to_metrics() {
        let Html(page) = index(State(state())).await;
        assert!(page.contains("<a href=\"/metrics\">"));
    }

    #[tokio::test]
    async fn router_serves_custom_telemetry_path() {
        let app = create_router(state().exporter, "/sentry/metrics");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let get = |path: &'static str| async move { reqwest::get(format!("http://{addr}{path}")).await.unwrap() };

        let response = get("/sentry/metrics").await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            exposition::CONTENT_TYPE
        );
        assert!(response.text().await.unwrap().contains("sentry_up 1\n"));

        let response = get("/healthz").await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "OK");

        let page = get("/").await.text().await.unwrap();
        assert!(page.contains("<a href=\"/sentry/metrics\">"), "{page}");

        assert_eq!(get("/metrics").await.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
