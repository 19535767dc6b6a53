use crate::server::create_router;
use color_eyre::Result;
use eyre::Context as _;
use sentry_api_client::SentryClient;
use sentry_exporter_config::Config;
use sentry_exporter_core::{
    Exporter,
    ExporterSettings,
    StatTable,
    StatWindow,
};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct App {
    config: Config,
    exporter: Arc<Exporter>,
}

impl App {
    /// Expects a validated config.
    pub fn new(config: Config) -> Result<Self> {
        let sentry_url = config.sentry_url()?;
        let client = SentryClient::new(&sentry_url, config.auth_token()?, config.sentry.timeout)
            .context("Failed to create sentry client")?;
        debug!(api = %client.base_url(), "created sentry client");

        let table = StatTable::new(&config.metrics.namespace)?;
        let settings = ExporterSettings {
            namespace: config.metrics.namespace.clone(),
            concurrency: config.concurrency()?,
            window: StatWindow::new(config.sentry.stat_resolution, config.sentry.stat_lookback)?,
        };
        let exporter = Exporter::new(Arc::new(client), table, settings).context("Failed to create exporter")?;

        Ok(Self {
            config,
            exporter: Arc::new(exporter),
        })
    }

    pub async fn run(self) -> Result<()> {
        let address = self.config.web.listen_address;
        let telemetry_path = self.config.web.telemetry_path.as_str();
        let app = create_router(self.exporter.clone(), telemetry_path);

        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to listen on {address}"))?;
        info!("starting server; telemetry accessible at {address}{telemetry_path}");

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")?;

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
