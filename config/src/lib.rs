#[macro_use]
extern crate tracing;

mod args;

pub use args::Args;
use eyre::{
    bail,
    ensure,
    eyre,
    Context as _,
    Result,
};
use serde::{
    Deserialize,
    Deserializer,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroUsize,
    time::Duration,
};
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub sentry: SentryConfig,
    pub metrics: MetricsConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebConfig {
    pub listen_address: SocketAddr,
    pub telemetry_path: String,
}

#[derive(Clone, Deserialize)]
pub struct SentryConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    pub concurrency: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub stat_resolution: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub stat_lookback: Duration,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("url", &self.url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .field("stat_resolution", &self.stat_resolution)
            .field("stat_lookback", &self.stat_lookback)
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MetricsConfig {
    pub namespace: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl config::Source for Config {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let mut cache = HashMap::<String, config::Value>::new();
        cache.insert("web.listen_address".to_string(), self.web.listen_address.to_string().into());
        cache.insert("web.telemetry_path".to_string(), self.web.telemetry_path.clone().into());
        if let Some(url) = &self.sentry.url {
            cache.insert("sentry.url".to_string(), url.clone().into());
        }
        if let Some(auth_token) = &self.sentry.auth_token {
            cache.insert("sentry.auth_token".to_string(), auth_token.clone().into());
        }
        for (key, duration) in [
            ("sentry.timeout", self.sentry.timeout),
            ("sentry.stat_resolution", self.sentry.stat_resolution),
            ("sentry.stat_lookback", self.sentry.stat_lookback),
        ] {
            cache.insert(key.to_string(), humantime::format_duration(duration).to_string().into());
        }
        cache.insert("sentry.concurrency".to_string(), (self.sentry.concurrency as u64).into());
        cache.insert("metrics.namespace".to_string(), self.metrics.namespace.clone().into());
        cache.insert("log.level".to_string(), self.log.level.clone().into());
        Ok(cache)
    }
}

impl Config {
    /// Defaults, then the optional config file, then command line and environment.
    pub fn new(args: Args) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(Config::default());

        if let Some(path) = &args.config {
            debug!(?path, "loading config file");
            builder = builder.add_source(config::File::from(path.as_path()).format(config::FileFormat::Yaml));
        }

        builder = builder.add_source(args);

        let cfg: Self = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .context("Failed to load configuration")?;

        Ok(cfg)
    }

    /// Checks everything the exporter needs before anything is started.
    pub fn validate(&self) -> Result<()> {
        self.sentry_url()?;
        self.auth_token()?;
        self.concurrency()?;
        self.log_filter()?;
        ensure!(
            self.sentry.stat_resolution.as_secs() > 0,
            "sentry.stat-resolution needs to be at least 1s, got {}",
            humantime::format_duration(self.sentry.stat_resolution)
        );
        ensure!(
            self.sentry.stat_resolution.subsec_nanos() == 0,
            "sentry.stat-resolution needs to be a whole number of seconds, got {}",
            humantime::format_duration(self.sentry.stat_resolution)
        );
        ensure!(
            !self.sentry.stat_lookback.is_zero(),
            "sentry.stat-lookback needs to be positive"
        );
        ensure!(!self.sentry.timeout.is_zero(), "sentry.timeout needs to be positive");
        ensure!(
            self.web.telemetry_path.starts_with('/'),
            "web.telemetry-path needs to start with '/', got {:?}",
            self.web.telemetry_path
        );
        ensure!(
            !matches!(self.web.telemetry_path.as_str(), "/" | "/healthz"),
            "web.telemetry-path {:?} is reserved",
            self.web.telemetry_path
        );
        Ok(())
    }

    pub fn sentry_url(&self) -> Result<Url> {
        let raw = required(
            self.sentry.url.as_deref(),
            "--sentry.url",
            "SENTRY_URL",
        )?;
        let url = Url::parse(raw).with_context(|| format!("Invalid sentry url {raw:?}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("sentry url needs to be http or https, got {raw:?}");
        }
        Ok(url)
    }

    pub fn auth_token(&self) -> Result<&str> {
        required(
            self.sentry.auth_token.as_deref(),
            "--sentry.auth-token",
            "SENTRY_AUTH_TOKEN",
        )
    }

    pub fn concurrency(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.sentry.concurrency).ok_or_else(|| {
            eyre!(
                "--sentry.concurrency needs to be >= 1, got {}",
                self.sentry.concurrency
            )
        })
    }

    pub fn log_filter(&self) -> Result<LevelFilter> {
        self.log
            .level
            .parse()
            .with_context(|| format!("Invalid log level {:?}", self.log.level))
    }
}

fn required<'a>(value: Option<&'a str>, flag: &str, env: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("neither {flag} nor environment variable {env} was defined; this is required"),
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
