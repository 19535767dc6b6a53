use clap::Parser;
use std::{
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

/// Prometheus exporter for the per-project event statistics of a Sentry instance.
///
/// Values given here take precedence over the configuration file, which in
/// turn overrides the built-in defaults.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Optional YAML configuration file.
    #[clap(long, value_name = "FILE", env = "SENTRY_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// The host:port to listen on for HTTP requests. [default: 0.0.0.0:9096]
    #[clap(long = "web.listen-address", value_name = "ADDRESS")]
    pub listen_address: Option<SocketAddr>,

    /// Path under which to expose metrics. [default: /metrics]
    #[clap(long = "web.telemetry-path", value_name = "PATH")]
    pub telemetry_path: Option<String>,

    /// HTTP URL of the Sentry instance to talk to.
    #[clap(long = "sentry.url", value_name = "URL", env = "SENTRY_URL")]
    pub sentry_url: Option<String>,

    /// Bearer token used for authorization.
    #[clap(long = "sentry.auth-token", value_name = "TOKEN", env = "SENTRY_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Timeout of every request sent to Sentry. [default: 10s]
    #[clap(long = "sentry.timeout", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Number of concurrent stats requests to allow against Sentry. [default: 40]
    #[clap(long = "sentry.concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Bucket width of the requested stats series. [default: 10s]
    #[clap(long = "sentry.stat-resolution", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub stat_resolution: Option<Duration>,

    /// How far back the requested stats series reaches. [default: 1m]
    #[clap(long = "sentry.stat-lookback", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub stat_lookback: Option<Duration>,

    /// Prefix of every exported metric. [default: sentry]
    #[clap(long = "metrics.namespace", value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Log level, `RUST_LOG` takes precedence. [default: info]
    #[clap(long = "log.level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(listen_address) = &self.listen_address {
                cache.insert("web.listen_address".to_string(), listen_address.to_string().into());
            }
            if let Some(telemetry_path) = &self.telemetry_path {
                cache.insert("web.telemetry_path".to_string(), telemetry_path.clone().into());
            }
            if let Some(url) = &self.sentry_url {
                cache.insert("sentry.url".to_string(), url.clone().into());
            }
            if let Some(auth_token) = &self.auth_token {
                cache.insert("sentry.auth_token".to_string(), auth_token.clone().into());
            }
            if let Some(timeout) = self.timeout {
                cache.insert(
                    "sentry.timeout".to_string(),
                    humantime::format_duration(timeout).to_string().into(),
                );
            }
            if let Some(concurrency) = self.concurrency {
                cache.insert("sentry.concurrency".to_string(), (concurrency as u64).into());
            }
            if let Some(resolution) = self.stat_resolution {
                cache.insert(
                    "sentry.stat_resolution".to_string(),
                    humantime::format_duration(resolution).to_string().into(),
                );
            }
            if let Some(lookback) = self.stat_lookback {
                cache.insert(
                    "sentry.stat_lookback".to_string(),
                    humantime::format_duration(lookback).to_string().into(),
                );
            }
            if let Some(namespace) = &self.namespace {
                cache.insert("metrics.namespace".to_string(), namespace.clone().into());
            }
            if let Some(log_level) = &self.log_level {
                cache.insert("log.level".to_string(), log_level.clone().into());
            }
            Ok(cache)
        }
    }
}
