use clap::Parser;
use color_eyre::Result;
use sentry_exporter::{
    init_errors,
    init_logging,
    App,
    Args,
    Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let config = Config::new(Args::parse())?;
    config.validate()?;
    init_logging(config.log_filter()?)?;
    App::new(config)?.run().await
}
