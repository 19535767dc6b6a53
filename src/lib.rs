#[macro_use]
extern crate tracing;

mod app;
mod error;
pub mod logging;
pub mod server;

pub use app::App;
pub use error::AppError;
pub use logging::{
    init_errors,
    init_logging,
};
pub use sentry_exporter_config::{
    Args,
    Config,
};
