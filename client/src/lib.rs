//! Minimal client for the Sentry web API (`/api/0/`).
//!
//! Only the endpoints needed to walk organizations, teams and projects and to
//! read per-project event statistics are covered. [`SentryApi`] is the seam
//! the exporter is written against; [`SentryClient`] implements it on top of
//! `reqwest`.

#[macro_use]
extern crate tracing;

pub mod api;
mod client;
mod error;
mod model;
mod pagination;

pub use api::{
    ApiFuture,
    ProjectStatsRequest,
    SentryApi,
};
pub use client::SentryClient;
pub use error::ApiError;
pub use model::{
    Organization,
    Project,
    StatQuery,
    StatSample,
    Team,
};
pub use pagination::{
    LinkTarget,
    Page,
    PageLink,
};
