use reqwest::StatusCode;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Failed to build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("The auth token cannot be used as a header value")]
    InvalidToken,
    #[error("Invalid Sentry URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with {status}: {body}")]
    Status { url: Url, status: StatusCode, body: String },
    #[error("Failed to decode the response of {url}: {source}")]
    Decode {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid Link header entry: {0}")]
    InvalidLink(String),
    #[error("The pagination link announces no further results")]
    NoNextPage,
}

impl ApiError {
    /// The HTTP status of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
