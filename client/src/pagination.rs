//! Cursor pagination as exposed by Sentry through the `Link` response header:
//!
//! ```text
//! <https://sentry.io/api/0/organizations/?&cursor=100:-1:1>; rel="previous"; results="false"; cursor="100:-1:1",
//! <https://sentry.io/api/0/organizations/?&cursor=100:1:0>; rel="next"; results="true"; cursor="100:1:0"
//! ```

use crate::ApiError;
use url::Url;

/// One page of a listing together with the links to its neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub link: PageLink,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLink {
    pub previous: Option<LinkTarget>,
    pub next: Option<LinkTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub url: Url,
    /// Whether requesting `url` yields any items.
    pub results: bool,
    pub cursor: String,
}

impl PageLink {
    /// Returns the next page target if the server announced further results.
    pub fn next_with_results(&self) -> Option<&LinkTarget> {
        self.next.as_ref().filter(|next| next.results)
    }

    pub fn has_next(&self) -> bool {
        self.next_with_results().is_some()
    }

    pub fn parse(header: &str) -> Result<Self, ApiError> {
        let mut link = PageLink::default();

        for entry in header.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let invalid = || ApiError::InvalidLink(entry.to_string());

            let (target, params) = entry
                .strip_prefix('<')
                .and_then(|rest| rest.split_once('>'))
                .ok_or_else(invalid)?;
            let url = Url::parse(target.trim()).map_err(|_| invalid())?;

            let mut rel = None;
            let mut results = false;
            let mut cursor = String::new();
            for param in params.split(';').map(str::trim).filter(|param| !param.is_empty()) {
                let (key, value) = param.split_once('=').ok_or_else(invalid)?;
                let value = value.trim().trim_matches('"');
                match key.trim() {
                    "rel" => rel = Some(value.to_string()),
                    "results" => results = value == "true",
                    "cursor" => cursor = value.to_string(),
                    _ => {}
                }
            }

            let target = LinkTarget { url, results, cursor };
            match rel.as_deref() {
                Some("next") => link.next = Some(target),
                Some("previous") => link.previous = Some(target),
                Some(_) => {}
                None => return Err(invalid()),
            }
        }

        Ok(link)
    }
}
