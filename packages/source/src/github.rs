//! GitHub REST API page source for Actions workflows and workflow runs.
//!
//! The first page of a resource is requested with a `per_page` parameter.
//! Continuation follows the `rel="next"` entry of the `Link` response
//! header, whose URL is used verbatim as the cursor for the next request.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use workflow_stats_source_models::Resource;

use crate::{Page, PageSource, SourceError};

/// Default base URL of the GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest `per_page` the API honours; the server caps larger values.
pub const MAX_PAGE_SIZE: u32 = 100;

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Base API URL, without a trailing slash.
    pub api_url: String,
    /// Optional token, forwarded as a bearer `Authorization` header.
    pub token: Option<String>,
    /// `User-Agent` header value (GitHub rejects requests without one).
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            token: None,
            user_agent: concat!("workflow-stats/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl GithubConfig {
    /// Reads `GITHUB_API_URL` and `GITHUB_TOKEN`, falling back to the
    /// public API without a token.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("GITHUB_API_URL").unwrap_or(defaults.api_url),
            token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            user_agent: defaults.user_agent,
        }
    }
}

/// A [`PageSource`] that talks to the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    /// Builds a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the token is not a valid header value or
    /// the HTTP client cannot be constructed.
    pub fn new(config: &GithubConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                SourceError::Config {
                    message: format!("invalid GITHUB_TOKEN: {e}"),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Builds a client from the environment (see [`GithubConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the client cannot be constructed.
    pub fn from_env() -> Result<Self, SourceError> {
        Self::new(&GithubConfig::from_env())
    }

    /// Builds the URL of the first page of `resource`.
    fn first_page_url(&self, resource: &Resource, page_size: u32) -> String {
        let repo = resource.repo();
        match resource {
            Resource::Workflows { .. } => format!(
                "{}/repos/{}/{}/actions/workflows?per_page={page_size}",
                self.api_url, repo.owner, repo.name
            ),
            Resource::WorkflowRuns { workflow_id, .. } => format!(
                "{}/repos/{}/{}/actions/workflows/{workflow_id}/runs?per_page={page_size}",
                self.api_url, repo.owner, repo.name
            ),
        }
    }
}

impl PageSource for GithubClient {
    async fn fetch_page(
        &self,
        resource: &Resource,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page, SourceError> {
        if page_size > MAX_PAGE_SIZE {
            return Err(SourceError::PageSizeTooLarge {
                requested: page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        let url = cursor.map_or_else(
            || self.first_page_url(resource, page_size),
            str::to_owned,
        );

        log::debug!("Fetching {resource}: {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_next_link);

        let body: serde_json::Value = response.json().await?;
        let records = extract_records(body, resource)?;

        Ok(Page { records, next })
    }

    fn backend(&self) -> &'static str {
        "github"
    }
}

/// Returns the URL of the `rel="next"` entry of a `Link` header, if any.
#[must_use]
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        parts
            .map(str::trim)
            .any(|param| param == "rel=\"next\"" || param == "rel=next")
            .then(|| url.to_owned())
    })
}

/// Pulls the record array out of a list response.
///
/// GitHub wraps each page as `{"total_count": n, "<resource>": [...]}`.
fn extract_records(
    mut body: serde_json::Value,
    resource: &Resource,
) -> Result<Vec<serde_json::Value>, SourceError> {
    let kind = resource.kind();
    let key: &str = kind.as_ref();
    match body.get_mut(key).map(serde_json::Value::take) {
        Some(serde_json::Value::Array(records)) => Ok(records),
        Some(_) => Err(SourceError::MalformedPage {
            resource: resource.to_string(),
            message: format!("'{key}' is not an array"),
        }),
        None => Err(SourceError::MalformedPage {
            resource: resource.to_string(),
            message: format!("response does not contain '{key}'"),
        }),
    }
}
