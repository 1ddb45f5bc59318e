//! HTTP client for the upstream Dokploy API.
//!
//! The dashboard issues exactly two upstream calls per aggregation, in
//! parallel, and refuses to serve a partial result: either both legs succeed
//! and validate, or the whole request fails with an error naming the leg
//! that broke.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::model::{ConfigResponse, Meta, OpenApiDocument, Project};

const OPENAPI_CALL: &str = "settings.getOpenApiDocument";
const PROJECTS_CALL: &str = "project.all";

/// Upstream calls hang on unreachable hosts without a client-side deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Dokploy URL is not configured; set upstream.base_url or HARBORVIEW_UPSTREAM_URL")]
    Configuration,

    #[error("upstream {call} returned {status}")]
    Status { call: &'static str, status: StatusCode },

    #[error("upstream {call} response failed validation: {message}")]
    Validation { call: &'static str, message: String },

    #[error("upstream {call} request failed: {source}")]
    Network {
        call: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Client for the two aggregation calls. Construct it once from config and
/// share it; `reqwest::Client` pools connections internally.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl UpstreamClient {
    /// `base_url` is taken as configured; a missing or empty value is kept as
    /// "unconfigured" so each aggregation request can report it instead of
    /// failing at startup.
    pub fn new(base_url: Option<&str>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.and_then(normalize_base_url),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Fetch the OpenAPI descriptor and the project list concurrently and
    /// merge them into one envelope. Fails as a whole if either leg fails.
    pub async fn fetch_config(&self) -> Result<ConfigResponse, UpstreamError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(UpstreamError::Configuration)?;

        let (document, projects) = tokio::try_join!(
            self.get_json::<OpenApiDocument>(base, OPENAPI_CALL),
            self.get_json::<Vec<Project>>(base, PROJECTS_CALL),
        )?;

        debug!(projects = projects.len(), "Aggregated upstream payload");
        Ok(merge_config(document, projects, Utc::now()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        base: &str,
        call: &'static str,
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", base, call);
        let mut request = self.http.get(&url).header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|source| UpstreamError::Network { call, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { call, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| UpstreamError::Network { call, source })?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::Validation {
            call,
            message: e.to_string(),
        })
    }
}

/// Merge the two validated upstream payloads into the response envelope.
fn merge_config(
    document: OpenApiDocument,
    projects: Vec<Project>,
    fetched_at: DateTime<Utc>,
) -> ConfigResponse {
    let info = document.info.unwrap_or_default();
    let servers = document
        .servers
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| s.url)
        .collect();

    ConfigResponse {
        projects,
        meta: Meta {
            title: info.title,
            version: info.version,
            description: info.description,
            servers,
            fetched_at: fetched_at.to_rfc3339(),
        },
    }
}

/// Normalize a configured base URL: trim whitespace, strip exactly one
/// trailing slash, and append `/api` unless the path already carries an
/// `/api` segment. Empty or whitespace-only input means "not configured".
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let stripped = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if stripped.ends_with("/api") || stripped.contains("/api/") {
        Some(stripped.to_string())
    } else {
        Some(format!("{}/api", stripped))
    }
}
