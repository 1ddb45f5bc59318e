//! Typed model for the upstream Dokploy payload.
//!
//! Upstream objects are loosely typed: almost every field is optional, and the
//! API grows new fields without notice. Each record therefore keeps a
//! `#[serde(flatten)]` side-channel so unknown fields survive a round trip
//! instead of being stripped. Required fields (only `Domain.host` and
//! `Meta.fetched_at`) are enforced by serde itself, so a missing or mistyped
//! field fails deserialization with the offending field named in the error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A published domain attached to a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One deployable unit: an application, a compose stack, or a managed
/// database. Which id field is populated depends on the category the
/// resource was listed under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<Domain>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysql: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mariadb: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<Vec<Resource>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata lifted from the upstream OpenAPI document, plus the timestamp of
/// the aggregation that produced the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub servers: Vec<String>,
    pub fetched_at: String,
}

/// The aggregated envelope served to the dashboard client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub projects: Vec<Project>,
    pub meta: Meta,
}

/// Subset of an OpenAPI 3.x document we care about: `info` and `servers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    #[serde(default)]
    pub info: Option<OpenApiInfo>,
    #[serde(default)]
    pub servers: Option<Vec<OpenApiServer>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiServer {
    #[serde(default)]
    pub url: Option<String>,
}

/// Build a browsable URL from a domain record.
///
/// Returns `None` when the domain is absent or its host is empty. The port
/// segment is omitted for a missing or zero port, and a path of exactly `/`
/// is dropped so we never emit a bare trailing slash. Host and path are
/// trusted as-is; no percent-encoding is applied.
pub fn resolve_domain_url(domain: Option<&Domain>) -> Option<String> {
    let domain = domain?;
    if domain.host.is_empty() {
        return None;
    }

    let scheme = if domain.https == Some(true) {
        "https"
    } else {
        "http"
    };

    let mut url = format!("{}://{}", scheme, domain.host);

    match domain.port {
        Some(port) if port != 0 => {
            url.push(':');
            url.push_str(&port.to_string());
        }
        _ => {}
    }

    if let Some(path) = domain.path.as_deref() {
        if path != "/" {
            url.push_str(path);
        }
    }

    Some(url)
}
