//! Projection of the nested project tree into the flat list the dashboard
//! renders.
//!
//! The projection is pure and deterministic: the same upstream payload always
//! produces the same entries in the same order, and entry ids are stable
//! across aggregations so pinned entries keep pointing at the same resource.

use serde::Serialize;

use crate::model::{resolve_domain_url, Project, Resource};

/// The fixed resource categories of an environment, in display order.
/// Each carries the field key used in ids and the label shown in the UI.
const CATEGORIES: [(&str, &str); 7] = [
    ("applications", "Applications"),
    ("compose", "Compose"),
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mariadb", "MariaDB"),
    ("mongo", "MongoDB"),
    ("redis", "Redis"),
];

const FALLBACK_PROJECT_NAME: &str = "Unnamed project";
const FALLBACK_TITLE: &str = "Untitled resource";

/// One row of the dashboard list. Derived, never persisted server-side; the
/// client keeps only the `id` of pinned entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub id: String,
    pub project_key: String,
    pub title: String,
    pub project_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_name: Option<String>,
    pub section: String,
    pub urls: Vec<String>,
}

/// Flatten the project tree into a sorted list of entries.
///
/// Projects, environments, categories and resources are walked in input
/// order; the output is then sorted by project name and entry title
/// (case-insensitive). The sort is stable, so same-key entries keep their
/// traversal order.
pub fn flatten(projects: &[Project]) -> Vec<ResourceEntry> {
    let mut entries = Vec::new();

    for (project_index, project) in projects.iter().enumerate() {
        let project_name = project
            .name
            .clone()
            .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string());
        let project_key = project
            .project_id
            .clone()
            .or_else(|| project.name.clone())
            .unwrap_or_else(|| format!("project-{}", base36(project_index)));

        for environment in &project.environments {
            let environment_name = environment.name.clone();

            for (category_key, section) in CATEGORIES {
                let Some(resources) = category_resources(environment, category_key) else {
                    continue;
                };

                for (res_index, resource) in resources.iter().enumerate() {
                    let urls: Vec<String> = resource
                        .domains
                        .iter()
                        .flatten()
                        .filter_map(|d| resolve_domain_url(Some(d)))
                        .filter(|u| !u.is_empty())
                        .collect();

                    let title = resource
                        .name
                        .clone()
                        .or_else(|| resource.app_name.clone())
                        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

                    let id = resource
                        .compose_id
                        .clone()
                        .or_else(|| resource.application_id.clone())
                        .or_else(|| resource.database_id.clone())
                        .unwrap_or_else(|| {
                            format!(
                                "{}-{}-{}",
                                project.project_id.as_deref().unwrap_or(&project_name),
                                category_key,
                                res_index
                            )
                        });

                    entries.push(ResourceEntry {
                        id,
                        project_key: project_key.clone(),
                        title,
                        project_name: project_name.clone(),
                        environment_name: environment_name.clone(),
                        section: section.to_string(),
                        urls,
                    });
                }
            }
        }
    }

    entries.sort_by(|a, b| {
        let by_project = a
            .project_name
            .to_lowercase()
            .cmp(&b.project_name.to_lowercase());
        by_project.then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });

    entries
}

fn category_resources<'a>(
    environment: &'a crate::model::Environment,
    key: &str,
) -> Option<&'a Vec<Resource>> {
    match key {
        "applications" => environment.applications.as_ref(),
        "compose" => environment.compose.as_ref(),
        "postgres" => environment.postgres.as_ref(),
        "mysql" => environment.mysql.as_ref(),
        "mariadb" => environment.mariadb.as_ref(),
        "mongo" => environment.mongo.as_ref(),
        "redis" => environment.redis.as_ref(),
        _ => None,
    }
}

fn base36(mut n: usize) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[n % 36]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap()
}
