//! Azure DevOps work item lookups.
//!
//! Best-effort client for the work item tracking REST API. Lookups need an
//! organization URL and a personal access token; without both, every call
//! is answered locally with `None` and no network request is made. Any
//! failure (network, auth, missing item, malformed response) is logged and
//! absorbed: callers only ever see an optional description.

use std::future::Future;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::config::Settings;

const WORK_ITEM_FIELDS: &str = "System.Title,System.Description";
const API_VERSION: &str = "7.1";

/// Fetches a human-readable work item description by identifier.
pub trait WorkItemLookup: Send + Sync {
    fn fetch_description(&self, id: &str) -> impl Future<Output = Option<String>> + Send;
}

/// `WorkItemLookup` backed by the Azure DevOps REST API.
pub struct AdoClient {
    organization_url: Option<String>,
    access_token: Option<String>,
    client: OnceLock<reqwest::Client>,
}

#[derive(Debug, Deserialize)]
struct WorkItemResponse {
    #[serde(default)]
    fields: WorkItemFields,
}

#[derive(Debug, Default, Deserialize)]
struct WorkItemFields {
    #[serde(rename = "System.Title")]
    title: Option<String>,
    #[serde(rename = "System.Description")]
    description: Option<String>,
}

impl AdoClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            organization_url: settings.organization_url.clone(),
            access_token: settings.access_token.clone(),
            client: OnceLock::new(),
        }
    }

    /// The HTTP client is built on first use and reused afterwards.
    fn http(&self) -> &reqwest::Client {
        self.client.get_or_init(reqwest::Client::new)
    }

    async fn request(
        &self,
        organization_url: &str,
        token: &str,
        id: &str,
    ) -> reqwest::Result<WorkItemResponse> {
        let url = format!(
            "{}/_apis/wit/workitems/{}",
            organization_url.trim_end_matches('/'),
            id
        );

        self.http()
            .get(&url)
            .query(&[("fields", WORK_ITEM_FIELDS), ("api-version", API_VERSION)])
            .basic_auth("", Some(token))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

impl WorkItemLookup for AdoClient {
    async fn fetch_description(&self, id: &str) -> Option<String> {
        let (Some(url), Some(token)) =
            (self.organization_url.as_deref(), self.access_token.as_deref())
        else {
            tracing::debug!("work item tracker not configured, skipping lookup for {}", id);
            return None;
        };

        match self.request(url, token, id).await {
            Ok(item) => combine_fields(item.fields),
            Err(e) => {
                tracing::warn!("work item {} lookup failed: {}", id, e);
                None
            }
        }
    }
}

/// Join title and description with a line break. A lookup that produced no
/// text at all is not worth displaying and counts as unavailable.
fn combine_fields(fields: WorkItemFields) -> Option<String> {
    let title = fields.title.unwrap_or_default();
    let description = fields.description.unwrap_or_default();
    let combined = format!("{title}\n{description}");
    let combined = combined.trim();

    if combined.is_empty() {
        None
    } else {
        Some(combined.to_string())
    }
}
