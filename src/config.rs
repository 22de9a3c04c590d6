//! Work item tracker configuration.
//!
//! Three optional settings drive enrichment: the Azure DevOps organization
//! URL, a personal access token, and the regex used to spot work item
//! references in commit summaries. CLI flags win over environment
//! variables. When the URL or token is missing, enrichment is disabled and
//! annotations fall back to plain blame output.

use regex::Regex;

use crate::error::{AppError, Result};
use crate::tracker::extract::DEFAULT_IDENTIFIER_PATTERN;

const ORGANIZATION_URL_VAR: &str = "ADO_ORGANIZATION_URL";
const ACCESS_TOKEN_VAR: &str = "ADO_ACCESS_TOKEN";
const IDENTIFIER_PATTERN_VAR: &str = "ADO_WORK_ITEM_PATTERN";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub organization_url: Option<String>,
    pub access_token: Option<String>,
    pub identifier_pattern: Option<String>,
}

impl Settings {
    /// Merge CLI-provided values with environment fallbacks.
    pub fn resolve(
        organization_url: Option<String>,
        access_token: Option<String>,
        identifier_pattern: Option<String>,
    ) -> Self {
        Self {
            organization_url: organization_url.or_else(|| read_env(ORGANIZATION_URL_VAR)),
            access_token: access_token.or_else(|| read_env(ACCESS_TOKEN_VAR)),
            identifier_pattern: identifier_pattern.or_else(|| read_env(IDENTIFIER_PATTERN_VAR)),
        }
    }

    /// True when both settings required for remote lookups are present.
    pub fn enrichment_configured(&self) -> bool {
        self.organization_url.is_some() && self.access_token.is_some()
    }

    /// Compile the configured identifier pattern, or the default one.
    pub fn identifier_regex(&self) -> Result<Regex> {
        let source = self
            .identifier_pattern
            .as_deref()
            .unwrap_or(DEFAULT_IDENTIFIER_PATTERN);
        Regex::new(source).map_err(|e| AppError::InvalidPattern(e.to_string()))
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
