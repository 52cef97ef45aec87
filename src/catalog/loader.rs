//! JSON catalog loader for site probe definitions

use crate::error::{CorvusError, Result};
use crate::models::{SearchConfig, TokenKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use url::Url;

/// Response markers for one existence verdict.
///
/// A set matches when the HTTP status code is listed, any marker string is a
/// substring of the body, or any regex pattern matches the body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MarkerSet {
    #[serde(default)]
    pub status: Vec<u16>,
    #[serde(default)]
    pub strings: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl MarkerSet {
    pub fn is_empty(&self) -> bool {
        self.status.is_empty() && self.strings.is_empty() && self.patterns.is_empty()
    }
}

/// Describes how to test one site for a token's existence.
///
/// Loaded once at startup and shared read-only across all probes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeDefinition {
    pub name: String,
    pub kind: TokenKind,
    /// Request URL with an `{account}` placeholder for the token
    pub url_template: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Optional request body, also `{account}`-templated
    #[serde(default)]
    pub body_template: Option<String>,
    /// Markers indicating an account exists
    pub exists: MarkerSet,
    /// Markers indicating no account exists
    #[serde(default)]
    pub not_found: MarkerSet,
    /// Inclusive status range considered classifiable; codes outside it are
    /// Unknown unless listed as a not-found status
    #[serde(default)]
    pub valid_status: Option<(u16, u16)>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

impl ProbeDefinition {
    /// Host component of the probe URL, used to key per-host concurrency limits
    pub fn host(&self) -> Option<String> {
        let url = self.url_template.replace("{account}", "probe");
        Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    sites: Vec<ProbeDefinition>,
}

const VALID_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Validates a definition for correctness
pub fn validate_definition(def: &ProbeDefinition) -> std::result::Result<(), String> {
    if def.name.is_empty() {
        return Err("site name is empty".to_string());
    }
    if !def.url_template.contains("{account}") {
        return Err("url_template is missing the {account} placeholder".to_string());
    }
    if Url::parse(&def.url_template.replace("{account}", "probe")).is_err() {
        return Err(format!("url_template is not a valid URL: {}", def.url_template));
    }
    if !VALID_METHODS.contains(&def.method.to_uppercase().as_str()) {
        return Err(format!("invalid HTTP method: {}", def.method));
    }
    if def.exists.is_empty() {
        return Err("no exists markers configured".to_string());
    }
    for pattern in def.exists.patterns.iter().chain(&def.not_found.patterns) {
        if let Err(e) = Regex::new(pattern) {
            return Err(format!("invalid marker pattern '{pattern}': {e}"));
        }
    }
    if let Some((min, max)) = def.valid_status {
        if min > max {
            return Err(format!("valid_status range is inverted: {min}-{max}"));
        }
    }
    Ok(())
}

/// Parses a catalog document. A malformed definition is fatal, never skipped.
pub fn parse_catalog(content: &str) -> Result<Vec<ProbeDefinition>> {
    let file: CatalogFile = serde_json::from_str(content)?;

    for def in &file.sites {
        if let Err(msg) = validate_definition(def) {
            return Err(CorvusError::CatalogError(def.name.clone(), msg));
        }
    }

    Ok(file.sites)
}

/// Loads and validates the site catalog from a JSON file
pub fn load_catalog(path: &Path) -> Result<Vec<ProbeDefinition>> {
    let content = std::fs::read_to_string(path)?;
    let sites = parse_catalog(&content)?;
    info!("Loaded {} site definitions from {}", sites.len(), path.display());
    Ok(sites)
}

/// Applies category and NSFW filters from the config
pub fn apply_filters(
    catalog: Vec<ProbeDefinition>,
    config: &SearchConfig,
) -> Vec<ProbeDefinition> {
    let before = catalog.len();
    let filtered: Vec<ProbeDefinition> = catalog
        .into_iter()
        .filter(|def| {
            if config.no_nsfw && def.nsfw {
                return false;
            }
            match &config.filter_category {
                Some(cat) => def.category.as_deref() == Some(cat.as_str()),
                None => true,
            }
        })
        .collect();

    if filtered.len() != before {
        info!("Filtered catalog: {} of {} sites selected", filtered.len(), before);
    }
    filtered
}
