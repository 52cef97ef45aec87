//! Common test utilities

use corvus::catalog::{MarkerSet, ProbeDefinition};
use corvus::models::{SearchConfig, TokenKind};

/// Creates a SearchConfig suited to wiremock-backed tests
pub fn test_config() -> SearchConfig {
    SearchConfig {
        max_concurrent: 10,
        max_per_host: 8,
        timeout_secs: 10,
        max_retries: 0,
        retry_backoff_ms: 10,
        user_agent: "Corvus-Test/0.1.0".to_string(),
        ..SearchConfig::default()
    }
}

/// Creates a bare username probe definition for the given URL template
pub fn definition(name: &str, url_template: &str) -> ProbeDefinition {
    ProbeDefinition {
        name: name.to_string(),
        kind: TokenKind::Username,
        url_template: url_template.to_string(),
        method: "GET".to_string(),
        headers: Default::default(),
        body_template: None,
        exists: MarkerSet::default(),
        not_found: MarkerSet::default(),
        valid_status: None,
        category: None,
        nsfw: false,
    }
}

/// Definition that reports an account when the body contains `marker`
pub fn exists_on_body(name: &str, url_template: &str, marker: &str) -> ProbeDefinition {
    let mut def = definition(name, url_template);
    def.exists.strings = vec![marker.to_string()];
    def
}
