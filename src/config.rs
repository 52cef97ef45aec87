//! Configuration management for Corvus

use crate::error::Result;
use crate::models::SearchConfig;
use serde::Deserialize;
use std::path::Path;

/// File-based configuration structure matching default.toml
#[derive(Debug, Deserialize)]
struct FileConfig {
    search: Option<SearchSection>,
    filters: Option<FiltersSection>,
}

#[derive(Debug, Deserialize)]
struct SearchSection {
    max_concurrent: Option<usize>,
    max_per_host: Option<usize>,
    timeout_secs: Option<u64>,
    deadline_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    max_body_bytes: Option<usize>,
    user_agent: Option<String>,
    follow_redirects: Option<bool>,
    proxy: Option<String>,
    dump: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct FiltersSection {
    category: Option<String>,
    no_nsfw: Option<bool>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<SearchConfig> {
    let content = std::fs::read_to_string(path)?;
    let file_config: FileConfig = toml::from_str(&content)?;

    let mut config = SearchConfig::default();

    if let Some(search) = file_config.search {
        if let Some(max) = search.max_concurrent {
            config.max_concurrent = max;
        }
        if let Some(per_host) = search.max_per_host {
            config.max_per_host = per_host;
        }
        if let Some(timeout) = search.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(deadline) = search.deadline_secs {
            config.deadline_secs = Some(deadline);
        }
        if let Some(retries) = search.max_retries {
            config.max_retries = retries;
        }
        if let Some(backoff) = search.retry_backoff_ms {
            config.retry_backoff_ms = backoff;
        }
        if let Some(cap) = search.max_body_bytes {
            config.max_body_bytes = cap;
        }
        if let Some(ua) = search.user_agent {
            config.user_agent = ua;
        }
        if let Some(follow) = search.follow_redirects {
            config.follow_redirects = follow;
        }
        if let Some(proxy) = search.proxy {
            config.proxy = Some(proxy);
        }
        if let Some(dump) = search.dump {
            config.dump = dump;
        }
    }

    if let Some(filters) = file_config.filters {
        config.filter_category = filters.category;
        if let Some(no_nsfw) = filters.no_nsfw {
            config.no_nsfw = no_nsfw;
        }
    }

    Ok(config)
}

/// Merges CLI arguments into an existing SearchConfig
#[allow(clippy::too_many_arguments)]
pub fn merge_cli_args(
    config: &mut SearchConfig,
    max_concurrent: Option<usize>,
    max_per_host: Option<usize>,
    timeout: Option<u64>,
    deadline: Option<u64>,
    retries: Option<u32>,
    proxy: Option<String>,
    filter: Option<String>,
    headers: Option<Vec<String>>,
) {
    if let Some(max) = max_concurrent {
        config.max_concurrent = max;
    }
    if let Some(per_host) = max_per_host {
        config.max_per_host = per_host;
    }
    if let Some(t) = timeout {
        config.timeout_secs = t;
    }
    if let Some(d) = deadline {
        config.deadline_secs = Some(d);
    }
    if let Some(r) = retries {
        config.max_retries = r;
    }
    if let Some(p) = proxy {
        config.proxy = Some(p);
    }
    if let Some(f) = filter {
        // Accepts "cat=social" or a bare category name
        config.filter_category = Some(
            f.strip_prefix("cat=").map(str::to_string).unwrap_or(f),
        );
    }
    if let Some(h) = headers {
        for header in h {
            if let Some((key, value)) = header.split_once(':') {
                config
                    .headers
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }
}
