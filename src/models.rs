//! Core data models for Corvus

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// The kind of identity token being searched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Username,
    Email,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Username => write!(f, "username"),
            TokenKind::Email => write!(f, "email"),
        }
    }
}

/// An identity token (username or email) to search for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    value: String,
    kind: TokenKind,
}

impl Token {
    /// Creates a token of the given kind
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// Creates a username token
    pub fn username(value: impl Into<String>) -> Self {
        Self::new(value, TokenKind::Username)
    }

    /// Creates an email token
    pub fn email(value: impl Into<String>) -> Self {
        Self::new(value, TokenKind::Email)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Existence status determined for one (token, site) pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProbeStatus {
    /// The site reported an account bound to the token
    Exists,
    /// The site reported no such account
    NotFound,
    /// A response was obtained but matched neither marker set
    Unknown,
    /// No classification could be attempted (transport failure)
    Error,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Exists => write!(f, "FOUND"),
            ProbeStatus::NotFound => write!(f, "NOT-FOUND"),
            ProbeStatus::Unknown => write!(f, "UNKNOWN"),
            ProbeStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// The immutable result of one probe against one site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Site name from the probe definition
    pub site_name: String,
    /// Fully substituted request URL
    pub url: String,
    /// Token that was probed
    pub token: Token,
    /// Classified existence status
    pub status: ProbeStatus,
    /// HTTP status code, when a response was obtained
    pub http_status: Option<u16>,
    /// Response body, truncated at the configured cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Wall-clock time spent on the request in milliseconds
    pub elapsed_ms: u64,
    /// Transport failure or truncation detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Position of the definition in the catalog, used for deterministic ordering
    pub catalog_index: usize,
}

/// Aggregated result of searching one token across the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: String,
    /// Token this report covers
    pub token: Token,
    /// Run start time (local timezone)
    pub started_at: DateTime<Local>,
    /// Run end time, set when the report is sealed
    pub finished_at: Option<DateTime<Local>>,
    /// Outcomes in catalog order, one per applicable definition
    pub outcomes: Vec<ProbeOutcome>,
    /// Number of definitions applicable to the token's kind
    pub total_sites: usize,
    /// Probes cut short by deadline or cancellation
    pub unresolved: usize,
}

impl RunReport {
    /// Creates an empty report for a token
    pub fn new(token: Token, total_sites: usize) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            token,
            started_at: Local::now(),
            finished_at: None,
            outcomes: Vec::with_capacity(total_sites),
            total_sites,
            unresolved: 0,
        }
    }

    /// Returns the outcomes where an account was found
    pub fn found(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == ProbeStatus::Exists)
    }

    /// Returns count of outcomes with the given status
    pub fn count_by_status(&self, status: ProbeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Marks the report as sealed
    pub fn seal(&mut self) {
        self.finished_at = Some(Local::now());
    }
}

/// Configuration for a search session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum in-flight requests across all sites and tokens
    pub max_concurrent: usize,
    /// Maximum in-flight requests to a single host
    pub max_per_host: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Overall run deadline in seconds (unlimited when absent)
    pub deadline_secs: Option<u64>,
    /// Transport-failure retry budget per probe
    pub max_retries: u32,
    /// Base delay for exponential retry backoff, in milliseconds
    pub retry_backoff_ms: u64,
    /// Response bodies are truncated beyond this many bytes
    pub max_body_bytes: usize,
    /// User-Agent header value
    pub user_agent: String,
    /// Whether to follow HTTP redirects
    pub follow_redirects: bool,
    /// HTTP/HTTPS proxy URL
    pub proxy: Option<String>,
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
    /// Only probe sites in this category
    pub filter_category: Option<String>,
    /// Exclude NSFW sites from the search
    pub no_nsfw: bool,
    /// Dump response bodies of found accounts to disk
    pub dump: bool,
}

impl SearchConfig {
    /// Per-probe timeout as a Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Overall run deadline as a Duration, if configured
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 50,
            max_per_host: 2,
            timeout_secs: 30,
            deadline_secs: None,
            max_retries: 1,
            retry_backoff_ms: 500,
            max_body_bytes: 256 * 1024,
            user_agent: "Corvus/0.1.0".to_string(),
            follow_redirects: true,
            proxy: None,
            headers: HashMap::new(),
            filter_category: None,
            no_nsfw: false,
            dump: false,
        }
    }
}
