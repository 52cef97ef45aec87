//! Single-site probe execution

use crate::catalog::ProbeDefinition;
use crate::error::CorvusError;
use crate::http::HttpClient;
use crate::models::{ProbeOutcome, ProbeStatus, SearchConfig, Token};
use crate::probe::classifier;
use reqwest::Method;
use std::time::Instant;
use tracing::debug;

/// Executes one HTTP probe per call and classifies the response.
///
/// Transport failures surface as `ProbeStatus::Error` with no retry here;
/// the scheduler owns the retry policy.
#[derive(Clone)]
pub struct SiteProber {
    client: HttpClient,
    max_body_bytes: usize,
}

impl SiteProber {
    pub fn new(client: HttpClient, config: &SearchConfig) -> Self {
        Self {
            client,
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Substitutes the token into the definition's URL template
    pub fn build_url(token: &Token, def: &ProbeDefinition) -> String {
        def.url_template.replace("{account}", token.value())
    }

    /// Probes one site for the token. Always produces an outcome.
    pub async fn probe(&self, token: &Token, def: &ProbeDefinition, index: usize) -> ProbeOutcome {
        let url = Self::build_url(token, def);
        let body = def
            .body_template
            .as_ref()
            .map(|b| b.replace("{account}", token.value()));
        // Method validity is enforced at catalog load
        let method = Method::from_bytes(def.method.to_uppercase().as_bytes()).unwrap_or(Method::GET);

        let started = Instant::now();
        let response = match self
            .client
            .request(method, &url, &def.headers, body.as_deref())
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Transport failure for {}: {e}", def.name);
                return self.transport_error(token, def, index, url, None, started, &e);
            }
        };

        let http_status = response.status().as_u16();
        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                let e = CorvusError::HttpError(e);
                return self.transport_error(token, def, index, url, Some(http_status), started, &e);
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let truncated = bytes.len() > self.max_body_bytes;
        let text = String::from_utf8_lossy(&bytes[..bytes.len().min(self.max_body_bytes)]).into_owned();

        let status = classifier::classify(def, http_status, &text);
        debug!("[{}] {} -> {status}", def.name, http_status);

        ProbeOutcome {
            site_name: def.name.clone(),
            url,
            token: token.clone(),
            status,
            http_status: Some(http_status),
            body: Some(text),
            elapsed_ms,
            error_detail: truncated
                .then(|| format!("body truncated at {} bytes", self.max_body_bytes)),
            catalog_index: index,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn transport_error(
        &self,
        token: &Token,
        def: &ProbeDefinition,
        index: usize,
        url: String,
        http_status: Option<u16>,
        started: Instant,
        err: &CorvusError,
    ) -> ProbeOutcome {
        let detail = match err {
            CorvusError::HttpError(e) if e.is_timeout() => "request timed out".to_string(),
            CorvusError::HttpError(e) if e.is_connect() => format!("connection failed: {e}"),
            other => other.to_string(),
        };
        ProbeOutcome {
            site_name: def.name.clone(),
            url,
            token: token.clone(),
            status: ProbeStatus::Error,
            http_status,
            body: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
            error_detail: Some(detail),
            catalog_index: index,
        }
    }
}
