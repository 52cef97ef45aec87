//! HTTP client wrapper with request tracking
//!
//! A single-shot client: retries are the scheduler's concern, so each call
//! here issues exactly one outbound request.

use crate::error::{CorvusError, Result};
use crate::models::SearchConfig;
use rand::seq::SliceRandom;
use reqwest::{Client, Method, Response};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// Picks a browser User-Agent at random, one per run
pub fn random_user_agent() -> String {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&USER_AGENTS[0])
        .to_string()
}

/// Shared HTTP client with a request counter
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_count: Arc<AtomicU64>,
    default_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Creates a new HttpClient from search configuration
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            });

        if let Some(ref proxy_url) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| CorvusError::ConfigError(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            request_count: Arc::new(AtomicU64::new(0)),
            default_headers: config.headers.clone(),
        })
    }

    /// Sends one request with the given method, headers, and optional body
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&str>,
    ) -> Result<Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let mut req = self.client.request(method.clone(), url);
        for (key, value) in self.default_headers.iter().chain(headers) {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(b) = body {
            req = req.body(b.to_string());
        }

        let response = req.send().await?;
        debug!("Response: {} [{method}] {url}", response.status());
        Ok(response)
    }

    /// Returns the total number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}
