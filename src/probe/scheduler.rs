//! Concurrency-bounded fan-out of probes across the catalog
//!
//! The scheduler owns every policy the prober does not: global and per-host
//! concurrency limits, transport-failure retries with exponential backoff,
//! the overall run deadline, and cooperative cancellation.

use crate::catalog::ProbeDefinition;
use crate::http::HttpClient;
use crate::models::{ProbeOutcome, ProbeStatus, RunReport, SearchConfig, Token};
use crate::probe::aggregator;
use crate::probe::prober::SiteProber;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Error detail recorded on probes cut short by the run deadline
pub const DETAIL_DEADLINE: &str = "deadline exceeded";
/// Error detail recorded on probes cut short by external cancellation
pub const DETAIL_CANCELLED: &str = "cancelled";

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Fans a token out to all applicable definitions under bounded concurrency
#[derive(Clone)]
pub struct ProbeScheduler {
    prober: SiteProber,
    config: SearchConfig,
    global: Arc<Semaphore>,
    hosts: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl ProbeScheduler {
    pub fn new(client: HttpClient, config: SearchConfig) -> Self {
        let prober = SiteProber::new(client, &config);
        let global = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            prober,
            config,
            global,
            hosts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counting semaphore for the definition's host, created on first use.
    /// Shared across tokens so multi-token runs honor the same budget.
    async fn host_semaphore(&self, def: &ProbeDefinition) -> Arc<Semaphore> {
        let key = def.host().unwrap_or_else(|| def.name.clone());
        let mut map = self.hosts.lock().await;
        map.entry(key)
            .or_insert_with(|| Arc::new(Semaphore::new(self.config.max_per_host)))
            .clone()
    }

    /// Probes every kind-matching definition and streams outcomes as they
    /// complete. The stream is finite and carries exactly one outcome per
    /// applicable definition; completion order is unspecified.
    pub fn run(
        &self,
        token: Token,
        catalog: Arc<Vec<ProbeDefinition>>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<ProbeOutcome> {
        let (tx, rx) = mpsc::channel(64);
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.dispatch(token, catalog, cancel, tx).await;
        });
        rx
    }

    async fn dispatch(
        &self,
        token: Token,
        catalog: Arc<Vec<ProbeDefinition>>,
        cancel: CancellationToken,
        tx: mpsc::Sender<ProbeOutcome>,
    ) {
        let deadline = self.config.deadline().map(|d| Instant::now() + d);
        let mut set = JoinSet::new();

        for (index, def) in catalog.iter().enumerate() {
            if def.kind != token.kind() {
                continue;
            }
            let worker = Worker {
                prober: self.prober.clone(),
                global: Arc::clone(&self.global),
                host_sem: self.host_semaphore(def).await,
                token: token.clone(),
                catalog: Arc::clone(&catalog),
                index,
                max_retries: self.config.max_retries,
                backoff_base: Duration::from_millis(self.config.retry_backoff_ms),
                cancel: cancel.clone(),
                deadline,
            };
            set.spawn(worker.run());
        }

        info!("Dispatching {} probes for \"{token}\"", set.len());

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => {
                    if tx.send(outcome).await.is_err() {
                        debug!("Outcome receiver dropped, stopping collection");
                        break;
                    }
                }
                Err(e) => error!("Probe task panicked: {e}"),
            }
        }
    }

    /// Searches several tokens concurrently. Tokens share the global and
    /// per-host budgets but no other state; reports come back in input order.
    pub async fn run_many(
        &self,
        tokens: Vec<Token>,
        catalog: Arc<Vec<ProbeDefinition>>,
        cancel: CancellationToken,
    ) -> Vec<RunReport> {
        let mut set = JoinSet::new();

        for (pos, token) in tokens.into_iter().enumerate() {
            let scheduler = self.clone();
            let catalog = Arc::clone(&catalog);
            let cancel = cancel.clone();
            set.spawn(async move {
                let applicable = catalog.iter().filter(|d| d.kind == token.kind()).count();
                let outcomes = scheduler.run(token.clone(), catalog, cancel);
                (pos, aggregator::aggregate(token, applicable, outcomes).await)
            });
        }

        let mut reports: Vec<(usize, RunReport)> = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(entry) => reports.push(entry),
                Err(e) => error!("Token task panicked: {e}"),
            }
        }
        reports.sort_by_key(|(pos, _)| *pos);
        reports.into_iter().map(|(_, report)| report).collect()
    }
}

/// One spawned probe: permit acquisition, the attempt/retry loop, and the
/// synthesized outcome when cancellation or the deadline wins the race.
struct Worker {
    prober: SiteProber,
    global: Arc<Semaphore>,
    host_sem: Arc<Semaphore>,
    token: Token,
    catalog: Arc<Vec<ProbeDefinition>>,
    index: usize,
    max_retries: u32,
    backoff_base: Duration,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Worker {
    async fn run(self) -> ProbeOutcome {
        let started = Instant::now();
        let def = &self.catalog[self.index];
        tokio::select! {
            _ = self.cancel.cancelled() => self.cut_short(def, DETAIL_CANCELLED, started),
            _ = until_deadline(self.deadline) => self.cut_short(def, DETAIL_DEADLINE, started),
            outcome = self.attempt_with_permits(def, started) => outcome,
        }
    }

    async fn attempt_with_permits(&self, def: &ProbeDefinition, started: Instant) -> ProbeOutcome {
        // Host permit first so a saturated host never pins a global slot.
        // Permits are held across retries.
        let _host = match self.host_sem.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return self.cut_short(def, DETAIL_CANCELLED, started),
        };
        let _global = match self.global.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return self.cut_short(def, DETAIL_CANCELLED, started),
        };

        let mut attempt: u32 = 0;
        loop {
            let outcome = self.prober.probe(&self.token, def, self.index).await;
            // Error here always means transport failure; unclassifiable
            // responses are Unknown and never retried
            if outcome.status != ProbeStatus::Error || attempt >= self.max_retries {
                return outcome;
            }
            attempt += 1;
            let delay = backoff_delay(self.backoff_base, attempt);
            debug!("Retrying {} (attempt {attempt}) after {delay:?}", def.name);
            sleep(delay).await;
        }
    }

    /// Synthesizes the outcome for a probe that never completed. Elapsed time
    /// covers the whole wait, permit queues and retries included.
    fn cut_short(&self, def: &ProbeDefinition, detail: &str, started: Instant) -> ProbeOutcome {
        ProbeOutcome {
            site_name: def.name.clone(),
            url: SiteProber::build_url(&self.token, def),
            token: self.token.clone(),
            status: ProbeStatus::Error,
            http_status: None,
            body: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
            error_detail: Some(detail.to_string()),
            catalog_index: self.index,
        }
    }
}

async fn until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << (attempt - 1).min(8)).min(MAX_BACKOFF)
}
