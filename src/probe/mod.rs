//! Probing engine: classification, per-site probing, scheduling, aggregation

pub mod aggregator;
pub mod classifier;
pub mod prober;
pub mod scheduler;

pub use aggregator::aggregate;
pub use classifier::classify;
pub use prober::SiteProber;
pub use scheduler::{ProbeScheduler, DETAIL_CANCELLED, DETAIL_DEADLINE};
