//! Corvus - Reverse Identity Search
//!
//! Probes a catalog of site definitions for accounts bound to a username or
//! email, classifies each response as found / not found / unknown / error,
//! and aggregates the outcomes into a deterministic, catalog-ordered report.

pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod probe;
pub mod report;
