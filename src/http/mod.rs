//! HTTP client module for Corvus

pub mod client;
pub use client::{random_user_agent, HttpClient};
