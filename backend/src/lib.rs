//! # Store Uptime
//!
//! Estimates uptime and downtime for a fleet of retail locations from sparse
//! status polls, bounded by each location's local business hours, and serves
//! the result as an asynchronous report job.
//!
//! ## Architecture
//!
//! - [`models`]: Domain types (polls, business-hour rules, report jobs, rows)
//! - [`services`]: Uptime estimation and the report pipeline
//! - [`db`]: Repository traits with in-memory and Postgres backends
//! - [`config`]: Report pipeline settings
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
