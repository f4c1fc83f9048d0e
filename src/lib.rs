//! HTTP monitoring report server library.
//!
//! Serves daily HTTP monitoring reports produced by an external batch job,
//! streaming them from storage with optional account filtering and row caps.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod services;
