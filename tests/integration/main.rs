//! Integration test suite.
//!
//! Drives the real routes against a local report store in a temporary
//! directory. No external services are required.
//!
//! Run with: cargo test --test integration


mod http_monitoring_tests;
