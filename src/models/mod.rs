//! Request models for the report endpoints.

pub mod report_request;

pub use report_request::{ReportQuery, ReportRequest, TopN, format_date, local_today};
