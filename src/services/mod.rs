//! Report storage and streaming services.

pub mod report_reader;
pub mod storage;

pub use report_reader::{AccountFilter, MatchingLines, ReportReader};
pub use storage::{LocalStore, ReportStore, S3Store};
