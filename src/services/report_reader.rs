//! Streaming reader for daily HTTP monitoring reports.
//!
//! A report is read one line at a time from storage. Lines are optionally
//! filtered by account and the output is optionally capped, so memory use
//! stays bounded by the longest line whatever the file size.

use std::borrow::Cow;
use std::sync::Arc;

use actix_web::web::Bytes;
use futures_util::stream::{self, Stream};
use regex::Regex;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, error};

use crate::config::{AccountMatch, ReportSettings};
use crate::error::{AppError, AppResult};
use crate::models::{ReportRequest, TopN};
use crate::services::storage::{ReportSource, ReportStore};

/// Opens reports and turns them into filtered line streams.
#[derive(Clone)]
pub struct ReportReader {
    store: Arc<dyn ReportStore>,
    settings: ReportSettings,
}

impl ReportReader {
    pub fn new(store: Arc<dyn ReportStore>, settings: ReportSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Storage path of the report selected by `request`.
    ///
    /// Format: `{reports_root}/{date}/http_monitoring_{report}.csv`
    pub fn report_path(&self, request: &ReportRequest) -> String {
        format!(
            "{}/{}/{}",
            self.settings.reports_root,
            request.date,
            request.file_name()
        )
    }

    /// Open the report for `request`.
    ///
    /// The filter is built before storage is touched, so an unusable account
    /// pattern never opens a handle. Errors from opening the file surface
    /// here, before any output is produced.
    pub async fn open(&self, request: &ReportRequest) -> AppResult<MatchingLines> {
        let filter = request
            .account
            .as_deref()
            .map(|account| AccountFilter::new(account, self.settings.account_match))
            .transpose()?;

        let path = self.report_path(request);
        debug!(path = %path, account = ?request.account, top = ?request.top_n, "Opening report");

        let source = self.store.open(&path).await?;
        Ok(MatchingLines::new(source, filter, request.top_n).with_label(path))
    }
}

/// Any character except a line terminator (`\n`, `\r`, NEL, LS, PS).
const LINE_CHAR: &str = r"[^\n\r\x{85}\x{2028}\x{2029}]";

/// Matches lines carrying an account as a tab-delimited field.
///
/// A line matches when the whole line matches `.*?\t{account}\t.*`, i.e.
/// the account sits between two tabs somewhere in the line.
#[derive(Debug, Clone)]
pub struct AccountFilter {
    pattern: Regex,
}

impl AccountFilter {
    /// Build a filter for `account`.
    ///
    /// With [`AccountMatch::Regex`] the value is used as a sub-pattern as
    /// given, so characters like `.` or `|` keep their regex meaning. With
    /// [`AccountMatch::Literal`] it is escaped first.
    pub fn new(account: &str, mode: AccountMatch) -> AppResult<Self> {
        let account: Cow<'_, str> = match mode {
            AccountMatch::Regex => Cow::Borrowed(account),
            AccountMatch::Literal => Cow::Owned(regex::escape(account)),
        };
        let pattern = Regex::new(&format!("^(?:{LINE_CHAR}*?\t{account}\t{LINE_CHAR}*)$"))?;
        Ok(Self { pattern })
    }

    /// Lines are decoded lossily for matching only.
    pub fn matches(&self, line: &[u8]) -> bool {
        self.pattern.is_match(&String::from_utf8_lossy(line))
    }
}

/// Lines of an open report that pass the filter, up to the cap.
///
/// Single forward pass: once the cap is reached no further input is read.
/// The storage handle is released when this value is dropped.
pub struct MatchingLines {
    source: ReportSource,
    filter: Option<AccountFilter>,
    top_n: TopN,
    emitted: usize,
    buf: Vec<u8>,
    label: String,
}

impl MatchingLines {
    pub fn new(source: ReportSource, filter: Option<AccountFilter>, top_n: TopN) -> Self {
        Self {
            source,
            filter,
            top_n,
            emitted: 0,
            buf: Vec::new(),
            label: String::new(),
        }
    }

    /// Name used when logging stream outcomes.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Number of lines emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Next emitted line, newline-terminated, or `None` at the end.
    pub async fn next_line(&mut self) -> AppResult<Option<Bytes>> {
        loop {
            if self.top_n.is_reached(self.emitted) {
                return Ok(None);
            }

            self.buf.clear();
            let read = self
                .source
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to read {}: {}", self.label, e)))?;
            if read == 0 {
                return Ok(None);
            }

            let line = strip_line_terminator(&self.buf);
            if self.filter.as_ref().is_none_or(|filter| filter.matches(line)) {
                self.emitted += 1;
                let mut out = Vec::with_capacity(line.len() + 1);
                out.extend_from_slice(line);
                out.push(b'\n');
                return Ok(Some(Bytes::from(out)));
            }
        }
    }

    /// Turn into a body stream for a streaming HTTP response.
    ///
    /// A read error ends the stream with that error, which aborts the
    /// response since the status line has already been sent.
    pub fn into_stream(self) -> impl Stream<Item = AppResult<Bytes>> + 'static {
        stream::unfold(Some(self), |state| async move {
            let mut lines = state?;
            match lines.next_line().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(lines))),
                Ok(None) => {
                    debug!(path = %lines.label, lines = lines.emitted, "Report stream finished");
                    None
                }
                Err(e) => {
                    error!(
                        path = %lines.label,
                        lines = lines.emitted,
                        "Report stream failed: {}",
                        e
                    );
                    Some((Err(e), None))
                }
            }
        })
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn strip_line_terminator(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}
