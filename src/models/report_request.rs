//! Query parameters of the report endpoint and their resolved form.

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

/// Date format used for report directories.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw query parameters as sent by the client.
///
/// Every field keeps the exact string received so that absent and empty
/// values stay distinguishable.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Report type, selects `http_monitoring_{report}.csv`.
    pub report: Option<String>,
    /// Report date (`yyyy-MM-dd`), defaults to today.
    pub date: Option<String>,
    /// Only return rows carrying this account as a tab-delimited field.
    pub account: Option<String>,
    /// Maximum number of rows to return. Ignored if not an integer.
    pub top: Option<String>,
}

impl ReportQuery {
    /// Build from decoded `key=value` pairs. The first occurrence of a key wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "report" => &mut query.report,
                "date" => &mut query.date,
                "account" => &mut query.account,
                "top" => &mut query.top,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Cap on the number of matching lines returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopN {
    #[default]
    Unlimited,
    Limit(usize),
}

impl TopN {
    /// Parse the `top` parameter.
    ///
    /// Anything that is not a 32-bit integer is ignored. `-1` means no cap,
    /// other negative values cap at zero lines.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.and_then(|value| value.parse::<i32>().ok()) {
            None | Some(-1) => Self::Unlimited,
            Some(n) => Self::Limit(usize::try_from(n).unwrap_or(0)),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Unlimited => None,
            Self::Limit(n) => Some(*n),
        }
    }

    /// Whether `emitted` lines already exhaust the cap.
    pub fn is_reached(&self, emitted: usize) -> bool {
        self.limit().is_some_and(|limit| emitted >= limit)
    }
}

/// A fully resolved report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub report_type: String,
    pub date: String,
    pub account: Option<String>,
    pub top_n: TopN,
}

impl ReportRequest {
    /// Resolve query parameters against the given calendar day.
    ///
    /// `date` is taken verbatim when present; a malformed value simply points
    /// at a file that does not exist.
    pub fn resolve(query: ReportQuery, today: NaiveDate) -> AppResult<Self> {
        let report_type = query
            .report
            .ok_or_else(|| AppError::InvalidInput("report parameter is required".to_string()))?;

        let date = query.date.unwrap_or_else(|| format_date(today));
        let top_n = TopN::parse(query.top.as_deref());

        Ok(Self {
            report_type,
            date,
            account: query.account,
            top_n,
        })
    }

    /// File name of the report inside its date directory.
    pub fn file_name(&self) -> String {
        format!("http_monitoring_{}.csv", self.report_type)
    }
}

/// Format a day the way report directories are named.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Today's date in the server's local time zone.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
