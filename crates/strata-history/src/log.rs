//! Commit record building from `git log` output.
//!
//! The log is requested with a custom `--format` whose fields are joined by a
//! caller-chosen delimiter. [`parse_log`] maps each record back to a
//! [`CommitRecord`], one output record per input record.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use strata_core::{CommitRecord, DEFAULT_LOG_DELIMITER};
use tracing::debug;

/// Separator git emits between records when bodies are included (`%x1e`).
const RECORD_SEPARATOR: char = '\u{1e}';

/// Field layout of a log request.
///
/// # Examples
///
/// ```
/// use strata_history::log::LogFormat;
///
/// let format = LogFormat::with_delimiter("|");
/// assert_eq!(format.git_format(), "%H|%h|%s|%an|%aI|%P|%D");
///
/// let with_body = LogFormat { include_body: true, ..format };
/// assert_eq!(with_body.git_format(), "%H|%h|%s|%an|%aI|%P|%D|%b%x1e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFormat {
    /// Field delimiter. Must not occur in any field git may print.
    pub delimiter: String,
    /// Append the message body as an eighth field.
    pub include_body: bool,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::with_delimiter(DEFAULT_LOG_DELIMITER)
    }
}

impl LogFormat {
    /// A format without bodies using `delimiter` between fields.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            include_body: false,
        }
    }

    /// The value to pass as `git log --format=<value>`.
    pub fn git_format(&self) -> String {
        let d = &self.delimiter;
        let mut format = ["%H", "%h", "%s", "%an", "%aI", "%P", "%D"].join(d);
        if self.include_body {
            format.push_str(d);
            format.push_str("%b%x1e");
        }
        format
    }
}

/// Parse log output produced with `format` into commit records.
///
/// Every non-blank record yields exactly one [`CommitRecord`], in input
/// order. A record with an empty hash is kept with `hash: ""` so callers can
/// line results up with the lines they fed in. Missing trailing fields are
/// treated as empty, so a truncated line still yields a record.
///
/// # Examples
///
/// ```
/// use strata_history::log::{parse_log, LogFormat};
///
/// let text = "abc123|abc123|Fix bug|Jane|2024-01-01|def456|HEAD -> main\n";
/// let commits = parse_log(text, &LogFormat::with_delimiter("|"));
///
/// assert_eq!(commits.len(), 1);
/// assert_eq!(commits[0].parents, vec!["def456"]);
/// assert_eq!(commits[0].refs, vec!["HEAD -> main"]);
/// assert!(!commits[0].is_merge());
/// ```
pub fn parse_log(text: &str, format: &LogFormat) -> Vec<CommitRecord> {
    let records: Box<dyn Iterator<Item = &str>> = if format.include_body {
        Box::new(text.split(RECORD_SEPARATOR))
    } else {
        Box::new(text.lines())
    };

    records
        .filter_map(|record| parse_record(record, format))
        .collect()
}

fn parse_record(record: &str, format: &LogFormat) -> Option<CommitRecord> {
    // Bodies end with a newline before %x1e, and git puts one after it.
    let record = record.trim_matches(|c| c == '\n' || c == '\r');
    if record.trim().is_empty() {
        return None;
    }

    let limit = if format.include_body { 8 } else { 7 };
    let mut fields = record.splitn(limit, format.delimiter.as_str());
    let mut next = || fields.next().unwrap_or("");

    let hash = next().trim();
    if hash.is_empty() {
        debug!(record, "log record without a hash");
    }
    let short_hash = next().trim();
    let subject = next();
    let author = next();
    let date = next();
    let parents = next();
    let refs = next();
    let body = if format.include_body {
        let body = next().trim();
        (!body.is_empty()).then(|| body.to_string())
    } else {
        None
    };

    Some(CommitRecord {
        hash: hash.to_string(),
        short_hash: short_hash.to_string(),
        parents: parents.split_whitespace().map(str::to_string).collect(),
        refs: refs
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
        author: author.to_string(),
        authored_at: parse_timestamp(date),
        subject: subject.to_string(),
        body,
        stats: None,
    })
}

/// Parse a log date field.
///
/// Accepts strict ISO 8601 (`%aI`), git's ISO-like form (`%ai`), RFC 2822,
/// a bare calendar date (midnight UTC) and unix seconds (`%at`).
///
/// # Examples
///
/// ```
/// use strata_history::log::parse_timestamp;
///
/// let t = parse_timestamp("2024-03-05T10:20:30+02:00").unwrap();
/// assert_eq!(t.timestamp(), 1709626830);
///
/// assert!(parse_timestamp("2024-01-01").is_some());
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(field: &str) -> Option<DateTime<FixedOffset>> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(field) {
        return Some(t);
    }
    if let Ok(t) = DateTime::parse_from_str(field, "%Y-%m-%d %H:%M:%S %z") {
        return Some(t);
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(field) {
        return Some(t);
    }
    if let Ok(date) = NaiveDate::parse_from_str(field, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).fixed_offset());
    }
    if let Ok(seconds) = field.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0).map(|t| t.fixed_offset());
    }

    debug!(field, "unrecognized commit date");
    None
}
