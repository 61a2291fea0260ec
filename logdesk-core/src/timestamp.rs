//! Server timestamp normalization
//!
//! The LogCollector backend serializes instants differently depending on the
//! code path that produced them:
//!
//! | Wire shape | Example | Interpretation |
//! |------------|---------|----------------|
//! | number / digit string | `1768902069000` | epoch milliseconds |
//! | integer tuple | `[2026,1,20,18,41,9,500000000]` | KST wall clock, 7th element ms or ns |
//! | zoned string | `2026-01-20T09:41:09Z` | absolute instant |
//! | spaced local string | `2026-01-20 18:41:09.000` | KST wall clock |
//! | ISO local string | `2026-01-20T18:41:09` | KST wall clock |
//!
//! Everything else goes through a best-effort parser. Normalization never
//! fails loudly: unusable values become `None` and display as [`PLACEHOLDER`].

use std::fmt;
use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound,
    TimeZone, Timelike, Utc,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Rendered in place of a missing or unparsable timestamp.
pub const PLACEHOLDER: &str = "-";

/// Korea Standard Time, UTC+9 with no daylight saving.
pub const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Largest magnitude a browser `Date` accepts (±100,000,000 days).
const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

/// The tuple's 7th element above this is nanoseconds, not milliseconds.
const MAX_TUPLE_MILLIS: i64 = 999;

/// The fixed KST offset.
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

/// A timestamp exactly as the backend sent it.
///
/// Variant order matters for untagged decoding: integers before floats,
/// strings before the catch-all, so any JSON value decodes without error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerTimestamp {
    /// Epoch milliseconds
    EpochMillis(i64),
    /// Epoch milliseconds with a fractional part
    Fractional(f64),
    /// `[year, month, day, hour, minute, second, fraction?]`
    Parts(Vec<i64>),
    /// Any textual encoding
    Text(String),
    /// Already an instant (constructed client-side, never decoded)
    Instant(DateTime<Utc>),
    /// Booleans, objects and other shapes no parser understands
    Other(serde_json::Value),
}

impl ServerTimestamp {
    /// Build from a raw JSON value. `null` means "no value".
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        // Untagged decoding cannot fail because of the catch-all variant.
        serde_json::from_value(value.clone()).ok()
    }

    /// True for values that mean "nothing was sent" rather than "garbage was sent".
    pub fn is_empty(&self) -> bool {
        matches!(self, ServerTimestamp::Text(s) if s.trim().is_empty())
    }

    /// Normalize to an absolute instant, millisecond precision.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            ServerTimestamp::Instant(dt) => clip(*dt),
            ServerTimestamp::EpochMillis(ms) => from_epoch_millis(*ms),
            ServerTimestamp::Fractional(ms) => {
                if !ms.is_finite() || ms.abs() > MAX_EPOCH_MILLIS as f64 {
                    return None;
                }
                from_epoch_millis(ms.trunc() as i64)
            }
            ServerTimestamp::Parts(parts) => parse_parts(parts),
            ServerTimestamp::Text(text) => parse_text(text),
            ServerTimestamp::Other(_) => None,
        }
    }

    /// Render for display in the host time zone.
    pub fn display(&self) -> String {
        format_server_time(Some(self))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ServerTimestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        ServerTimestamp::Instant(dt.with_timezone(&Utc))
    }
}

impl From<i64> for ServerTimestamp {
    fn from(ms: i64) -> Self {
        ServerTimestamp::EpochMillis(ms)
    }
}

impl From<&str> for ServerTimestamp {
    fn from(text: &str) -> Self {
        ServerTimestamp::Text(text.to_string())
    }
}

impl fmt::Display for ServerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Normalize a raw JSON value into an instant.
pub fn normalize(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    ServerTimestamp::from_value(value).and_then(|ts| ts.instant())
}

/// Render an optional server timestamp in the host time zone, or [`PLACEHOLDER`].
pub fn format_server_time(ts: Option<&ServerTimestamp>) -> String {
    format_server_time_in(ts, &Local)
}

/// Render an optional server timestamp in `tz`, or [`PLACEHOLDER`].
pub fn format_server_time_in<Tz: TimeZone>(ts: Option<&ServerTimestamp>, tz: &Tz) -> String {
    match ts.and_then(ServerTimestamp::instant) {
        Some(instant) => format_korean(&instant, tz),
        None => PLACEHOLDER.to_string(),
    }
}

/// Korean long-form date time: `2026. 1. 20. 오후 6:41:09`.
pub fn format_korean<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> String {
    let local = instant.with_timezone(tz);
    let (is_pm, hour) = local.hour12();
    format!(
        "{}. {}. {}. {} {}:{:02}:{:02}",
        local.year(),
        local.month(),
        local.day(),
        if is_pm { "오후" } else { "오전" },
        hour,
        local.minute(),
        local.second()
    )
}

/// Ten-digit values are almost certainly epoch seconds.
///
/// They are still read as milliseconds; callers only use this to log the
/// suspicious value.
pub fn looks_like_epoch_seconds(value: i64) -> bool {
    (1_000_000_000..100_000_000_000).contains(&value)
}

fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms.unsigned_abs() > MAX_EPOCH_MILLIS as u64 {
        return None;
    }
    if looks_like_epoch_seconds(ms) {
        tracing::debug!(value = ms, "timestamp looks like epoch seconds; reading as milliseconds");
    }
    DateTime::<Utc>::from_timestamp_millis(ms)
}

/// Browser dates carry millisecond precision.
fn clip(dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if dt.nanosecond() >= 1_000_000_000 {
        // leap-second representation
        return None;
    }
    if dt.timestamp_millis().abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    Some(dt.trunc_subsecs(3))
}

fn parse_parts(parts: &[i64]) -> Option<DateTime<Utc>> {
    if !(6..=7).contains(&parts.len()) {
        return None;
    }

    let fraction = parts.get(6).copied().unwrap_or(0);
    let millis = if fraction > MAX_TUPLE_MILLIS {
        fraction / 1_000_000
    } else {
        fraction
    };
    if !(0..=MAX_TUPLE_MILLIS).contains(&millis) {
        return None;
    }

    let year = i32::try_from(parts[0]).ok().filter(|y| (0..=9999).contains(y))?;
    let date = NaiveDate::from_ymd_opt(
        year,
        u32::try_from(parts[1]).ok()?,
        u32::try_from(parts[2]).ok()?,
    )?;
    let time = NaiveTime::from_hms_milli_opt(
        u32::try_from(parts[3]).ok()?,
        u32::try_from(parts[4]).ok()?,
        u32::try_from(parts[5]).ok()?,
        millis as u32,
    )?;

    from_kst_wall_clock(&date.and_time(time))
}

fn spaced_local_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d+)?$").expect("valid regex")
    })
}

fn iso_local_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?$").expect("valid regex")
    })
}

fn zone_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(Z|[+-]\d{2}:\d{2})$").expect("valid regex"))
}

fn parse_text(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return from_epoch_millis(s.parse::<i64>().ok()?);
    }

    if zone_suffix_pattern().is_match(s) {
        return parse_zoned(s).or_else(|| parse_generic(s));
    }

    if spaced_local_pattern().is_match(s) {
        return parse_kst_local(&s.replacen(' ', "T", 1));
    }

    if iso_local_pattern().is_match(s) {
        return parse_kst_local(s);
    }

    parse_generic(s)
}

fn parse_zoned(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return clip(dt.with_timezone(&Utc));
    }

    let normalized = match s.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest.replacen(' ', "T", 1)),
        None => s.replacen(' ', "T", 1),
    };
    ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
        .and_then(|dt| clip(dt.with_timezone(&Utc)))
}

fn parse_kst_local(s: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    from_kst_wall_clock(&naive)
}

fn from_kst_wall_clock(naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    kst()
        .from_local_datetime(naive)
        .single()
        .and_then(|dt| clip(dt.with_timezone(&Utc)))
}

/// Best-effort fallback for shapes the backend is not known to emit.
///
/// Date-only ISO strings are UTC midnight; other zone-less forms use the
/// host time zone, the way a browser date parser treats them.
fn parse_generic(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return clip(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return clip(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    const LOCAL_DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    let naive = LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y/%m/%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .and_then(|dt| clip(dt.with_timezone(&Utc)))
}
