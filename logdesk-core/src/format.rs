//! Formatting helpers shared by the TUI and CLI.

use chrono::{DateTime, Utc};

use crate::timestamp::{ServerTimestamp, PLACEHOLDER};

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    format_relative_time_at(ts, Utc::now())
}

pub fn format_relative_time_at(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Relative time for a server timestamp, or the placeholder.
pub fn format_relative(ts: Option<&ServerTimestamp>) -> String {
    match ts.and_then(ServerTimestamp::instant) {
        Some(instant) => format_relative_time(instant),
        None => PLACEHOLDER.to_string(),
    }
}

/// Cut to `max` characters, ending with an ellipsis when shortened.
pub fn truncate(s: &str, max: usize) -> String {
    let first_line = s.lines().next().unwrap_or_default();
    let shortened = first_line.len() < s.trim_end().len();
    if first_line.chars().count() <= max && !shortened {
        return first_line.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut out: String = first_line.chars().take(keep).collect();
    out.push('…');
    out
}

/// First 8 characters of a log hash.
pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(8) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

/// Integer with thousands separators: `12,345`.
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Optional string or the placeholder.
pub fn or_placeholder(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time_at(now - Duration::seconds(5), now), "5s ago");
        assert_eq!(format_relative_time_at(now - Duration::minutes(3), now), "3m ago");
        assert_eq!(format_relative_time_at(now - Duration::hours(2), now), "2h ago");
        assert_eq!(format_relative_time_at(now + Duration::hours(2), now), "just now");
        assert_eq!(format_relative(None), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("a longer message", 8), "a longe…");
        assert_eq!(truncate("데이터베이스 연결 실패", 4), "데이터…");
        assert_eq!(truncate("line one\nline two", 40), "line one…");
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "01234567");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_count(-4_200), "-4,200");
    }
}
