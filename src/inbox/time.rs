//! Relative time tags (`time:today`, `time:24h`, ...) and the display
//! date formatting they share with the general text search. The
//! formatter's exact output participates in matching, so the two must
//! stay consistent.

use chrono::{DateTime, Datelike, Duration, Local, TimeZone};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const WEEK_MS: i64 = 7 * DAY_MS;

fn local_datetime(ts_millis: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(ts_millis).single()
}

/// Format a message timestamp the way the inbox list displays it:
/// time-of-day within 24 hours, weekday + month + day within a week,
/// month + day beyond that.
pub fn format_display_date(ts_millis: i64, now: DateTime<Local>) -> String {
    let Some(datetime) = local_datetime(ts_millis) else {
        return String::new();
    };

    let elapsed_ms = now.timestamp_millis() - ts_millis;
    if elapsed_ms < DAY_MS {
        datetime.format("%-I:%M %p").to_string()
    } else if elapsed_ms < WEEK_MS {
        datetime.format("%a %b %-d").to_string()
    } else {
        datetime.format("%b %-d").to_string()
    }
}

/// Whether a term names one of the relative time buckets. The query
/// parser uses this to route bare keywords like `today` into the time
/// bucket even without a `time:` prefix.
pub fn is_time_keyword(term: &str) -> bool {
    matches!(
        term,
        "today" | "yesterday" | "24h" | "last24h" | "day" | "7d" | "last7d" | "week" | "last7days"
    )
}

/// Evaluate one time tag against a message timestamp. Unrecognized
/// terms fall back to substring matching on the formatted display date
/// (so `mon` or `jan` match by containment).
pub fn matches_time_tag(term: &str, ts_millis: i64, now: DateTime<Local>) -> bool {
    let Some(datetime) = local_datetime(ts_millis) else {
        return false;
    };
    let elapsed_ms = now.timestamp_millis() - ts_millis;

    match term {
        "today" => datetime.date_naive() == now.date_naive(),
        "yesterday" => datetime.date_naive() == (now - Duration::days(1)).date_naive(),
        "24h" | "last24h" | "day" => elapsed_ms < DAY_MS,
        "7d" | "last7d" | "week" | "last7days" => elapsed_ms < WEEK_MS,
        _ => {
            let display = format_display_date(ts_millis, now).to_lowercase();
            !display.is_empty() && display.contains(term)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Local> {
        Local::now()
    }

    #[test]
    fn test_today_matches_current_moment() {
        let current = now();
        assert!(matches_time_tag("today", current.timestamp_millis(), current));
    }

    #[test]
    fn test_25_hours_ago_is_not_today_but_is_week() {
        let current = now();
        let ts = (current - Duration::hours(25)).timestamp_millis();

        assert!(!matches_time_tag("today", ts, current));
        assert!(!matches_time_tag("24h", ts, current));
        assert!(matches_time_tag("week", ts, current));
        assert!(matches_time_tag("7d", ts, current));
    }

    #[test]
    fn test_yesterday() {
        let current = now();
        let ts = (current - Duration::days(1)).timestamp_millis();
        assert!(matches_time_tag("yesterday", ts, current));
        assert!(!matches_time_tag("yesterday", current.timestamp_millis(), current));
    }

    #[test]
    fn test_24h_aliases() {
        let current = now();
        let recent = (current - Duration::hours(2)).timestamp_millis();
        for term in ["24h", "last24h", "day"] {
            assert!(matches_time_tag(term, recent, current));
        }

        let old = (current - Duration::days(10)).timestamp_millis();
        for term in ["24h", "last24h", "day", "7d", "last7d", "week", "last7days"] {
            assert!(!matches_time_tag(term, old, current));
        }
    }

    #[test]
    fn test_unknown_term_falls_back_to_display_containment() {
        let current = now();
        // 3 days ago renders as weekday + month + day, e.g. "Mon Jan 5"
        let three_days_ago = current - Duration::days(3);
        let ts = three_days_ago.timestamp_millis();

        let weekday = three_days_ago.format("%a").to_string().to_lowercase();
        assert!(matches_time_tag(&weekday, ts, current));

        let month = three_days_ago.format("%b").to_string().to_lowercase();
        assert!(matches_time_tag(&month, ts, current));

        assert!(!matches_time_tag("zzz", ts, current));
    }

    #[test]
    fn test_display_format_buckets() {
        let current = now();

        let recent = current - Duration::hours(1);
        let display = format_display_date(recent.timestamp_millis(), current);
        assert!(display.contains("AM") || display.contains("PM"));

        let this_week = current - Duration::days(3);
        let display = format_display_date(this_week.timestamp_millis(), current);
        assert!(display.starts_with(&this_week.format("%a").to_string()));

        let older = current - Duration::days(30);
        let display = format_display_date(older.timestamp_millis(), current);
        assert!(display.starts_with(&older.format("%b").to_string()));
        assert!(!display.contains(&older.format("%a").to_string()));
    }
}
