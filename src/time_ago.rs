use chrono::{DateTime, Utc};

const UNITS: [(&str, i64); 6] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// "3 minutes ago" style label for `then` as seen at `now`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    for (label, unit) in UNITS {
        let n = secs / unit;
        if n >= 1 {
            let plural = if n == 1 { "" } else { "s" };
            return format!("{n} {label}{plural} ago");
        }
    }
    "just now".to_string()
}
