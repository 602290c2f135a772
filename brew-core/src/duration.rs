//! Human-friendly durations, in minutes.

use std::sync::LazyLock;

use regex::Regex;

const MINUTES_PER_DAY: f64 = 60.0 * 24.0;

/// Display units, largest first.
const DISPLAY_FACTORS: [(&str, f64); 5] = [
    ("month", 30.0 * MINUTES_PER_DAY),
    ("week", 7.0 * MINUTES_PER_DAY),
    ("day", MINUTES_PER_DAY),
    ("hour", 60.0),
    ("minute", 1.0),
];

static DURATION_PARTS: LazyLock<Option<[(Regex, f64); 5]>> = LazyLock::new(|| {
    Some([
        (Regex::new(r"(?i)(\d+)\s*w").ok()?, 7.0 * MINUTES_PER_DAY),
        (Regex::new(r"(?i)(\d+)\s*d").ok()?, MINUTES_PER_DAY),
        (Regex::new(r"(?i)(\d+)\s*h").ok()?, 60.0),
        (Regex::new(r"(?i)(\d+)\s*m").ok()?, 1.0),
        (Regex::new(r"(?i)(\d+)\s*s").ok()?, 1.0 / 60.0),
    ])
});

/// Parse a duration such as `"2w 3d"` or `"1h 30m"` into minutes.
///
/// A plain number is returned unchanged. Unrecognised text yields zero.
pub fn parse_duration(value: &str) -> f64 {
    if let Ok(minutes) = value.trim().parse::<f64>() {
        return minutes;
    }
    let Some(parts) = DURATION_PARTS.as_ref() else {
        return 0.0;
    };

    parts
        .iter()
        .filter_map(|(re, factor)| {
            let caps = re.captures(value)?;
            let amount: f64 = caps[1].parse().ok()?;
            Some(amount * factor)
        })
        .sum()
}

/// Render minutes as e.g. `"2 weeks 3 days"`.
///
/// With `approximate = Some(n)` only the `n` most significant units are
/// shown, the last one rounded. Zero renders as `"start"`.
pub fn display_duration(minutes: f64, approximate: Option<usize>) -> String {
    let mut remaining = minutes;
    let mut parts = Vec::new();
    let mut count = 0;

    for (label, factor) in DISPLAY_FACTORS {
        let last_shown = approximate.is_some_and(|n| count + 1 == n);
        let amount = if factor == 1.0 || last_shown {
            (remaining / factor).round()
        } else {
            (remaining / factor).floor()
        };
        remaining %= factor;

        if amount > 0.0 || count > 0 {
            count += 1;
        }
        if approximate.is_some_and(|n| count > n) {
            break;
        }
        if amount > 0.0 {
            let plural = if amount != 1.0 { "s" } else { "" };
            parts.push(format!("{amount:.0} {label}{plural}"));
        }
    }

    if parts.is_empty() {
        "start".to_string()
    } else {
        parts.join(" ")
    }
}
