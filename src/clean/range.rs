//! Age class range parsing.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::AgeRange;

/// Separator between the lower and upper bound of a range.
pub const RANGE_SEPARATOR: char = '-';

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Spreadsheet exports prefix some cells with an apostrophe
    RE.get_or_init(|| Regex::new(r"^\D*(\d+)").expect("valid regex"))
}

/// First run of digits in `part`, skipping any non-digit prefix.
///
/// Returns `None` rather than zero when there are no digits.
pub fn extract_number(part: &str) -> Option<u32> {
    leading_number()
        .captures(part.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Split a raw range on its first separator.
///
/// `"10-14"` gives `10..=14`, `"15+"` gives an open-ended range from 15. An
/// unreadable upper bound is left unset; an unreadable lower bound yields no
/// range at all.
pub fn parse_age_range(raw: &str) -> Option<AgeRange> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (lower, upper) = match raw.split_once(RANGE_SEPARATOR) {
        Some((lower, upper)) => (lower, Some(upper)),
        None => (raw, None),
    };

    let minimum_age = extract_number(lower)?;
    let maximum_age = upper.and_then(extract_number);

    Some(AgeRange {
        minimum_age,
        maximum_age,
    })
}
