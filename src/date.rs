// src/date.rs
//! Date normalization shared by patch records and cosmetic items.
//!
//! Canonical form is `DD-Mon-YYYY` (e.g. `03-Mar-2021`). Inputs that cannot be
//! reduced to it degrade, never fail:
//! - `(2012)`                      → `Released in 2012`
//! - `Prestige ...` / `Worlds ...` → `Special Release: <input>`
//! - glyph-only cells (✔ ⭐ ‒ …)    → [`UNKNOWN_DATE`]
//! - anything else                 → `Non-standard: <input>`

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// The single "no date" sentinel used by every call site.
pub const UNKNOWN_DATE: &str = "Unknown";

static RE_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").expect("paren regex"));
static RE_PAREN_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{4})\)").expect("paren year regex"));
static RE_WIKI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-([A-Za-z]{3})-(\d{4})").expect("wiki date regex"));
static RE_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2}),\s*(\d{4})$").expect("named month regex")
});
static RE_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Prestige|Worlds)\s+").expect("special prefix regex"));
static RE_LABEL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)|Released: (.*)").expect("label date regex"));
static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(20\d\d|19\d\d)\b").expect("year regex"));
static RE_MONTH_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)\b",
    )
    .expect("month word regex")
});
static RE_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)?\b").expect("day regex"));

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Month number for a full or abbreviated English month name (case-insensitive).
pub fn month_number(name: &str) -> Option<u32> {
    let n = name.to_ascii_lowercase();
    let m = match n.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(m)
}

fn canonical(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Normalize a free-form date token. Never panics, never errors.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_DATE) {
        return UNKNOWN_DATE.to_string();
    }

    // A bare year in parentheses is the only parenthetical that carries meaning.
    if let Some(caps) = RE_PAREN_YEAR.captures(trimmed) {
        return format!("Released in {}", &caps[1]);
    }

    let stripped = RE_PAREN.replace_all(trimmed, "").trim().to_string();
    if stripped.is_empty() {
        return UNKNOWN_DATE.to_string();
    }

    if let Some(caps) = RE_WIKI.captures(&stripped) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month = &caps[2];
        let month = match month_number(month) {
            Some(m) => MONTH_ABBR[(m - 1) as usize].to_string(),
            None => month.to_string(),
        };
        return format!("{:02}-{}-{}", day, month, &caps[3]);
    }

    if let Some(caps) = RE_NAMED.captures(&stripped) {
        if let Some(date) = named_month_date(&caps[1], &caps[2], &caps[3]) {
            return canonical(date);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&stripped, "%Y-%m-%d") {
        return canonical(date);
    }

    if RE_SPECIAL.is_match(trimmed) {
        return format!("Special Release: {trimmed}");
    }

    if stripped.chars().all(|c| !c.is_alphanumeric()) {
        return UNKNOWN_DATE.to_string();
    }

    warn!(target: "date", raw = %trimmed, "non-standard date");
    format!("Non-standard: {stripped}")
}

fn named_month_date(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    let m = month_number(month)?;
    let d: u32 = day.parse().ok()?;
    let y: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Pull the date token out of a version label (`"V1.0.0.32 (July 10, 2009)"`,
/// `"Patch 5 Released: March 3, 2021"`) and normalize it.
pub fn extract_date(label: &str) -> String {
    let Some(caps) = RE_LABEL_DATE.captures(label) else {
        return UNKNOWN_DATE.to_string();
    };
    let token = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    if token.is_empty() {
        return UNKNOWN_DATE.to_string();
    }
    normalize_date(token)
}

/// Best-effort calendar date for ordering. `None` means "sort last".
pub fn resolve_date(normalized: &str) -> Option<NaiveDate> {
    if normalized == UNKNOWN_DATE {
        return None;
    }

    if let Some(caps) = RE_WIKI.captures(normalized) {
        let d: u32 = caps[1].parse().ok()?;
        let m = month_number(&caps[2]).unwrap_or(1);
        let y: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let year: i32 = RE_YEAR.captures(normalized)?[1].parse().ok()?;
    let month = RE_MONTH_WORD
        .captures(normalized)
        .and_then(|c| month_number(&c[1]))
        .unwrap_or(1);
    let day = RE_DAY
        .captures(normalized)
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(1);

    let resolved = NaiveDate::from_ymd_opt(year, month, day);
    if resolved.is_none() {
        warn!(target: "date", date = %normalized, "could not build calendar date");
    }
    resolved
}

/// Year of a normalized date, if any can be resolved.
pub fn release_year(normalized: &str) -> Option<i32> {
    resolve_date(normalized).map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiki_form_is_padded() {
        assert_eq!(normalize_date("5-Jan-2021"), "05-Jan-2021");
        assert_eq!(normalize_date("05-Jan-2021"), "05-Jan-2021");
    }

    #[test]
    fn named_month_variants() {
        assert_eq!(normalize_date("March 3, 2021"), "03-Mar-2021");
        assert_eq!(normalize_date("March 3,2021"), "03-Mar-2021");
        assert_eq!(normalize_date("Mar 3, 2021"), "03-Mar-2021");
        assert_eq!(normalize_date("Sept. 14, 2019"), "14-Sep-2019");
    }

    #[test]
    fn iso_and_year_only() {
        assert_eq!(normalize_date("2020-11-05"), "05-Nov-2020");
        assert_eq!(normalize_date("Legacy (2012)"), "Released in 2012");
    }

    #[test]
    fn sentinels_and_fallbacks() {
        assert_eq!(normalize_date("✔"), UNKNOWN_DATE);
        assert_eq!(normalize_date("⭐‒"), UNKNOWN_DATE);
        assert_eq!(normalize_date("   "), UNKNOWN_DATE);
        assert_eq!(
            normalize_date("Worlds 2019 bundle"),
            "Special Release: Worlds 2019 bundle"
        );
        assert_eq!(normalize_date("Sometime soon"), "Non-standard: Sometime soon");
        // impossible calendar date falls through instead of panicking
        assert_eq!(normalize_date("February 31, 2021"), "Non-standard: February 31, 2021");
    }

    #[test]
    fn resolves_for_ordering() {
        assert_eq!(
            resolve_date("03-Mar-2021"),
            NaiveDate::from_ymd_opt(2021, 3, 3)
        );
        assert_eq!(
            resolve_date("Released in 2012"),
            NaiveDate::from_ymd_opt(2012, 1, 1)
        );
        assert_eq!(resolve_date(UNKNOWN_DATE), None);
        assert_eq!(resolve_date("Non-standard: soon"), None);
    }

    #[test]
    fn label_dates() {
        assert_eq!(extract_date("V1.0.0.32 (July 10, 2009)"), "10-Jul-2009");
        assert_eq!(extract_date("Patch Released: 2021-03-03"), "03-Mar-2021");
        assert_eq!(extract_date("V14.3"), UNKNOWN_DATE);
    }
}
