// Date normalization shared by the MRZ and front-side paths.
// Everything renders as DD/MM/YYYY.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Two-digit years up to and including this value belong to the 2000s.
pub const CENTURY_PIVOT: u32 = 30;

lazy_static! {
    // DD.MM.YYYY, DD/MM/YYYY, DD-MM-YYYY (separators may be mixed)
    static ref LOOSE_DATE: Regex = Regex::new(r"(\d{2})[./-](\d{2})[./-](\d{4})").unwrap();
}

pub fn format_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Parse an ICAO 9303 `YYMMDD` date into `DD/MM/YYYY`.
///
/// Anything other than exactly six ASCII digits, or a date that does not
/// exist on the calendar, gives `None`.
pub fn parse_icao_date(raw: &str) -> Option<String> {
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let yy = raw[0..2].parse::<u32>().ok()?;
    let month = raw[2..4].parse::<u32>().ok()?;
    let day = raw[4..6].parse::<u32>().ok()?;

    let year = if yy <= CENTURY_PIVOT { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year as i32, month, day).map(format_display)
}

/// Find the first `DD<sep>MM<sep>YYYY` in free text and render it.
pub fn parse_loose_date(text: &str) -> Option<String> {
    let caps = LOOSE_DATE.captures(text)?;
    candidate_from_parts(&caps[1], &caps[2], &caps[3]).map(format_display)
}

/// Every date-shaped match in `text` that is a real calendar date, in order
/// of appearance.
pub fn date_candidates(text: &str) -> Vec<NaiveDate> {
    LOOSE_DATE
        .captures_iter(text)
        .filter_map(|caps| candidate_from_parts(&caps[1], &caps[2], &caps[3]))
        .collect()
}

fn candidate_from_parts(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day = day.parse::<u32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    let year = year.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Accepts `DD/MM/YYYY` or ISO `YYYY-MM-DD`; anything else is returned
/// unchanged so hand-typed values survive.
pub fn normalize_display(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    NaiveDate::parse_from_str(value, DISPLAY_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map(format_display)
        .unwrap_or_else(|_| value.to_string())
}
