// Field-specific text heuristics for the CIN front side.
// Pure functions over OCR text; the cascade that calls them lives in front.rs.

use crate::processing::dates::{date_candidates, format_display, parse_loose_date};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Lowercased spellings of "né le" as they come out of OCR.
pub const BIRTH_MARKERS: [&str; 5] = ["ne le", "né le", "nele", "ne", "né"];
pub const EXPIRY_MARKER: &str = "valable";
pub const KNOWN_LOCALITY: &str = "GUELMIM";

pub const NAME_LINE_MIN_CHARS: usize = 2;
pub const NAME_LINE_MAX_CHARS: usize = 30;

lazy_static! {
    static ref DOCUMENT_NUMBER: Regex = Regex::new(r"\b[A-Z]{1,3}\d{5,8}\b").unwrap();
    // Region crops are single short lines; OCR often splits letters from digits
    static ref DOCUMENT_NUMBER_SPACED: Regex = Regex::new(r"[A-Z]{1,3}\s*\d{5,8}").unwrap();
    static ref LOCALITY: Regex = Regex::new(&format!(r"(?i)\b{}\b", KNOWN_LOCALITY)).unwrap();
}

pub struct FieldExtractor;

impl FieldExtractor {
    /// Trimmed, non-empty lines of an OCR dump.
    pub fn clean_lines(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// First line carrying a birth marker that also holds a parseable date.
    pub fn birth_date_from_marker(lines: &[String]) -> Option<String> {
        lines
            .iter()
            .filter(|line| {
                let lower = line.to_lowercase();
                BIRTH_MARKERS.iter().any(|m| lower.contains(m))
            })
            .find_map(|line| parse_loose_date(line))
    }

    /// Only the last "valable" line is considered, whether or not its date
    /// parses.
    pub fn expiry_from_marker(lines: &[String]) -> Option<String> {
        lines
            .iter()
            .rev()
            .find(|line| line.to_lowercase().contains(EXPIRY_MARKER))
            .and_then(|line| parse_loose_date(line))
    }

    /// Every valid date found in the general and digits-only passes.
    pub fn pooled_candidates(general: &str, digits: &str) -> Vec<NaiveDate> {
        date_candidates(&format!("{} \n{}", general, digits))
    }

    pub fn earliest(candidates: &[NaiveDate]) -> Option<String> {
        candidates.iter().min().copied().map(format_display)
    }

    pub fn latest(candidates: &[NaiveDate]) -> Option<String> {
        candidates.iter().max().copied().map(format_display)
    }

    /// Letters-then-digits card number, e.g. `JA118202`.
    pub fn document_number(text: &str) -> Option<String> {
        DOCUMENT_NUMBER.find(text).map(|m| m.as_str().to_string())
    }

    /// Same shape as `document_number` but tolerates a gap between the
    /// letters and digits, which is removed.
    pub fn document_number_spaced(text: &str) -> Option<String> {
        DOCUMENT_NUMBER_SPACED
            .find(text)
            .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
    }

    /// Lines that look like a printed name: uppercase letters and spaces only.
    pub fn uppercase_name_lines(lines: &[String]) -> Vec<&str> {
        lines
            .iter()
            .map(String::as_str)
            .filter(|line| Self::is_name_line(line))
            .collect()
    }

    fn is_name_line(line: &str) -> bool {
        let len = line.chars().count();
        if !(NAME_LINE_MIN_CHARS..=NAME_LINE_MAX_CHARS).contains(&len) {
            return false;
        }
        let letters: Vec<char> = line.chars().filter(|c| *c != ' ').collect();
        !letters.is_empty()
            && letters.iter().all(|c| c.is_alphabetic())
            && letters.iter().any(|c| c.is_uppercase())
            && !letters.iter().any(|c| c.is_lowercase())
    }

    /// `(surname, given_names)` from the first two name lines, title-cased.
    pub fn names_from_lines(lines: &[String]) -> (Option<String>, Option<String>) {
        let upper = Self::uppercase_name_lines(lines);
        (
            upper.first().map(|l| Self::title_case(l)),
            upper.get(1).map(|l| Self::title_case(l)),
        )
    }

    pub fn locality(text: &str) -> Option<String> {
        LOCALITY.find(text).map(|m| m.as_str().to_uppercase())
    }

    /// Uppercase the first letter of every word and lowercase the rest.
    pub fn title_case(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word_start = true;
        for c in text.chars() {
            if c.is_alphabetic() {
                if word_start {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                word_start = false;
            } else {
                out.push(c);
                word_start = true;
            }
        }
        out
    }
}
