use crate::models::{CheckDigits, CheckResults, DocumentFormat, MrzFields};
use crate::processing::image::ImageProcessor;
use crate::processing::ocr::{OcrDispatcher, OcrEngine, OcrProfile};
use crate::utils::Result;
use log::{debug, info};
use std::path::Path;

/// Shortest OCR line still treated as a (possibly truncated) MRZ line.
const MIN_MRZ_LINE: usize = 28;

/// Finds and decodes the machine-readable zone of a document image.
/// `Ok(None)` means the image was read but holds no MRZ.
pub trait MrzReader: Send + Sync {
    fn read(&self, path: &Path, use_legacy: bool) -> Result<Option<MrzFields>>;
}

/// MRZ reader running a charset-restricted Tesseract pass over the page.
pub struct TesseractMrzReader<'e> {
    dispatcher: OcrDispatcher<'e>,
}

impl<'e> TesseractMrzReader<'e> {
    pub fn new(engine: &'e dyn OcrEngine) -> Self {
        TesseractMrzReader {
            dispatcher: OcrDispatcher::new(engine),
        }
    }
}

impl<'e> MrzReader for TesseractMrzReader<'e> {
    fn read(&self, path: &Path, use_legacy: bool) -> Result<Option<MrzFields>> {
        info!("Extracting MRZ from {}", path.display());
        let img = ImageProcessor::load(path)?;
        let processed = ImageProcessor::preprocess(&img);
        let text = self
            .dispatcher
            .full_page(&processed, &OcrProfile::mrz(use_legacy))?;
        Ok(MrzParser::parse(&text))
    }
}

pub struct MrzParser;

impl MrzParser {
    /// Locate MRZ lines in an OCR dump and decode them.
    pub fn parse(text: &str) -> Option<MrzFields> {
        let lines = Self::extract_mrz_lines(text);
        debug!("Filtered MRZ lines: {:?}", lines);

        let format = Self::detect_format(&lines)?;
        let needed = format.mrz_lines();
        let width = format.mrz_chars_per_line();
        let candidates: Vec<&String> = lines
            .iter()
            .filter(|l| Self::fits(format, l.len()))
            .collect();
        let block: Vec<String> = candidates[candidates.len() - needed..]
            .iter()
            .map(|l| Self::pad(l, width))
            .collect();

        let fields = match format {
            DocumentFormat::TD1 => Self::parse_td1(&block),
            DocumentFormat::TD2 | DocumentFormat::TD3 => Self::parse_two_line(format, &block),
        };
        debug!(
            "Parsed {} MRZ, check score {}",
            format.tag(),
            fields.checks.score()
        );

        if !Self::is_plausible(&fields.checks) {
            debug!("Rejecting {} block: no field check digit matches", format.tag());
            return None;
        }
        Some(fields)
    }

    /// A real MRZ read, even a noisy one, keeps at least one of the number,
    /// birth date or expiry check digits intact.
    fn is_plausible(checks: &CheckResults) -> bool {
        checks.valid_number || checks.valid_date_of_birth || checks.valid_expiration_date
    }

    // Lines printed with at least one filler, made only of MRZ characters once
    // cleaned. The filler must be in the raw OCR text: spaces alone do not
    // make a line an MRZ line.
    fn extract_mrz_lines(text: &str) -> Vec<String> {
        text.lines()
            .filter(|raw| raw.contains('<') || raw.contains('«'))
            .map(Self::clean_mrz_line)
            .filter(|l| {
                l.len() >= MIN_MRZ_LINE
                    && l.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '<')
            })
            .collect()
    }

    fn clean_mrz_line(line: &str) -> String {
        line.trim()
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('<'),
                '«' => Some('<'),
                c if c.is_ascii_alphanumeric() => Some(c.to_ascii_uppercase()),
                '<' => Some('<'),
                _ => None,
            })
            .collect()
    }

    fn fits(format: DocumentFormat, len: usize) -> bool {
        match format {
            DocumentFormat::TD3 => len >= 40,
            DocumentFormat::TD2 => (33..40).contains(&len),
            DocumentFormat::TD1 => len < 33,
        }
    }

    fn detect_format(lines: &[String]) -> Option<DocumentFormat> {
        [DocumentFormat::TD3, DocumentFormat::TD2, DocumentFormat::TD1]
            .into_iter()
            .find(|format| {
                lines.iter().filter(|l| Self::fits(*format, l.len())).count() >= format.mrz_lines()
            })
    }

    fn pad(line: &str, width: usize) -> String {
        let mut padded: String = line.chars().take(width).collect();
        while padded.len() < width {
            padded.push('<');
        }
        padded
    }

    fn parse_two_line(format: DocumentFormat, block: &[String]) -> MrzFields {
        let (line1, line2) = (&block[0], &block[1]);
        let width = format.mrz_chars_per_line();
        let (surname, given_names) = Self::split_names(&line1[5..]);

        // TD3 has a personal number with its own check digit; TD2 only
        // optional data
        let (personal_end, personal_check) = match format {
            DocumentFormat::TD3 => (42, Some(Self::char_at(line2, 42))),
            _ => (35, None),
        };
        let personal = &line2[28..personal_end];

        let check_digits = CheckDigits {
            document_number_check: Self::char_at(line2, 9),
            date_of_birth_check: Self::char_at(line2, 19),
            date_of_expiry_check: Self::char_at(line2, 27),
            personal_number_check: personal_check.unwrap_or('<'),
            composite_check: Self::char_at(line2, width - 1),
        };
        let composite_input = format!(
            "{}{}{}",
            &line2[0..10],
            &line2[13..20],
            &line2[21..width - 1]
        );
        let number = &line2[0..9];
        let dob = Self::fix_digits(&line2[13..19]);
        let expiry = Self::fix_digits(&line2[21..27]);
        let checks = CheckResults {
            valid_number: Self::check(number, check_digits.document_number_check),
            valid_date_of_birth: Self::check(&dob, check_digits.date_of_birth_check),
            valid_expiration_date: Self::check(&expiry, check_digits.date_of_expiry_check),
            valid_personal_number: match personal_check {
                Some(c) => Self::check(personal, c),
                None => true,
            },
            valid_composite: Self::check(&composite_input, check_digits.composite_check),
        };

        MrzFields {
            format,
            document_code: Self::clean_field(&line1[0..2]),
            country: Self::clean_field(&line1[2..5]),
            document_number: Self::clean_field(number),
            surname,
            given_names,
            nationality: Self::clean_field(&line2[10..13]),
            date_of_birth: dob,
            expiration_date: expiry,
            sex: Self::clean_field(&line2[20..21]),
            personal_number: Self::clean_field(personal),
            check_digits,
            checks,
            date_of_birth_display: String::new(),
            expiration_date_display: String::new(),
            raw_text: block.join("\n"),
        }
    }

    fn parse_td1(block: &[String]) -> MrzFields {
        let (line1, line2, line3) = (&block[0], &block[1], &block[2]);
        let (surname, given_names) = Self::split_names(line3);

        let check_digits = CheckDigits {
            document_number_check: Self::char_at(line1, 14),
            date_of_birth_check: Self::char_at(line2, 6),
            date_of_expiry_check: Self::char_at(line2, 14),
            personal_number_check: '<',
            composite_check: Self::char_at(line2, 29),
        };
        let composite_input = format!(
            "{}{}{}{}",
            &line1[5..30],
            &line2[0..7],
            &line2[8..15],
            &line2[18..29]
        );
        let number = &line1[5..14];
        let dob = Self::fix_digits(&line2[0..6]);
        let expiry = Self::fix_digits(&line2[8..14]);
        let checks = CheckResults {
            valid_number: Self::check(number, check_digits.document_number_check),
            valid_date_of_birth: Self::check(&dob, check_digits.date_of_birth_check),
            valid_expiration_date: Self::check(&expiry, check_digits.date_of_expiry_check),
            valid_personal_number: true,
            valid_composite: Self::check(&composite_input, check_digits.composite_check),
        };

        MrzFields {
            format: DocumentFormat::TD1,
            document_code: Self::clean_field(&line1[0..2]),
            country: Self::clean_field(&line1[2..5]),
            document_number: Self::clean_field(number),
            surname,
            given_names,
            nationality: Self::clean_field(&line2[15..18]),
            date_of_birth: dob,
            expiration_date: expiry,
            sex: Self::clean_field(&line2[7..8]),
            personal_number: Self::clean_field(&line1[15..30]),
            check_digits,
            checks,
            date_of_birth_display: String::new(),
            expiration_date_display: String::new(),
            raw_text: block.join("\n"),
        }
    }

    fn char_at(line: &str, idx: usize) -> char {
        line.as_bytes().get(idx).map(|b| *b as char).unwrap_or('<')
    }

    /// `SURNAME<<GIVEN<NAMES` into `("SURNAME", "GIVEN NAMES")`.
    fn split_names(field: &str) -> (String, String) {
        let mut parts = field.splitn(2, "<<");
        let surname = parts.next().map(Self::clean_field).unwrap_or_default();
        let given = parts.next().map(Self::clean_field).unwrap_or_default();
        (surname, given)
    }

    fn clean_field(field: &str) -> String {
        field
            .split('<')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    // Dates and check digits are numeric; undo the usual letter confusions
    fn fix_digits(field: &str) -> String {
        field
            .chars()
            .map(|c| match c {
                'O' | 'Q' | 'D' => '0',
                'I' | 'L' => '1',
                'Z' => '2',
                'S' => '5',
                'G' => '6',
                'B' => '8',
                _ => c,
            })
            .collect()
    }

    /// ICAO 9303 check digit: weights 7-3-1, `<` counts as 0, A-Z as 10-35.
    pub fn check_digit(field: &str) -> u32 {
        const WEIGHTS: [u32; 3] = [7, 3, 1];
        field
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let value = match c {
                    '0'..='9' => c as u32 - '0' as u32,
                    'A'..='Z' => c as u32 - 'A' as u32 + 10,
                    _ => 0,
                };
                value * WEIGHTS[i % 3]
            })
            .sum::<u32>()
            % 10
    }

    fn check(field: &str, printed: char) -> bool {
        let printed = match Self::fix_digits(&printed.to_string()).chars().next() {
            Some('<') => 0,
            Some(c) => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
            None => return false,
        };
        Self::check_digit(field) == printed
    }
}
