use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat string-to-string view of an extraction result. Ordered so that JSON
/// output is stable between runs.
pub type FieldMap = BTreeMap<String, String>;

/// Keys every `FieldMap` produced by this crate carries.
pub mod keys {
    pub const DOCUMENT_TYPE_TAG: &str = "document_type_tag";
    pub const COUNTRY: &str = "country";
    pub const NATIONALITY: &str = "nationality";
    pub const DOCUMENT_NUMBER: &str = "document_number";
    pub const SURNAME: &str = "surname";
    pub const GIVEN_NAMES: &str = "given_names";
    pub const DATE_OF_BIRTH_DISPLAY: &str = "date_of_birth_display";
    pub const EXPIRATION_DATE_DISPLAY: &str = "expiration_date_display";
    pub const RAW_OCR_TEXT: &str = "raw_ocr_text";

    // MRZ-only
    pub const DOCUMENT_CODE: &str = "document_code";
    pub const DATE_OF_BIRTH: &str = "date_of_birth";
    pub const EXPIRATION_DATE: &str = "expiration_date";
    pub const SEX: &str = "sex";
    pub const PERSONAL_NUMBER: &str = "personal_number";
    pub const VALID_SCORE: &str = "valid_score";
    pub const VALID_NUMBER: &str = "valid_number";
    pub const VALID_DATE_OF_BIRTH: &str = "valid_date_of_birth";
    pub const VALID_EXPIRATION_DATE: &str = "valid_expiration_date";
    pub const VALID_PERSONAL_NUMBER: &str = "valid_personal_number";
    pub const VALID_COMPOSITE: &str = "valid_composite";

    pub const CANONICAL: [&str; 9] = [
        DOCUMENT_TYPE_TAG,
        COUNTRY,
        NATIONALITY,
        DOCUMENT_NUMBER,
        SURNAME,
        GIVEN_NAMES,
        DATE_OF_BIRTH_DISPLAY,
        EXPIRATION_DATE_DISPLAY,
        RAW_OCR_TEXT,
    ];
}

/// Sentinel stored in `document_type_tag` for front-side extractions.
pub const FRONT_FALLBACK_TAG: &str = "FRONT_FALLBACK";

/// ICAO 9303 physical document classes that carry an MRZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    TD1, // ID Card (85.6mm × 54.0mm)
    TD2, // ID Card (105.0mm × 74.0mm)
    TD3, // Passport (125.0mm × 88.0mm)
}

impl DocumentFormat {
    pub fn mrz_lines(&self) -> usize {
        match self {
            DocumentFormat::TD1 => 3,
            DocumentFormat::TD2 => 2,
            DocumentFormat::TD3 => 2,
        }
    }

    pub fn mrz_chars_per_line(&self) -> usize {
        match self {
            DocumentFormat::TD1 => 30,
            DocumentFormat::TD2 => 36,
            DocumentFormat::TD3 => 44,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            DocumentFormat::TD1 => "TD1",
            DocumentFormat::TD2 => "TD2",
            DocumentFormat::TD3 => "TD3",
        }
    }
}

/// Check digit characters as printed in the MRZ.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckDigits {
    pub document_number_check: char,
    pub date_of_birth_check: char,
    pub date_of_expiry_check: char,
    pub personal_number_check: char,
    pub composite_check: char,
}

/// Outcome of recomputing each MRZ check digit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResults {
    pub valid_number: bool,
    pub valid_date_of_birth: bool,
    pub valid_expiration_date: bool,
    pub valid_personal_number: bool,
    pub valid_composite: bool,
}

impl CheckResults {
    /// Percentage of passing checks, 0-100.
    pub fn score(&self) -> u32 {
        let checks = [
            self.valid_number,
            self.valid_date_of_birth,
            self.valid_expiration_date,
            self.valid_personal_number,
            self.valid_composite,
        ];
        let passed = checks.iter().filter(|c| **c).count() as u32;
        passed * 100 / checks.len() as u32
    }
}

/// Fields decoded from a machine-readable zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrzFields {
    pub format: DocumentFormat,
    pub document_code: String,
    pub country: String,
    pub document_number: String,
    pub surname: String,
    pub given_names: String,
    pub nationality: String,
    /// Raw ICAO `YYMMDD`.
    pub date_of_birth: String,
    /// Raw ICAO `YYMMDD`.
    pub expiration_date: String,
    pub sex: String,
    pub personal_number: String,
    pub check_digits: CheckDigits,
    pub checks: CheckResults,
    /// Filled by the MRZ adapter.
    pub date_of_birth_display: String,
    /// Filled by the MRZ adapter.
    pub expiration_date_display: String,
    pub raw_text: String,
}

impl MrzFields {
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        let mut put = |k: &str, v: &str| {
            map.insert(k.to_string(), v.to_string());
        };
        put(keys::DOCUMENT_TYPE_TAG, self.format.tag());
        put(keys::COUNTRY, &self.country);
        put(keys::NATIONALITY, &self.nationality);
        put(keys::DOCUMENT_NUMBER, &self.document_number);
        put(keys::SURNAME, &self.surname);
        put(keys::GIVEN_NAMES, &self.given_names);
        put(keys::DATE_OF_BIRTH_DISPLAY, &self.date_of_birth_display);
        put(keys::EXPIRATION_DATE_DISPLAY, &self.expiration_date_display);
        put(keys::RAW_OCR_TEXT, &self.raw_text);
        put(keys::DOCUMENT_CODE, &self.document_code);
        put(keys::DATE_OF_BIRTH, &self.date_of_birth);
        put(keys::EXPIRATION_DATE, &self.expiration_date);
        put(keys::SEX, &self.sex);
        put(keys::PERSONAL_NUMBER, &self.personal_number);
        put(keys::VALID_SCORE, &self.checks.score().to_string());
        put(keys::VALID_NUMBER, bool_str(self.checks.valid_number));
        put(keys::VALID_DATE_OF_BIRTH, bool_str(self.checks.valid_date_of_birth));
        put(keys::VALID_EXPIRATION_DATE, bool_str(self.checks.valid_expiration_date));
        put(keys::VALID_PERSONAL_NUMBER, bool_str(self.checks.valid_personal_number));
        put(keys::VALID_COMPOSITE, bool_str(self.checks.valid_composite));
        map
    }
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Best-effort record produced by the front-side extractor. Missing
/// detections are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedIdentity {
    pub document_type_tag: String,
    pub country: String,
    pub nationality: String,
    pub document_number: String,
    pub surname: String,
    pub given_names: String,
    pub date_of_birth_display: String,
    pub expiration_date_display: String,
    pub raw_ocr_text: String,
}

impl ExtractedIdentity {
    /// Empty record tagged as a front-side extraction.
    pub fn front_fallback(nationality: &str) -> Self {
        ExtractedIdentity {
            document_type_tag: FRONT_FALLBACK_TAG.to_string(),
            country: String::new(),
            nationality: nationality.to_string(),
            document_number: String::new(),
            surname: String::new(),
            given_names: String::new(),
            date_of_birth_display: String::new(),
            expiration_date_display: String::new(),
            raw_ocr_text: String::new(),
        }
    }

    pub fn to_field_map(&self) -> FieldMap {
        [
            (keys::DOCUMENT_TYPE_TAG, &self.document_type_tag),
            (keys::COUNTRY, &self.country),
            (keys::NATIONALITY, &self.nationality),
            (keys::DOCUMENT_NUMBER, &self.document_number),
            (keys::SURNAME, &self.surname),
            (keys::GIVEN_NAMES, &self.given_names),
            (keys::DATE_OF_BIRTH_DISPLAY, &self.date_of_birth_display),
            (keys::EXPIRATION_DATE_DISPLAY, &self.expiration_date_display),
            (keys::RAW_OCR_TEXT, &self.raw_ocr_text),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provenance {
    Mrz,
    FrontFallback,
}

/// Result of reading a document, whichever path produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentFields {
    Mrz(MrzFields),
    FrontFallback(ExtractedIdentity),
}

impl DocumentFields {
    pub fn provenance(&self) -> Provenance {
        match self {
            DocumentFields::Mrz(_) => Provenance::Mrz,
            DocumentFields::FrontFallback(_) => Provenance::FrontFallback,
        }
    }

    pub fn to_field_map(&self) -> FieldMap {
        match self {
            DocumentFields::Mrz(m) => m.to_field_map(),
            DocumentFields::FrontFallback(f) => f.to_field_map(),
        }
    }

    /// Whether any identifying field was recovered.
    pub fn has_key_field(&self) -> bool {
        let (dob, exp, number, surname, names) = match self {
            DocumentFields::Mrz(m) => (
                &m.date_of_birth_display,
                &m.expiration_date_display,
                &m.document_number,
                &m.surname,
                &m.given_names,
            ),
            DocumentFields::FrontFallback(f) => (
                &f.date_of_birth_display,
                &f.expiration_date_display,
                &f.document_number,
                &f.surname,
                &f.given_names,
            ),
        };
        [dob, exp, number, surname, names].iter().any(|v| !v.is_empty())
    }
}
