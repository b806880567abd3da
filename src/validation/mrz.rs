use crate::models::MrzFields;
use crate::processing::dates::parse_icao_date;
use crate::processing::mrz::MrzReader;
use crate::utils::{DocumentError, Result};
use log::{info, warn};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    NoMrzDetected,
    CountryMismatch {
        required: String,
        country: String,
        nationality: String,
    },
}

impl From<RejectionReason> for DocumentError {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::NoMrzDetected => DocumentError::NoMrzDetected,
            RejectionReason::CountryMismatch {
                required,
                country,
                nationality,
            } => DocumentError::CountryMismatch {
                required,
                country,
                nationality,
            },
        }
    }
}

/// Validation state of one MRZ read. `Validated` and `Rejected` are
/// terminal; nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum MrzValidation {
    Unvalidated(Option<MrzFields>),
    Validated(MrzFields),
    Rejected(RejectionReason),
}

impl MrzValidation {
    pub fn new(parsed: Option<MrzFields>) -> Self {
        MrzValidation::Unvalidated(parsed)
    }

    /// Accept the read, or reject it when there is no MRZ or when neither
    /// the issuing country nor the nationality matches `require_country`.
    pub fn validate(self, require_country: Option<&str>) -> Self {
        let fields = match self {
            MrzValidation::Unvalidated(Some(fields)) => fields,
            MrzValidation::Unvalidated(None) => {
                return MrzValidation::Rejected(RejectionReason::NoMrzDetected)
            }
            terminal => return terminal,
        };

        if let Some(required) = require_country {
            let matches = fields.country.eq_ignore_ascii_case(required)
                || fields.nationality.eq_ignore_ascii_case(required);
            if !matches {
                return MrzValidation::Rejected(RejectionReason::CountryMismatch {
                    required: required.to_uppercase(),
                    country: fields.country,
                    nationality: fields.nationality,
                });
            }
        }
        MrzValidation::Validated(fields)
    }

    pub fn into_result(self) -> Result<MrzFields> {
        match self {
            MrzValidation::Validated(fields) => Ok(fields),
            MrzValidation::Rejected(reason) => Err(reason.into()),
            MrzValidation::Unvalidated(_) => Err(DocumentError::NoMrzDetected),
        }
    }
}

/// Reads a document's MRZ, applies the country policy and adds display
/// dates next to the raw ICAO ones.
pub struct MrzAdapter<'r> {
    reader: &'r dyn MrzReader,
}

impl<'r> MrzAdapter<'r> {
    pub fn new(reader: &'r dyn MrzReader) -> Self {
        MrzAdapter { reader }
    }

    pub fn read_mrz_document(
        &self,
        path: &Path,
        use_legacy: bool,
        require_country: Option<&str>,
    ) -> Result<MrzFields> {
        let parsed = self.reader.read(path, use_legacy)?;
        let validation = MrzValidation::new(parsed).validate(require_country);
        if let MrzValidation::Rejected(reason) = &validation {
            warn!("MRZ rejected for {}: {:?}", path.display(), reason);
        }

        let mut fields = validation.into_result()?;
        Self::add_display_dates(&mut fields);
        info!(
            "MRZ accepted: {} {} {}",
            fields.format.tag(),
            fields.country,
            fields.document_number
        );
        Ok(fields)
    }

    // Unparseable raw dates are shown as-is rather than dropped
    fn add_display_dates(fields: &mut MrzFields) {
        fields.date_of_birth_display =
            parse_icao_date(&fields.date_of_birth).unwrap_or_else(|| fields.date_of_birth.clone());
        fields.expiration_date_display = parse_icao_date(&fields.expiration_date)
            .unwrap_or_else(|| fields.expiration_date.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckDigits, CheckResults, DocumentFormat};

    fn usa_passport() -> MrzFields {
        MrzFields {
            format: DocumentFormat::TD3,
            document_code: "P".to_string(),
            country: "USA".to_string(),
            document_number: "123456789".to_string(),
            surname: "DOE".to_string(),
            given_names: "JOHN".to_string(),
            nationality: "USA".to_string(),
            date_of_birth: "800101".to_string(),
            expiration_date: "3O0101".to_string(),
            sex: "M".to_string(),
            personal_number: String::new(),
            check_digits: CheckDigits::default(),
            checks: CheckResults::default(),
            date_of_birth_display: String::new(),
            expiration_date_display: String::new(),
            raw_text: String::new(),
        }
    }

    struct FixedReader(Option<MrzFields>);

    impl MrzReader for FixedReader {
        fn read(&self, _path: &Path, _use_legacy: bool) -> Result<Option<MrzFields>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_country_requirement_rejects_foreign_document() {
        let reader = FixedReader(Some(usa_passport()));
        let err = MrzAdapter::new(&reader)
            .read_mrz_document(Path::new("doc.jpg"), true, Some("MAR"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::CountryMismatch { .. }));
    }

    #[test]
    fn test_no_requirement_accepts_any_country() {
        let reader = FixedReader(Some(usa_passport()));
        let fields = MrzAdapter::new(&reader)
            .read_mrz_document(Path::new("doc.jpg"), true, None)
            .unwrap();
        assert_eq!(fields.date_of_birth_display, "01/01/1980");
        // raw values are kept, and shown as-is when they do not parse
        assert_eq!(fields.date_of_birth, "800101");
        assert_eq!(fields.expiration_date_display, "3O0101");
    }

    #[test]
    fn test_requirement_is_case_insensitive_and_checks_nationality() {
        let mut doc = usa_passport();
        doc.nationality = "MAR".to_string();
        let state = MrzValidation::new(Some(doc)).validate(Some("mar"));
        assert!(matches!(state, MrzValidation::Validated(_)));
    }

    #[test]
    fn test_missing_mrz_is_rejected() {
        let state = MrzValidation::new(None).validate(Some("MAR"));
        assert_eq!(state, MrzValidation::Rejected(RejectionReason::NoMrzDetected));
        assert!(matches!(state.into_result(), Err(DocumentError::NoMrzDetected)));

        let reader = FixedReader(None);
        let err = MrzAdapter::new(&reader)
            .read_mrz_document(Path::new("doc.jpg"), false, None)
            .unwrap_err();
        assert!(matches!(err, DocumentError::NoMrzDetected));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        let rejected = MrzValidation::Rejected(RejectionReason::NoMrzDetected);
        assert_eq!(rejected.clone().validate(None), rejected);

        let validated = MrzValidation::Validated(usa_passport());
        assert_eq!(validated.clone().validate(Some("MAR")), validated);
    }
}
