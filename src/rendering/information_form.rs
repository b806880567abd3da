use crate::models::{keys, FieldMap};
use crate::rendering::canvas::{Font, PageCanvas, A4};
use crate::utils::Result;
use log::info;

pub const TITLE: &str = "Passport/ID Information Form";

const MARGIN_X: f32 = 50.0;
const VALUE_OFFSET: f32 = 120.0;
const LINE_HEIGHT: f32 = 25.0;

struct FormWriter {
    canvas: PageCanvas,
    y: f32,
}

impl FormWriter {
    fn section(&mut self, title: &str) {
        self.canvas.draw_text(Font::HelveticaBold, 12.0, MARGIN_X, self.y, title);
        self.y -= LINE_HEIGHT;
    }

    fn field(&mut self, label: &str, value: &str) {
        self.canvas
            .draw_text(Font::Helvetica, 10.0, MARGIN_X, self.y, &format!("{}:", label));
        self.canvas
            .draw_text(Font::HelveticaBold, 10.0, MARGIN_X + VALUE_OFFSET, self.y, value);
        self.y -= LINE_HEIGHT;
    }
}

fn get<'m>(fields: &'m FieldMap, key: &str) -> &'m str {
    fields.get(key).map(String::as_str).unwrap_or("")
}

fn display_or_raw<'m>(fields: &'m FieldMap, display: &str, raw: &str) -> &'m str {
    match get(fields, display) {
        "" => get(fields, raw),
        value => value,
    }
}

fn yes_no(fields: &FieldMap, key: &str) -> &'static str {
    if get(fields, key) == "true" {
        "Yes"
    } else {
        "No"
    }
}

/// Render an A4 summary sheet for any extraction result. Keys that are
/// absent render as empty values.
pub fn render_information_form(fields: &FieldMap) -> Result<Vec<u8>> {
    let (width, height) = A4;
    let mut canvas = PageCanvas::new(width, height);
    canvas.draw_text(Font::HelveticaBold, 16.0, MARGIN_X, height - 50.0, TITLE);

    let mut form = FormWriter {
        canvas,
        y: height - 100.0,
    };

    form.section("Personal Information");
    form.field("Document Type", get(fields, keys::DOCUMENT_CODE));
    form.field("Country", get(fields, keys::COUNTRY));
    form.field("Document Number", get(fields, keys::DOCUMENT_NUMBER));
    form.field("Surname", get(fields, keys::SURNAME));
    form.field("Given Names", get(fields, keys::GIVEN_NAMES));
    form.field("Sex", get(fields, keys::SEX));
    form.field("Nationality", get(fields, keys::NATIONALITY));

    form.section("Dates");
    form.field(
        "Date of Birth",
        display_or_raw(fields, keys::DATE_OF_BIRTH_DISPLAY, keys::DATE_OF_BIRTH),
    );
    form.field(
        "Expiration Date",
        display_or_raw(fields, keys::EXPIRATION_DATE_DISPLAY, keys::EXPIRATION_DATE),
    );

    let personal_number = get(fields, keys::PERSONAL_NUMBER);
    if !personal_number.is_empty() {
        form.field("Personal Number", personal_number);
    }

    form.section("Validation");
    form.field("Valid Score", get(fields, keys::VALID_SCORE));
    form.field("Valid Number", yes_no(fields, keys::VALID_NUMBER));
    form.field("Valid DOB", yes_no(fields, keys::VALID_DATE_OF_BIRTH));
    form.field("Valid Expiration", yes_no(fields, keys::VALID_EXPIRATION_DATE));

    let pdf = form.canvas.finish()?;
    info!("Rendered information form ({} bytes)", pdf.len());
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractedIdentity;
    use crate::processing::mrz::MrzParser;
    use crate::rendering::canvas::page_strings;

    const TD3: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\n\
        L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn test_mrz_result_renders_all_sections() {
        let fields = MrzParser::parse(TD3).unwrap().to_field_map();
        let pdf = render_information_form(&fields).unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let strings = page_strings(&pdf);
        assert_eq!(strings[0], TITLE);
        for expected in ["Personal Information", "ERIKSSON", "ANNA MARIA", "UTO", "Validation", "100"] {
            assert!(strings.iter().any(|s| s == expected), "missing {}", expected);
        }
        // no display date was computed, so the raw value is shown
        assert!(strings.iter().any(|s| s == "740812"));
        assert!(strings.iter().any(|s| s == "Personal Number:"));
        assert_eq!(strings.iter().filter(|s| *s == "Yes").count(), 3);
    }

    #[test]
    fn test_front_result_renders_with_defaults() {
        let mut identity = ExtractedIdentity::front_fallback("MAR");
        identity.date_of_birth_display = "13/09/1984".to_string();
        let pdf = render_information_form(&identity.to_field_map()).unwrap();

        let strings = page_strings(&pdf);
        assert!(strings.iter().any(|s| s == "13/09/1984"));
        assert!(!strings.iter().any(|s| s == "Personal Number:"));
        assert_eq!(strings.iter().filter(|s| *s == "No").count(), 3);
    }

    #[test]
    fn test_empty_map_still_renders() {
        let pdf = render_information_form(&FieldMap::new()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
