use crate::config::DEFAULT_HOTEL_CITY;
use crate::models::{keys, FieldMap};
use crate::processing::dates::{format_display, normalize_display};
use crate::rendering::canvas::{string_width, Font, PageCanvas, POINTS_PER_INCH};
use crate::utils::Result;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

pub const HOTEL_NAME: &str = "Hotel Palace - Tanger";
pub const FORM_HEADING: &str = "FICHE D'HÔTEL - HOTEL FORM";

/// Registration card size, 3.86in x 7.48in.
pub const PAGE_SIZE: (f32, f32) = (3.86 * POINTS_PER_INCH, 7.48 * POINTS_PER_INCH);

const LINE_HEIGHT: f32 = 22.0;
const LABEL_X: f32 = 10.0;
const TOP_MARGIN: f32 = 30.0;

/// Hotel registration record. Every field is free text; dates are
/// normalized to DD/MM/YYYY when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelForm {
    pub nom: String,
    pub prenom: String,
    pub date_naissance: String,
    pub nationalite: String,
    pub numero: String,
    pub cin: String,
    pub carte_sejour: String,
    pub entree_maroc: String,
    pub passeport_num: String,
    pub domicile: String,
    pub date_arrivee: String,
    pub num_chambre: String,
    pub nb_enfants: String,
    pub provenance: String,
    pub destination: String,
    pub fait_a: String,
    pub fait_le: String,
}

impl HotelForm {
    /// Build a form from the caller's previous extraction, if any.
    pub fn prefill(previous: Option<&FieldMap>, today: NaiveDate) -> Self {
        let empty = FieldMap::new();
        let prev = previous.unwrap_or(&empty);
        let get = |key: &str| prev.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let mut date_naissance = get(keys::DATE_OF_BIRTH_DISPLAY);
        if date_naissance.is_empty() {
            date_naissance = get(keys::DATE_OF_BIRTH);
        }

        HotelForm {
            nom: get(keys::SURNAME),
            prenom: get(keys::GIVEN_NAMES),
            date_naissance,
            nationalite: get(keys::NATIONALITY),
            numero: get(keys::DOCUMENT_NUMBER),
            passeport_num: get(keys::DOCUMENT_NUMBER),
            fait_a: DEFAULT_HOTEL_CITY.to_string(),
            fait_le: format_display(today),
            ..HotelForm::default()
        }
    }

    fn normalized(&self) -> Self {
        HotelForm {
            date_naissance: normalize_display(&self.date_naissance),
            date_arrivee: normalize_display(&self.date_arrivee),
            fait_le: normalize_display(&self.fait_le),
            ..self.clone()
        }
    }
}

enum Align {
    Center,
    Right,
}

struct CardWriter {
    canvas: PageCanvas,
    y: f32,
}

impl CardWriter {
    fn skip(&mut self, lines: f32) {
        self.y -= LINE_HEIGHT * lines;
    }

    /// Bold label on the left, optional translation caption under it and the
    /// value placed on the same row.
    fn line(&mut self, label: &str, caption: Option<&str>, value: &str, align: Align) {
        let width = self.canvas.width();
        self.canvas.draw_text(Font::HelveticaBold, 11.0, LABEL_X, self.y, label);
        if let Some(caption) = caption {
            self.canvas
                .draw_text(Font::Helvetica, 7.0, LABEL_X, self.y - 9.0, caption);
        }
        if !value.is_empty() {
            let text_width = string_width(value, Font::Helvetica, 11.0);
            let x = match align {
                Align::Right => width - 90.0 - text_width,
                Align::Center => (width - text_width) / 2.0,
            };
            self.canvas.draw_text(Font::Helvetica, 11.0, x, self.y, value);
        }
        self.skip(1.0);
    }

    fn multiline(&mut self, label: &str, lines: &[&str]) {
        self.canvas.draw_text(Font::HelveticaBold, 11.0, LABEL_X, self.y, label);
        self.skip(1.0);
        for text in lines {
            if !text.is_empty() {
                self.canvas.draw_centered(Font::Helvetica, 11.0, self.y, text);
            }
            self.skip(1.0);
        }
    }

    /// Two label/value pairs on one row; the right pair is kept inside the
    /// page.
    fn dual_line(&mut self, left: (&str, &str), right: (&str, &str)) {
        let width = self.canvas.width();
        let (label1, value1) = left;
        let (label2, value2) = right;

        self.canvas.draw_text(Font::HelveticaBold, 11.0, LABEL_X, self.y, label1);
        let x1v = LABEL_X + string_width(label1, Font::HelveticaBold, 11.0) + 6.0;
        self.canvas.draw_text(Font::Helvetica, 11.0, x1v, self.y, value1);

        let x2 = (width * 0.55).max(x1v + 90.0).min(width - 120.0);
        self.canvas.draw_text(Font::HelveticaBold, 11.0, x2, self.y, label2);
        let x2v = x2 + string_width(label2, Font::HelveticaBold, 11.0) + 6.0;
        self.canvas.draw_text(Font::Helvetica, 11.0, x2v, self.y, value2);
        self.skip(1.0);
    }
}

pub fn render_hotel_form(form: &HotelForm) -> Result<Vec<u8>> {
    let form = form.normalized();
    let (width, height) = PAGE_SIZE;
    let mut card = CardWriter {
        canvas: PageCanvas::new(width, height),
        y: height - TOP_MARGIN,
    };

    card.canvas.draw_centered(Font::HelveticaBold, 14.0, card.y, HOTEL_NAME);
    card.skip(1.5);
    card.canvas.draw_text(Font::HelveticaBold, 14.0, 30.0, card.y, FORM_HEADING);
    card.skip(1.5);

    card.line("Nom :", Some("Name - Apellidos"), &form.nom, Align::Center);
    card.skip(0.5);
    card.line("Prenome :", Some("First name - Nombre"), &form.prenom, Align::Center);
    card.skip(0.5);
    card.line(
        "Date de naissance :",
        Some("Date of Birth - Ficha de Nacimiento"),
        &form.date_naissance,
        Align::Right,
    );
    card.skip(0.5);
    card.line(
        "Nationalité :",
        Some("Nationality - Nacionalida"),
        &form.nationalite,
        Align::Center,
    );

    if !form.cin.is_empty() {
        card.skip(0.5);
        card.line("C.I.N :", None, &form.cin, Align::Center);
    }
    if !form.carte_sejour.is_empty() {
        card.skip(0.5);
        card.line("Carte de séjour :", None, &form.carte_sejour, Align::Center);
    }
    if !form.entree_maroc.is_empty() {
        card.skip(0.5);
        card.dual_line(("D\u{2019}entrée Au Maroc :", form.entree_maroc.as_str()), ("", ""));
    }
    if !form.passeport_num.is_empty() {
        card.skip(0.5);
        card.line("Passeport N° :", None, &form.passeport_num, Align::Center);
    }

    card.skip(0.5);
    card.multiline("Domicile Habituel :", &[form.domicile.as_str()]);

    card.skip(0.5);
    card.dual_line(
        ("Date d\u{2019}arrivée ", form.date_arrivee.as_str()),
        ("N° de chambre :", form.num_chambre.as_str()),
    );
    card.skip(0.5);
    card.dual_line(
        ("N° d\u{2019}enfants mineurs accompagnant le client :", form.nb_enfants.as_str()),
        ("", ""),
    );
    card.skip(0.5);
    card.dual_line(
        ("Lieu de Provenance :", form.provenance.as_str()),
        ("Destination :", form.destination.as_str()),
    );

    card.skip(1.5);
    let place = if form.fait_a.is_empty() {
        DEFAULT_HOTEL_CITY
    } else {
        form.fait_a.as_str()
    };
    card.line(&format!("Fait à {}, le :", place), None, &form.fait_le, Align::Center);

    let pdf = card.canvas.finish()?;
    info!("Rendered hotel form ({} bytes)", pdf.len());
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::canvas::page_strings;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn previous() -> FieldMap {
        [
            (keys::SURNAME, " ERIKSSON "),
            (keys::GIVEN_NAMES, "ANNA MARIA"),
            (keys::DATE_OF_BIRTH, "740812"),
            (keys::DATE_OF_BIRTH_DISPLAY, "12/08/1974"),
            (keys::NATIONALITY, "UTO"),
            (keys::DOCUMENT_NUMBER, "L898902C3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_prefill_from_previous_extraction() {
        let form = HotelForm::prefill(Some(&previous()), today());
        assert_eq!(form.nom, "ERIKSSON");
        assert_eq!(form.prenom, "ANNA MARIA");
        assert_eq!(form.date_naissance, "12/08/1974");
        assert_eq!(form.nationalite, "UTO");
        assert_eq!(form.numero, "L898902C3");
        assert_eq!(form.passeport_num, "L898902C3");
        assert_eq!(form.fait_a, "Tanger");
        assert_eq!(form.fait_le, "18/10/2026");
        assert!(form.cin.is_empty());
        assert!(form.domicile.is_empty());
    }

    #[test]
    fn test_prefill_falls_back_to_raw_birth_date() {
        let mut prev = previous();
        prev.remove(keys::DATE_OF_BIRTH_DISPLAY);
        assert_eq!(HotelForm::prefill(Some(&prev), today()).date_naissance, "740812");
    }

    #[test]
    fn test_prefill_without_previous_is_blank() {
        let form = HotelForm::prefill(None, today());
        assert_eq!(
            form,
            HotelForm {
                fait_a: "Tanger".to_string(),
                fait_le: "18/10/2026".to_string(),
                ..HotelForm::default()
            }
        );
    }

    #[test]
    fn test_render_normalizes_dates_and_skips_empty_optionals() {
        let mut form = HotelForm::prefill(Some(&previous()), today());
        form.date_arrivee = "2026-10-17".to_string();
        form.num_chambre = "12".to_string();

        let pdf = render_hotel_form(&form).unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let strings = page_strings(&pdf);
        assert_eq!(strings[0], HOTEL_NAME);
        assert_eq!(strings[1], "FICHE D'H\u{d4}TEL - HOTEL FORM");
        assert!(strings.iter().any(|s| s == "17/10/2026"));
        assert!(strings.iter().any(|s| s == "Passeport N\u{b0} :"));
        assert!(!strings.iter().any(|s| s == "C.I.N :"));
        assert!(!strings.iter().any(|s| s.starts_with("Carte de s")));
        assert_eq!(strings.last().map(String::as_str), Some("18/10/2026"));
        assert!(strings.iter().any(|s| s == "Fait \u{e0} Tanger, le :"));
    }

    #[test]
    fn test_render_optional_lines_when_filled() {
        let form = HotelForm {
            cin: "JA118202".to_string(),
            carte_sejour: "CS-99".to_string(),
            entree_maroc: "01/10/2026".to_string(),
            ..HotelForm::default()
        };
        let strings = page_strings(&render_hotel_form(&form).unwrap());
        assert!(strings.iter().any(|s| s == "C.I.N :"));
        assert!(strings.iter().any(|s| s == "JA118202"));
        assert!(strings.iter().any(|s| s == "CS-99"));
        assert!(strings.iter().any(|s| s == "D\u{92}entr\u{e9}e Au Maroc :"));
        assert!(!strings.iter().any(|s| s == "Passeport N\u{b0} :"));
        // blank place falls back to the hotel's city
        assert!(strings.iter().any(|s| s == "Fait \u{e0} Tanger, le :"));
    }

    #[test]
    fn test_page_size_matches_card() {
        let (w, h) = PAGE_SIZE;
        assert!((w - 277.92).abs() < 0.01);
        assert!((h - 538.56).abs() < 0.01);
    }
}
