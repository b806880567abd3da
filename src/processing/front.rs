// Front-side extraction for the Moroccan CIN, used when the card has no MRZ.
//
// Each field is resolved by an ordered list of detectors. The first one that
// returns a value wins and the rest never run, so region OCR is only paid for
// when the full-page heuristics came up empty.

use crate::models::ExtractedIdentity;
use crate::processing::dates::parse_loose_date;
use crate::processing::extractors::FieldExtractor;
use crate::processing::image::ImageProcessor;
use crate::processing::ocr::{OcrDispatcher, OcrEngine, OcrProfile};
use crate::processing::regions::{
    RegionOfInterest, BIRTH_DATE_REGION, DOCUMENT_NUMBER_REGION, EXPIRY_DATE_REGION, NAMES_REGION,
};
use crate::utils::Result;
use chrono::NaiveDate;
use image::{DynamicImage, GrayImage};
use log::{debug, info};
use std::path::Path;

/// This extractor only reads cards issued by one country.
pub const ISSUING_NATIONALITY: &str = "MAR";

/// Text of the three full-page passes, kept for the whole call.
pub struct PageTexts {
    pub general_lines: Vec<String>,
    /// General pass lines joined back together; also the `raw_ocr_text`.
    pub general: String,
    pub digits: String,
    pub alnum: String,
    /// Valid dates from the general and digits passes.
    pub date_pool: Vec<NaiveDate>,
}

impl PageTexts {
    pub fn new(general_raw: &str, digits: String, alnum: String) -> Self {
        let general_lines = FieldExtractor::clean_lines(general_raw);
        let general = general_lines.join(" \n");
        let date_pool = FieldExtractor::pooled_candidates(&general, &digits);
        PageTexts {
            general_lines,
            general,
            digits,
            alnum,
            date_pool,
        }
    }
}

/// State shared by the detectors of one extraction call.
pub struct FrontContext<'a> {
    pub image: &'a GrayImage,
    pub dispatcher: &'a OcrDispatcher<'a>,
    pub texts: &'a PageTexts,
}

impl<'a> FrontContext<'a> {
    fn region_text(&self, region: &RegionOfInterest, profile: &OcrProfile) -> Result<String> {
        Ok(self.dispatcher.region(self.image, region, profile)?.trim().to_string())
    }

    fn region_date(&self, region: &RegionOfInterest) -> Result<Option<String>> {
        let text = self.region_text(region, &OcrProfile::REGION_DIGITS)?;
        Ok(parse_loose_date(&text))
    }
}

pub type Detector = fn(&FrontContext<'_>) -> Result<Option<String>>;

/// Detectors for one field, in priority order.
pub struct FieldCascade {
    pub field: &'static str,
    pub detectors: &'static [(&'static str, Detector)],
}

impl FieldCascade {
    /// Run detectors until one yields a value; empty string when none does.
    pub fn resolve(&self, ctx: &FrontContext<'_>) -> Result<String> {
        for (name, detector) in self.detectors {
            if let Some(value) = detector(ctx)? {
                debug!("{} resolved by {}: {}", self.field, name, value);
                return Ok(value);
            }
        }
        debug!("{} not found", self.field);
        Ok(String::new())
    }
}

fn birth_from_marker(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    Ok(FieldExtractor::birth_date_from_marker(&ctx.texts.general_lines))
}

fn birth_from_pool(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    Ok(FieldExtractor::earliest(&ctx.texts.date_pool))
}

fn birth_from_region(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    ctx.region_date(&BIRTH_DATE_REGION)
}

fn expiry_from_marker(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    Ok(FieldExtractor::expiry_from_marker(&ctx.texts.general_lines))
}

fn expiry_from_pool(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    Ok(FieldExtractor::latest(&ctx.texts.date_pool))
}

fn expiry_from_region(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    ctx.region_date(&EXPIRY_DATE_REGION)
}

fn number_from_alnum_pass(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    Ok(FieldExtractor::document_number(&ctx.texts.alnum))
}

fn number_from_general_pass(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    Ok(FieldExtractor::document_number(&ctx.texts.general))
}

fn number_from_region(ctx: &FrontContext<'_>) -> Result<Option<String>> {
    let text = ctx.region_text(&DOCUMENT_NUMBER_REGION, &OcrProfile::REGION_ALNUM)?;
    Ok(FieldExtractor::document_number_spaced(&text))
}

pub const BIRTH_DATE_CASCADE: FieldCascade = FieldCascade {
    field: "date_of_birth",
    detectors: &[
        ("marker_line", birth_from_marker),
        ("earliest_candidate", birth_from_pool),
        ("birth_date_region", birth_from_region),
    ],
};

pub const EXPIRY_DATE_CASCADE: FieldCascade = FieldCascade {
    field: "expiration_date",
    detectors: &[
        ("marker_line", expiry_from_marker),
        ("latest_candidate", expiry_from_pool),
        ("expiry_date_region", expiry_from_region),
    ],
};

pub const DOCUMENT_NUMBER_CASCADE: FieldCascade = FieldCascade {
    field: "document_number",
    detectors: &[
        ("alnum_pass", number_from_alnum_pass),
        ("general_pass", number_from_general_pass),
        ("document_number_region", number_from_region),
    ],
};

pub struct FrontFieldExtractor<'e> {
    dispatcher: OcrDispatcher<'e>,
}

impl<'e> FrontFieldExtractor<'e> {
    pub fn new(engine: &'e dyn OcrEngine) -> Self {
        FrontFieldExtractor {
            dispatcher: OcrDispatcher::new(engine),
        }
    }

    /// Best-effort read of the card front. Only an undecodable image or a
    /// broken OCR engine is an error; undetected fields are empty strings.
    pub fn extract_front_fields(&self, image_path: &Path) -> Result<ExtractedIdentity> {
        info!("Front-side extraction for {}", image_path.display());
        let img = ImageProcessor::load(image_path)?;
        self.extract_from_image(&img)
    }

    pub fn extract_from_image(&self, img: &DynamicImage) -> Result<ExtractedIdentity> {
        let processed = ImageProcessor::preprocess(img);

        let texts = PageTexts::new(
            &self.dispatcher.full_page(&processed, &OcrProfile::GENERAL)?,
            self.dispatcher.full_page(&processed, &OcrProfile::DIGITS)?,
            self.dispatcher.full_page(&processed, &OcrProfile::ALNUM)?,
        );
        debug!("Date candidates: {:?}", texts.date_pool);

        let ctx = FrontContext {
            image: &processed,
            dispatcher: &self.dispatcher,
            texts: &texts,
        };

        let mut identity = ExtractedIdentity::front_fallback(ISSUING_NATIONALITY);
        identity.date_of_birth_display = BIRTH_DATE_CASCADE.resolve(&ctx)?;
        identity.expiration_date_display = EXPIRY_DATE_CASCADE.resolve(&ctx)?;
        identity.document_number = DOCUMENT_NUMBER_CASCADE.resolve(&ctx)?;

        let (surname, given_names) = Self::resolve_names(&ctx)?;
        identity.surname = surname;
        identity.given_names = given_names;

        identity.country = FieldExtractor::locality(&texts.general)
            .unwrap_or_else(|| ISSUING_NATIONALITY.to_string());
        identity.raw_ocr_text = texts.general.clone();

        info!(
            "Front-side extraction done (number: {}, birth: {}, expiry: {})",
            present(&identity.document_number),
            present(&identity.date_of_birth_display),
            present(&identity.expiration_date_display)
        );
        Ok(identity)
    }

    /// Page heuristic first; the names region only fills slots still empty.
    fn resolve_names(ctx: &FrontContext<'_>) -> Result<(String, String)> {
        let (surname, given_names) = FieldExtractor::names_from_lines(&ctx.texts.general_lines);
        let mut surname = surname.unwrap_or_default();
        let mut given_names = given_names.unwrap_or_default();

        if surname.is_empty() || given_names.is_empty() {
            let text = ctx.region_text(&NAMES_REGION, &OcrProfile::REGION_GENERAL)?;
            let (roi_surname, roi_names) =
                FieldExtractor::names_from_lines(&FieldExtractor::clean_lines(&text));
            if surname.is_empty() {
                surname = roi_surname.unwrap_or_default();
            }
            if given_names.is_empty() {
                given_names = roi_names.unwrap_or_default();
            }
            debug!("names region gave surname={:?} given_names={:?}", surname, given_names);
        }
        Ok((surname, given_names))
    }
}

fn present(value: &str) -> &'static str {
    if value.is_empty() {
        "missing"
    } else {
        "found"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keys;
    use crate::processing::ocr::testing::{BrokenEngine, ScriptedEngine};
    use crate::utils::DocumentError;
    use image::{GrayImage, Luma};

    const FRONT_GENERAL: &str = "ROYAUME DU MAROC\n\
        Carte Nationale d'Identite\n\
        ALAOUI\n\
        FATIMA ZAHRA\n\
        Née le 13.09.1984\n\
        à Guelmim\n\
        Valable jusqu'au 01.12.2031\n";

    fn card() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(640, 400, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 40 } else { 220 }])
        }))
    }

    #[test]
    fn test_full_page_heuristics_skip_regions() {
        let engine = ScriptedEngine::new()
            .page(&OcrProfile::GENERAL, FRONT_GENERAL)
            .page(&OcrProfile::DIGITS, "13.09.1984\n01.12.2031")
            .page(&OcrProfile::ALNUM, "JA118202");
        let extractor = FrontFieldExtractor::new(&engine);

        let id = extractor.extract_from_image(&card()).unwrap();

        assert_eq!(id.date_of_birth_display, "13/09/1984");
        assert_eq!(id.expiration_date_display, "01/12/2031");
        assert_eq!(id.document_number, "JA118202");
        // "ROYAUME DU MAROC" is the first uppercase line on this dump
        assert_eq!(id.surname, "Royaume Du Maroc");
        assert_eq!(id.given_names, "Alaoui");
        assert_eq!(id.country, "GUELMIM");
        assert_eq!(id.nationality, "MAR");
        assert_eq!(id.document_type_tag, "FRONT_FALLBACK");

        for region in [
            &BIRTH_DATE_REGION,
            &EXPIRY_DATE_REGION,
            &DOCUMENT_NUMBER_REGION,
            &NAMES_REGION,
        ] {
            assert_eq!(engine.region_calls(region), 0, "{} was read", region.name);
        }
        assert_eq!(engine.calls().len(), 3);
    }

    #[test]
    fn test_pooled_dates_pick_extremes() {
        let engine = ScriptedEngine::new()
            .page(&OcrProfile::GENERAL, "18.09.2027\nsome text 10/02/1946")
            .page(&OcrProfile::DIGITS, "");
        let id = FrontFieldExtractor::new(&engine)
            .extract_from_image(&card())
            .unwrap();

        assert_eq!(id.date_of_birth_display, "10/02/1946");
        assert_eq!(id.expiration_date_display, "18/09/2027");
        assert_eq!(engine.region_calls(&BIRTH_DATE_REGION), 0);
        assert_eq!(engine.region_calls(&EXPIRY_DATE_REGION), 0);
    }

    #[test]
    fn test_marker_lines_beat_pooled_dates() {
        // The digits pass holds an older and a later unlabeled date
        let engine = ScriptedEngine::new()
            .page(&OcrProfile::GENERAL, FRONT_GENERAL)
            .page(&OcrProfile::DIGITS, "02.03.1950\n05.05.2040");
        let id = FrontFieldExtractor::new(&engine)
            .extract_from_image(&card())
            .unwrap();

        assert_eq!(id.date_of_birth_display, "13/09/1984");
        assert_eq!(id.expiration_date_display, "01/12/2031");
        assert_eq!(engine.region_calls(&BIRTH_DATE_REGION), 0);
        assert_eq!(engine.region_calls(&EXPIRY_DATE_REGION), 0);
    }

    #[test]
    fn test_single_date_fills_birth_and_expiry() {
        // Known degenerate case: one date on the whole card lands in both fields
        let engine = ScriptedEngine::new().page(&OcrProfile::DIGITS, "01.12.2031");
        let id = FrontFieldExtractor::new(&engine)
            .extract_from_image(&card())
            .unwrap();
        assert_eq!(id.date_of_birth_display, "01/12/2031");
        assert_eq!(id.expiration_date_display, "01/12/2031");
    }

    #[test]
    fn test_region_fallbacks_fill_missing_fields() {
        let engine = ScriptedEngine::new()
            .page(&OcrProfile::GENERAL, "Carte Nationale")
            .region(&BIRTH_DATE_REGION, &OcrProfile::REGION_DIGITS, " 13.09.1984 \n")
            .region(&EXPIRY_DATE_REGION, &OcrProfile::REGION_DIGITS, "01.12.2031")
            .region(&DOCUMENT_NUMBER_REGION, &OcrProfile::REGION_ALNUM, "JA 118202")
            .region(&NAMES_REGION, &OcrProfile::REGION_GENERAL, "ALAOUI\nFATIMA ZAHRA\n");
        let id = FrontFieldExtractor::new(&engine)
            .extract_from_image(&card())
            .unwrap();

        assert_eq!(id.date_of_birth_display, "13/09/1984");
        assert_eq!(id.expiration_date_display, "01/12/2031");
        assert_eq!(id.document_number, "JA118202");
        assert_eq!(id.surname, "Alaoui");
        assert_eq!(id.given_names, "Fatima Zahra");
        assert_eq!(id.country, "MAR");
        for region in [
            &BIRTH_DATE_REGION,
            &EXPIRY_DATE_REGION,
            &DOCUMENT_NUMBER_REGION,
            &NAMES_REGION,
        ] {
            assert_eq!(engine.region_calls(region), 1);
        }
    }

    #[test]
    fn test_names_region_only_fills_empty_slot() {
        let engine = ScriptedEngine::new()
            .page(&OcrProfile::GENERAL, "Carte\nALAOUI\n")
            .region(&NAMES_REGION, &OcrProfile::REGION_GENERAL, "BENNANI\nFATIMA\n");
        let id = FrontFieldExtractor::new(&engine)
            .extract_from_image(&card())
            .unwrap();
        assert_eq!(id.surname, "Alaoui");
        assert_eq!(id.given_names, "Fatima");
    }

    #[test]
    fn test_nothing_detected_keeps_every_key() {
        let engine = ScriptedEngine::new();
        let id = FrontFieldExtractor::new(&engine)
            .extract_from_image(&card())
            .unwrap();
        let map = id.to_field_map();
        for key in keys::CANONICAL {
            assert!(map.contains_key(key));
        }
        assert_eq!(map[keys::DOCUMENT_NUMBER], "");
        assert_eq!(map[keys::DATE_OF_BIRTH_DISPLAY], "");
        assert_eq!(map[keys::COUNTRY], "MAR");
        // 3 page passes + 4 regions
        assert_eq!(engine.calls().len(), 7);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let engine = ScriptedEngine::new()
            .page(&OcrProfile::GENERAL, FRONT_GENERAL)
            .region(&DOCUMENT_NUMBER_REGION, &OcrProfile::REGION_ALNUM, "JA118202");
        let extractor = FrontFieldExtractor::new(&engine);
        let first = extractor.extract_from_image(&card()).unwrap();
        let second = extractor.extract_from_image(&card()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.to_field_map()).unwrap(),
            serde_json::to_string(&second.to_field_map()).unwrap()
        );
    }

    #[test]
    fn test_broken_engine_is_an_error() {
        let err = FrontFieldExtractor::new(&BrokenEngine)
            .extract_from_image(&card())
            .unwrap_err();
        assert!(matches!(err, DocumentError::OcrError(_)));
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let engine = ScriptedEngine::new();
        let err = FrontFieldExtractor::new(&engine)
            .extract_front_fields(Path::new("/nonexistent/card.jpg"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::ImageProcessingError(_)));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_extract_from_file() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        card().save_with_format(file.path(), image::ImageFormat::Png).unwrap();
        let engine = ScriptedEngine::new().page(&OcrProfile::ALNUM, "JA118202");
        let id = FrontFieldExtractor::new(&engine)
            .extract_front_fields(file.path())
            .unwrap();
        assert_eq!(id.document_number, "JA118202");
    }
}
