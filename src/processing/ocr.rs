use crate::processing::image::ImageProcessor;
use crate::processing::regions::RegionOfInterest;
use crate::utils::{DocumentError, Result};
use image::GrayImage;
use log::debug;
use std::path::Path;
use tesseract::{OcrEngineMode, PageSegMode, Tesseract};

const DIGITS_AND_SEPARATORS: &str = "0123456789./-";
const UPPER_ALNUM: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MRZ_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// LSTM recognizer (`--oem 1`)
    Default,
    /// Legacy recognizer (`--oem 0`), better on constrained charsets
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegmentation {
    /// `--psm 6`
    SingleBlock,
    /// `--psm 7`
    SingleLine,
}

/// Everything that configures one OCR call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrProfile {
    pub name: &'static str,
    pub page_seg_mode: PageSegmentation,
    pub engine_mode: EngineMode,
    pub whitelist: Option<&'static str>,
    pub languages: &'static str,
}

impl OcrProfile {
    /// Mixed French/English text, no charset restriction.
    pub const GENERAL: OcrProfile = OcrProfile {
        name: "general",
        page_seg_mode: PageSegmentation::SingleBlock,
        engine_mode: EngineMode::Default,
        whitelist: None,
        languages: "eng+fra",
    };

    pub const DIGITS: OcrProfile = OcrProfile {
        name: "digits",
        page_seg_mode: PageSegmentation::SingleBlock,
        engine_mode: EngineMode::Legacy,
        whitelist: Some(DIGITS_AND_SEPARATORS),
        languages: "eng",
    };

    pub const ALNUM: OcrProfile = OcrProfile {
        name: "alnum",
        page_seg_mode: PageSegmentation::SingleBlock,
        engine_mode: EngineMode::Legacy,
        whitelist: Some(UPPER_ALNUM),
        languages: "eng",
    };

    pub const REGION_DIGITS: OcrProfile = OcrProfile {
        name: "region_digits",
        page_seg_mode: PageSegmentation::SingleLine,
        engine_mode: EngineMode::Legacy,
        whitelist: Some(DIGITS_AND_SEPARATORS),
        languages: "eng+fra",
    };

    pub const REGION_ALNUM: OcrProfile = OcrProfile {
        name: "region_alnum",
        page_seg_mode: PageSegmentation::SingleLine,
        engine_mode: EngineMode::Legacy,
        whitelist: Some(UPPER_ALNUM),
        languages: "eng+fra",
    };

    pub const REGION_GENERAL: OcrProfile = OcrProfile {
        name: "region_general",
        page_seg_mode: PageSegmentation::SingleBlock,
        engine_mode: EngineMode::Default,
        whitelist: None,
        languages: "eng+fra",
    };

    pub fn mrz(use_legacy: bool) -> OcrProfile {
        OcrProfile {
            name: "mrz",
            page_seg_mode: PageSegmentation::SingleBlock,
            engine_mode: if use_legacy { EngineMode::Legacy } else { EngineMode::Default },
            whitelist: Some(MRZ_CHARSET),
            languages: "eng",
        }
    }
}

/// One recognition job: an image (already cropped when `region` is set)
/// and the profile to read it with.
pub struct OcrRequest<'a> {
    pub image: &'a GrayImage,
    pub profile: &'a OcrProfile,
    pub region: Option<&'a RegionOfInterest>,
}

/// An OCR backend. Implementations make exactly one recognition call per
/// `recognize` and return the text untouched.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, request: &OcrRequest<'_>) -> Result<String>;
}

/// Tesseract through the `tesseract` crate. A fresh handle is created for
/// every call so the engine holds no mutable state.
pub struct TesseractEngine {
    datapath: Option<String>,
}

impl TesseractEngine {
    pub fn new(tessdata_dir: Option<&Path>) -> Self {
        TesseractEngine {
            datapath: tessdata_dir.map(|p| p.to_string_lossy().into_owned()),
        }
    }

    fn oem(mode: EngineMode) -> OcrEngineMode {
        match mode {
            EngineMode::Default => OcrEngineMode::LstmOnly,
            EngineMode::Legacy => OcrEngineMode::TesseractOnly,
        }
    }

    fn psm(mode: PageSegmentation) -> PageSegMode {
        match mode {
            PageSegmentation::SingleBlock => PageSegMode::PsmSingleBlock,
            PageSegmentation::SingleLine => PageSegMode::PsmSingleLine,
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, request: &OcrRequest<'_>) -> Result<String> {
        let profile = request.profile;

        // Tesseract reads from disk; keep the temp file alive until get_text
        let temp_file = ImageProcessor::save_to_temp_file(request.image)?;
        let path_str = temp_file
            .path()
            .to_str()
            .ok_or_else(|| DocumentError::OcrError("Could not convert path to string".to_string()))?;

        let mut tess = Tesseract::new_with_oem(
            self.datapath.as_deref(),
            Some(profile.languages),
            Self::oem(profile.engine_mode),
        )
        .map_err(|e| {
            DocumentError::OcrError(format!(
                "Failed to initialize Tesseract ({}, {}): {}",
                profile.name, profile.languages, e
            ))
        })?;

        tess.set_page_seg_mode(Self::psm(profile.page_seg_mode));

        if let Some(whitelist) = profile.whitelist {
            tess = tess
                .set_variable("tessedit_char_whitelist", whitelist)
                .map_err(|e| DocumentError::OcrError(format!("Failed to set whitelist: {}", e)))?;
        }

        tess = tess
            .set_image(path_str)
            .map_err(|e| DocumentError::OcrError(format!("Failed to set image: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| DocumentError::OcrError(format!("Failed to extract text: {}", e)))?;

        debug!(
            "OCR [{}{}]:\n{}",
            profile.name,
            request.region.map(|r| format!(" @ {}", r.name)).unwrap_or_default(),
            text
        );
        Ok(text)
    }
}

/// Issues OCR requests against a full page or one of its regions.
pub struct OcrDispatcher<'e> {
    engine: &'e dyn OcrEngine,
}

impl<'e> OcrDispatcher<'e> {
    pub fn new(engine: &'e dyn OcrEngine) -> Self {
        OcrDispatcher { engine }
    }

    pub fn full_page(&self, image: &GrayImage, profile: &OcrProfile) -> Result<String> {
        self.engine.recognize(&OcrRequest {
            image,
            profile,
            region: None,
        })
    }

    /// Crop `region`, re-clean the crop, and read it with `profile`.
    pub fn region(
        &self,
        image: &GrayImage,
        region: &RegionOfInterest,
        profile: &OcrProfile,
    ) -> Result<String> {
        let crop = ImageProcessor::clean_region(&ImageProcessor::crop(image, region));
        self.engine.recognize(&OcrRequest {
            image: &crop,
            profile,
            region: Some(region),
        })
    }
}
