use crate::config::Config;
use crate::models::DocumentFields;
use crate::processing::front::FrontFieldExtractor;
use crate::processing::mrz::MrzReader;
use crate::processing::ocr::OcrEngine;
use crate::utils::Result;
use crate::validation::MrzAdapter;
use log::{info, warn};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub use_legacy: bool,
    pub require_country: Option<String>,
    pub front_fallback: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions::from(&Config::default())
    }
}

impl From<&Config> for ReadOptions {
    fn from(config: &Config) -> Self {
        ReadOptions {
            use_legacy: config.use_legacy,
            require_country: config.require_country.clone(),
            front_fallback: config.front_fallback,
        }
    }
}

/// Reads one document image: the MRZ first, then the card front when the
/// MRZ is missing or rejected.
pub struct DocumentReader<'a> {
    mrz_reader: &'a dyn MrzReader,
    engine: &'a dyn OcrEngine,
    options: ReadOptions,
}

impl<'a> DocumentReader<'a> {
    pub fn new(mrz_reader: &'a dyn MrzReader, engine: &'a dyn OcrEngine, options: ReadOptions) -> Self {
        DocumentReader {
            mrz_reader,
            engine,
            options,
        }
    }

    pub fn read(&self, image_path: &Path) -> Result<DocumentFields> {
        let attempt = MrzAdapter::new(self.mrz_reader).read_mrz_document(
            image_path,
            self.options.use_legacy,
            self.options.require_country.as_deref(),
        );

        match attempt {
            Ok(fields) => Ok(DocumentFields::Mrz(fields)),
            Err(e) if e.is_recoverable() && self.options.front_fallback => {
                info!("{}; falling back to front-side extraction", e);
                let identity =
                    FrontFieldExtractor::new(self.engine).extract_front_fields(image_path)?;
                let fields = DocumentFields::FrontFallback(identity);
                if !fields.has_key_field() {
                    warn!("Front-side extraction found no identifying field in {}", image_path.display());
                }
                Ok(fields)
            }
            Err(e) => Err(e),
        }
    }
}
