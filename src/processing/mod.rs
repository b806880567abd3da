pub mod dates;
pub mod extractors;
pub mod front;
pub mod image;
pub mod mrz;
pub mod ocr;
pub mod regions;

pub use extractors::FieldExtractor;
pub use front::FrontFieldExtractor;
pub use self::image::ImageProcessor;
pub use mrz::{MrzParser, MrzReader, TesseractMrzReader};
pub use ocr::{OcrDispatcher, OcrEngine, OcrProfile, TesseractEngine};
