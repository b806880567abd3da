pub mod config;
pub mod document_reader;
pub mod models;
pub mod processing;
pub mod rendering;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use document_reader::{DocumentReader, ReadOptions};
pub use utils::{DocumentError, Result};
