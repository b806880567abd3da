// Command-line front end: MRZ / CIN extraction and PDF form filling

use chrono::Local;
use clap::{Parser, Subcommand};
use log::info;
use mrzform::{
    models::FieldMap,
    processing::{TesseractEngine, TesseractMrzReader},
    rendering::{render_hotel_form, render_information_form, HotelForm},
    validation::MrzAdapter,
    Config, DocumentError, DocumentReader, ReadOptions, Result,
};
use std::fs;
use std::path::{Path, PathBuf};

const MOROCCO: &str = "MAR";

/// Read passports and ID cards, and fill forms from them
#[derive(Parser, Debug)]
#[command(name = "mrzform")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tesseract language data directory (overrides config and TESSDATA_PREFIX)
    #[arg(long, global = true)]
    tessdata: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the MRZ from an image and print it as JSON
    ExtractMrz {
        /// Scanned image (PNG, JPEG, ...); PDF input is not supported
        path: PathBuf,

        /// Use the legacy OCR engine even when the config turns it off
        #[arg(long)]
        legacy: bool,
    },

    /// Read a Moroccan national ID card (CIN), falling back to the front side
    ExtractId {
        /// Scanned image (PNG, JPEG, ...); PDF input is not supported
        path: PathBuf,

        /// Disable the legacy OCR engine
        #[arg(long)]
        no_legacy: bool,

        /// Do not require MAR as issuing country or nationality
        #[arg(long)]
        allow_any_country: bool,

        /// Fail instead of reading the card front when no MRZ is accepted
        #[arg(long)]
        no_front_fallback: bool,
    },

    /// Read a document and write a filled PDF form
    FillForm {
        /// Scanned image (PNG, JPEG, ...); PDF input is not supported
        path: PathBuf,

        /// Output PDF (default: <input stem>_filled.pdf next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable the legacy OCR engine
        #[arg(long)]
        no_legacy: bool,

        /// Render the hotel registration card instead of the information form
        #[arg(long)]
        hotel: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.tessdata {
        config.tessdata_dir = Some(dir.clone());
    }
    Ok(config)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(DocumentError::IoError(format!(
            "File not found: {}",
            path.display()
        )))
    }
}

fn print_json(fields: &FieldMap) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(fields)?);
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{}_filled.pdf", stem))
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let engine = TesseractEngine::new(config.tessdata_dir().as_deref());
    let mrz_reader = TesseractMrzReader::new(&engine);

    match cli.command {
        Command::ExtractMrz { path, legacy } => {
            ensure_exists(&path)?;
            let use_legacy = config.use_legacy_with(legacy, false);
            let fields = MrzAdapter::new(&mrz_reader).read_mrz_document(&path, use_legacy, None)?;
            print_json(&fields.to_field_map())
        }
        Command::ExtractId {
            path,
            no_legacy,
            allow_any_country,
            no_front_fallback,
        } => {
            ensure_exists(&path)?;
            let require_country = if allow_any_country {
                None
            } else {
                Some(
                    config
                        .require_country
                        .clone()
                        .unwrap_or_else(|| MOROCCO.to_string()),
                )
            };
            let options = ReadOptions {
                use_legacy: config.use_legacy_with(false, no_legacy),
                require_country,
                front_fallback: config.front_fallback && !no_front_fallback,
            };
            let fields = DocumentReader::new(&mrz_reader, &engine, options).read(&path)?;
            info!("Read {} via {:?}", path.display(), fields.provenance());
            print_json(&fields.to_field_map())
        }
        Command::FillForm {
            path,
            output,
            no_legacy,
            hotel,
        } => {
            ensure_exists(&path)?;
            let options = ReadOptions {
                use_legacy: config.use_legacy_with(false, no_legacy),
                ..ReadOptions::from(&config)
            };
            let fields = DocumentReader::new(&mrz_reader, &engine, options)
                .read(&path)?
                .to_field_map();

            let pdf = if hotel {
                let mut form = HotelForm::prefill(Some(&fields), Local::now().date_naive());
                form.fait_a = config.hotel_city.clone();
                render_hotel_form(&form)?
            } else {
                render_information_form(&fields)?
            };

            let output = output.unwrap_or_else(|| default_output(&path));
            fs::write(&output, pdf)?;
            println!("Successfully created filled PDF: {}", output.display());
            print_json(&fields)
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
