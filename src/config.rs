use crate::utils::{DocumentError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const TESSDATA_ENV: &str = "TESSDATA_PREFIX";
pub const DEFAULT_HOTEL_CITY: &str = "Tanger";

/// Runtime options, loaded from an optional JSON file. Missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tessdata_dir: Option<PathBuf>,
    /// Use the legacy tesseract engine for the MRZ pass.
    pub use_legacy: bool,
    /// Three-letter code the MRZ must carry as issuing country or nationality.
    pub require_country: Option<String>,
    pub front_fallback: bool,
    pub hotel_city: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tessdata_dir: None,
            use_legacy: true,
            require_country: None,
            front_fallback: true,
            hotel_city: DEFAULT_HOTEL_CITY.to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            DocumentError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)
            .map_err(|e| DocumentError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        if let Some(code) = &self.require_country {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(DocumentError::ConfigError(format!(
                    "require_country must be a three-letter code, got {:?}",
                    code
                )));
            }
        }
        Ok(self)
    }

    /// Legacy engine choice after command-line flags: `disable` wins over
    /// `enable`, and with neither the file value stands.
    pub fn use_legacy_with(&self, enable: bool, disable: bool) -> bool {
        !disable && (enable || self.use_legacy)
    }

    /// The configured tessdata directory, else `TESSDATA_PREFIX`.
    pub fn tessdata_dir(&self) -> Option<PathBuf> {
        self.tessdata_dir
            .clone()
            .or_else(|| env::var_os(TESSDATA_ENV).map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.use_legacy);
        assert!(config.front_fallback);
        assert_eq!(config.require_country, None);
        assert_eq!(config.hotel_city, "Tanger");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"require_country": "MAR", "use_legacy": false}"#).unwrap();
        assert_eq!(config.require_country.as_deref(), Some("MAR"));
        assert!(!config.use_legacy);
        assert!(config.front_fallback);
        assert_eq!(config.hotel_city, DEFAULT_HOTEL_CITY);
    }

    #[test]
    fn test_legacy_flags_override_file_value() {
        let off = Config::from_json(r#"{"use_legacy": false}"#).unwrap();
        assert!(!off.use_legacy_with(false, false));
        assert!(off.use_legacy_with(true, false));

        let on = Config::default();
        assert!(on.use_legacy_with(false, false));
        assert!(!on.use_legacy_with(false, true));
        assert!(!on.use_legacy_with(true, true));
    }

    #[test]
    fn test_rejects_bad_country_code() {
        let err = Config::from_json(r#"{"require_country": "MOROCCO"}"#).unwrap_err();
        assert!(matches!(err, DocumentError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(DocumentError::ConfigError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tessdata_dir": "/opt/tessdata", "hotel_city": "Rabat"}}"#).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.tessdata_dir(), Some(PathBuf::from("/opt/tessdata")));
        assert_eq!(config.hotel_city, "Rabat");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file(Path::new("/nonexistent/mrzform.json")).unwrap_err();
        assert!(matches!(err, DocumentError::ConfigError(_)));
    }
}
