use super::error::OcrError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};

static LANGUAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{3}(_[a-z]+)?$").expect("language code pattern is valid"));

/// Well-known tessdata locations, checked when `TESSDATA_PREFIX` is unset.
const TESSDATA_FALLBACK_PATHS: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
];

/// Check a Tesseract language spec such as `eng`, `spa+lat` or `chi_sim`.
pub fn validate_language_code(lang_code: &str) -> Result<(), OcrError> {
    if lang_code.trim().is_empty() {
        return Err(OcrError::InvalidLanguageCode(
            "Language cannot be empty. Please specify a valid language code (e.g., 'eng')".to_string(),
        ));
    }

    for code in lang_code.split('+') {
        if !LANGUAGE_CODE.is_match(code) {
            return Err(OcrError::InvalidLanguageCode(format!(
                "Language code '{}' is not a Tesseract language code",
                code
            )));
        }
    }
    Ok(())
}

/// Locate the tessdata directory: `TESSDATA_PREFIX` first, then the usual install paths.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    if let Some(prefix) = env::var_os("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        if prefix.is_dir() {
            return Some(prefix);
        }
    }

    TESSDATA_FALLBACK_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_dir())
}

/// Make sure a `.traineddata` file exists for every language in `lang_code`.
pub fn validate_language_data(tessdata_dir: &Path, lang_code: &str) -> Result<(), OcrError> {
    for lang in lang_code.split('+').map(str::trim).filter(|l| !l.is_empty()) {
        let traineddata = tessdata_dir.join(format!("{}.traineddata", lang));
        if !traineddata.exists() {
            return Err(OcrError::MissingLanguageData(format!(
                "Language '{}' not found. Traineddata file does not exist: {}",
                lang,
                traineddata.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_language_code_valid() {
        assert!(validate_language_code("eng").is_ok());
        assert!(validate_language_code("spa").is_ok());
        assert!(validate_language_code("chi_sim").is_ok());
        assert!(validate_language_code("spa+lat").is_ok());
    }

    #[test]
    fn test_validate_language_code_invalid() {
        let result = validate_language_code("english");
        assert!(matches!(result.unwrap_err(), OcrError::InvalidLanguageCode(_)));
        assert!(validate_language_code("eng+").is_err());
        assert!(validate_language_code("ENG").is_err());
        assert!(validate_language_code("eng; rm -rf").is_err());
    }

    #[test]
    fn test_validate_language_code_empty() {
        assert!(validate_language_code("  ").is_err());
    }

    #[test]
    fn test_validate_language_data() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("spa.traineddata"), b"").unwrap();

        assert!(validate_language_data(dir.path(), "spa").is_ok());
        let err = validate_language_data(dir.path(), "spa+eng").unwrap_err();
        assert!(matches!(err, OcrError::MissingLanguageData(_)));
        assert!(err.to_string().contains("'eng'"));
    }
}
