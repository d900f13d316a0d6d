use crate::error::{Result, VellumError};
use std::path::{Path, PathBuf};

/// Where a page is read from and where its outputs go.
///
/// The output tree mirrors the source tree: `box1/0001.jpg` is read from
/// `<source>/box1/0001.jpg` and written to `<output>/box1/` as `0001.jpg`,
/// `0001.data.json`, `0001.texts.txt` and `0001.words.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    /// Page identity as given in the index, slash separated.
    pub page: String,
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub image_path: PathBuf,
    pub data_path: PathBuf,
    pub text_path: PathBuf,
    pub keywords_path: PathBuf,
}

impl PageLayout {
    /// Resolve a relative page path against the source and output roots.
    ///
    /// Absolute paths, `..` segments and paths without a file name are rejected
    /// so that outputs can never land outside the output root.
    pub fn resolve(page: &str, source_root: &Path, output_root: &Path) -> Result<Self> {
        let page = page.trim();
        if page.is_empty() {
            return Err(VellumError::validation("Page path is empty"));
        }
        if page.starts_with('/') || page.starts_with('\\') || Path::new(page).is_absolute() {
            return Err(VellumError::validation(format!(
                "Page path must be relative to the source root: {}",
                page
            )));
        }

        let segments: Vec<&str> = page.split(['/', '\\']).filter(|s| !s.is_empty() && *s != ".").collect();
        if segments.contains(&"..") {
            return Err(VellumError::validation(format!(
                "Page path must not leave the source root: {}",
                page
            )));
        }

        let Some((file_name, dirs)) = segments.split_last() else {
            return Err(VellumError::validation(format!("Page path has no file name: {}", page)));
        };
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VellumError::validation(format!("Page path has no file name: {}", page)))?;

        let mut source_dir = source_root.to_path_buf();
        let mut output_dir = output_root.to_path_buf();
        for dir in dirs {
            source_dir.push(dir);
            output_dir.push(dir);
        }

        Ok(Self {
            page: page.to_string(),
            source_path: source_dir.join(file_name),
            image_path: output_dir.join(file_name),
            data_path: output_dir.join(format!("{}.data.json", stem)),
            text_path: output_dir.join(format!("{}.texts.txt", stem)),
            keywords_path: output_dir.join(format!("{}.words.txt", stem)),
            output_dir,
        })
    }
}
