use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::pdf_parser::DEFAULT_LINE_MARGIN;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical gap, relative to line height, above which two text lines
    /// belong to different paragraphs.
    pub line_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_margin: DEFAULT_LINE_MARGIN,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.line_margin.is_finite() && self.line_margin > 0.0,
            "line_margin must be a positive number, got {}",
            self.line_margin
        );
        Ok(())
    }
}

impl fmt::Display for LayoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Keep whole paragraphs on one line instead of one sentence per line.
    pub disable_sentence_split: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorefConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookConfig {
    pub id: u32,
    #[serde(default = "default_subject")]
    pub subject: String,
    pub grade: u8,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub origin: String,
    /// Overrides the archive name taken from the last URL segment.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl BookConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.url.trim().is_empty(), "book {} has an empty url", self.id);
        ensure!(
            !self.subject.trim().is_empty(),
            "book {} has an empty subject",
            self.id
        );
        if let Some(name) = &self.file_name {
            ensure!(
                !name.trim().is_empty(),
                "book {} has an empty file_name override",
                self.id
            );
            ensure!(
                !name.contains(['/', '\\']) && name != "..",
                "book {} file_name must not contain a path: {:?}",
                self.id,
                name
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory the archives are downloaded into.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory the `class_<grade>_<subject>` folders are created in.
    #[serde(default = "default_data_dir")]
    pub extract_to: PathBuf,
    /// When set, chapter texts and a summary are written here.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub coref: CorefConfig,
    pub books: Vec<BookConfig>,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: PipelineConfig =
            serde_json::from_str(&config_str).with_context(|| "Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        ensure!(!self.books.is_empty(), "config lists no books");

        let mut seen = HashSet::new();
        for book in &self.books {
            book.validate()?;
            ensure!(seen.insert(book.id), "book id {} is listed twice", book.id);
        }
        Ok(())
    }
}

fn default_subject() -> String {
    "History".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
