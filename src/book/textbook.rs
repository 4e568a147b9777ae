use std::path::{Path, PathBuf};
use tracing::info;

use super::chapter::Chapter;
use crate::config::BookConfig;
use crate::coref::CorefEngine;
use crate::error::{Result, TextbookError};
use crate::fetch::{download_archive, extraction_dir_name, unzip_archive};
use crate::utils::chapter_locator::locate_chapter_files;
use crate::utils::pdf_parser::{extract_text_from_pdf, LayoutParams, PdfTextEngine};
use crate::utils::sentence::SentenceSegmenter;

/// Identity and classification of a textbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMeta {
    pub id: u32,
    pub subject: String,
    pub grade: u8,
    pub url: String,
    pub title: String,
    pub origin: String,
}

impl BookMeta {
    pub fn new(id: u32, subject: &str, grade: u8, url: &str) -> Result<Self> {
        if subject.trim().is_empty() {
            return Err(TextbookError::InvalidMetadata(format!(
                "book {} has an empty subject",
                id
            )));
        }
        if url.trim().is_empty() {
            return Err(TextbookError::InvalidMetadata(format!("book {} has an empty url", id)));
        }
        Ok(Self {
            id,
            subject: subject.to_string(),
            grade,
            url: url.to_string(),
            title: String::new(),
            origin: String::new(),
        })
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }
}

/// A textbook archive and the chapters extracted from it.
#[derive(Debug, Clone)]
pub struct Book {
    meta: BookMeta,
    archive_path: Option<PathBuf>,
    extract_dir: Option<PathBuf>,
    chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(meta: BookMeta) -> Self {
        Self {
            meta,
            archive_path: None,
            extract_dir: None,
            chapters: Vec::new(),
        }
    }

    pub fn from_config(config: &BookConfig) -> Result<Self> {
        let meta = BookMeta::new(config.id, &config.subject, config.grade, &config.url)?
            .with_title(&config.title)
            .with_origin(&config.origin);
        Ok(Self::new(meta))
    }

    pub fn meta(&self) -> &BookMeta {
        &self.meta
    }

    pub fn archive_path(&self) -> Option<&Path> {
        self.archive_path.as_deref()
    }

    pub fn extract_dir(&self) -> Option<&Path> {
        self.extract_dir.as_deref()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapters_mut(&mut self) -> &mut [Chapter] {
        &mut self.chapters
    }

    /// Point the book at an archive that is already on disk.
    pub fn set_archive_path(&mut self, path: PathBuf) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(TextbookError::InvalidMetadata(
                "archive path must not be empty".to_string(),
            ));
        }
        self.archive_path = Some(path);
        Ok(())
    }

    /// Download the book archive into `dir` unless it is already there.
    pub fn download(&mut self, dir: &Path, file_name: Option<&str>) -> Result<&Path> {
        let path = download_archive(&self.meta.url, dir, file_name)?;
        let path = self.archive_path.insert(path);
        Ok(path.as_path())
    }

    /// Extract the archive into `extract_to/class_<grade>_<subject>`.
    pub fn unzip(&mut self, extract_to: &Path) -> Result<&Path> {
        let archive = self
            .archive_path
            .as_deref()
            .ok_or(TextbookError::ArchiveNotDownloaded)?;
        let dest = extract_to.join(extraction_dir_name(self.meta.grade, &self.meta.subject));
        unzip_archive(archive, &dest)?;
        let dest = self.extract_dir.insert(dest);
        Ok(dest.as_path())
    }

    /// Extract the text of every chapter PDF, replacing any earlier chapters.
    pub fn make_chapters(
        &mut self,
        engine: &dyn PdfTextEngine,
        params: &LayoutParams,
    ) -> Result<usize> {
        let extract_dir = self.extract_dir.as_deref().ok_or(TextbookError::NotExtracted)?;
        let files = locate_chapter_files(extract_dir)?;

        let mut chapters = Vec::with_capacity(files.len());
        for (idx, file) in files.iter().enumerate() {
            info!("Extracting {}/{}: {:?}", idx + 1, files.len(), file.path);
            let content = extract_text_from_pdf(&file.path, engine, params)?;
            chapters.push(Chapter::new(file.number, file.path.clone(), content.text)?);
        }

        self.chapters = chapters;
        Ok(self.chapters.len())
    }

    /// Normalize every chapter's raw text.
    pub fn improve_sentence_boundaries(
        &mut self,
        segmenter: &dyn SentenceSegmenter,
        disable_sentence_split: bool,
    ) -> Result<()> {
        for chapter in &mut self.chapters {
            chapter.normalize(segmenter, disable_sentence_split)?;
        }
        Ok(())
    }

    /// Resolve coreferences chapter by chapter.
    ///
    /// Every chapter must have extracted and clean text; this is checked
    /// before any chapter is modified. An engine failure stops the run.
    pub fn resolve_coreference(&mut self, engine: &dyn CorefEngine) -> Result<()> {
        for chapter in &self.chapters {
            chapter.resolvable_text()?;
        }

        let total = self.chapters.len();
        for (idx, chapter) in self.chapters.iter_mut().enumerate() {
            info!("Resolving chapter {}/{} (chapter {})", idx + 1, total, chapter.number());
            chapter.resolve(engine)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::ChapterStage;
    use crate::coref::HeuristicCoref;
    use crate::fetch::archive::tests::write_zip;
    use crate::utils::pdf_parser::tests::FixedEngine;
    use crate::utils::sentence::RuleSegmenter;

    fn book() -> Book {
        Book::new(BookMeta::new(1, "History", 9, "http://127.0.0.1:9/hess1dd.zip").unwrap())
    }

    #[test]
    fn test_meta_validation() {
        assert!(BookMeta::new(1, "", 9, "http://x/a.zip").is_err());
        assert!(BookMeta::new(1, "History", 9, "  ").is_err());
        let meta = BookMeta::new(1, "History", 9, "http://x/a.zip")
            .unwrap()
            .with_title("India and the Contemporary World")
            .with_origin("NCERT");
        assert_eq!(meta.origin, "NCERT");
    }

    #[test]
    fn test_unzip_before_download_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = book();

        let err = book.unzip(dir.path()).unwrap_err();
        assert!(matches!(err, TextbookError::ArchiveNotDownloaded));
        assert!(book.extract_dir().is_none());
        assert!(!dir.path().join("class_9_History").exists());
    }

    #[test]
    fn test_empty_archive_path_rejected() {
        let mut book = book();
        assert!(book.set_archive_path(PathBuf::new()).is_err());
        assert!(book.archive_path().is_none());
    }

    #[test]
    fn test_make_chapters_before_unzip_fails() {
        let mut book = book();
        let err = book
            .make_chapters(&FixedEngine::new("text"), &LayoutParams::default())
            .unwrap_err();
        assert!(matches!(err, TextbookError::NotExtracted));
    }

    #[test]
    fn test_archive_to_resolved_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("hess1dd.zip");
        write_zip(
            &archive,
            &[
                ("hess1dd/hess102.pdf", "%PDF"),
                ("hess1dd/hess101.pdf", "%PDF"),
                ("hess1dd/hess1ps.pdf", "%PDF"),
            ],
        );

        let mut book = book();
        let downloaded = book.download(dir.path(), None).unwrap().to_path_buf();
        assert_eq!(downloaded, std::fs::canonicalize(&archive).unwrap());

        let extract_dir = book.unzip(&dir.path().join("data")).unwrap().to_path_buf();
        assert!(extract_dir.ends_with("data/class_9_History"));

        let engine = FixedEngine::new("Akbar ruled\nlong.\n\nHe built forts.");
        let count = book.make_chapters(&engine, &LayoutParams::default()).unwrap();
        assert_eq!(count, 2);
        let numbers: Vec<u32> = book.chapters().iter().map(|c| c.number()).collect();
        assert_eq!(numbers, vec![1, 2]);

        let err = book.resolve_coreference(&HeuristicCoref::new()).unwrap_err();
        assert!(matches!(err, TextbookError::MissingCleanText { chapter: 1 }));
        assert!(book.chapters().iter().all(|c| c.resolved_text().is_none()));

        book.improve_sentence_boundaries(&RuleSegmenter::english(), false).unwrap();
        book.resolve_coreference(&HeuristicCoref::new()).unwrap();

        for chapter in book.chapters() {
            assert_eq!(chapter.stage(), ChapterStage::Resolved);
            assert_eq!(chapter.resolved_text(), Some("Akbar ruled long.\nAkbar built forts."));
        }
    }

    #[test]
    fn test_partial_normalization_blocks_resolution_of_all() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("book.zip");
        write_zip(&archive, &[("b/ch01.pdf", "%PDF"), ("b/ch02.pdf", "%PDF")]);

        let mut book = book();
        book.set_archive_path(archive).unwrap();
        book.unzip(dir.path()).unwrap();
        book.make_chapters(&FixedEngine::new("Akbar ruled. He won."), &LayoutParams::default())
            .unwrap();
        book.chapters_mut()[0]
            .normalize(&RuleSegmenter::english(), false)
            .unwrap();

        let err = book.resolve_coreference(&HeuristicCoref::new()).unwrap_err();
        assert!(matches!(err, TextbookError::MissingCleanText { chapter: 2 }));
        assert!(book.chapters()[0].resolved_text().is_none());
    }

    #[test]
    fn test_scanned_chapter_reports_empty_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("scan.zip");
        write_zip(&archive, &[("s/scan01.pdf", "%PDF")]);

        let mut book = book();
        book.set_archive_path(archive).unwrap();
        book.unzip(dir.path()).unwrap();
        book.make_chapters(&FixedEngine::new("\x0C \x0C"), &LayoutParams::default())
            .unwrap();
        book.improve_sentence_boundaries(&RuleSegmenter::english(), false)
            .unwrap();

        let err = book.resolve_coreference(&HeuristicCoref::new()).unwrap_err();
        assert!(matches!(err, TextbookError::EmptyExtraction { chapter: 1 }));
        assert_eq!(book.chapters()[0].stage(), ChapterStage::Clean);
    }
}
