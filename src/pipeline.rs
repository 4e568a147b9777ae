use tracing::info;

use crate::book::{Book, ChapterStage};
use crate::config::{BookConfig, PipelineConfig};
use crate::coref::{CorefEngine, HeuristicCoref};
use crate::error::Result;
use crate::export::write_book;
use crate::utils::pdf_parser::{LayoutParams, PdfExtractEngine, PdfTextEngine};
use crate::utils::sentence::{RuleSegmenter, SentenceSegmenter};

/// Books processed by one pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub books: Vec<Book>,
}

impl RunSummary {
    pub fn chapter_count(&self) -> usize {
        self.books.iter().map(|b| b.chapters().len()).sum()
    }

    pub fn resolved_count(&self) -> usize {
        self.books
            .iter()
            .flat_map(|b| b.chapters())
            .filter(|c| c.stage() == ChapterStage::Resolved)
            .count()
    }
}

/// Runs download, unzip, extraction, normalization and optional coreference
/// resolution for every configured book, one after another.
pub struct Pipeline {
    config: PipelineConfig,
    pdf_engine: Box<dyn PdfTextEngine>,
    segmenter: Box<dyn SentenceSegmenter>,
    coref_engine: Option<Box<dyn CorefEngine>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let coref_engine: Option<Box<dyn CorefEngine>> = if config.coref.enabled {
            Some(Box::new(HeuristicCoref::new()))
        } else {
            None
        };
        Self {
            config,
            pdf_engine: Box::new(PdfExtractEngine),
            segmenter: Box::new(RuleSegmenter::english()),
            coref_engine,
        }
    }

    pub fn with_pdf_engine(mut self, engine: Box<dyn PdfTextEngine>) -> Self {
        self.pdf_engine = engine;
        self
    }

    pub fn with_segmenter(mut self, segmenter: Box<dyn SentenceSegmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Replaces the coreference engine; it only runs when enabled in the config.
    pub fn with_coref_engine(mut self, engine: Box<dyn CorefEngine>) -> Self {
        if self.config.coref.enabled {
            self.coref_engine = Some(engine);
        }
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Download and unzip one book without extracting any text.
    pub fn fetch_book(&self, book_config: &BookConfig) -> Result<Book> {
        let mut book = Book::from_config(book_config)?;
        book.download(&self.config.data_dir, book_config.file_name.as_deref())?;
        book.unzip(&self.config.extract_to)?;
        Ok(book)
    }

    pub fn process_book(&self, book_config: &BookConfig) -> Result<Book> {
        info!("Processing book {} (class {} {})", book_config.id, book_config.grade, book_config.subject);

        let mut book = self.fetch_book(book_config)?;

        let params = LayoutParams {
            line_margin: self.config.layout.line_margin,
        };
        book.make_chapters(self.pdf_engine.as_ref(), &params)?;
        book.improve_sentence_boundaries(
            self.segmenter.as_ref(),
            self.config.normalize.disable_sentence_split,
        )?;

        if let Some(engine) = &self.coref_engine {
            book.resolve_coreference(engine.as_ref())?;
        }

        if let Some(output_dir) = &self.config.output_dir {
            write_book(&book, output_dir)?;
        }

        Ok(book)
    }

    pub fn run(&self) -> Result<RunSummary> {
        let mut books = Vec::with_capacity(self.config.books.len());
        for (idx, book_config) in self.config.books.iter().enumerate() {
            info!("Book {}/{}", idx + 1, self.config.books.len());
            books.push(self.process_book(book_config)?);
        }

        let summary = RunSummary { books };
        info!(
            "Pipeline finished: {} books, {} chapters, {} resolved",
            summary.books.len(),
            summary.chapter_count(),
            summary.resolved_count()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::archive::tests::write_zip;
    use crate::utils::pdf_parser::tests::FixedEngine;
    use std::fs;
    use std::path::Path;

    fn config(root: &Path, coref: bool) -> PipelineConfig {
        serde_json::from_value(serde_json::json!({
            "data_dir": root.join("downloads"),
            "extract_to": root.join("data"),
            "output_dir": root.join("out"),
            "coref": { "enabled": coref },
            "books": [{
                "id": 7,
                "grade": 9,
                "url": "http://127.0.0.1:9/hess1dd.zip",
                "file_name": "history9.zip"
            }]
        }))
        .unwrap()
    }

    fn seed_archive(root: &Path) {
        fs::create_dir_all(root.join("downloads")).unwrap();
        write_zip(
            &root.join("downloads/history9.zip"),
            &[
                ("hess1dd/hess101.pdf", "%PDF"),
                ("hess1dd/hess102.pdf", "%PDF"),
                ("hess1dd/hess1an.pdf", "%PDF"),
            ],
        );
    }

    #[test]
    fn test_run_with_coreference() {
        let dir = tempfile::tempdir().unwrap();
        seed_archive(dir.path());

        let pipeline = Pipeline::new(config(dir.path(), true))
            .with_pdf_engine(Box::new(FixedEngine::new("Ashoka ruled\nMagadha.\n\nHe embraced peace.")));
        let summary = pipeline.run().unwrap();

        assert_eq!(summary.books.len(), 1);
        assert_eq!(summary.chapter_count(), 2);
        assert_eq!(summary.resolved_count(), 2);

        let chapter = &summary.books[0].chapters()[0];
        assert_eq!(chapter.clean_text(), Some("Ashoka ruled Magadha.\nHe embraced peace."));
        assert_eq!(chapter.resolved_text(), Some("Ashoka ruled Magadha.\nAshoka embraced peace."));

        let out = dir.path().join("out/7");
        assert!(out.join("chapter_02.resolved.txt").exists());
        assert!(out.join("book.json").exists());
        assert!(dir.path().join("data/class_9_History/hess1dd/hess101.pdf").exists());
    }

    #[test]
    fn test_run_without_coreference_stops_at_clean() {
        let dir = tempfile::tempdir().unwrap();
        seed_archive(dir.path());

        let mut cfg = config(dir.path(), false);
        cfg.normalize.disable_sentence_split = true;
        let pipeline = Pipeline::new(cfg)
            .with_pdf_engine(Box::new(FixedEngine::new("One.\nTwo.\n\nThree.")))
            .with_coref_engine(Box::new(HeuristicCoref::new()));
        let summary = pipeline.run().unwrap();

        assert_eq!(summary.resolved_count(), 0);
        assert_eq!(summary.books[0].chapters()[1].clean_text(), Some("One. Two.\nThree."));
    }

    #[test]
    fn test_failed_download_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(config(dir.path(), false))
            .with_pdf_engine(Box::new(FixedEngine::new("unused")));

        assert!(pipeline.run().is_err());
        assert!(!dir.path().join("data").exists());
    }
}
