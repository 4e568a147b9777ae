use std::path::{Path, PathBuf};

use crate::coref::{Cluster, CorefEngine};
use crate::error::{Result, TextbookError};
use crate::utils::chapter_locator::chapter_number;
use crate::utils::sentence::SentenceSegmenter;
use crate::utils::text_processor::normalize_text;

/// How far a chapter has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChapterStage {
    Raw,
    Clean,
    Resolved,
}

/// One chapter of a book and every text derived from it.
///
/// Raw text is fixed at construction. Clean text derives from raw text and
/// resolved text from clean text; replacing the clean text drops the
/// resolution made from the old one.
#[derive(Debug, Clone)]
pub struct Chapter {
    number: u32,
    file_path: PathBuf,
    raw_text: String,
    clean_text: Option<String>,
    resolved_text: Option<String>,
    coref_clusters: Option<Vec<Cluster>>,
}

impl Chapter {
    /// Fails unless `number` is the two-digit suffix of the file name.
    pub fn new(number: u32, file_path: PathBuf, raw_text: String) -> Result<Self> {
        if chapter_number(&file_path) != Some(number) {
            return Err(TextbookError::InvalidChapterFile(file_path));
        }
        Ok(Self {
            number,
            file_path,
            raw_text,
            clean_text: None,
            resolved_text: None,
            coref_clusters: None,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn clean_text(&self) -> Option<&str> {
        self.clean_text.as_deref()
    }

    pub fn resolved_text(&self) -> Option<&str> {
        self.resolved_text.as_deref()
    }

    pub fn coref_clusters(&self) -> Option<&[Cluster]> {
        self.coref_clusters.as_deref()
    }

    pub fn stage(&self) -> ChapterStage {
        if self.resolved_text.is_some() {
            ChapterStage::Resolved
        } else if self.clean_text.is_some() {
            ChapterStage::Clean
        } else {
            ChapterStage::Raw
        }
    }

    /// Reflow the raw text into clean text.
    pub fn normalize(
        &mut self,
        segmenter: &dyn SentenceSegmenter,
        disable_sentence_split: bool,
    ) -> Result<()> {
        let clean = normalize_text(&self.raw_text, segmenter, disable_sentence_split)?;
        self.set_clean_text(clean);
        Ok(())
    }

    /// Use hand-cleaned text instead of running the normalizer.
    pub fn set_clean_text(&mut self, clean: String) {
        self.clean_text = Some(clean);
        self.resolved_text = None;
        self.coref_clusters = None;
    }

    /// The clean text coreference resolution would run on.
    ///
    /// A chapter whose PDF produced only whitespace reports
    /// `EmptyExtraction` rather than asking for normalization again.
    pub fn resolvable_text(&self) -> Result<&str> {
        if self.raw_text.trim().is_empty() {
            return Err(TextbookError::EmptyExtraction {
                chapter: self.number,
            });
        }
        self.clean_text
            .as_deref()
            .filter(|text| !text.is_empty())
            .ok_or(TextbookError::MissingCleanText {
                chapter: self.number,
            })
    }

    /// Resolve coreferences in the clean text. Leaves the chapter untouched on failure.
    pub fn resolve(&mut self, engine: &dyn CorefEngine) -> Result<()> {
        let clean = self.resolvable_text()?;
        let output = engine.resolve(clean)?;
        self.resolved_text = Some(output.resolved);
        self.coref_clusters = Some(output.clusters);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coref::{CorefOutput, HeuristicCoref};
    use crate::utils::sentence::RuleSegmenter;

    fn chapter(raw: &str) -> Chapter {
        Chapter::new(7, PathBuf::from("book/chapter_07.pdf"), raw.to_string()).unwrap()
    }

    #[test]
    fn test_number_must_match_file_name() {
        assert!(Chapter::new(7, PathBuf::from("chapter_07.pdf"), String::new()).is_ok());
        assert!(matches!(
            Chapter::new(8, PathBuf::from("chapter_07.pdf"), String::new()),
            Err(TextbookError::InvalidChapterFile(_))
        ));
        assert!(Chapter::new(1, PathBuf::from("appendix.pdf"), String::new()).is_err());
    }

    #[test]
    fn test_stages_advance_in_order() {
        let mut ch = chapter("Akbar ruled long.\n\nHe built\nFatehpur Sikri.");
        assert_eq!(ch.stage(), ChapterStage::Raw);

        ch.normalize(&RuleSegmenter::english(), false).unwrap();
        assert_eq!(ch.stage(), ChapterStage::Clean);
        assert_eq!(ch.clean_text(), Some("Akbar ruled long.\nHe built Fatehpur Sikri."));

        ch.resolve(&HeuristicCoref::new()).unwrap();
        assert_eq!(ch.stage(), ChapterStage::Resolved);
        assert_eq!(ch.resolved_text(), Some("Akbar ruled long.\nAkbar built Fatehpur Sikri."));
        assert_eq!(ch.coref_clusters().map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_resolve_before_normalize_fails_without_mutation() {
        let mut ch = chapter("He built it.");
        let err = ch.resolve(&HeuristicCoref::new()).unwrap_err();

        assert!(matches!(err, TextbookError::MissingCleanText { chapter: 7 }));
        assert!(ch.resolved_text().is_none());
        assert!(ch.coref_clusters().is_none());
    }

    #[test]
    fn test_blank_extraction_is_reported_as_empty() {
        let mut ch = chapter(" \x0C\n ");
        ch.normalize(&RuleSegmenter::english(), false).unwrap();
        assert_eq!(ch.clean_text(), Some(""));

        let err = ch.resolve(&HeuristicCoref::new()).unwrap_err();
        assert!(matches!(err, TextbookError::EmptyExtraction { chapter: 7 }));
        assert!(err.to_string().contains("scanned"));
        assert_eq!(ch.stage(), ChapterStage::Clean);
    }

    #[test]
    fn test_renormalizing_drops_stale_resolution() {
        let mut ch = chapter("Akbar ruled. He built forts.");
        ch.normalize(&RuleSegmenter::english(), false).unwrap();
        ch.resolve(&HeuristicCoref::new()).unwrap();

        ch.normalize(&RuleSegmenter::english(), true).unwrap();
        assert_eq!(ch.stage(), ChapterStage::Clean);
        assert_eq!(ch.clean_text(), Some("Akbar ruled. He built forts."));
    }

    #[test]
    fn test_engine_failure_keeps_previous_state() {
        struct Down;
        impl CorefEngine for Down {
            fn resolve(&self, _: &str) -> anyhow::Result<CorefOutput> {
                anyhow::bail!("model not loaded")
            }
        }

        let mut ch = chapter("Text.");
        ch.set_clean_text("Text.".to_string());
        assert!(ch.resolve(&Down).is_err());
        assert_eq!(ch.stage(), ChapterStage::Clean);
    }
}
