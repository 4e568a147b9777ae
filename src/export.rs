use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::book::{Book, Chapter};
use crate::error::Result;
use crate::utils::sink::{FileSink, TextSink};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub number: u32,
    pub source: String,
    pub raw_characters: usize,
    pub clean_characters: Option<usize>,
    pub resolved_characters: Option<usize>,
    pub clusters: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: u32,
    pub subject: String,
    pub grade: u8,
    pub title: String,
    pub origin: String,
    pub url: String,
    pub chapters: Vec<ChapterSummary>,
}

impl BookSummary {
    pub fn from_book(book: &Book) -> Self {
        let meta = book.meta();
        Self {
            id: meta.id,
            subject: meta.subject.clone(),
            grade: meta.grade,
            title: meta.title.clone(),
            origin: meta.origin.clone(),
            url: meta.url.clone(),
            chapters: book.chapters().iter().map(summarize_chapter).collect(),
        }
    }
}

fn summarize_chapter(chapter: &Chapter) -> ChapterSummary {
    ChapterSummary {
        number: chapter.number(),
        source: chapter.file_path().display().to_string(),
        raw_characters: chapter.raw_text().chars().count(),
        clean_characters: chapter.clean_text().map(|t| t.chars().count()),
        resolved_characters: chapter.resolved_text().map(|t| t.chars().count()),
        clusters: chapter.coref_clusters().map(|c| c.len()),
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    let mut sink = FileSink::create(path)?;
    sink.write_text(text)?;
    sink.close()
}

/// Write every available chapter text and a `book.json` summary to
/// `output_dir/<book id>/`.
pub fn write_book(book: &Book, output_dir: &Path) -> Result<BookSummary> {
    let book_dir = output_dir.join(book.meta().id.to_string());
    fs::create_dir_all(&book_dir)?;

    for chapter in book.chapters() {
        let stem = format!("chapter_{:02}", chapter.number());
        write_text(&book_dir.join(format!("{}.raw.txt", stem)), chapter.raw_text())?;
        if let Some(clean) = chapter.clean_text() {
            write_text(&book_dir.join(format!("{}.clean.txt", stem)), clean)?;
        }
        if let Some(resolved) = chapter.resolved_text() {
            write_text(&book_dir.join(format!("{}.resolved.txt", stem)), resolved)?;
        }
    }

    let summary = BookSummary::from_book(book);
    let json = serde_json::to_string_pretty(&summary)?;
    write_text(&book_dir.join("book.json"), &json)?;

    info!(
        "Wrote {} chapters of book {} to {:?}",
        summary.chapters.len(),
        summary.id,
        book_dir
    );
    Ok(summary)
}
