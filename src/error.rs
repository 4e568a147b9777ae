use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TextbookError>;

#[derive(Debug, Error)]
pub enum TextbookError {
    /// Unzip was requested before any archive path was recorded on the book.
    #[error("archive not yet downloaded: download the file or set the archive path first")]
    ArchiveNotDownloaded,

    /// Chapters were requested before the archive was extracted.
    #[error("book has not been extracted yet: run unzip first")]
    NotExtracted,

    /// Coreference resolution needs normalized text to work on.
    #[error("chapter {chapter} has no clean text: run sentence normalization before coreference resolution")]
    MissingCleanText { chapter: u32 },

    /// The chapter PDF yielded no text at all, so there is nothing to resolve.
    #[error("chapter {chapter} has no extractable text (the PDF is probably scanned images)")]
    EmptyExtraction { chapter: u32 },

    #[error("chapter {number} appears twice: {first:?} and {second:?}")]
    DuplicateChapter {
        number: u32,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("file name does not end in a two-digit chapter number: {0:?}")]
    InvalidChapterFile(PathBuf),

    #[error("invalid book metadata: {0}")]
    InvalidMetadata(String),

    #[error("request to {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("text sink is closed")]
    SinkClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Failures raised inside text-extraction, segmentation or coreference engines.
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}
