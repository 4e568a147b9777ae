// Library exports for use in scripts and other binaries

pub mod book;
pub mod config;
pub mod coref;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use book::{Book, BookMeta, Chapter, ChapterStage};
pub use config::PipelineConfig;
pub use error::{Result, TextbookError};
pub use pipeline::{Pipeline, RunSummary};
