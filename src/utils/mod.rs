pub mod chapter_locator;
pub mod pdf_parser;
pub mod sentence;
pub mod sink;
pub mod text_processor;

pub use chapter_locator::{chapter_number, locate_chapter_files, ChapterFile};
pub use pdf_parser::{extract_text_from_pdf, LayoutParams, PdfContent, PdfExtractEngine, PdfTextEngine};
pub use sentence::{RuleSegmenter, SentenceSegmenter};
pub use sink::{FileSink, StringSink, TextSink};
pub use text_processor::{normalize_text, reflow_paragraphs};
