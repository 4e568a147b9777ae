use anyhow::anyhow;
use pdf_extract::{output_doc, Document, MediaBox, OutputDev, OutputError, Transform};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::utils::sink::{StringSink, TextSink};

/// Paragraph-break sensitivity used unless configured otherwise.
///
/// Lower values split a single paragraph into several text blocks, higher
/// values merge neighbouring paragraphs; 0.7 errs on the side of merging.
pub const DEFAULT_LINE_MARGIN: f32 = 0.7;

/// Layout analysis parameters handed to the PDF engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub line_margin: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            line_margin: DEFAULT_LINE_MARGIN,
        }
    }
}

/// Converts the bytes of a PDF document into plain text written to `sink`.
///
/// Pages are written in document order and separated by a form feed.
pub trait PdfTextEngine {
    fn convert(
        &self,
        pdf: &[u8],
        params: &LayoutParams,
        sink: &mut dyn TextSink,
    ) -> anyhow::Result<()>;
}

/// Engine backed by the `pdf-extract` crate.
///
/// Glyph positions come from pdf-extract's content-stream interpreter; the
/// line and paragraph decisions are made by [`MarginTextOutput`] so that
/// `line_margin` controls where paragraphs break.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractEngine;

impl PdfTextEngine for PdfExtractEngine {
    fn convert(
        &self,
        pdf: &[u8],
        params: &LayoutParams,
        sink: &mut dyn TextSink,
    ) -> anyhow::Result<()> {
        debug!("pdf-extract conversion with line_margin={}", params.line_margin);

        let mut doc = Document::load_mem(pdf).map_err(|e| anyhow!("pdf-extract failed: {}", e))?;
        if doc.is_encrypted() {
            doc.decrypt("")
                .map_err(|e| anyhow!("encrypted PDF could not be opened: {}", e))?;
        }

        let mut output = MarginTextOutput::new(params);
        output_doc(&doc, &mut output).map_err(|e| anyhow!("pdf-extract failed: {}", e))?;

        for page in output.into_pages() {
            sink.write_text(&page)?;
            sink.write_text("\x0C")?;
        }
        Ok(())
    }
}

/// Collects characters into per-page text.
///
/// A word whose baseline moves by more than half a line height starts a new
/// line. When the blank space between the two lines is wider than
/// `line_margin` line heights the new line also starts a new paragraph.
struct MarginTextOutput {
    line_margin: f64,
    pages: Vec<String>,
    current: String,
    first_char: bool,
    last_y: f64,
    last_end: f64,
}

impl MarginTextOutput {
    fn new(params: &LayoutParams) -> Self {
        Self {
            line_margin: f64::from(params.line_margin),
            pages: Vec::new(),
            current: String::new(),
            first_char: false,
            last_y: 0.0,
            last_end: 0.0,
        }
    }

    fn into_pages(self) -> Vec<String> {
        self.pages
    }
}

impl OutputDev for MarginTextOutput {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.current.clear();
        self.first_char = false;
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.pages.push(std::mem::take(&mut self.current));
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        ch: &str,
    ) -> std::result::Result<(), OutputError> {
        // Side of the square with the same area as the scaled glyph box.
        let line_height = font_size * (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
        let (x, y) = (trm.m31, trm.m32);

        if self.first_char && !self.current.is_empty() {
            let dy = (y - self.last_y).abs();
            if dy > line_height * 0.5 {
                let blank = dy - line_height;
                if blank > line_height * self.line_margin {
                    self.current.push_str("\n\n");
                } else {
                    self.current.push('\n');
                }
            } else if x > self.last_end + line_height * 0.1 {
                self.current.push(' ');
            }
        }

        self.current.push_str(ch);
        self.first_char = false;
        self.last_y = y;
        self.last_end = x + width * line_height;
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        self.first_char = true;
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}

/// Structured content from PDF
#[derive(Debug, Clone)]
pub struct PdfContent {
    pub text: String,
    pub pages: Vec<String>,
    pub has_text: bool,
}

/// Extract text from a PDF file
pub fn extract_text_from_pdf(
    path: &Path,
    engine: &dyn PdfTextEngine,
    params: &LayoutParams,
) -> Result<PdfContent> {
    info!("Extracting text from PDF: {:?}", path);

    let bytes = {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        bytes
    };

    let mut sink = StringSink::new();
    let converted = engine.convert(&bytes, params, &mut sink);
    sink.close()?;
    converted?;

    let text = sink.into_string();
    let has_text = !text.trim().is_empty();

    if !has_text {
        warn!("PDF appears to be scanned or has no extractable text: {:?}", path);
    }

    let pages: Vec<String> = text
        .trim_end_matches('\x0C')
        .split('\x0C')
        .map(|s| s.to_string())
        .collect();

    info!("Extracted {} pages from PDF", pages.len());

    Ok(PdfContent {
        text,
        pages,
        has_text,
    })
}
