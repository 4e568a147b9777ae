use crate::error::Result;
use crate::utils::sentence::SentenceSegmenter;

/// Paragraphs extracted from PDFs are separated by a blank line.
const PARAGRAPH_BREAK: &str = "\n\n";

/// Split raw extracted text into paragraphs and undo line wrapping inside each one.
///
/// Whitespace-only paragraphs (runs of blank lines, page breaks) are dropped.
pub fn reflow_paragraphs(raw: &str) -> Vec<String> {
    raw.split(PARAGRAPH_BREAK)
        .map(|paragraph| paragraph.replace(['\n', '\x0C'], " ").trim().to_string())
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Reflow raw text into one paragraph per line, or one sentence per line
/// when sentence splitting is enabled.
///
/// Sentences never cross paragraph boundaries and keep their paragraph order.
pub fn normalize_text(
    raw: &str,
    segmenter: &dyn SentenceSegmenter,
    disable_sentence_split: bool,
) -> Result<String> {
    let paragraphs = reflow_paragraphs(raw);

    if disable_sentence_split {
        return Ok(paragraphs.join("\n"));
    }

    let mut lines = Vec::new();
    for paragraph in &paragraphs {
        lines.extend(segmenter.segment(paragraph)?);
    }
    Ok(lines.join("\n"))
}
