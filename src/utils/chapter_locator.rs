use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, TextbookError};

/// A chapter PDF found inside an extracted book archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub number: u32,
    pub path: PathBuf,
}

/// Chapter number encoded in the last two characters of the file stem,
/// e.g. `chapter_07.pdf` and `jess107.pdf` are both chapter 7.
pub fn chapter_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.get(stem.len().checked_sub(2)?..)?;
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Collect chapter PDFs from the immediate subfolders of `extract_dir`,
/// ordered by chapter number.
///
/// Files without a two-digit chapter suffix are skipped. Two files mapping to
/// the same chapter number are rejected.
pub fn locate_chapter_files(extract_dir: &Path) -> Result<Vec<ChapterFile>> {
    info!("Looking for chapter PDFs in: {:?}", extract_dir);

    let mut pdf_files = Vec::new();
    for entry in WalkDir::new(extract_dir).min_depth(2).max_depth(2) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .map(TextbookError::Io)
                .unwrap_or_else(|| TextbookError::InvalidChapterFile(extract_dir.to_path_buf()))
        })?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            pdf_files.push(entry.into_path());
        }
    }
    pdf_files.sort();

    let mut seen: HashMap<u32, PathBuf> = HashMap::new();
    let mut chapters = Vec::new();
    for path in pdf_files {
        let Some(number) = chapter_number(&path) else {
            debug!("Skipping non-chapter file: {:?}", path);
            continue;
        };
        if let Some(first) = seen.get(&number) {
            return Err(TextbookError::DuplicateChapter {
                number,
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(number, path.clone());
        chapters.push(ChapterFile { number, path });
    }
    chapters.sort_by_key(|chapter| chapter.number);

    info!("Found {} chapter files", chapters.len());
    Ok(chapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF-1.4").unwrap();
    }

    #[test]
    fn test_chapter_number() {
        assert_eq!(chapter_number(Path::new("chapter_07.pdf")), Some(7));
        assert_eq!(chapter_number(Path::new("book/jess110.pdf")), Some(10));
        assert_eq!(chapter_number(Path::new("appendix.pdf")), None);
        assert_eq!(chapter_number(Path::new("ch7.pdf")), None);
        assert_eq!(chapter_number(Path::new("7.pdf")), None);
        assert_eq!(chapter_number(Path::new("résumé_é9.pdf")), None);
    }

    #[test]
    fn test_keeps_only_numbered_pdfs_sorted_by_number() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("part_b/chapter_10.pdf"));
        touch(&root.join("part_a/chapter_07.pdf"));
        touch(&root.join("part_a/appendix.pdf"));
        touch(&root.join("part_a/chapter_02.PDF"));
        touch(&root.join("part_a/notes_03.txt"));
        touch(&root.join("top_level_01.pdf"));
        touch(&root.join("part_a/deeper/chapter_05.pdf"));

        let chapters = locate_chapter_files(root).unwrap();
        let numbers: Vec<u32> = chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![2, 7, 10]);
        assert!(chapters[1].path.ends_with("part_a/chapter_07.pdf"));
    }

    #[test]
    fn test_duplicate_chapter_numbers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a/chapter_01.pdf"));
        touch(&dir.path().join("b/intro01.pdf"));

        match locate_chapter_files(dir.path()) {
            Err(TextbookError::DuplicateChapter { number, first, second }) => {
                assert_eq!(number, 1);
                assert!(first.ends_with("a/chapter_01.pdf"));
                assert!(second.ends_with("b/intro01.pdf"));
            }
            other => panic!("expected duplicate chapter error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        assert!(locate_chapter_files(Path::new("/no/such/extract/dir")).is_err());
    }
}
