use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{info, warn};
use zip::ZipArchive;

/// Folder an archive for `grade`/`subject` is extracted into, e.g. `class_9_History`.
pub fn extraction_dir_name(grade: u8, subject: &str) -> String {
    format!("class_{}_{}", grade, subject)
}

/// Extract every entry of the zip file at `archive` below `dest`.
///
/// Entries whose names would escape `dest` are skipped. Existing files are
/// overwritten. Returns the number of files written.
pub fn unzip_archive(archive: &Path, dest: &Path) -> crate::Result<usize> {
    info!("Extracting {:?} into {:?}", archive, dest);

    fs::create_dir_all(dest)?;
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(path) => dest.join(path),
            None => {
                warn!("Skipping unsafe archive entry: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;
        written += 1;
    }

    info!("Extracted {} files", written);
    Ok(written)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extraction_dir_name() {
        assert_eq!(extraction_dir_name(9, "History"), "class_9_History");
    }

    #[test]
    fn test_unzip_creates_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("book.zip");
        write_zip(
            &archive,
            &[
                ("hess1dd/", ""),
                ("hess1dd/hess101.pdf", "one"),
                ("hess1dd/hess102.pdf", "two"),
            ],
        );

        let dest = dir.path().join("out/class_9_History");
        let written = unzip_archive(&archive, &dest).unwrap();

        assert_eq!(written, 2);
        assert_eq!(fs::read_to_string(dest.join("hess1dd/hess102.pdf")).unwrap(), "two");
    }

    #[test]
    fn test_unzip_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("book.zip");
        fs::write(&archive, b"this is not a zip").unwrap();

        let err = unzip_archive(&archive, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, crate::TextbookError::Zip(_)));
    }
}
