pub(crate) mod archive;
mod download;

pub use archive::{extraction_dir_name, unzip_archive};
pub use download::{archive_file_name, download_archive};
