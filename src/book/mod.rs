mod chapter;
mod textbook;

pub use chapter::{Chapter, ChapterStage};
pub use textbook::{Book, BookMeta};
