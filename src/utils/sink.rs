use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TextbookError};

/// Destination for extracted or processed text.
///
/// `write` appends text, `flush` pushes buffered text to the backing store and
/// `close` flushes once more and releases it. Writing to a closed sink fails
/// with [`TextbookError::SinkClosed`]; closing twice is a no-op.
pub trait TextSink {
    fn write_text(&mut self, text: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// In-memory sink, used to collect a whole document before it is stored on a chapter.
#[derive(Debug, Default)]
pub struct StringSink {
    buffer: String,
    closed: bool,
}

impl StringSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl TextSink for StringSink {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if self.closed {
            return Err(TextbookError::SinkClosed);
        }
        self.buffer.push_str(text);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Err(TextbookError::SinkClosed);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Buffered file sink.
pub struct FileSink {
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
        })
    }
}

impl TextSink for FileSink {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(TextbookError::SinkClosed)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(TextbookError::SinkClosed)?;
        writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
