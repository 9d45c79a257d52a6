//! Append-only line sink for exported entries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Newline-terminated line writer with a running count
///
/// The pagination engine is the only writer, so lines land in the order the
/// engine appends them. Any write failure is reported as [`Error::Sink`] naming
/// the destination.
pub struct LineSink<W: Write> {
    writer: W,
    destination: PathBuf,
    lines_written: u64,
}

impl LineSink<BufWriter<File>> {
    /// Create (or truncate) `path` and write to it through a buffer
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Sink {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> LineSink<W> {
    /// Wrap an arbitrary writer; `destination` is only used in error messages
    pub fn new(writer: W, destination: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            destination: destination.into(),
            lines_written: 0,
        }
    }

    /// Append one line
    pub fn append(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}").map_err(|source| self.sink_error(source))?;
        self.lines_written += 1;
        Ok(())
    }

    /// Lines accepted so far
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Where the lines are going
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Borrow the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Signal end of stream: flush everything and return the final line count
    pub fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .map_err(|source| self.sink_error(source))?;
        Ok(self.lines_written)
    }

    fn sink_error(&self, source: std::io::Error) -> Error {
        Error::Sink {
            path: self.destination.clone(),
            source,
        }
    }
}
