//! Raw book input in JSON Lines form, one scraped item per line.

use std::io::BufRead;

use bookscrape_core::RawBook;

use crate::error::SourceError;

/// Iterates raw books from a JSON Lines reader, skipping blank lines.
///
/// A line that is not a valid raw book, including one that is not valid
/// UTF-8, yields [`SourceError::Decode`] and iteration continues with the
/// next line. [`SourceError::Io`] is reserved for failures of the reader.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Result<RawBook, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(SourceError::Io(e))),
            }
            self.line += 1;
            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let line = self.line;
            return Some(
                serde_json::from_slice(&self.buf)
                    .map_err(|source| SourceError::Decode { line, source }),
            );
        }
    }
}
