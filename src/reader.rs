use std::io::{self, Read};

use memchr::memchr;

/// Default size of the reader's internal buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

/// Yields lines as slices into an internal buffer.
///
/// The returned line excludes its `\n`. Only a trailing partial line is
/// ever copied, when it is moved to the front of the buffer before a refill;
/// a line longer than the whole buffer doubles the buffer.
pub struct StreamReader<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
    line_number: u64,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buf: vec![0; capacity.max(1)],
            start: 0,
            end: 0,
            eof: false,
            line_number: 0,
        }
    }

    /// 1-based index of the line most recently returned by [`Self::next_line`].
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the next line, or `None` once the input is exhausted.
    pub fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            if let Some(pos) = memchr(b'\n', &self.buf[self.start..self.end]) {
                let line_start = self.start;
                self.start += pos + 1;
                self.line_number += 1;
                return Ok(Some(&self.buf[line_start..line_start + pos]));
            }
            if self.eof {
                if self.start == self.end {
                    return Ok(None);
                }
                // last line without a terminator
                let line_start = self.start;
                self.start = self.end;
                self.line_number += 1;
                return Ok(Some(&self.buf[line_start..self.end]));
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.end == self.buf.len() {
            let grown = self.buf.len() * 2;
            self.buf.resize(grown, 0);
        }
        loop {
            match self.inner.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
