// src/line.rs
//
// Line source + cursor. Only one line is held at a time; sub-scanners that
// need to read past its end pull the next line into the same buffer.

use std::io::{BufRead, Read};

use tracing::trace;

use crate::error::{Error, Result, ScanError};

/// Default bound on the length of one input line, newline included.
pub const DEFAULT_MAX_LINE: usize = 4096;

pub struct LineSource<R> {
    reader: R,
    line: Vec<u8>,
    pos: usize,
    lineno: usize,
    generation: u64,
    max_line: usize,
    exhausted: bool,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, max_line: usize) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(max_line.min(DEFAULT_MAX_LINE)),
            pos: 0,
            lineno: 0,
            generation: 0,
            max_line,
            exhausted: false,
        }
    }

    /// Replace the current line with the next one from the reader.
    /// Returns `false` once the input is exhausted.
    pub fn next_line(&mut self) -> Result<bool> {
        debug_assert!(self.at_eol());
        self.line.clear();
        self.pos = 0;
        if self.exhausted {
            return Ok(false);
        }
        if self.max_line == 0 {
            return Err(Error::Scan {
                kind: ScanError::LineTooLong { limit: 0 },
                line: self.lineno + 1,
            });
        }

        // Never buffer more than `max_line` bytes; hitting the bound is fatal.
        let limit = self.max_line as u64;
        let n = self.reader.by_ref().take(limit).read_until(b'\n', &mut self.line)?;
        if n == 0 {
            self.exhausted = true;
            return Ok(false);
        }
        self.lineno += 1;
        if n >= self.max_line {
            self.line.clear();
            return Err(Error::Scan {
                kind: ScanError::LineTooLong { limit: self.max_line },
                line: self.lineno,
            });
        }
        self.generation = self.generation.wrapping_add(1);
        trace!(line = self.lineno, len = n, "read line");
        Ok(true)
    }

    /// Next byte, pulling a fresh line at the end of the current one.
    /// `None` means end of input.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.at_eol() && !self.next_line()? {
            return Ok(None);
        }
        let b = self.line[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    #[inline]
    pub fn at_eol(&self) -> bool {
        self.pos == self.line.len()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn line(&self) -> &[u8] {
        &self.line
    }

    /// Bytes left on the current line.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.line.len() - self.pos
    }

    /// Move the cursor forward on the current line.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.pos += n;
    }

    pub fn line_number(&self) -> usize {
        self.lineno
    }

    /// Changes every time a new line is loaded.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str, max: usize) -> LineSource<&[u8]> {
        LineSource::new(text.as_bytes(), max)
    }

    #[test]
    fn reads_lines_and_counts_them() {
        let mut src = source("ab\ncd", 64);
        assert_eq!(src.line_number(), 0);
        assert!(src.next_line().unwrap());
        assert_eq!(src.line(), b"ab\n");
        assert_eq!(src.line_number(), 1);
        src.advance(3);
        assert!(src.next_line().unwrap());
        assert_eq!(src.line(), b"cd");
        src.advance(2);
        assert!(!src.next_line().unwrap());
        assert!(!src.next_line().unwrap());
        assert_eq!(src.line_number(), 2);
    }

    #[test]
    fn read_byte_crosses_line_boundaries() {
        let mut src = source("a\nb\n", 64);
        let mut seen = Vec::new();
        while let Some(b) = src.read_byte().unwrap() {
            seen.push(b);
        }
        assert_eq!(seen, b"a\nb\n");
        assert_eq!(src.line_number(), 2);
    }

    #[test]
    fn generation_changes_per_line() {
        let mut src = source("x\ny\n", 64);
        src.next_line().unwrap();
        let first = src.generation();
        src.advance(2);
        src.next_line().unwrap();
        assert_ne!(first, src.generation());
    }

    #[test]
    fn overlong_line_is_fatal() {
        let mut src = source("short\nthis line is too long\n", 8);
        assert!(src.next_line().unwrap());
        src.advance(src.remaining());
        let err = src.next_line().unwrap_err();
        assert_eq!(err.scan_kind(), Some(&ScanError::LineTooLong { limit: 8 }));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn zero_bound_is_fatal() {
        let mut src = source("x\n", 0);
        let err = src.next_line().unwrap_err();
        assert_eq!(err.scan_kind(), Some(&ScanError::LineTooLong { limit: 0 }));
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn line_one_below_the_bound_is_accepted() {
        let mut src = source("1234567\n", 9);
        assert!(src.next_line().unwrap());
        assert_eq!(src.remaining(), 8);
    }
}
