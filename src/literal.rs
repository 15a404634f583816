// src/literal.rs
//
// Pending markup text. Flushing turns it into one print call whose string
// argument, once compiled and run, reproduces the text.
//
// - \ " CR TAB become two-char escapes.
// - BEL BS FF VT are dropped.
// - Each LF closes the string literal and reopens it on the next output line,
//   relying on adjacent string literal concatenation.

use std::io::{self, Write};

use tracing::debug;

/// When a flush happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flush {
    /// Emit whatever is pending.
    Full,
    /// End of input: whitespace-only content is discarded.
    EndOfInput,
}

#[derive(Debug, Default)]
pub struct LiteralBuffer {
    buf: Vec<u8>,
}

const PAGE: usize = 4096;

/// Whitespace as C's `isspace` sees it.
#[inline]
fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

impl LiteralBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(PAGE) }
    }

    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn push(&mut self, b: u8) {
        self.buf.push(b);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Emit the pending text as a `print_fn(...)` call and empty the buffer.
    pub fn flush<W: Write>(&mut self, out: &mut W, print_fn: &str, when: Flush) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        if when == Flush::EndOfInput && self.buf.iter().all(|&b| is_c_space(b)) {
            self.buf.clear();
            return Ok(());
        }
        debug!(bytes = self.buf.len(), ?when, "flush literal");
        let mut escaped = Vec::with_capacity(self.buf.len() + self.buf.len() / 8 + print_fn.len() + 8);
        write_print_call(&self.buf, print_fn, &mut escaped);
        self.buf.clear();
        out.write_all(&escaped)
    }
}

/// Render `text` as a complete print statement, preceded by a newline.
pub fn write_print_call(text: &[u8], print_fn: &str, out: &mut Vec<u8>) {
    out.push(b'\n');
    out.extend_from_slice(print_fn.as_bytes());
    out.extend_from_slice(b"(\"");
    let last = text.len().saturating_sub(1);
    for (i, &b) in text.iter().enumerate() {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'"' => out.extend_from_slice(b"\\\""),
            b'\n' if i < last => out.extend_from_slice(b"\\n\"\n\""),
            b'\n' => out.extend_from_slice(b"\\n\""),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x07 | 0x08 | 0x0b | 0x0c => {}
            _ => out.push(b),
        }
    }
    // A trailing LF already closed the string literal.
    if text.last() == Some(&b'\n') {
        out.extend_from_slice(b");\n");
    } else {
        out.extend_from_slice(b"\");\n");
    }
}
