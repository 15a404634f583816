// src/scanner.rs
//
// Region state machine + sub-scanners + driver loop.
//
// - Markup, inline script/style and tag bodies are buffered and later flushed
//   as print calls. Host code is copied through untouched.
// - The driver asks the matcher for the nearest pattern of the current region,
//   hands the bytes before it to the region's fallback, then runs the hook.
// - Sub-scanners read byte by byte and may pull further lines; each returns
//   only at its terminator. End of input inside one is fatal.

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::error::{Construct, Error, Region, Result, ScanError};
use crate::line::LineSource;
use crate::literal::{Flush, LiteralBuffer};
use crate::matcher::{Hook, MatchCache, Pattern};
use crate::options::Options;

/// Where bytes of a region go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sink {
    /// Straight to the output (host code).
    Output,
    /// Into the literal buffer (markup and friends).
    Literal,
}

impl Region {
    fn sink(self) -> Sink {
        match self {
            Region::Code => Sink::Output,
            Region::Markup | Region::Script | Region::Style | Region::Tag => Sink::Literal,
        }
    }
}

struct Emitter<W> {
    out: W,
    literal: LiteralBuffer,
}

impl<W: Write> Emitter<W> {
    #[inline]
    fn emit(&mut self, sink: Sink, bytes: &[u8]) -> io::Result<()> {
        match sink {
            Sink::Output => self.out.write_all(bytes),
            Sink::Literal => {
                self.literal.append(bytes);
                Ok(())
            }
        }
    }

    #[inline]
    fn put(&mut self, sink: Sink, b: u8) -> io::Result<()> {
        match sink {
            Sink::Output => self.out.write_all(&[b]),
            Sink::Literal => {
                self.literal.push(b);
                Ok(())
            }
        }
    }
}

/// One document's worth of scanning state.
pub struct Scanner<'a, R, W> {
    source: LineSource<R>,
    emitter: Emitter<W>,
    cache: MatchCache,
    region: Region,
    options: &'a Options,
}

impl<'a, R: BufRead, W: Write> Scanner<'a, R, W> {
    pub fn new(input: R, out: W, options: &'a Options) -> Self {
        Self {
            source: LineSource::new(input, options.max_line),
            emitter: Emitter { out, literal: LiteralBuffer::new() },
            cache: MatchCache::new(),
            region: Region::Markup,
            options,
        }
    }

    /// Transcode the whole input. On error, pending literal text is still
    /// written out before the error is returned.
    pub fn run(mut self) -> Result<()> {
        if let Err(err) = self.drive() {
            if let Err(flush_err) = self.flush_literal(Flush::Full) {
                debug!(%flush_err, "pending literal lost");
            }
            return Err(err);
        }
        if self.region != Region::Markup {
            warn!(region = %self.region, line = self.source.line_number(), "input ended inside {}", self.region);
        }
        self.flush_literal(Flush::EndOfInput)?;
        Ok(())
    }

    /* ============================== Driver ============================== */

    fn drive(&mut self) -> Result<()> {
        while self.source.next_line()? {
            while let Some(m) = self.cache.next_match(
                self.region,
                self.source.line(),
                self.source.pos(),
                self.source.generation(),
            ) {
                if m.at > self.source.pos() {
                    self.fallback(m.at - self.source.pos())?;
                }
                self.on_match(m.pattern)?;
                if self.source.at_eol() {
                    break;
                }
            }
            if !self.source.at_eol() {
                self.fallback(self.source.remaining())?;
            }
        }
        Ok(())
    }

    /// Unmatched bytes: buffered or copied, depending on the region.
    fn fallback(&mut self, n: usize) -> Result<()> {
        self.take(self.region.sink(), n)
    }

    /// Send the next `n` bytes of the current line to `sink`.
    fn take(&mut self, sink: Sink, n: usize) -> Result<()> {
        let start = self.source.pos();
        self.emitter.emit(sink, &self.source.line()[start..start + n])?;
        self.source.advance(n);
        Ok(())
    }

    fn on_match(&mut self, pattern: &'static Pattern) -> Result<()> {
        let line = self.source.line_number();
        let comments = self.options.region_comments;
        match pattern.hook {
            Hook::OpenCode => {
                self.flush_literal(Flush::Full)?;
                if comments {
                    writeln!(self.emitter.out, "/* BEGIN C (line {line}) */")?;
                }
                self.source.advance(pattern.len());
                self.switch(Region::Code);
            }
            Hook::CloseCode => {
                if comments {
                    write!(self.emitter.out, "/* END C (line {line}) */")?;
                }
                self.source.advance(pattern.len());
                self.switch(Region::Markup);
            }
            Hook::OpenPrint(construct) => {
                let label = if construct == Construct::PrintfArgs { "C%" } else { "C=" };
                self.flush_literal(Flush::Full)?;
                if comments {
                    writeln!(self.emitter.out, "/* BEGIN {label} (line {line}) */")?;
                }
                self.source.advance(pattern.len());
                self.eat(construct, Sink::Output)?;
                if comments {
                    let line = self.source.line_number();
                    write!(self.emitter.out, "\n/* END {label} (line {line}) */")?;
                }
            }
            Hook::Enter(region) => {
                self.take(Sink::Literal, pattern.len())?;
                self.switch(region);
            }
            Hook::Leave => {
                self.take(Sink::Literal, pattern.len())?;
                self.switch(Region::Markup);
            }
            Hook::Nested(construct) => {
                let sink = self.region.sink();
                self.take(sink, pattern.len())?;
                self.eat(construct, sink)?;
            }
            Hook::StrayTagStart => return Err(self.fatal(ScanError::StrayTagStart)),
            Hook::StrayTagEnd => return Err(self.fatal(ScanError::StrayTagEnd)),
        }
        Ok(())
    }

    fn switch(&mut self, to: Region) {
        debug!(line = self.source.line_number(), from = %self.region, %to, "region change");
        self.region = to;
    }

    fn flush_literal(&mut self, when: Flush) -> io::Result<()> {
        let Emitter { out, literal } = &mut self.emitter;
        literal.flush(out, self.options.print_name(), when)
    }

    fn fatal(&self, kind: ScanError) -> Error {
        Error::Scan { kind, line: self.source.line_number() }
    }

    /* =========================== Sub-scanners =========================== */

    /// Run the sub-scanner for `construct`; its opener has already been sent.
    fn eat(&mut self, construct: Construct, sink: Sink) -> Result<()> {
        let options = self.options;
        match construct {
            Construct::DoubleQuoted => self.eat_quoted(b'"', construct, sink),
            Construct::SingleQuoted => self.eat_quoted(b'\'', construct, sink),
            Construct::CharLiteral => self.eat_char_literal(sink),
            Construct::BlockComment => self.eat_block_comment(sink),
            Construct::LineComment => self.eat_line_comment(sink),
            Construct::Macro => self.eat_macro(sink),
            Construct::PrintArgs => self.eat_print(options.print_name(), construct),
            Construct::PrintfArgs => self.eat_print(options.printf_name(), construct),
            Construct::MarkupComment => self.eat_markup_comment(sink),
        }
    }

    fn next_byte(&mut self, construct: Construct, sink: Sink) -> Result<u8> {
        match self.source.read_byte()? {
            Some(b) => Ok(b),
            None => Err(self.fatal(ScanError::Unterminated { construct, region: self.region_of(sink) })),
        }
    }

    /// Region to name in diagnostics: anything copied through is host code.
    fn region_of(&self, sink: Sink) -> Region {
        match sink {
            Sink::Output => Region::Code,
            Sink::Literal => self.region,
        }
    }

    /// Quoted string up to the matching unescaped quote. A backslash escapes
    /// exactly one byte, so `"a\\"` ends at its last quote.
    fn eat_quoted(&mut self, quote: u8, construct: Construct, sink: Sink) -> Result<()> {
        let mut escaped = false;
        loop {
            let b = self.next_byte(construct, sink)?;
            if b == b'\n' {
                let region = self.region_of(sink);
                return Err(self.fatal(ScanError::NewlineInString { construct, region }));
            }
            self.emitter.put(sink, b)?;
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == quote {
                return Ok(());
            }
        }
    }

    /// `'x'` or `'\x'`, nothing else.
    fn eat_char_literal(&mut self, sink: Sink) -> Result<()> {
        let construct = Construct::CharLiteral;
        let b = self.next_byte(construct, sink)?;
        if b == b'\'' || b == b'\n' {
            return Err(self.fatal(ScanError::InvalidCharLiteral));
        }
        self.emitter.put(sink, b)?;
        if b == b'\\' {
            let escaped = self.next_byte(construct, sink)?;
            self.emitter.put(sink, escaped)?;
        }
        let close = self.next_byte(construct, sink)?;
        if close != b'\'' {
            return Err(self.fatal(ScanError::InvalidCharLiteral));
        }
        self.emitter.put(sink, close)?;
        Ok(())
    }

    fn eat_block_comment(&mut self, sink: Sink) -> Result<()> {
        let mut prev = 0u8;
        loop {
            let b = self.next_byte(Construct::BlockComment, sink)?;
            self.emitter.put(sink, b)?;
            if prev == b'*' && b == b'/' {
                return Ok(());
            }
            prev = b;
        }
    }

    fn eat_line_comment(&mut self, sink: Sink) -> Result<()> {
        loop {
            let b = self.next_byte(Construct::LineComment, sink)?;
            self.emitter.put(sink, b)?;
            if b == b'\n' {
                return Ok(());
            }
        }
    }

    /// Preprocessor line, continued by backslash-newline. A comment inside it
    /// ends the macro scan once the comment itself ends.
    fn eat_macro(&mut self, sink: Sink) -> Result<()> {
        let construct = Construct::Macro;
        let mut pending: Option<u8> = None;
        let (mut prev, mut prev2) = (0u8, 0u8);
        loop {
            let b = match pending.take() {
                Some(b) => b,
                None => self.next_byte(construct, sink)?,
            };
            match b {
                b'"' => {
                    self.emitter.put(sink, b)?;
                    self.eat_quoted(b'"', Construct::DoubleQuoted, sink)?;
                    (prev, prev2) = (0, 0);
                    continue;
                }
                b'\'' => {
                    self.emitter.put(sink, b)?;
                    self.eat_char_literal(sink)?;
                    (prev, prev2) = (0, 0);
                    continue;
                }
                b'/' => match self.next_byte(construct, sink)? {
                    b'*' => {
                        self.emitter.emit(sink, b"/*")?;
                        return self.eat_block_comment(sink);
                    }
                    b'/' => {
                        self.emitter.emit(sink, b"//")?;
                        return self.eat_line_comment(sink);
                    }
                    next => pending = Some(next),
                },
                _ => {}
            }
            self.emitter.put(sink, b)?;
            let continued = prev == b'\\' || (prev == b'\r' && prev2 == b'\\');
            if b == b'\n' && !continued {
                return Ok(());
            }
            (prev2, prev) = (prev, b);
        }
    }

    /// Body of `<?= ... ?>` / `<?% ... ?>`, wrapped in a call to `func`.
    fn eat_print(&mut self, func: &str, construct: Construct) -> Result<()> {
        let sink = Sink::Output;
        write!(self.emitter.out, "{func}(")?;
        let mut pending: Option<u8> = None;
        loop {
            let b = match pending.take() {
                Some(b) => b,
                None => self.next_byte(construct, sink)?,
            };
            match b {
                b'"' => {
                    self.emitter.put(sink, b)?;
                    self.eat_quoted(b'"', Construct::DoubleQuoted, sink)?;
                }
                b'\'' => {
                    self.emitter.put(sink, b)?;
                    self.eat_char_literal(sink)?;
                }
                b'?' => {
                    let next = self.next_byte(construct, sink)?;
                    if next == b'>' {
                        self.emitter.out.write_all(b");")?;
                        return Ok(());
                    }
                    self.emitter.put(sink, b)?;
                    pending = Some(next);
                }
                _ => self.emitter.put(sink, b)?,
            }
        }
    }

    /// `<!-- ... -->`, buffered as markup.
    fn eat_markup_comment(&mut self, sink: Sink) -> Result<()> {
        let (mut prev, mut prev2) = (0u8, 0u8);
        loop {
            let b = self.next_byte(Construct::MarkupComment, sink)?;
            self.emitter.put(sink, b)?;
            if b == b'>' && prev == b'-' && prev2 == b'-' {
                return Ok(());
            }
            (prev2, prev) = (prev, b);
        }
    }
}
