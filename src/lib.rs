//! `chtml` turns an HTML template with embedded C/C++ fragments into one C/C++
//! translation unit.
//!
//! Literal markup becomes calls to a print routine, `<? ... ?>` blocks are
//! copied through verbatim, and `<?= expr ?>` / `<?% fmt, args ?>` become calls
//! to the print / printf-style routine.
//!
//! ```text
//! Hello <?= name ?>!
//! ```
//!
//! becomes (region comments omitted)
//!
//! ```text
//! print("Hello ");
//! print( name );
//! print("!\n");
//! ```
//!
//! The input is processed one line at a time. Quoted strings and comments in
//! host code, inline `<script>`/`<style>` bodies and tag attributes are
//! skipped over so that delimiters inside them do not end a region early.

use std::io::{BufRead, Write};

use chrono::{DateTime, Local};

pub use error::{Construct, Error, Region, Result, ScanError};
pub use options::{is_identifier, Header, Options};
pub use scanner::Scanner;

pub mod error;
pub mod line;
pub mod literal;
pub mod matcher;
pub mod options;
mod scanner;

/// Transpile `input` into `out`, header stamped with the current time.
pub fn transpile<R: BufRead, W: Write>(input: R, out: &mut W, options: &Options) -> Result<()> {
    transpile_at(input, out, options, Local::now())
}

/// Like [`transpile`], with an explicit time for the default header.
pub fn transpile_at<R: BufRead, W: Write>(
    input: R,
    out: &mut W,
    options: &Options,
    now: DateTime<Local>,
) -> Result<()> {
    options.write_preamble(out, now)?;
    Scanner::new(input, &mut *out, options).run()?;
    options.write_postamble(out)?;
    Ok(())
}
