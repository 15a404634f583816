// src/options.rs
//
// What the command line contributes to the transpiler, and the fixed text
// that surrounds the transcoded body.

use std::io::{self, Write};

use chrono::{DateTime, Local};

use crate::line::DEFAULT_MAX_LINE;

pub const DEFAULT_PRINT: &str = "print";
pub const DEFAULT_PRINTF: &str = "printf";

const PRINT_DEFINE: &str = "#include <stdio.h>\n#define print(x) fputs(x, stdout)\n\n";
const PRINTF_DEFINE: &str = "#include <stdio.h>\n\n";
const MAIN_START: &str = "int main(void) {\n";
const MAIN_STOP: &str = "\nreturn 0; } /* end main function */\n";
const CONTENT_TYPE_HTML: &str = "Content-Type: text/html; charset=utf-8";

/// Leading comment of the generated file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Header {
    /// "Generated by ..." with the current local time.
    #[default]
    Timestamp,
    Custom(String),
    Omit,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Overrides the print routine; `None` keeps `print` and defines it.
    pub print_fn: Option<String>,
    /// Overrides the formatted print routine.
    pub printf_fn: Option<String>,
    /// Emit BEGIN/END comments around host-code regions.
    pub region_comments: bool,
    pub header: Header,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    /// Wrap the body in a boilerplate `main`.
    pub main_wrapper: bool,
    /// Print an HTTP content-type header first.
    pub content_type: bool,
    /// Longest accepted input line, newline included.
    pub max_line: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            print_fn: None,
            printf_fn: None,
            region_comments: true,
            header: Header::Timestamp,
            prefix: None,
            suffix: None,
            main_wrapper: false,
            content_type: false,
            max_line: DEFAULT_MAX_LINE,
        }
    }
}

impl Options {
    pub fn print_name(&self) -> &str {
        self.print_fn.as_deref().unwrap_or(DEFAULT_PRINT)
    }

    pub fn printf_name(&self) -> &str {
        self.printf_fn.as_deref().unwrap_or(DEFAULT_PRINTF)
    }

    /// Everything that precedes the body.
    pub fn write_preamble<W: Write>(&self, out: &mut W, now: DateTime<Local>) -> io::Result<()> {
        match &self.header {
            Header::Timestamp => write!(
                out,
                "/*\n *\tGenerated by chtml (do not edit)\n *\t{}\n */\n\n",
                now.format("%a %b %d %H:%M:%S %Z %Y")
            )?,
            Header::Custom(text) if !text.is_empty() => write!(out, "/*\n{text}\n*/\n")?,
            Header::Custom(_) | Header::Omit => {}
        }
        if self.print_fn.is_none() {
            out.write_all(PRINT_DEFINE.as_bytes())?;
        } else if self.printf_fn.is_none() {
            out.write_all(PRINTF_DEFINE.as_bytes())?;
        }
        if let Some(prefix) = self.prefix.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "{prefix}")?;
        }
        if self.main_wrapper {
            out.write_all(MAIN_START.as_bytes())?;
        }
        if self.content_type {
            writeln!(out, "{}(\"{CONTENT_TYPE_HTML}\\n\\n\");", self.print_name())?;
        }
        Ok(())
    }

    /// Everything that follows the body.
    pub fn write_postamble<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.main_wrapper {
            out.write_all(MAIN_STOP.as_bytes())?;
        }
        if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "{suffix}")?;
        }
        Ok(())
    }
}

/* ============================ Identifier check ========================== */

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'_' | b':' | b'.' | b'-' | b'<' | b'>')
}

/// Accepts C identifiers and C++-ish qualified names (`ms.input`, `std::puts`).
pub fn is_identifier(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.split_first() {
        Some((&first, rest)) => {
            is_ident_start(first) && rest.iter().all(|&b| is_ident_start(b) || b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;
    use similar_asserts::assert_eq;

    use super::*;

    fn preamble(options: &Options) -> String {
        let now = Local.with_ymd_and_hms(2020, 3, 15, 9, 30, 0).unwrap();
        let mut out = Vec::new();
        options.write_preamble(&mut out, now).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[rstest]
    #[case::plain("print")]
    #[case::member("ms.input")]
    #[case::qualified("std::puts")]
    #[case::template("out<char>")]
    #[case::digits("emit2")]
    fn accepts_identifiers(#[case] id: &str) {
        assert!(is_identifier(id));
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_digit("2print")]
    #[case::space("my print")]
    #[case::call("print()")]
    fn rejects_non_identifiers(#[case] id: &str) {
        assert!(!is_identifier(id));
    }

    #[test]
    fn default_preamble_defines_print() {
        let text = preamble(&Options::default());
        assert!(text.starts_with("/*\n *\tGenerated by chtml (do not edit)\n *\tSun Mar 15 09:30:00 "));
        assert!(text.ends_with(" 2020\n */\n\n#include <stdio.h>\n#define print(x) fputs(x, stdout)\n\n"));
    }

    #[test]
    fn custom_header_and_overrides() {
        let options = Options {
            header: Header::Custom("hello".into()),
            print_fn: Some("emit".into()),
            prefix: Some("void page(void) {".into()),
            content_type: true,
            main_wrapper: true,
            ..Options::default()
        };
        assert_eq!(
            preamble(&options),
            "/*\nhello\n*/\n#include <stdio.h>\n\nvoid page(void) {\nint main(void) {\n\
             emit(\"Content-Type: text/html; charset=utf-8\\n\\n\");\n"
        );
    }

    #[test]
    fn empty_custom_header_is_omitted() {
        let options = Options {
            header: Header::Custom(String::new()),
            print_fn: Some("a".into()),
            printf_fn: Some("b".into()),
            prefix: Some(String::new()),
            ..Options::default()
        };
        assert_eq!(preamble(&options), "");
    }

    #[test]
    fn postamble_closes_main_and_appends_suffix() {
        let options = Options { main_wrapper: true, suffix: Some("/* eof */".into()), ..Options::default() };
        let mut out = Vec::new();
        options.write_postamble(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nreturn 0; } /* end main function */\n/* eof */\n"
        );
    }
}
