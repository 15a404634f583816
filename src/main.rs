// src/main.rs
//
// chtml: HTML template to C/C++ source transpiler
//
// - Literal markup is turned into print(...) calls, escaped and split per line.
// - <? ... ?> blocks are copied through verbatim between BEGIN/END comments.
// - <?= expr ?> becomes print(expr); <?% fmt, args ?> becomes printf(fmt, args).
// - <script>, <style>, comments and tag attributes are scanned for quotes and
//   comments so that delimiters inside them do not end a region early.
//
// CLI flags:
//   --main          : wrap the body in a boilerplate main function
//   --html          : print a text/html content-type header first
//   -b              : omit begin/end comments
//   -c <header>     : custom header comment ("" disables it)
//   -a / -z <code>  : code to prepend / append
//   -p / -f <func>  : override print / printf routine names
// INPUT and OUTPUT default to stdin/stdout; "-" selects them explicitly.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chtml::{is_identifier, Header, Options};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

/// CLI flags
#[derive(Parser)]
#[command(author, version, about, disable_version_flag = true)]
struct Cli {
    /// Include boilerplate main function
    #[arg(long = "main", action = ArgAction::SetTrue)]
    main_wrapper: bool,

    /// Send content-type header (text/html, charset utf-8)
    #[arg(long, action = ArgAction::SetTrue)]
    html: bool,

    /// Omit begin/end comments in output
    #[arg(short = 'b', action = ArgAction::SetTrue)]
    no_comments: bool,

    /// Override the default comment header; an empty string disables it
    #[arg(short = 'c', value_name = "HEADER")]
    header: Option<String>,

    /// Code to prepend
    #[arg(short = 'a', value_name = "PREFIX")]
    prefix: Option<String>,

    /// Code to append
    #[arg(short = 'z', value_name = "SUFFIX")]
    suffix: Option<String>,

    /// Override function 'print(x)' (default: a macro for fputs(x, stdout))
    #[arg(short = 'p', value_name = "FUNC", value_parser = identifier)]
    print: Option<String>,

    /// Override function 'printf(x, ...)'
    #[arg(short = 'f', value_name = "FUNC", value_parser = identifier)]
    printf: Option<String>,

    /// Maximum length of one input line, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = chtml::line::DEFAULT_MAX_LINE,
          value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..))]
    max_line: usize,

    /// Print version information
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Input file ('-' for stdin, default)
    input: Option<PathBuf>,

    /// Output file ('-' for stdout, default)
    output: Option<PathBuf>,
}

fn identifier(s: &str) -> Result<String, String> {
    if is_identifier(s) {
        Ok(s.to_owned())
    } else {
        Err(format!("invalid identifier '{s}'"))
    }
}

/// `None` or "-" means the standard stream.
fn named(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| p.as_os_str() != "-")
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            print_fn: self.print.clone(),
            printf_fn: self.printf.clone(),
            region_comments: !self.no_comments,
            header: match &self.header {
                None => Header::Timestamp,
                Some(text) if text.is_empty() => Header::Omit,
                Some(text) => Header::Custom(text.clone()),
            },
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            main_wrapper: self.main_wrapper,
            content_type: self.html,
            max_line: self.max_line,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("CHTML_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .without_time()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let line = err.line();
            if line > 0 {
                eprintln!("\nchtml error: {err}\n(line: {line})");
            } else {
                eprintln!("\nchtml error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> chtml::Result<()> {
    let options = cli.options();

    let input: Box<dyn BufRead> = match named(cli.input) {
        Some(path) => Box::new(BufReader::new(File::open(&path).map_err(|e| open_error(&path, "reading", e))?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut out: BufWriter<Box<dyn Write>> = BufWriter::new(match named(cli.output) {
        Some(path) => Box::new(File::create(&path).map_err(|e| open_error(&path, "writing", e))?),
        None => Box::new(io::stdout().lock()),
    });

    let result = chtml::transpile(input, &mut out, &options);
    // Whatever was produced before a failure is kept.
    out.flush()?;
    result
}

fn open_error(path: &std::path::Path, what: &str, err: io::Error) -> io::Error {
    io::Error::new(err.kind(), format!("unable to open '{}' for {what}: {err}", path.display()))
}
