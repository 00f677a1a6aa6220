//! xml2doc -- print the document form of XML files.
//!
//! Each input is parsed, mapped onto the document model and printed on its
//! own line, either in the document-shell form or as JSON.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xml2doc::{to_map, Document, Map, ParseOptions, SerializationOptions};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xml2doc -- map XML files onto ordered documents.
#[derive(Parser, Debug)]
#[command(name = "xml2doc", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Log debug information to stderr (`RUST_LOG` takes precedence).
    #[arg(long)]
    verbose: bool,

    // -- Parsing options ---------------------------------------------------
    /// Drop whitespace-only text nodes while parsing.
    #[arg(long)]
    noblanks: bool,

    // -- Serialization options ---------------------------------------------
    /// Include comments found in element content.
    #[arg(long)]
    comments: bool,

    /// Encode the DOCTYPE's notation and entity declarations.
    #[arg(long = "dtd-elements")]
    dtd_elements: bool,

    /// Set the reserved doctype flag.
    #[arg(long)]
    doctype: bool,

    // -- Output options ----------------------------------------------------
    /// Print JSON instead of the shell form.
    #[arg(long)]
    json: bool,

    /// Print timing information for reading, parsing and serializing.
    #[arg(long)]
    timing: bool,
}

impl Cli {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions::default().no_blanks(self.noblanks)
    }

    fn serialization_options(&self) -> SerializationOptions {
        SerializationOptions::default()
            .include_comments(self.comments)
            .include_dtd_elements(self.dtd_elements)
            .include_doc_type(self.doctype)
    }
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_SERIALIZE_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut worst_exit: u8 = EXIT_SUCCESS;
    for file in &cli.files {
        let exit = process_file(&cli, file);
        if exit > worst_exit {
            worst_exit = exit;
        }
    }

    ExitCode::from(worst_exit)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, filename: &str) -> u8 {
    // -- Read input --------------------------------------------------------
    let start_read = Instant::now();

    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_PARSE_ERROR;
        }
    };

    if cli.timing {
        let elapsed = start_read.elapsed();
        eprintln!("Reading file {filename} took {elapsed:?}");
    }

    // -- Parse -------------------------------------------------------------
    let start_parse = Instant::now();

    let doc = match Document::parse_bytes_with_options(&input, &cli.parse_options()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_PARSE_ERROR;
        }
    };

    if cli.timing {
        let elapsed = start_parse.elapsed();
        eprintln!("Parsing took {elapsed:?}");
    }

    // -- Serialize ---------------------------------------------------------
    let start_serial = Instant::now();

    let map = match to_map(&doc, doc.root(), &cli.serialization_options()) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_SERIALIZE_ERROR;
        }
    };

    if cli.timing {
        let elapsed = start_serial.elapsed();
        eprintln!("Serializing took {elapsed:?}");
    }

    write_output(&render(cli, &map));
    EXIT_SUCCESS
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Reads raw bytes from a file or stdin (when filename is `-`); encoding
/// detection happens in the parser.
fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

fn render(cli: &Cli, map: &Map) -> String {
    if cli.json {
        // Serializing a Map into JSON has no failure path: keys are strings.
        serde_json::to_string(map).unwrap_or_else(|_| map.to_string())
    } else {
        map.to_string()
    }
}

fn write_output(content: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{content}");
    // Flush stdout to ensure output is complete, especially when piped.
    let _ = stdout.flush();
}
