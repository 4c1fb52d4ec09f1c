//! Headless ttyrec replay
//!
//! Feeds every frame of a recording through the screen model and prints the
//! final screen as a debug dump. Compressed recordings are decompressed
//! transparently by extension.

use std::env;
use std::error::Error;
use std::io;
use std::process;

use tatami_ttyrec::{compfile, FrameReader};
use tatami_vt::{Point, Term};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const HELP_TEXT: &str = r#"tatami-play - replay a ttyrec recording headlessly

USAGE:
    tatami-play [OPTIONS] <FILE>

FILE may be gzip- or bzip2-compressed (.gz, .bz2, .bzip2).

OPTIONS:
    -s, --size <COLSxROWS>  Screen size (default: 80x24)
    -d, --debug             Log unknown escape sequences to stderr
    -h, --help              Print help information
    -V, --version           Print version information

ENVIRONMENT VARIABLES:
    TATAMI_SIZE             Override screen size (COLSxROWS)
"#;

struct Args {
    file: String,
    size: Point,
    debug: bool,
}

fn parse_size(value: &str) -> Result<Point, String> {
    let (cols, rows) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("bad size {value:?}, expected COLSxROWS"))?;
    let x: i32 = cols
        .trim()
        .parse()
        .map_err(|_| format!("bad column count {cols:?}"))?;
    let y: i32 = rows
        .trim()
        .parse()
        .map_err(|_| format!("bad row count {rows:?}"))?;
    if x < 1 || y < 1 {
        return Err(format!("size {value:?} must be at least 1x1"));
    }
    Ok(Point::new(x, y))
}

fn parse_args() -> Result<Args, String> {
    let argv: Vec<String> = env::args().collect();
    let mut file = None;
    let mut size = None;
    let mut debug = false;

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-h" | "--help" => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("tatami-play {VERSION}");
                process::exit(0);
            }
            "-d" | "--debug" => debug = true,
            "-s" | "--size" => {
                i += 1;
                if i >= argv.len() {
                    return Err("--size requires a COLSxROWS argument".to_string());
                }
                size = Some(parse_size(&argv[i])?);
            }
            arg if arg.starts_with('-') => return Err(format!("unknown option {arg:?}")),
            arg => {
                if file.is_some() {
                    return Err("expected exactly one input file".to_string());
                }
                file = Some(arg.to_string());
            }
        }
        i += 1;
    }

    let size = match size {
        Some(size) => size,
        None => match env::var("TATAMI_SIZE") {
            Ok(value) => parse_size(&value)?,
            Err(_) => Point::new(80, 24),
        },
    };
    let file = file.ok_or_else(|| "missing input file (see --help)".to_string())?;
    Ok(Args { file, size, debug })
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let input = compfile::open(&args.file)?;
    let mut reader = FrameReader::new(input);

    let mut term = Term::with_size(args.size);
    term.debug = args.debug;

    let mut frames = 0u64;
    let mut bytes = 0u64;
    while let Some(frame) = reader.read_frame()? {
        bytes += frame.body.len() as u64;
        term.write(&frame.body);
        frames += 1;
    }
    eprintln!("replayed {frames} frames ({bytes} bytes)");

    print!("{}", term.debug_dump());
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            process::exit(2);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
