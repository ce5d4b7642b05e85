//! AOKV Inspection CLI
//!
//! Reads AOKV container files: summary info, key listing, point lookups,
//! and full dumps.

use std::io::Read;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use aokv::{IndexOptions, Reader, ReaderOptions, TransformFn, Value};

/// AOKV container inspector
#[derive(Parser, Debug)]
#[command(name = "aokv")]
#[command(about = "Inspect append-only key-value container files")]
#[command(version)]
struct Args {
    /// File id the container was written with
    #[arg(long, default_value = "0")]
    file_id: u32,

    /// Treat compressed bodies as gzip
    #[arg(long)]
    gzip: bool,

    /// Fail on unrecognized blocks instead of skipping them
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a container summary
    Info { file: String },
    /// List all keys in first-occurrence order
    Keys { file: String },
    /// Print one value as JSON-ish text
    Get { file: String, key: String },
    /// Print every key-value pair
    Dump { file: String },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> aokv::Result<()> {
    match &args.command {
        Command::Info { file } => {
            let mut reader = open_reader(file, args)?;
            reader.index(index_options(args))?;
            let size = std::fs::metadata(file)?.len();
            println!("file:  {}", file);
            println!("size:  {} bytes", size);
            println!("keys:  {}", reader.len());
        }
        Command::Keys { file } => {
            let mut reader = open_reader(file, args)?;
            reader.index(index_options(args))?;
            for key in reader.keys()? {
                println!("{}", key);
            }
        }
        Command::Get { file, key } => {
            let mut reader = open_reader(file, args)?;
            reader.index(index_options(args))?;
            match reader.get(key)? {
                Some(value) => println!("{}", render(&value)),
                None => println!("(absent)"),
            }
        }
        Command::Dump { file } => {
            let mut reader = open_reader(file, args)?;
            reader.index(index_options(args))?;
            for key in reader.keys()? {
                match reader.get(&key)? {
                    Some(value) => println!("{} = {}", key, render(&value)),
                    None => println!("{} = (truncated)", key),
                }
            }
        }
    }
    Ok(())
}

fn open_reader(file: &str, args: &Args) -> aokv::Result<Reader<aokv::FileSource>> {
    let mut options = ReaderOptions::with_file_id(args.file_id);
    if args.gzip {
        options = options.decompress(gunzip());
    }
    Reader::open(file, options)
}

fn index_options(args: &Args) -> IndexOptions {
    IndexOptions {
        check_headers: args.strict,
        ..IndexOptions::default()
    }
}

/// Gzip decompressor transform
fn gunzip() -> TransformFn {
    Box::new(|bytes| {
        let mut decoder = flate2::read::GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    })
}

fn render(value: &Value) -> String {
    match value {
        Value::Json(v) => v.to_string(),
        Value::TypedArray(t) => {
            format!("<{} x{} ({} bytes)>", t.kind().tag(), t.len(), t.data().len())
        }
        Value::RawBytes(b) => format!("<raw {} bytes>", b.len()),
    }
}
