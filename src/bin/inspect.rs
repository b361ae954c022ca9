//! hashlib Inspector
//!
//! Prints the header and records of a stored hashlib table.

use std::path::PathBuf;

use clap::Parser;
use hashlib::codec::RecordReader;
use hashlib::{Config, HashlibError};
use tracing_subscriber::{fmt, EnvFilter};

/// hashlib file inspector
#[derive(Parser, Debug)]
#[command(name = "hashlib-inspect")]
#[command(about = "Inspect a stored hashlib table")]
#[command(version)]
struct Args {
    /// Stored table file
    file: PathBuf,

    /// List records (key and value length)
    #[arg(short, long)]
    keys: bool,

    /// Maximum number of records to list
    #[arg(short, long)]
    limit: Option<u64>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hashlib=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("hashlib-inspect v{}", hashlib::VERSION);
    tracing::info!("File: {}", args.file.display());

    if let Err(e) = inspect(&args) {
        tracing::error!("Inspection failed: {}", e);
        std::process::exit(1);
    }
}

fn inspect(args: &Args) -> Result<(), HashlibError> {
    let mut reader = RecordReader::open(&args.file, Config::default().io_buffer_size)?;
    let header = reader.header();

    println!("capacity: {}", header.capacity);
    println!("count:    {}", header.count);

    let mut value_bytes = 0u64;
    while let Some(record) = reader.next_record()? {
        value_bytes += record.value.len() as u64;

        let listed = args.limit.map_or(true, |limit| reader.records_read() <= limit);
        if args.keys && listed {
            println!("{:>8}  {}", record.value.len(), record.key);
        }
    }

    let records = reader.records_read();
    println!("records:  {}", records);
    println!("values:   {} bytes", value_bytes);

    if records != header.count {
        tracing::warn!(
            "Header count {} does not match {} records",
            header.count,
            records
        );
    }

    Ok(())
}
