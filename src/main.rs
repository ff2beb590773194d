//! txfdump CLI
//!
//! Command-line interface for the txfrecord decoder.
//! Decodes single records or walks a file of consecutive records.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use console::style;
use humansize::{format_size, BINARY};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use txfrecord::ntfs::{describe_file_attribute_flags, describe_usn_reason_flags, format_filetime};
use txfrecord::{
    DebugSink, DecodeOptions, GenericBody, NoopSink, Record, RecordBody, TracingSink, TxfError,
    UpdateJournalEntryList, DEFAULT_MAX_DATA_SIZE,
};

/// txfdump - Transactional NTFS log record decoder
#[derive(Parser)]
#[command(name = "txfdump")]
#[command(version)]
#[command(about = "Decode TxF log records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Report decoded fields (-v for debug, -vv for raw data dumps)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode the record at an offset of a file
    Decode {
        path: PathBuf,

        /// Byte offset of the record
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Reject records longer than this many bytes
        #[arg(long)]
        max_size: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Decode consecutive records, each starting where the previous ended
    Walk {
        path: PathBuf,

        /// Byte offset of the first record
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Maximum number of records to decode
        #[arg(short, long)]
        limit: Option<usize>,

        /// Reject records longer than this many bytes
        #[arg(long)]
        max_size: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("offset {offset} is past the end of the file ({length} bytes)")]
    OffsetPastEnd { offset: usize, length: usize },

    #[error("record at offset {offset}: {source}")]
    Decode {
        offset: usize,
        #[source]
        source: TxfError,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let sink: &dyn DebugSink = if cli.verbose > 0 { &TracingSink } else { &NoopSink };

    let result = match cli.command {
        Commands::Decode {
            path,
            offset,
            max_size,
            format,
        } => cmd_decode(&path, offset, options(sink, max_size), format),

        Commands::Walk {
            path,
            offset,
            limit,
            max_size,
            format,
        } => cmd_walk(&path, offset, limit, options(sink, max_size), format),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,txfrecord=debug",
        _ => "warn,txfrecord=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn options(sink: &dyn DebugSink, max_size: Option<usize>) -> DecodeOptions<'_> {
    DecodeOptions::new()
        .with_max_data_size(max_size.unwrap_or(DEFAULT_MAX_DATA_SIZE))
        .with_sink(sink)
}

fn read_file(path: &Path, offset: usize) -> Result<Vec<u8>, CliError> {
    let data = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if offset > data.len() {
        return Err(CliError::OffsetPastEnd {
            offset,
            length: data.len(),
        });
    }
    Ok(data)
}

/// Decode command implementation
fn cmd_decode(
    path: &Path,
    offset: usize,
    options: DecodeOptions<'_>,
    format: Format,
) -> Result<(), CliError> {
    let data = read_file(path, offset)?;

    let mut record = Record::new();
    record
        .decode_with(&data[offset..], &options)
        .map_err(|source| CliError::Decode { offset, source })?;

    match format {
        Format::Json => print_json(offset, &record),
        Format::Text => print_record(offset, &record),
    }
    Ok(())
}

/// Walk command implementation
fn cmd_walk(
    path: &Path,
    start: usize,
    limit: Option<usize>,
    options: DecodeOptions<'_>,
    format: Format,
) -> Result<(), CliError> {
    let data = read_file(path, start)?;
    let limit = limit.unwrap_or(usize::MAX);

    let mut record = Record::new();
    let mut offset = start;
    let mut count = 0;

    while offset < data.len() && count < limit {
        record
            .decode_with(&data[offset..], &options)
            .map_err(|source| CliError::Decode { offset, source })?;

        match format {
            Format::Json => print_json(offset, &record),
            Format::Text => print_record(offset, &record),
        }

        // A decoded record is never smaller than its header
        offset += record.size() as usize;
        count += 1;
    }

    if format == Format::Text {
        println!(
            "{} {} records, {} decoded",
            style("✓").green().bold(),
            count,
            style(format_size((offset - start) as u64, BINARY)).cyan()
        );
    }
    Ok(())
}

fn print_json(offset: usize, record: &Record) {
    println!(
        "{}",
        serde_json::json!({
            "offset": offset,
            "record": record,
        })
    );
}

fn print_record(offset: usize, record: &Record) {
    let Some(header) = record.header() else {
        return;
    };

    println!(
        "{} Record at offset {}",
        style("→").cyan().bold(),
        style(format!("0x{:08x}", offset)).yellow()
    );
    let kind_name = match record.body() {
        Some(RecordBody::EntryList(_)) => "update journal entries list",
        _ => "generic",
    };
    println!(
        "  {} 0x{:04x} ({})",
        style("Type:").bold(),
        header.kind,
        kind_name
    );
    println!(
        "  {} {}",
        style("Size:").bold(),
        format_size(record.size() as u64, BINARY)
    );
    println!(
        "  {} MFT entry {}, sequence {}",
        style("File reference:").bold(),
        header.mft_entry(),
        header.sequence_number()
    );
    println!("  {} {}", style("GUID:").bold(), header.guid());
    println!(
        "  {} {}",
        style("Timestamp:").bold(),
        format_filetime(header.timestamp)
    );

    match record.body() {
        Some(RecordBody::EntryList(list)) => print_entry_list(list),
        Some(RecordBody::Generic(body)) => print_generic_body(body),
        None => {}
    }
    println!();
}

fn print_entry_list(list: &UpdateJournalEntryList) {
    println!(
        "  {} 0x{:016x}",
        style("Next LSN:").bold(),
        list.header.next_lsn
    );
    println!("  {} {}", style("Entries:").bold(), list.entries.len());

    for (i, entry) in list.entries.iter().enumerate() {
        println!(
            "    {} {} {}",
            style(format!("{:3}.", i + 1)).dim(),
            style(format!("USN {}", entry.usn.usn)).yellow(),
            style(&entry.usn.file_name).cyan()
        );
        println!(
            "        {} {}  {} MFT entry {}",
            style("Time:").dim(),
            format_filetime(entry.usn.timestamp),
            style("Parent:").dim(),
            entry.usn.parent_record_number()
        );
        println!(
            "        {} 0x{:08x} {}",
            style("Reason:").dim(),
            entry.usn.reason,
            style(describe_usn_reason_flags(entry.usn.reason).join(", ")).dim()
        );
    }
}

fn print_generic_body(body: &GenericBody) {
    if let Some(name) = body.name() {
        println!("  {} {}", style("Name:").bold(), style(name).cyan());
    }
    if let Some(times) = &body.file_times {
        println!("  {} {}", style("Created:").bold(), format_filetime(times.creation));
        println!("  {} {}", style("Modified:").bold(), format_filetime(times.modification));
        println!(
            "  {} {}",
            style("Entry modified:").bold(),
            format_filetime(times.entry_modification)
        );
        println!("  {} {}", style("Accessed:").bold(), format_filetime(times.access));
    }
    if let Some(sizes) = &body.file_sizes {
        println!(
            "  {} {} (allocated {})",
            style("File size:").bold(),
            style(format_size(sizes.data_size, BINARY)).yellow(),
            format_size(sizes.allocated_size, BINARY)
        );
    }
    if let Some(flags) = body.file_attributes {
        let names = describe_file_attribute_flags(flags);
        println!(
            "  {} 0x{:08x} {}",
            style("Attributes:").bold(),
            flags,
            style(names.join(", ")).dim()
        );
    }
}
