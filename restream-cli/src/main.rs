use anyhow::Result;
use clap::{Parser, Subcommand};
use restream_cli::{commands, DEFAULT_TAIL_CUTOFF};
use restream_core::constants::DEFAULT_READ_CHUNK;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "restream")]
#[command(about = "Restream - Bounded-memory seekable streams over sequential channels", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a file through a reader stream and a writer stream
    Copy {
        /// Input file
        #[arg(short, long)]
        input: String,

        /// Output file
        #[arg(short, long)]
        output: String,

        /// Bytes kept behind the cursor on both streams
        #[arg(long, default_value_t = DEFAULT_TAIL_CUTOFF)]
        tail_cutoff: usize,

        /// Bytes requested from the input per read
        #[arg(long, default_value_t = DEFAULT_READ_CHUNK)]
        read_chunk: usize,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pack JSON values into length-prefixed, checksummed records
    Pack {
        /// Input JSON file (array of payloads)
        #[arg(short, long)]
        input: String,

        /// Output file for packed records
        #[arg(short, long)]
        output: String,

        /// Bytes kept behind the cursor; every record must fit
        #[arg(long, default_value_t = DEFAULT_TAIL_CUTOFF)]
        tail_cutoff: usize,
    },

    /// Read packed records back and verify their checksums
    Unpack {
        /// Input file with packed records
        #[arg(short, long)]
        input: String,

        /// Output JSON file for the recovered payloads
        #[arg(short, long)]
        output: Option<String>,

        /// Bytes kept behind the cursor
        #[arg(long, default_value_t = DEFAULT_TAIL_CUTOFF)]
        tail_cutoff: usize,
    },

    /// Hex dump a byte range of a file
    Dump {
        /// Input file
        #[arg(short, long)]
        input: String,

        /// Offset of the first byte
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Number of bytes to dump
        #[arg(long, default_value = "256")]
        len: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Copy {
            input,
            output,
            tail_cutoff,
            read_chunk,
            progress,
            json,
        } => commands::copy::execute(&input, &output, tail_cutoff, read_chunk, progress, json)
            .map(|_| ()),

        Commands::Pack {
            input,
            output,
            tail_cutoff,
        } => commands::pack::execute(&input, &output, tail_cutoff).map(|_| ()),

        Commands::Unpack {
            input,
            output,
            tail_cutoff,
        } => commands::unpack::execute(&input, output.as_deref(), tail_cutoff).map(|_| ()),

        Commands::Dump { input, offset, len } => commands::dump::execute(&input, offset, len),
    }
}
