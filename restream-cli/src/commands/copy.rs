use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use restream_core::{
    ReadChannel, RebufferedStream, StreamConfig, StreamError, StreamStats, WriteChannel,
};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use tracing::info;

/// Outcome of a copy
#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub bytes: u64,
    pub blake3: String,
    pub reader: StreamStats,
    pub writer: StreamStats,
}

pub fn execute(
    input: &str,
    output: &str,
    tail_cutoff: usize,
    read_chunk: usize,
    progress: bool,
    json: bool,
) -> Result<CopyReport> {
    info!("Copying {} to {}", input, output);

    let source = File::open(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;
    let sink = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output))?;

    let config = StreamConfig::new()
        .tail_cutoff(tail_cutoff)
        .read_chunk(read_chunk);
    let mut reader = RebufferedStream::with_config(ReadChannel::new(source), config)
        .with_context(|| "Invalid stream configuration")?;
    let mut writer = RebufferedStream::with_config(WriteChannel::new(BufWriter::new(sink)), config)?;

    let bar = if progress {
        let len = fs::metadata(input).map(|m| m.len()).unwrap_or(0);
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    let mut hasher = blake3::Hasher::new();
    let block = read_chunk.max(1);
    loop {
        let (data, done) = match reader.read(block) {
            Ok(data) => (data, false),
            Err(StreamError::ShortRead { partial, .. }) => (partial, true),
            Err(e) => return Err(e).with_context(|| format!("Failed reading {}", input)),
        };

        if !data.is_empty() {
            // A short read leaves the cursor in place; consume the tail for real
            let data = if done { reader.read(data.len())? } else { data };
            hasher.update(&data);
            writer
                .write(&data)
                .with_context(|| format!("Failed writing {}", output))?;
            if let Some(bar) = &bar {
                bar.inc(data.len() as u64);
            }
        }

        if done {
            break;
        }
    }

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let bytes = writer.tell();
    let reader_stats = *reader.stats();
    reader.close()?;
    writer
        .close()
        .with_context(|| format!("Failed to flush output file: {}", output))?;
    let writer_stats = *writer.stats();

    let report = CopyReport {
        bytes,
        blake3: hex::encode(hasher.finalize().as_bytes()),
        reader: reader_stats,
        writer: writer_stats,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n=== Copy Results ===");
        println!("Bytes copied:      {} bytes", report.bytes);
        println!("BLAKE3:            {}", report.blake3.cyan());
        println!("Channel reads:     {}", report.reader.channel_reads);
        println!("Channel writes:    {}", report.writer.channel_writes);
        println!(
            "Peak window:       {} / {} bytes (reader / writer)",
            report.reader.peak_window, report.writer.peak_window
        );
        println!("{} Copy complete", "✓".green());
    }

    Ok(report)
}
