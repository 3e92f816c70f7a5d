use crate::record::read_record;
use anyhow::{Context, Result};
use restream_core::{ReadChannel, RebufferedStream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct UnpackedRecord {
    pub offset: u64,
    pub len: usize,
    pub payload: Value,
}

pub fn execute(input: &str, output: Option<&str>, tail_cutoff: usize) -> Result<Vec<UnpackedRecord>> {
    info!("Unpacking file: {}", input);

    let file = File::open(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;
    let mut stream = RebufferedStream::with_tail_cutoff(ReadChannel::new(file), tail_cutoff);

    let mut records = Vec::new();
    while let Some(record) = read_record(&mut stream)? {
        // Payloads are JSON when produced by `pack`; anything else is kept as text
        let payload = serde_json::from_slice(&record.payload).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&record.payload).to_string())
        });
        records.push(UnpackedRecord {
            offset: record.offset,
            len: record.payload.len(),
            payload,
        });
    }

    let stats = *stream.stats();
    stream.close()?;

    // Print statistics
    println!("\n=== Unpack Results ===");
    println!("Records:           {}", records.len());
    println!("Bytes read:        {} bytes", stats.bytes_read);
    println!("Channel reads:     {}", stats.channel_reads);
    println!("Peak window:       {} bytes", stats.peak_window);
    println!();

    if let Some(output_path) = output {
        // Write to JSON file
        let json = serde_json::to_string_pretty(&records)
            .with_context(|| "Failed to serialize unpacked records")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Unpacked records written to: {}", output_path);
    } else {
        // Print to stdout
        println!("=== Records ===");
        for record in &records {
            println!("Record @ offset {}: {} bytes", record.offset, record.len);
        }
    }

    Ok(records)
}
