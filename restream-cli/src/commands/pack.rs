use crate::record::write_record;
use anyhow::{Context, Result};
use restream_core::{RebufferedStream, StreamStats, WriteChannel};
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufWriter;
use tracing::info;

pub fn execute(input: &str, output: &str, tail_cutoff: usize) -> Result<StreamStats> {
    info!("Packing data from {} to {}", input, output);

    // Read input JSON
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;

    let payloads: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| "Failed to parse JSON input")?;

    info!("Found {} payloads to pack", payloads.len());

    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output))?;
    let mut stream =
        RebufferedStream::with_tail_cutoff(WriteChannel::new(BufWriter::new(file)), tail_cutoff);

    for (i, payload) in payloads.iter().enumerate() {
        // Serialize payload to JSON bytes
        let payload_bytes = serde_json::to_vec(payload)
            .with_context(|| format!("Failed to serialize payload {}", i))?;

        let offset = write_record(&mut stream, &payload_bytes)
            .with_context(|| format!("Failed to pack record {}", i))?;

        info!("Packed record {} at offset {} ({} bytes)", i, offset, payload_bytes.len());
    }

    let total = stream.tell();
    let stats = *stream.stats();
    stream
        .close()
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!(
        "Successfully packed {} records ({} bytes total, peak window {} bytes)",
        payloads.len(),
        total,
        stats.peak_window
    );

    Ok(stats)
}
