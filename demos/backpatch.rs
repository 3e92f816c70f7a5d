//! Backpatching example: length-prefixed records written through a bounded window

use restream_core::{RebufferedStream, Whence, WriteChannel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Restream Backpatch Example\n");

    let records = [
        "first record",
        "a somewhat longer second record",
        "3",
    ];

    // Only 64 bytes behind the cursor stay addressable
    let mut stream = RebufferedStream::with_tail_cutoff(WriteChannel::new(Vec::new()), 64);

    for record in &records {
        let len_at = stream.tell();

        // Placeholder length, patched once the payload is written
        stream.write(&0u32.to_be_bytes())?;
        stream.write(record.as_bytes())?;
        let end = stream.tell();

        stream.seek(len_at as i64, Whence::Start)?;
        stream.write(&(record.len() as u32).to_be_bytes())?;
        stream.seek(end as i64, Whence::Start)?;

        println!(
            "Record at offset {}: {} bytes (window {}..{})",
            len_at,
            record.len(),
            stream.cached_from(),
            stream.cached_to()
        );
    }

    let stats = *stream.stats();
    let output = stream.into_channel()?.into_inner();

    println!("\nWrote {} bytes, {} flushed during eviction", output.len(), stats.bytes_flushed);
    println!("Peak window: {} bytes", stats.peak_window);

    Ok(())
}
