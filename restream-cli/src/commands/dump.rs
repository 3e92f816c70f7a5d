use anyhow::{Context, Result};
use colored::*;
use restream_core::{ReadChannel, RebufferedStream, StreamError, Whence};
use std::fs::File;
use tracing::{info, warn};

const BYTES_PER_LINE: usize = 16;

pub fn execute(input: &str, offset: u64, len: usize) -> Result<()> {
    info!("Dumping {} bytes at offset {} of {}", len, offset, input);

    let file = File::open(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;
    // Only the requested range ever needs to stay addressable
    let mut stream = RebufferedStream::with_tail_cutoff(ReadChannel::new(file), len);

    let offset_i64 = i64::try_from(offset).with_context(|| "Offset too large")?;
    let start = match stream.seek(offset_i64, Whence::Start) {
        Ok(start) => start,
        Err(StreamError::SeekBeyondAvailable { available, .. }) => {
            println!("{} Offset {} is past the end of the file ({} bytes)", "✗".red(), offset, available);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let data = match stream.read(len) {
        Ok(data) => data,
        Err(StreamError::ShortRead { partial, .. }) => {
            warn!("File ends {} bytes into the requested range", partial.len());
            partial
        }
        Err(e) => return Err(e.into()),
    };

    for (i, line) in data.chunks(BYTES_PER_LINE).enumerate() {
        let at = start + (i * BYTES_PER_LINE) as u64;
        let printable: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<32}  {}", at, hex::encode(line), printable);
    }

    Ok(())
}
