//! Copy a file through a reader stream with a small tail cutoff, peeking
//! backwards as a format engine would when disambiguating alternatives

use restream_core::{ReadChannel, RebufferedStream, StreamConfig, StreamError, Whence};
use std::fs::File;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: bounded_copy <input-file>")?;

    let config = StreamConfig::new().tail_cutoff(256).read_chunk(4096);
    let mut stream = RebufferedStream::with_config(ReadChannel::new(File::open(&path)?), config)?;

    let mut total = 0u64;
    let mut newlines = 0u64;
    loop {
        let block = match stream.read(512) {
            Ok(block) => block,
            Err(StreamError::ShortRead { partial, .. }) => {
                total += partial.len() as u64;
                newlines += partial.iter().filter(|&&b| b == b'\n').count() as u64;
                break;
            }
            Err(e) => return Err(e.into()),
        };
        total += block.len() as u64;
        newlines += block.iter().filter(|&&b| b == b'\n').count() as u64;

        // Look back at the tail of the block and step forward again
        stream.seek(-16, Whence::Current)?;
        let tail = stream.read(16)?;
        assert_eq!(&tail[..], &block[block.len() - 16..]);
    }

    let stats = stream.stats();
    println!("{}: {} bytes, {} lines", path, total, newlines);
    println!(
        "Channel reads: {}, peak window: {} bytes",
        stats.channel_reads, stats.peak_window
    );

    Ok(())
}
