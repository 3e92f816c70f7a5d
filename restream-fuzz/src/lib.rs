//! Fuzzing entry points for restream-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_ops

use restream_core::{MemoryChannel, ReadChannel, RebufferedStream, StreamError, Whence};
use std::io::Cursor;

/// Interpret `data` as a script of stream operations and check every result
/// against a plain vector holding the expected logical contents.
pub fn fuzz_ops(data: &[u8]) {
    let Some((&cutoff, script)) = data.split_first() else {
        return;
    };

    let mut stream = RebufferedStream::with_tail_cutoff(MemoryChannel::new(), cutoff as usize);
    let mut model: Vec<u8> = Vec::new();
    let mut ops = script.chunks_exact(2);

    for op in &mut ops {
        let (kind, arg) = (op[0] % 3, op[1]);
        let at = stream.tell() as usize;
        match kind {
            0 => match stream.read(arg as usize) {
                Ok(read) => assert_eq!(&read[..], &model[at..at + arg as usize]),
                Err(StreamError::ShortRead { partial, .. }) => {
                    assert_eq!(&partial[..], &model[at..]);
                    assert_eq!(stream.tell() as usize, at);
                }
                Err(e) => panic!("unexpected read error: {e}"),
            },
            1 => {
                let bytes = vec![arg; (arg % 17) as usize + 1];
                stream.write(&bytes).unwrap();
                let end = at + bytes.len();
                if model.len() < end {
                    model.resize(end, 0);
                }
                model[at..end].copy_from_slice(&bytes);
            }
            _ => {
                let delta = arg as i8 as i64;
                if stream.seek(delta, Whence::Current).is_err() {
                    assert_eq!(stream.tell() as usize, at);
                }
            }
        }

        if let Some(cutoff) = stream.tail_cutoff() {
            assert!(stream.tell() - stream.cached_from() <= cutoff as u64);
        }
    }

    let channel = stream.into_channel().unwrap();
    assert_eq!(channel.contents(), &model[..]);
}

/// Read arbitrary bytes through a small window; must never panic
pub fn fuzz_read(data: &[u8]) {
    let mut stream = RebufferedStream::with_tail_cutoff(ReadChannel::new(Cursor::new(data)), 32);
    let mut total = 0usize;
    for &n in data.iter().take(64) {
        match stream.read(n as usize) {
            Ok(read) => total += read.len(),
            Err(_) => break,
        }
    }
    assert!(total <= data.len());
}
