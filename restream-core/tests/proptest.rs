//! Property-based tests using proptest

use bytes::Bytes;
use proptest::prelude::*;
use restream_core::{
    ByteChannel, Capabilities, MemoryChannel, ReadChannel, RebufferedStream, StreamConfig,
    StreamError, Whence,
};
use std::cell::RefCell;
use std::io::{self, Cursor};
use std::rc::Rc;

/// Write-only sink sharing its received bytes with the test
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl ByteChannel for SharedSink {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(Capabilities::WRITE)
    }

    fn read(&mut self, _max_len: usize) -> io::Result<Bytes> {
        Ok(Bytes::new())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }
}

#[derive(Debug, Clone)]
enum Op {
    Read(usize),
    Write(Vec<u8>),
    Seek(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..64).prop_map(Op::Read),
        prop::collection::vec(any::<u8>(), 1..64).prop_map(Op::Write),
        (-96i64..96).prop_map(Op::Seek),
    ]
}

proptest! {
    #[test]
    fn prop_sequential_round_trip(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..200), 1..20)
    ) {
        let mut stream = RebufferedStream::new(MemoryChannel::new());
        let mut expected = Vec::new();
        for chunk in &chunks {
            prop_assert_eq!(stream.write(chunk).unwrap(), chunk.len());
            expected.extend_from_slice(chunk);
        }

        prop_assert_eq!(stream.seek(0, Whence::Start).unwrap(), 0);
        let read = stream.read(expected.len()).unwrap();
        prop_assert_eq!(read.as_ref(), &expected[..]);
    }

    #[test]
    fn prop_random_access_equivalence(
        data in prop::collection::vec(any::<u8>(), 1..2048),
        picks in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 1..30),
        read_chunk in 1usize..300,
    ) {
        let config = StreamConfig::new().read_chunk(read_chunk);
        let mut stream = RebufferedStream::with_config(
            ReadChannel::new(Cursor::new(data.clone())),
            config,
        ).unwrap();

        for (a, b) in picks {
            let o = a.index(data.len() + 1);
            let len = b.index(data.len() - o + 1);
            prop_assert_eq!(stream.seek(o as i64, Whence::Start).unwrap(), o as u64);
            let read = stream.read(len).unwrap();
            prop_assert_eq!(read.as_ref(), &data[o..o + len]);
            prop_assert_eq!(stream.tell(), (o + len) as u64);
        }
    }

    #[test]
    fn prop_write_then_read_identity(
        initial in prop::collection::vec(any::<u8>(), 0..512),
        at in any::<prop::sample::Index>(),
        payload in prop::collection::vec(any::<u8>(), 1..256),
    ) {
        let mut stream = RebufferedStream::new(MemoryChannel::from_bytes(initial.clone()));
        let o = at.index(initial.len() + 1);

        stream.seek(o as i64, Whence::Start).unwrap();
        stream.write(&payload).unwrap();
        stream.seek(o as i64, Whence::Start).unwrap();
        let read = stream.read(payload.len()).unwrap();
        prop_assert_eq!(read.as_ref(), &payload[..]);
    }

    #[test]
    fn prop_bounded_window_and_flush_order(
        cutoff in 0usize..128,
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let sink = SharedSink::default();
        let mut stream = RebufferedStream::with_tail_cutoff(sink.clone(), cutoff);
        // Logical content of the stream as the caller sees it
        let mut model: Vec<u8> = Vec::new();

        for op in ops {
            match op {
                Op::Read(n) => {
                    let at = stream.tell() as usize;
                    match stream.read(n) {
                        Ok(data) => prop_assert_eq!(data.as_ref(), &model[at..at + n]),
                        Err(StreamError::ShortRead { partial, .. }) => {
                            prop_assert!(at + n > model.len());
                            prop_assert_eq!(partial.as_ref(), &model[at..]);
                            prop_assert_eq!(stream.tell() as usize, at);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                }
                Op::Write(bytes) => {
                    let at = stream.tell() as usize;
                    stream.write(&bytes).unwrap();
                    let end = at + bytes.len();
                    if model.len() < end {
                        model.resize(end, 0);
                    }
                    model[at..end].copy_from_slice(&bytes);
                }
                Op::Seek(delta) => {
                    let before = stream.tell();
                    let target = before as i64 + delta;
                    match stream.seek(delta, Whence::Current) {
                        Ok(pos) => prop_assert_eq!(pos as i64, target),
                        Err(StreamError::SeekOutOfWindow { base, .. }) => {
                            prop_assert!(target >= 0 && (target as u64) < base);
                            prop_assert_eq!(stream.tell(), before);
                        }
                        Err(StreamError::NegativeSeek(t)) => {
                            prop_assert_eq!(t, target);
                            prop_assert_eq!(stream.tell(), before);
                        }
                        Err(StreamError::SeekBeyondAvailable { .. }) => {
                            prop_assert!(target as usize > model.len());
                            prop_assert_eq!(stream.tell(), before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                }
            }

            prop_assert!(stream.tell() - stream.cached_from() <= cutoff as u64);
            // The sink always holds exactly the evicted prefix
            let flushed = sink.0.borrow().len() as u64;
            prop_assert_eq!(flushed, stream.cached_from());
        }

        stream.close().unwrap();
        prop_assert_eq!(&sink.0.borrow()[..], &model[..]);
    }

    #[test]
    fn prop_read_never_panics_on_short_channels(
        data in prop::collection::vec(any::<u8>(), 0..256),
        n in 0usize..512,
    ) {
        let mut stream = RebufferedStream::new(ReadChannel::new(Cursor::new(data.clone())));
        match stream.read(n) {
            Ok(read) => prop_assert_eq!(read.as_ref(), &data[..n]),
            Err(e) => {
                let partial = e.partial().cloned().unwrap_or_default();
                prop_assert_eq!(partial.as_ref(), &data[..]);
                prop_assert_eq!(stream.tell(), 0);
            }
        }
    }
}
