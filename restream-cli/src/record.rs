//! Length-prefixed, checksummed records
//!
//! Layout of one record:
//! 1. Payload length (4 bytes, big-endian)
//! 2. Payload (variable length)
//! 3. CRC32C of the payload (4 bytes, big-endian)
//!
//! The writer does not know the length up front: it writes a placeholder,
//! then the payload, then seeks back to patch the length and re-reads the
//! payload to checksum it. The whole record must therefore fit within the
//! stream's tail cutoff.

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use restream_core::{ByteChannel, RebufferedStream, StreamError, Whence};

/// Bytes of framing around each payload (length + checksum)
pub const RECORD_OVERHEAD: usize = 8;

/// Largest payload accepted when reading (16 MiB)
pub const MAX_RECORD_LEN: u32 = 16 * 1024 * 1024;

/// A record read back from a stream
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Offset of the length prefix
    pub offset: u64,

    /// Payload bytes
    pub payload: Bytes,
}

/// Write one record at the cursor
pub fn write_record<C: ByteChannel>(stream: &mut RebufferedStream<C>, payload: &[u8]) -> Result<u64> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|&len| len <= MAX_RECORD_LEN)
        .with_context(|| format!("Payload of {} bytes is too large", payload.len()))?;

    let len_at = stream.tell();
    stream.write(&[0u8; 4])?;
    stream.write(payload)?;

    stream
        .seek(len_at as i64, Whence::Start)
        .with_context(|| {
            format!(
                "Record at offset {} ({} bytes) does not fit the tail cutoff",
                len_at,
                payload.len()
            )
        })?;
    stream.write(&len.to_be_bytes())?;

    // Checksum what actually sits in the stream
    let written = stream.read(payload.len())?;
    let crc = crc32c::crc32c(&written);
    stream.write(&crc.to_be_bytes())?;

    Ok(len_at)
}

/// Read one record at the cursor; `None` at a clean end of stream
pub fn read_record<C: ByteChannel>(stream: &mut RebufferedStream<C>) -> Result<Option<Record>> {
    let offset = stream.tell();

    let header = match stream.read(4) {
        Ok(header) => header,
        Err(StreamError::ShortRead { partial, .. }) if partial.is_empty() => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Truncated record header at offset {}", offset)))
        }
    };

    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if len > MAX_RECORD_LEN {
        bail!(
            "Record at offset {} claims {} bytes, maximum is {}",
            offset,
            len,
            MAX_RECORD_LEN
        );
    }

    let payload = stream
        .read(len as usize)
        .with_context(|| format!("Truncated payload in record at offset {}", offset))?;
    let trailer = stream
        .read(4)
        .with_context(|| format!("Truncated checksum in record at offset {}", offset))?;

    let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = crc32c::crc32c(&payload);
    if actual != expected {
        bail!(
            "Checksum mismatch in record at offset {}: expected {:08x}, got {:08x}",
            offset,
            expected,
            actual
        );
    }

    Ok(Some(Record { offset, payload }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use restream_core::MemoryChannel;

    #[test]
    fn test_record_round_trip() {
        let mut channel = MemoryChannel::new();
        {
            let mut stream = RebufferedStream::with_tail_cutoff(&mut channel, 64);
            assert_eq!(write_record(&mut stream, b"alpha").unwrap(), 0);
            assert_eq!(write_record(&mut stream, b"").unwrap(), 13);
            assert_eq!(write_record(&mut stream, b"gamma ray").unwrap(), 21);
            stream.close().unwrap();
        }

        let bytes = channel.into_inner();
        assert_eq!(&bytes[0..4], &5u32.to_be_bytes());
        assert_eq!(&bytes[4..9], b"alpha");
        assert_eq!(&bytes[9..13], &crc32c::crc32c(b"alpha").to_be_bytes());

        let mut stream = RebufferedStream::with_tail_cutoff(MemoryChannel::from_bytes(bytes), 64);
        let first = read_record(&mut stream).unwrap().unwrap();
        assert_eq!(first.payload.as_ref(), b"alpha");
        let second = read_record(&mut stream).unwrap().unwrap();
        assert_eq!(second.offset, 13);
        assert!(second.payload.is_empty());
        let third = read_record(&mut stream).unwrap().unwrap();
        assert_eq!(third.payload.as_ref(), b"gamma ray");
        assert!(read_record(&mut stream).unwrap().is_none());
    }

    #[test]
    fn test_record_larger_than_cutoff_fails() {
        let mut stream = RebufferedStream::with_tail_cutoff(MemoryChannel::new(), 16);
        let err = write_record(&mut stream, &[7u8; 32]).unwrap_err();
        assert!(err.to_string().contains("does not fit the tail cutoff"));
    }

    #[test]
    fn test_corrupted_checksum_detected() {
        let mut channel = MemoryChannel::new();
        {
            let mut stream = RebufferedStream::new(&mut channel);
            write_record(&mut stream, b"payload").unwrap();
        }
        let mut bytes = channel.into_inner();
        bytes[6] ^= 0x01;

        let mut stream = RebufferedStream::new(MemoryChannel::from_bytes(bytes));
        let err = read_record(&mut stream).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_truncated_record_detected() {
        let mut stream = RebufferedStream::new(MemoryChannel::from_bytes(vec![0, 0, 0, 9, 1, 2]));
        let err = read_record(&mut stream).unwrap_err();
        assert!(err.to_string().contains("Truncated payload"));
    }
}
