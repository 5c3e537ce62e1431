//! RFC 1952 gzip member framing: fixed 10-byte header, `FLG` field
//! skipping, raw DEFLATE payload, 8-byte CRC32+ISIZE trailer.
//!
//! Operates over in-memory byte slices/buffers, the same sans-I/O style as
//! [`crate::bitio`] and [`crate::inflate`] — the pipeline orchestrator is
//! the layer that threads this against a real [`crate::storage::Source`]/
//! [`crate::storage::Sink`].

use alloc::vec::Vec;

use crate::checksum::crc32;
use crate::config::{GZIP_HEADER_SIZE, GZIP_MIN_FILE_SIZE, GZIP_TRAILER_SIZE};
use crate::deflate::Encoder;
use crate::error::{ErrKind, Error};
use crate::inflate::{self, SinkWindow};
use crate::lz77::Matcher;

const MAGIC: [u8; 2] = [0x1F, 0x8B];
const METHOD_DEFLATE: u8 = 8;

mod flg {
    pub const FHCRC: u8 = 1 << 1;
    pub const FEXTRA: u8 = 1 << 2;
    pub const FNAME: u8 = 1 << 3;
    pub const FCOMMENT: u8 = 1 << 4;
}

/// The fields of a parsed gzip header. `mtime`, `xfl`, `os` are carried
/// for completeness; this core never inspects them beyond round-tripping
/// on re-emit.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub mtime: u32,
    pub xfl: u8,
    pub os: u8,
}

/// Parse a gzip header (and skip any optional FLG-gated fields) starting at
/// `data[0]`. Returns the header plus the byte offset where the raw
/// DEFLATE stream begins.
pub fn read_header(data: &[u8]) -> Result<(Header, usize), Error> {
    if data.len() < GZIP_MIN_FILE_SIZE {
        return Err(Error::new(ErrKind::InvalidFile));
    }
    if data[0] != MAGIC[0] || data[1] != MAGIC[1] {
        return Err(Error::new(ErrKind::InvalidFile));
    }
    if data[2] != METHOD_DEFLATE {
        return Err(Error::new(ErrKind::InvalidFile));
    }
    let flags = data[3];
    let mtime = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let xfl = data[8];
    let os = data[9];

    let mut pos = GZIP_HEADER_SIZE;

    if flags & flg::FEXTRA != 0 {
        if pos + 2 > data.len() {
            return Err(Error::new(ErrKind::InvalidFile));
        }
        let xlen = u16::from_le_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2 + xlen;
    }
    if flags & flg::FNAME != 0 {
        pos += find_nul(data, pos)? + 1;
    }
    if flags & flg::FCOMMENT != 0 {
        pos += find_nul(data, pos)? + 1;
    }
    if flags & flg::FHCRC != 0 {
        pos += 2;
    }
    if pos > data.len() {
        return Err(Error::new(ErrKind::InvalidFile));
    }

    Ok((Header { mtime, xfl, os }, pos))
}

fn find_nul(data: &[u8], from: usize) -> Result<usize, Error> {
    data[from..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::new(ErrKind::InvalidFile))
}

/// Write the fixed 10-byte gzip header this core always emits:
/// `[1F 8B 08 00 00 00 00 00 04 03]` — no optional fields ever set on
/// write.
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&MAGIC);
    out.push(METHOD_DEFLATE);
    out.push(0x00); // FLG
    out.extend_from_slice(&0u32.to_le_bytes()); // MTIME
    out.push(0x04); // XFL
    out.push(0x03); // OS: Unix
}

/// Write the 8-byte trailer: CRC32(original) then ISIZE mod 2^32, both LE.
pub fn write_trailer(out: &mut Vec<u8>, crc32: u32, isize_: u32) {
    out.extend_from_slice(&crc32.to_le_bytes());
    out.extend_from_slice(&isize_.to_le_bytes());
}

/// Decompress a whole gzip member held in memory, validating the trailer's
/// CRC32 and ISIZE against what was actually produced, surfaced as
/// `ChecksumError` on mismatch.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let (_header, payload_start) = read_header(data)?;

    let mut result = Vec::new();
    let payload_end;
    {
        let mut sink = |chunk: &[u8]| -> Result<(), Error> {
            result.extend_from_slice(chunk);
            Ok(())
        };
        let mut window = SinkWindow::new(&mut sink);
        let consumed = inflate::inflate_to_sink_offset(&data[payload_start..], &mut window)?;
        window.finish()?;
        payload_end = payload_start + consumed;
    }

    if payload_end + GZIP_TRAILER_SIZE > data.len() {
        return Err(Error::new(ErrKind::InvalidFile));
    }
    let trailer = &data[payload_end..payload_end + GZIP_TRAILER_SIZE];
    let expected_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let expected_isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

    let actual_crc = crc32::crc32(&result);
    if actual_crc != expected_crc {
        return Err(Error::new(ErrKind::ChecksumError));
    }
    let actual_isize = (result.len() as u64 & 0xFFFF_FFFF) as u32;
    if actual_isize != expected_isize {
        return Err(Error::new(ErrKind::ChecksumError));
    }

    Ok(result)
}

/// Compress `data` into a complete gzip member (header, one fixed-Huffman
/// final block, trailer).
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + GZIP_MIN_FILE_SIZE);
    write_header(&mut out);

    let mut enc = Encoder::new();
    let mut matcher = Matcher::with_defaults();
    enc.compress_block(data, true, &mut matcher);
    out.extend_from_slice(&enc.into_bytes());

    let crc = crc32::crc32(data);
    let isize_ = (data.len() as u64 & 0xFFFF_FFFF) as u32;
    write_trailer(&mut out, crc, isize_);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_simple_payload() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let gz = compress(data);
        assert_eq!(&gz[0..10], &[0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x03]);
        let out = decompress(&gz).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn roundtrips_repeated_bytes_scenario() {
        let data = b"aaaaaaaaaa";
        let gz = compress(data);
        assert_eq!(&gz[0..10], &[0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x03]);
        let trailer = &gz[gz.len() - 8..];
        let crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let isize_ = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
        assert_eq!(crc, crc32::crc32(data));
        assert_eq!(isize_, 10);
        assert_eq!(decompress(&gz).unwrap(), data);
    }

    #[test]
    fn rejects_short_file() {
        let err = decompress(&[0u8; 17]).unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidFile);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut gz = compress(b"x");
        gz[0] = 0x00;
        assert_eq!(decompress(&gz).unwrap_err().kind(), ErrKind::InvalidFile);
    }

    #[test]
    fn detects_corrupted_payload() {
        let mut gz = compress(b"the quick brown fox jumps over the lazy dog, twice over");
        let flip_at = 12;
        gz[flip_at] ^= 0xFF;
        let result = decompress(&gz);
        assert!(matches!(
            result.unwrap_err().kind(),
            ErrKind::DataError | ErrKind::ChecksumError
        ));
    }

    #[test]
    fn skips_optional_header_fields() {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC);
        data.push(METHOD_DEFLATE);
        data.push(flg::FNAME | flg::FCOMMENT);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.push(0x00);
        data.push(0x03);
        data.extend_from_slice(b"file.txt\0");
        data.extend_from_slice(b"a comment\0");
        let payload_marker = data.len();
        data.extend_from_slice(&[0xAA; 4]);

        let (_header, start) = read_header(&data).unwrap();
        assert_eq!(start, payload_marker);
    }
}
