//! Streaming DEFLATE decoder — stored, fixed-Huffman and dynamic-Huffman
//! blocks (RFC 1951 §3.2.3).
//!
//! The block-dispatch loop ([`decode_blocks`]) is generic over [`Emit`], so
//! the same decode-step-shaped walk serves both output modes:
//!
//! - **Windowed** ([`SinkWindow`]): keeps the trailing `WINDOW_SIZE` bytes
//!   resident and periodically forwards everything older to a sink
//!   closure. Back-references resolve from this local buffer.
//! - **Sink-reflective** ([`ReflectiveEmitter`]): owns no window at all;
//!   every back-reference byte is re-read through a caller-supplied
//!   `read_emitted` hook against the sink's own already-written history.
//!   The caller is responsible for save/restore of sink position.

pub mod huffman;

use alloc::vec::Vec;

use crate::bitio::BitReader;
use crate::config::WINDOW_SIZE;
use crate::deflate::tables::{self, LENGTH_BASE, DIST_BASE};
use crate::error::{ErrKind, Error};
use huffman::{build_tree, decode_symbol, Tree};

/// BTYPE values from RFC 1951 §3.2.3.
mod btype {
    pub const STORED: u32 = 0b00;
    pub const FIXED: u32 = 0b01;
    pub const DYNAMIC: u32 = 0b10;
}

/// Order in which the 19 code-length-alphabet lengths are transmitted
/// (RFC 1951 §3.2.7).
const CLEN_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// The output side of the decode loop: literal bytes, LZ77 copies, and raw
/// stored-block runs. Implemented once per output mode.
pub trait Emit {
    fn literal(&mut self, b: u8) -> Result<(), Error>;
    fn raw_bytes(&mut self, bytes: &[u8]) -> Result<(), Error>;
    fn copy(&mut self, distance: u32, length: u32) -> Result<(), Error>;
}

/// A bounded-memory output buffer: keeps the trailing `WINDOW_SIZE` bytes
/// resident (the maximum distance a back-reference can name) and forwards
/// everything older to `sink` once a flush threshold is crossed.
pub struct SinkWindow<'s> {
    buf: Vec<u8>,
    sink: &'s mut dyn FnMut(&[u8]) -> Result<(), Error>,
}

impl<'s> SinkWindow<'s> {
    const FLUSH_THRESHOLD: usize = WINDOW_SIZE * 4;

    pub fn new(sink: &'s mut dyn FnMut(&[u8]) -> Result<(), Error>) -> Self {
        SinkWindow {
            buf: Vec::new(),
            sink,
        }
    }

    fn maybe_flush(&mut self) -> Result<(), Error> {
        if self.buf.len() > Self::FLUSH_THRESHOLD {
            let cut = self.buf.len() - WINDOW_SIZE;
            (self.sink)(&self.buf[..cut])?;
            self.buf.drain(..cut);
        }
        Ok(())
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.buf.extend_from_slice(bytes);
        self.maybe_flush()
    }

    /// Forward whatever remains and consume the window.
    pub fn finish(mut self) -> Result<(), Error> {
        if !self.buf.is_empty() {
            (self.sink)(&self.buf)?;
        }
        Ok(())
    }
}

impl<'s> Emit for SinkWindow<'s> {
    fn literal(&mut self, b: u8) -> Result<(), Error> {
        self.buf.push(b);
        self.maybe_flush()
    }

    fn raw_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.push_bytes(bytes)
    }

    fn copy(&mut self, distance: u32, length: u32) -> Result<(), Error> {
        let distance = distance as usize;
        if distance == 0 || distance > self.buf.len() {
            return Err(Error::new(ErrKind::DataError));
        }
        let start = self.buf.len() - distance;
        for i in 0..length as usize {
            let b = self.buf[start + i];
            self.buf.push(b);
        }
        self.maybe_flush()
    }
}

/// Sink-reflective output: no window of its own. Every emitted byte goes
/// straight to `sink`; every back-reference byte is re-derived by calling
/// `read_emitted(total_emitted_so_far - distance)` — the caller's job is
/// to seek its own sink's history and hand the byte back. Disallowed
/// against a sink that cannot do this (e.g. the tar reader, which is why
/// `.tar.gz` streaming without a temp file requires the windowed path).
pub struct ReflectiveEmitter<'s> {
    sink: &'s mut dyn FnMut(u8) -> Result<(), Error>,
    read_emitted: &'s mut dyn FnMut(u64) -> Result<u8, Error>,
    total_emitted: u64,
}

impl<'s> ReflectiveEmitter<'s> {
    pub fn new(
        sink: &'s mut dyn FnMut(u8) -> Result<(), Error>,
        read_emitted: &'s mut dyn FnMut(u64) -> Result<u8, Error>,
    ) -> Self {
        ReflectiveEmitter {
            sink,
            read_emitted,
            total_emitted: 0,
        }
    }

    pub fn total_emitted(&self) -> u64 {
        self.total_emitted
    }
}

impl<'s> Emit for ReflectiveEmitter<'s> {
    fn literal(&mut self, b: u8) -> Result<(), Error> {
        (self.sink)(b)?;
        self.total_emitted += 1;
        Ok(())
    }

    fn raw_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            self.literal(b)?;
        }
        Ok(())
    }

    fn copy(&mut self, distance: u32, length: u32) -> Result<(), Error> {
        let distance = distance as u64;
        if distance == 0 || distance > self.total_emitted {
            return Err(Error::new(ErrKind::DataError));
        }
        for _ in 0..length {
            let pos = self.total_emitted - distance;
            let b = (self.read_emitted)(pos)?;
            self.literal(b)?;
        }
        Ok(())
    }
}

fn read_code_lengths(
    reader: &mut BitReader,
    clen_tree: &Tree,
    count: usize,
) -> Result<Vec<u8>, Error> {
    let mut lengths = Vec::with_capacity(count);
    while lengths.len() < count {
        let sym = decode_symbol(reader, clen_tree)?;
        match sym {
            0..=15 => lengths.push(sym as u8),
            16 => {
                let prev = *lengths.last().ok_or_else(|| Error::new(ErrKind::DataError))?;
                let repeat = 3 + reader.get_bits(2)?;
                for _ in 0..repeat {
                    lengths.push(prev);
                }
            }
            17 => {
                let repeat = 3 + reader.get_bits(3)?;
                for _ in 0..repeat {
                    lengths.push(0);
                }
            }
            18 => {
                let repeat = 11 + reader.get_bits(7)?;
                for _ in 0..repeat {
                    lengths.push(0);
                }
            }
            _ => return Err(Error::new(ErrKind::DataError)),
        }
    }
    if lengths.len() != count {
        return Err(Error::new(ErrKind::DataError));
    }
    Ok(lengths)
}

fn decode_huffman_block<E: Emit>(
    reader: &mut BitReader,
    litlen_tree: &Tree,
    dist_tree: &Tree,
    out: &mut E,
) -> Result<(), Error> {
    loop {
        let sym = decode_symbol(reader, litlen_tree)?;
        if sym < 256 {
            out.literal(sym as u8)?;
            continue;
        }
        if sym == tables::END_OF_BLOCK {
            return Ok(());
        }
        let len_idx = (sym - 257) as usize;
        if len_idx >= LENGTH_BASE.len() {
            return Err(Error::new(ErrKind::DataError));
        }
        let (base_len, extra_bits) = LENGTH_BASE[len_idx];
        let length = base_len as u32 + reader.get_bits(extra_bits as u32)?;

        let dist_sym = decode_symbol(reader, dist_tree)?;
        if dist_sym as usize >= DIST_BASE.len() {
            return Err(Error::new(ErrKind::DataError));
        }
        let (base_dist, dist_extra_bits) = DIST_BASE[dist_sym as usize];
        let distance = base_dist as u32 + reader.get_bits(dist_extra_bits as u32)?;

        out.copy(distance, length)?;
    }
}

fn decode_stored_block<E: Emit>(reader: &mut BitReader, out: &mut E) -> Result<(), Error> {
    reader.align_to_byte();
    let rest = reader.remaining_bytes();
    if rest.len() < 4 {
        return Err(Error::new(ErrKind::DataError));
    }
    let len = u16::from_le_bytes([rest[0], rest[1]]);
    let nlen = u16::from_le_bytes([rest[2], rest[3]]);
    if len != !nlen {
        return Err(Error::new(ErrKind::DataError));
    }
    let len = len as usize;
    if rest.len() < 4 + len {
        return Err(Error::new(ErrKind::DataError));
    }
    out.raw_bytes(&rest[4..4 + len])?;
    reader.advance_bytes(4 + len);
    Ok(())
}

/// Drive the block-dispatch loop over `data` until `BFINAL`, forwarding
/// output through `out`. Returns the byte offset of the first byte after
/// the DEFLATE stream (i.e. past any padding bits of the final block),
/// which is where a gzip trailer or the next member would begin.
pub fn decode_blocks<E: Emit>(data: &[u8], out: &mut E) -> Result<usize, Error> {
    let mut reader = BitReader::new(data);
    let fixed_litlen = build_tree(&tables::fixed_litlen_lengths());
    let fixed_dist = build_tree(&tables::fixed_dist_lengths());

    loop {
        let bfinal = reader.get_bits(1)?;
        let btype = reader.get_bits(2)?;

        match btype {
            x if x == btype::STORED => decode_stored_block(&mut reader, out)?,
            x if x == btype::FIXED => {
                decode_huffman_block(&mut reader, &fixed_litlen, &fixed_dist, out)?
            }
            x if x == btype::DYNAMIC => {
                let hlit = 257 + reader.get_bits(5)? as usize;
                let hdist = 1 + reader.get_bits(5)? as usize;
                let hclen = 4 + reader.get_bits(4)? as usize;

                let mut clen_lengths = [0u8; 19];
                for &idx in CLEN_ORDER.iter().take(hclen) {
                    clen_lengths[idx] = reader.get_bits(3)? as u8;
                }
                let clen_tree = build_tree(&clen_lengths);

                let all_lengths = read_code_lengths(&mut reader, &clen_tree, hlit + hdist)?;
                let litlen_tree = build_tree(&all_lengths[..hlit]);
                let dist_tree = build_tree(&all_lengths[hlit..]);

                decode_huffman_block(&mut reader, &litlen_tree, &dist_tree, out)?
            }
            _ => return Err(Error::new(ErrKind::DataError)),
        }

        if bfinal == 1 {
            break;
        }
    }
    reader.align_to_byte();
    Ok(reader.byte_offset())
}

/// Windowed decode, returning the byte offset just past the DEFLATE
/// stream (see [`decode_blocks`]).
pub fn inflate_to_sink_offset(data: &[u8], out: &mut SinkWindow) -> Result<usize, Error> {
    decode_blocks(data, out)
}

/// Convenience for callers that don't need the trailing byte offset (e.g.
/// raw, unwrapped DEFLATE streams with nothing following).
pub fn inflate_to_sink(data: &[u8], out: &mut SinkWindow) -> Result<(), Error> {
    inflate_to_sink_offset(data, out).map(|_| ())
}

/// Decompress `data` in one call, collecting the whole result into memory.
/// `size_hint` pre-sizes the output buffer; it does not bound the result.
pub fn inflate_one_shot(data: &[u8], size_hint: usize) -> Result<Vec<u8>, Error> {
    let mut result = Vec::with_capacity(size_hint);
    {
        let mut sink = |chunk: &[u8]| -> Result<(), Error> {
            result.extend_from_slice(chunk);
            Ok(())
        };
        let mut window = SinkWindow::new(&mut sink);
        inflate_to_sink(data, &mut window)?;
        window.finish()?;
    }
    Ok(result)
}

/// Sink-reflective decode: `data` is a raw DEFLATE stream, `sink` receives
/// bytes one at a time in order, `read_emitted` must return the byte the
/// sink holds at absolute offset `pos` (`0`-based, counted from the start
/// of this stream's own output).
pub fn inflate_reflective(
    data: &[u8],
    sink: &mut dyn FnMut(u8) -> Result<(), Error>,
    read_emitted: &mut dyn FnMut(u64) -> Result<u8, Error>,
) -> Result<u64, Error> {
    let mut emitter = ReflectiveEmitter::new(sink, read_emitted);
    decode_blocks(data, &mut emitter)?;
    Ok(emitter.total_emitted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_truncated_input() {
        let err = inflate_one_shot(&[], 0).unwrap_err();
        assert_eq!(err.kind(), ErrKind::DataError);
    }

    #[test]
    fn stored_block_decodes() {
        let mut bytes = Vec::new();
        bytes.push(0b001); // BFINAL=1, BTYPE=00
        let payload = b"hello, stored block";
        let len = payload.len() as u16;
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&(!len).to_le_bytes());
        bytes.extend_from_slice(payload);

        let out = inflate_one_shot(&bytes, payload.len()).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn rejects_stored_block_with_bad_nlen() {
        let mut bytes = Vec::new();
        bytes.push(0b001);
        bytes.extend_from_slice(&5u16.to_le_bytes());
        bytes.extend_from_slice(&5u16.to_le_bytes()); // should be !5
        bytes.extend_from_slice(b"hello");
        assert!(inflate_one_shot(&bytes, 5).is_err());
    }

    #[test]
    fn windowed_sink_flushes_in_chunks() {
        let mut collected = Vec::new();
        {
            let mut sink = |chunk: &[u8]| -> Result<(), Error> {
                collected.extend_from_slice(chunk);
                Ok(())
            };
            let mut w = SinkWindow::new(&mut sink);
            let chunk = [b'x'; 4096];
            for _ in 0..40 {
                w.push_bytes(&chunk).unwrap();
            }
            w.finish().unwrap();
        }
        assert_eq!(collected.len(), 40 * 4096);
        assert!(collected.iter().all(|&b| b == b'x'));
    }

    #[test]
    fn reflective_decode_matches_windowed_decode() {
        use crate::deflate::compress_one_shot;
        use alloc::rc::Rc;
        use core::cell::RefCell;

        let data = b"the quick brown fox jumps over the lazy dog, the quick brown fox again";
        let compressed = compress_one_shot(data);

        let windowed = inflate_one_shot(&compressed, data.len()).unwrap();

        // The sink and `read_emitted` share the same backing history, as a
        // real sink-reflective caller requires: every byte `read_emitted`
        // can be asked for was already handed to `sink`.
        let history = Rc::new(RefCell::new(Vec::<u8>::new()));
        let produced = {
            let sink_history = Rc::clone(&history);
            let mut sink = move |b: u8| -> Result<(), Error> {
                sink_history.borrow_mut().push(b);
                Ok(())
            };
            let read_history = Rc::clone(&history);
            let mut read_emitted = move |pos: u64| -> Result<u8, Error> {
                read_history
                    .borrow()
                    .get(pos as usize)
                    .copied()
                    .ok_or_else(|| Error::new(ErrKind::DataError))
            };
            inflate_reflective(&compressed, &mut sink, &mut read_emitted).unwrap()
        };

        let reflective_out = history.borrow().clone();
        assert_eq!(produced, data.len() as u64);
        assert_eq!(reflective_out, windowed);
        assert_eq!(reflective_out, data.to_vec());
    }

    #[test]
    fn reflective_decode_rejects_distance_beyond_emitted() {
        let mut sink = |_: u8| -> Result<(), Error> { Ok(()) };
        let mut read_emitted = |_: u64| -> Result<u8, Error> { Ok(0) };
        // A single fixed-Huffman block whose first symbol is a copy with a
        // huge distance: code 257 (length 3, no extra bits) at 7 bits
        // (0000001, MSB-first => low-bit-first packed as the reversed
        // fixed code for 257) followed by a distance code requesting far
        // more than zero bytes emitted so far. Simplicity over realism:
        // reuse the encoder to build a guaranteed-corrupt stream isn't
        // needed — an empty/garbage stream with BFINAL+BTYPE=01 and a
        // single 7-bit zero pattern decodes as litlen symbol 0 (a literal),
        // so instead assert directly against the emitter's own guard.
        let mut emitter = ReflectiveEmitter::new(&mut sink, &mut read_emitted);
        assert!(emitter.copy(5, 1).is_err());
    }
}
