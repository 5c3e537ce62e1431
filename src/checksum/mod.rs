//! CRC-32 and Adler-32 accumulators, plus the small checksum-kind sum type
//! a framer selects between at construction time.

pub mod adler32;
pub mod crc32;

/// Which trailer checksum a framer demands. Selected at framer
/// construction; the decoder only branches on this for final trailer
/// validation, never mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    None,
    Adler32,
    Crc32,
}

/// An in-progress checksum of one of the two supported kinds, so the
/// decoder can accumulate without knowing which kind it holds until the
/// final trailer comparison. Checksum kind is chosen by the framer
/// wrapper.
#[derive(Debug, Clone, Copy)]
pub enum Accumulator {
    None,
    Adler32(u32),
    Crc32(u32),
}

impl Accumulator {
    pub fn new(kind: ChecksumKind) -> Self {
        match kind {
            ChecksumKind::None => Accumulator::None,
            ChecksumKind::Adler32 => Accumulator::Adler32(adler32::INITIAL),
            ChecksumKind::Crc32 => Accumulator::Crc32(crc32::INITIAL),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            Accumulator::None => {}
            Accumulator::Adler32(state) => *state = adler32::update(*state, bytes),
            Accumulator::Crc32(state) => *state = crc32::update(*state, bytes),
        }
    }

    /// The finalized checksum value, ready to compare against a trailer.
    /// CRC-32 requires the final XOR; Adler-32 and `None` need no
    /// finalization step.
    pub fn finalize(self) -> u32 {
        match self {
            Accumulator::None => 0,
            Accumulator::Adler32(state) => state,
            Accumulator::Crc32(state) => crc32::finalize(state),
        }
    }
}
