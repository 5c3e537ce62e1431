//! CRC-32 (IEEE 802.3, reflected polynomial 0xEDB88320).
//!
//! Table-based, byte-at-a-time. Gzip always uses this.

/// Accumulator seed. The caller starts a fresh checksum as `INITIAL`, folds
/// in bytes with [`update`], then applies [`finalize`] once at the end —
/// never mid-stream, since the running (pre-finalize) value has no meaning
/// as a standalone CRC.
pub const INITIAL: u32 = 0xFFFF_FFFF;

const POLY: u32 = 0xEDB8_8320;

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLY ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = build_table();

/// Fold `bytes` into a running CRC-32 state. `prev` starts at [`INITIAL`]
/// for a new checksum and is whatever [`update`] last returned thereafter.
#[inline]
pub fn update(prev: u32, bytes: &[u8]) -> u32 {
    let mut crc = prev;
    for &b in bytes {
        let idx = ((crc ^ b as u32) & 0xFF) as usize;
        crc = TABLE[idx] ^ (crc >> 8);
    }
    crc
}

/// Apply the final XOR. Call exactly once, after the last [`update`], to
/// get the value that belongs in a gzip trailer.
#[inline]
pub const fn finalize(state: u32) -> u32 {
    state ^ 0xFFFF_FFFF
}

/// One-shot convenience: `finalize(update(INITIAL, bytes))`.
pub fn crc32(bytes: &[u8]) -> u32 {
    finalize(update(INITIAL, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn known_vector_123456789() {
        // Standard CRC-32/ISO-HDLC check value.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn ten_repeated_bytes() {
        assert_eq!(crc32(b"aaaaaaaaaa"), 0x4C11_CDF0);
    }

    #[test]
    fn incremental_matches_oneshot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let whole = crc32(data);
        let mut state = INITIAL;
        for chunk in data.chunks(7) {
            state = update(state, chunk);
        }
        assert_eq!(finalize(state), whole);
    }
}
