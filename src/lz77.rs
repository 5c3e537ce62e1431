//! Hashed 3-byte sliding-window match finder.
//!
//! A single-entry-per-bucket hash table: one candidate position per hash
//! bucket rather than a chain walk. A `Matcher` type owns a flat hash
//! table of source positions, is driven one input position at a time, and
//! emits through two entry points (`literal`/`copy`).

use alloc::vec;
use alloc::vec::Vec;

use crate::config::{DEFAULT_HASH_BITS, MAX_MATCH, MIN_MATCH};

/// One step of LZ77 parsing: either a single byte, or a back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Copy { distance: u32, length: u32 },
}

/// A hashed single-entry-per-bucket match finder over a byte slice already
/// fully resident in memory (the LZ77 stage always sees the whole input
/// chunk the encoder is asked to compress in one call, one block per
/// call).
pub struct Matcher {
    hash_bits: u32,
    hash_table: Vec<i64>, // source index of the last position hashing here, -1 = empty
    window: u32,
}

impl Matcher {
    /// `hash_bits` governs the bucket count (`1 << hash_bits`); `window` is
    /// the maximum back-reference distance (up to 32 KiB).
    pub fn new(hash_bits: u32, window: u32) -> Self {
        let size = 1usize << hash_bits;
        Matcher {
            hash_bits,
            hash_table: vec![-1i64; size],
            window,
        }
    }

    pub fn with_defaults() -> Self {
        Matcher::new(DEFAULT_HASH_BITS, crate::config::WINDOW_SIZE as u32)
    }

    #[inline]
    fn hash(&self, p0: u8, p1: u8, p2: u8) -> usize {
        // ((p[0]<<16 | p[1]<<8 | p[2]) >> (24 - HASH_BITS) - value) & (HASH_SIZE-1)
        let v = ((p0 as i32) << 16) | ((p1 as i32) << 8) | (p2 as i32);
        let hash = (v >> (24 - self.hash_bits as i32)).wrapping_sub(v);
        (hash as usize) & (self.hash_table.len() - 1)
    }

    /// Parse `src` into a sequence of literals/copies, invoking `progress`
    /// with `(bytes_processed, total)` at each step.
    ///
    /// A fresh `Matcher` sees a fresh hash table; reusing one across calls
    /// carries its history forward, which lets back-references reach into
    /// data compressed by an earlier call as long as it is still within
    /// `window` bytes — callers that want per-call independence should
    /// construct a new `Matcher` per call.
    pub fn parse(&mut self, src: &[u8], mut progress: impl FnMut(usize, usize)) -> Vec<Token> {
        let mut tokens = Vec::new();
        let len = src.len();
        if len < MIN_MATCH {
            for &b in src {
                tokens.push(Token::Literal(b));
            }
            return tokens;
        }

        let read_end = len - MIN_MATCH;
        let mut pos = 0usize;

        while pos < read_end {
            progress(pos, len);

            let h = self.hash(src[pos], src[pos + 1], src[pos + 2]);
            let candidate = self.hash_table[h];
            self.hash_table[h] = pos as i64;

            let is_match = candidate >= 0
                && (pos as i64) > candidate
                && (pos as i64 - candidate) as u32 <= self.window
                && src[candidate as usize..candidate as usize + MIN_MATCH]
                    == src[pos..pos + MIN_MATCH];

            if is_match {
                let match_start = candidate as usize;
                let mut match_len = MIN_MATCH;
                let mut p = pos + MIN_MATCH;
                let mut m = match_start + MIN_MATCH;
                while p < len && match_len < MAX_MATCH && src[p] == src[m] {
                    p += 1;
                    m += 1;
                    match_len += 1;
                }
                tokens.push(Token::Copy {
                    distance: (pos - match_start) as u32,
                    length: match_len as u32,
                });
                pos = p;
            } else {
                tokens.push(Token::Literal(src[pos]));
                pos += 1;
            }
        }

        // Tail shorter than MIN_MATCH: always literals.
        while pos < len {
            tokens.push(Token::Literal(src[pos]));
            pos += 1;
        }

        progress(len, len);
        tokens
    }
}
