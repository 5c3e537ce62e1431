// config.rs — compile-time configuration constants.
// Named constants with a provenance comment instead of bare magic numbers.

/// One tar record. Invariant: every read/write against the tar stream
/// happens in multiples of this.
pub const TAR_BLOCK_SIZE: usize = 512;

/// Default sector buffer size, a multiple of [`TAR_BLOCK_SIZE`].
pub const DEFAULT_SECTOR_SIZE: usize = 4096;

/// `DEFAULT_SECTOR_SIZE / TAR_BLOCK_SIZE`, how many tar blocks fill one
/// sector.
pub const DEFAULT_SECTOR_BLOCKS: usize = DEFAULT_SECTOR_SIZE / TAR_BLOCK_SIZE;

/// Maximum DEFLATE back-reference window: the fixed 32 KiB dictionary.
pub const WINDOW_SIZE: usize = 32 * 1024;

/// Default LZ77 hash table width in bits.
pub const DEFAULT_HASH_BITS: u32 = 12;

/// `1 << DEFAULT_HASH_BITS` hash bucket count.
pub const DEFAULT_HASH_SIZE: usize = 1 << DEFAULT_HASH_BITS;

/// Minimum LZ77 match length.
pub const MIN_MATCH: usize = 3;

/// Maximum LZ77 match length, the largest length the DEFLATE length
/// alphabet (RFC 1951 §3.2.5, code 285) can encode in one symbol.
pub const MAX_MATCH: usize = 258;

/// Default read timeout for network-backed storage sources.
pub const DEFAULT_NETWORK_READ_TIMEOUT_MS: u32 = 10_000;

/// Default read timeout for local storage sources.
pub const DEFAULT_LOCAL_READ_TIMEOUT_MS: u32 = 100;

/// gzip fixed header size in bytes.
pub const GZIP_HEADER_SIZE: usize = 10;

/// gzip trailer size in bytes: CRC32 + ISIZE, both little-endian.
pub const GZIP_TRAILER_SIZE: usize = 8;

/// Minimum valid gzip file size: header + trailer with an empty DEFLATE
/// stream is never shorter than this.
pub const GZIP_MIN_FILE_SIZE: usize = GZIP_HEADER_SIZE + GZIP_TRAILER_SIZE;
