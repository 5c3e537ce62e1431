//! Error taxonomy and propagation: one flat enum covering codec, storage,
//! and tar-callback failures.
//!
//! No `thiserror`/`anyhow` dependency: a hand-rolled enum with manual
//! `Display` and (under the `std` feature) `std::error::Error` impls.

use alloc::boxed::Box;
use core::fmt;

/// The error taxonomy this crate's operations can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrKind {
    /// No error. Used only as a placeholder return in a few C-equivalence
    /// tables; never constructed by this crate's own operations.
    Ok,
    /// Storage adapter `open`/`stat`/`mkdir_parents`/`remove` failed.
    FsError,
    /// A `read`/`write` on an octet stream failed or the caller cancelled
    /// via its callback.
    StreamError,
    /// A firmware-update sink reported it never reached `is_finished()`.
    UpdateIncomplete,
    /// Sector/block arithmetic invariant violated while streaming
    /// `.tar.gz` in dictionary mode.
    GzDeflateFail,
    /// The gzip framer could not read or validate the source.
    GzReadFail,
    /// A tar entry path exceeds what `name`/`prefix` can encode.
    FilenameTooLong,
    /// The storage adapter reported the destination filesystem is full.
    FsFull,
    /// A sink `write` did not accept the full buffer it was given.
    WriteError,
    /// Optional tar-reader verification: written size didn't match the
    /// header.
    ReadSizeError,
    /// Not enough memory for the requested dictionary/sector allocation.
    HeapTooLow,
    /// Sink-reflective INFLATE was requested against a sink that cannot
    /// satisfy `read_emitted` (e.g. the tar reader, which is not seekable).
    NeedsDictionary,
    /// A tar header record failed to parse (magic/octal fields).
    ParseHeaderFailed,
    /// An allocation failed (sector buffer, dictionary window, hash table).
    MallocFail,
    /// A declared size (gzip ISIZE, tar entry size, frame original-size
    /// parameter) disagreed with what was actually produced/consumed.
    IntegrityFail,
    /// Bad gzip/DEFLATE header: wrong magic, unsupported method, or a file
    /// shorter than the fixed header+trailer size.
    InvalidFile,
    /// Malformed DEFLATE block (bad BTYPE, bad Huffman code, bad stored
    /// block length complement, back-reference past window start).
    DataError,
    /// Adler-32 or CRC-32 trailer mismatch.
    ChecksumError,
    /// A zlib preset dictionary was requested; this core does not support
    /// zlib preset dictionaries.
    DictError,
    /// A tar `data_cb` callback returned an error.
    TarDataCbFail,
    /// A tar `header_cb` callback returned an error.
    TarHeaderCbFail,
    /// A tar `end_cb` callback returned an error.
    TarFooterCbFail,
    /// Reading a 512-byte tar record from the source failed or was short.
    TarReadBlockFail,
    /// Translating a raw tar header into its logical form failed (bad
    /// numeric field encoding).
    TarHeaderTransFail,
    /// Parsing the raw 512-byte tar header block itself failed.
    TarHeaderParseFail,
}

impl ErrKind {
    /// Human-readable name, used by both `Display` and tests that assert on
    /// error identity without matching the enum directly.
    pub const fn name(self) -> &'static str {
        match self {
            ErrKind::Ok => "Ok",
            ErrKind::FsError => "FsError",
            ErrKind::StreamError => "StreamError",
            ErrKind::UpdateIncomplete => "UpdateIncomplete",
            ErrKind::GzDeflateFail => "GzDeflateFail",
            ErrKind::GzReadFail => "GzReadFail",
            ErrKind::FilenameTooLong => "FilenameTooLong",
            ErrKind::FsFull => "FsFull",
            ErrKind::WriteError => "WriteError",
            ErrKind::ReadSizeError => "ReadSizeError",
            ErrKind::HeapTooLow => "HeapTooLow",
            ErrKind::NeedsDictionary => "NeedsDictionary",
            ErrKind::ParseHeaderFailed => "ParseHeaderFailed",
            ErrKind::MallocFail => "MallocFail",
            ErrKind::IntegrityFail => "IntegrityFail",
            ErrKind::InvalidFile => "InvalidFile",
            ErrKind::DataError => "DataError",
            ErrKind::ChecksumError => "ChecksumError",
            ErrKind::DictError => "DictError",
            ErrKind::TarDataCbFail => "TarDataCbFail",
            ErrKind::TarHeaderCbFail => "TarHeaderCbFail",
            ErrKind::TarFooterCbFail => "TarFooterCbFail",
            ErrKind::TarReadBlockFail => "TarReadBlockFail",
            ErrKind::TarHeaderTransFail => "TarHeaderTransFail",
            ErrKind::TarHeaderParseFail => "TarHeaderParseFail",
        }
    }

    /// Whether this kind is recoverable: `IntegrityFail` leaves a usable
    /// (if short) file on disk; everything else that reaches this check is
    /// treated as non-recoverable by the pipeline (it still enters
    /// `Failed`, but the caller can tell the two apart when deciding
    /// whether to keep partial output).
    pub const fn is_recoverable(self) -> bool {
        matches!(self, ErrKind::IntegrityFail)
    }
}

impl fmt::Display for ErrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An [`ErrKind`] plus an optional underlying cause from the storage
/// adapter or another collaborator.
///
/// The source is type-erased rather than fixed to `std::io::Error` so that
/// a `no_std` + `alloc` storage adapter can still thread its own error type
/// through without this crate depending on `std::io`.
pub struct Error {
    kind: ErrKind,
    #[cfg(feature = "std")]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Construct an error with no underlying cause.
    pub const fn new(kind: ErrKind) -> Self {
        Error {
            kind,
            #[cfg(feature = "std")]
            source: None,
        }
    }

    /// Construct an error wrapping a collaborator's own error as the cause.
    #[cfg(feature = "std")]
    pub fn with_source(
        kind: ErrKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// The taxonomy kind this error carries.
    pub const fn kind(&self) -> ErrKind {
        self.kind
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error").field("kind", &self.kind).finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<ErrKind> for Error {
    fn from(kind: ErrKind) -> Self {
        Error::new(kind)
    }
}

/// Firmware-update sink errors, mapped from the sink's own integer codes by
/// subtracting a fixed offset. The sink implementation owns the offset
/// convention; this wraps whatever it reports as an opaque code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateErr(pub i32);

impl fmt::Display for UpdateErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "firmware update sink error (code {})", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UpdateErr {}
