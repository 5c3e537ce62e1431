//! ustar entry reader: parses headers, dispatches per-entry callbacks, and
//! keeps 512-byte block alignment for skipped/filtered entries.
//!
//! Adapted to this crate's own `storage::Source` trait instead of a global
//! read callback.

use crate::error::{ErrKind, Error};
use crate::storage::Source;

use super::header::{self, Header, TypeFlag, RECORD_SIZE};

/// Per-entry callback set. Any callback returning `Err` aborts the whole
/// read with that error.
pub struct ReaderCallbacks<'a> {
    pub header_cb: &'a mut dyn FnMut(&Header) -> Result<(), Error>,
    pub data_cb: &'a mut dyn FnMut(&Header, &[u8], usize) -> Result<(), Error>,
    pub end_cb: &'a mut dyn FnMut(&Header) -> Result<(), Error>,
    /// Evaluated before `include`; a `true` denies the entry.
    pub exclude: Option<&'a mut dyn FnMut(&Header) -> bool>,
    /// A `false` denies the entry.
    pub include: Option<&'a mut dyn FnMut(&Header) -> bool>,
    /// Optional slow-path verification, run once per admitted regular-file
    /// entry right after `end_cb` returns. The closure owns whatever
    /// `FsAdapter`/sink handle it needs to re-`stat` the file it just
    /// wrote and is expected to return `WriteError` (file missing),
    /// `ReadSizeError` (size mismatch), or `FsError` (stat itself failed)
    /// per §4.7's optional verification. Skipped for directories and for
    /// entries the `exclude`/`include` filters denied.
    pub verify: Option<&'a mut dyn FnMut(&Header) -> Result<(), Error>>,
    /// Optional per-entry status report: `(name, entry_size,
    /// total_bytes_so_far)`, raised once per admitted regular-file entry
    /// after `verify`. `total_bytes_so_far` is the running sum of admitted
    /// regular-file sizes, this entry included.
    pub progress: Option<&'a mut dyn FnMut(&str, u64, u64)>,
}

fn read_record(src: &mut dyn Source) -> Result<[u8; RECORD_SIZE], Error> {
    let mut buf = [0u8; RECORD_SIZE];
    let mut filled = 0;
    while filled < RECORD_SIZE {
        let n = src.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(Error::new(ErrKind::TarReadBlockFail));
        }
        filled += n;
    }
    Ok(buf)
}

fn is_admitted(header: &Header, callbacks: &mut ReaderCallbacks) -> bool {
    if let Some(exclude) = callbacks.exclude.as_deref_mut() {
        if exclude(header) {
            return false;
        }
    }
    if let Some(include) = callbacks.include.as_deref_mut() {
        if !include(header) {
            return false;
        }
    }
    true
}

/// Drive the reader over `src` until the two-zero-record EOF marker,
/// dispatching `callbacks` for every entry found.
pub fn read_entries(src: &mut dyn Source, callbacks: &mut ReaderCallbacks) -> Result<(), Error> {
    let mut total_so_far: u64 = 0;
    loop {
        let record = read_record(src)?;
        if header::is_zero_record(&record) {
            let next = read_record(src)?;
            if header::is_zero_record(&next) {
                return Ok(());
            }
            return Err(Error::new(ErrKind::TarHeaderParseFail));
        }

        let entry = header::parse(&record)?;
        (callbacks.header_cb)(&entry)?;

        let admitted = is_admitted(&entry, callbacks) && entry.typeflag.is_processed();

        let num_blocks = (entry.size + RECORD_SIZE as u64 - 1) / RECORD_SIZE as u64;
        for i in 0..num_blocks {
            let block = read_record(src)?;
            let is_last = i + 1 == num_blocks;
            let len = if is_last {
                let rem = entry.size % RECORD_SIZE as u64;
                if rem == 0 {
                    RECORD_SIZE
                } else {
                    rem as usize
                }
            } else {
                RECORD_SIZE
            };
            if admitted && matches!(entry.typeflag, TypeFlag::Regular) {
                (callbacks.data_cb)(&entry, &block, len)?;
            }
        }

        (callbacks.end_cb)(&entry)?;

        if admitted && matches!(entry.typeflag, TypeFlag::Regular) {
            if let Some(verify) = callbacks.verify.as_deref_mut() {
                verify(&entry)?;
            }
            total_so_far += entry.size;
            if let Some(progress) = callbacks.progress.as_deref_mut() {
                progress(&entry.full_path(), entry.size, total_so_far);
            }
        }
    }
}
