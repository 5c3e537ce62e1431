//! ustar entry writer: header synthesis, data streaming, EOF records, and
//! the size pre-scan used for progress reporting.
//!
//! Consumes an already-planned, owned list of entries rather than walking
//! a filesystem itself — a storage adapter's `enumerate` is a lazy,
//! non-restartable sequence, so the orchestrator snapshots it into
//! `Vec<EntryPlan>` before sizing or writing.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::Error;
use crate::storage::Sink;

use super::header::{self, RECORD_SIZE};

/// One planned tar entry: either a directory (no contents) or a regular
/// file with its full contents already resident. The pipeline is
/// responsible for producing this list from a real filesystem walk (or a
/// caller-supplied plan); this module knows nothing about `enumerate`
/// itself.
#[derive(Debug, Clone)]
pub struct EntryPlan {
    pub archive_path: String,
    pub is_dir: bool,
    pub size: u64,
    pub mtime: u64,
    pub contents: Option<Vec<u8>>,
}

/// Tight upper bound on the archive size this plan will produce:
/// `Σ(512 + ⌈size/512⌉·512) + 1024`.
pub fn predicted_size(entries: &[EntryPlan]) -> u64 {
    let mut total: u64 = 1024; // two EOF records
    for e in entries {
        let size = if e.is_dir { 0 } else { e.size };
        let data_blocks = (size + RECORD_SIZE as u64 - 1) / RECORD_SIZE as u64;
        total += RECORD_SIZE as u64 + data_blocks * RECORD_SIZE as u64;
    }
    total
}

/// Write every entry's header (and, for files, its padded data blocks)
/// followed by the two zero-record EOF marker, reporting actual bytes
/// written back to the caller for the predicted-vs-actual invariant check.
pub fn write_entries(entries: &[EntryPlan], sink: &mut dyn Sink) -> Result<u64, Error> {
    let mut written: u64 = 0;

    for entry in entries {
        let raw = header::build(&entry.archive_path, entry.is_dir, entry.size, entry.mtime)?;
        sink.write(&raw)?;
        written += RECORD_SIZE as u64;

        if !entry.is_dir {
            let contents = entry.contents.as_deref().unwrap_or(&[]);
            let mut offset = 0usize;
            while offset < contents.len() {
                let chunk_len = (contents.len() - offset).min(RECORD_SIZE);
                let mut block = [0u8; RECORD_SIZE];
                block[..chunk_len].copy_from_slice(&contents[offset..offset + chunk_len]);
                sink.write(&block)?;
                written += RECORD_SIZE as u64;
                offset += chunk_len;
            }
        }
    }

    let zero = [0u8; RECORD_SIZE];
    sink.write(&zero)?;
    sink.write(&zero)?;
    written += 2 * RECORD_SIZE as u64;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::VecSink;

    #[test]
    fn predicted_size_matches_actual_for_mixed_entries() {
        let entries = [
            EntryPlan {
                archive_path: "./d/".into(),
                is_dir: true,
                size: 0,
                mtime: 0,
                contents: None,
            },
            EntryPlan {
                archive_path: "./f".into(),
                is_dir: false,
                size: 3,
                mtime: 0,
                contents: Some(alloc::vec![1, 2, 3]),
            },
        ];
        let predicted = predicted_size(&entries);

        let mut out = Vec::new();
        let mut sink = VecSink::new(&mut out);
        let actual = write_entries(&entries, &mut sink).unwrap();

        assert_eq!(predicted, actual);
        assert_eq!(out.len() as u64, actual);
    }

    #[test]
    fn single_file_with_short_content_pads_final_block() {
        let entries = [EntryPlan {
            archive_path: "./f".into(),
            is_dir: false,
            size: 3,
            mtime: 0,
            contents: Some(alloc::vec![0x01, 0x02, 0x03]),
        }];
        let mut out = Vec::new();
        let mut sink = VecSink::new(&mut out);
        write_entries(&entries, &mut sink).unwrap();

        assert_eq!(out.len(), 2048);
        assert_eq!(&out[0..3], b"./f");
        assert_eq!(&out[512..515], &[0x01, 0x02, 0x03]);
        assert!(out[515..1024].iter().all(|&b| b == 0));
        assert!(out[1024..2048].iter().all(|&b| b == 0));
    }

    #[test]
    fn exact_multiple_of_512_has_no_extra_padding_block() {
        let contents = alloc::vec![9u8; 512];
        let entries = [EntryPlan {
            archive_path: "f".into(),
            is_dir: false,
            size: 512,
            mtime: 0,
            contents: Some(contents),
        }];
        let mut out = Vec::new();
        let mut sink = VecSink::new(&mut out);
        write_entries(&entries, &mut sink).unwrap();
        // header + exactly one data block + two EOF records.
        assert_eq!(out.len(), RECORD_SIZE * 4);
    }
}
