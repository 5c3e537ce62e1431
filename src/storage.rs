//! The only interface this core requires from its host: abstract octet
//! source/sink plus a small filesystem-adapter capability set, each
//! expressed as a trait rather than a set of function pointers.
//!
//! No concrete filesystem adapter ships here — real filesystems are kept
//! an external collaborator. [`MemoryFs`] is the ambient test double that
//! lets `tests/` exercise the pipeline without touching a real disk.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::Error;

/// An abstract byte source: "read up to `buf.len()`, return count or
/// end-of-stream". Never seekable.
pub trait Source {
    /// Read into `buf`, returning the number of bytes read. `Ok(0)` means
    /// end-of-stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;
}

/// An abstract byte sink: "write `buf`, return count or failure". A sink
/// that doesn't accept the full buffer is a `WriteError` at the call
/// site, not a partial-write contract the caller must loop on.
pub trait Sink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;
}

/// Metadata returned by [`FsAdapter::stat`].
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub is_dir: bool,
    pub size: u64,
    pub mtime: u64,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
}

/// One entry yielded by [`FsAdapter::enumerate`]. The sequence is finite
/// and not restartable — callers that need to pass over it twice (the
/// directory-walker size pre-scan) must snapshot it into an owned `Vec`
/// first.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
}

/// `open` mode: read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// Filesystem adapter capability set. An implementor supplies a
/// concrete `Handle` type (e.g. a file descriptor, an in-memory cursor);
/// the core only ever holds it opaquely.
pub trait FsAdapter {
    type Handle;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::Handle, Error>;
    fn close(&mut self, handle: Self::Handle) -> Result<(), Error>;
    fn read(&mut self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize, Error>;
    fn write(&mut self, handle: &mut Self::Handle, buf: &[u8]) -> Result<usize, Error>;
    fn stat(&mut self, path: &str) -> Result<Stat, Error>;
    fn exists(&mut self, path: &str) -> bool;
    fn mkdir_parents(&mut self, path: &str) -> Result<(), Error>;
    fn remove(&mut self, path: &str) -> Result<(), Error>;
    /// `levels` caps recursion depth below `dir` (`1` = immediate children
    /// only, `None` = unbounded); ignored when `recursive` is `false`.
    fn enumerate(
        &mut self,
        dir: &str,
        recursive: bool,
        levels: Option<u32>,
    ) -> Result<Vec<DirEntry>, Error>;

    /// Optional pre-flight hooks; default to "unknown".
    fn total_bytes(&mut self) -> Option<u64> {
        None
    }
    fn free_bytes(&mut self) -> Option<u64> {
        None
    }
}

/// Firmware-update sink, entirely optional and independent of
/// any real flashing library — the pipeline only ever calls through this
/// trait.
pub trait UpdateSink {
    fn begin(&mut self, size_hint: Option<u64>) -> Result<(), Error>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;
    fn end(&mut self, finalize: bool) -> Result<(), Error>;
    fn is_finished(&self) -> bool;
    fn restart(&mut self) -> Result<(), Error>;
}

/// A `Source`/`Sink` over an in-memory byte slice/buffer, used both as a
/// `MemoryFs` file handle and standalone in unit tests.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }
}

impl<'a> Source for SliceSource<'a> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let remaining = self.data.len() - self.pos;
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

pub struct VecSink<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> VecSink<'a> {
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        VecSink { out }
    }
}

impl<'a> Sink for VecSink<'a> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.out.extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// An in-memory filesystem test double implementing [`FsAdapter`] over a
/// `path -> bytes` map plus a separate directory set, so `tests/` can drive
/// whole pipeline scenarios without real disk I/O.
#[derive(Default)]
pub struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
    dirs: alloc::collections::BTreeSet<String>,
}

/// A read or write cursor into a [`MemoryFs`] entry.
pub enum MemoryHandle {
    Read { path: String, pos: usize },
    Write { path: String, buf: Vec<u8> },
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_file(&mut self, path: &str, contents: Vec<u8>) {
        self.files.insert(path.to_string(), contents);
    }

    pub fn put_dir(&mut self, path: &str) {
        self.dirs.insert(path.to_string());
    }

    pub fn get_file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }
}

impl FsAdapter for MemoryFs {
    type Handle = MemoryHandle;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::Handle, Error> {
        match mode {
            OpenMode::Read => {
                if !self.files.contains_key(path) {
                    return Err(Error::new(crate::error::ErrKind::FsError));
                }
                Ok(MemoryHandle::Read {
                    path: path.to_string(),
                    pos: 0,
                })
            }
            OpenMode::Write => Ok(MemoryHandle::Write {
                path: path.to_string(),
                buf: Vec::new(),
            }),
        }
    }

    fn close(&mut self, handle: Self::Handle) -> Result<(), Error> {
        if let MemoryHandle::Write { path, buf } = handle {
            self.files.insert(path, buf);
        }
        Ok(())
    }

    fn read(&mut self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize, Error> {
        match handle {
            MemoryHandle::Read { path, pos } => {
                let data = self
                    .files
                    .get(path)
                    .ok_or_else(|| Error::new(crate::error::ErrKind::FsError))?;
                let remaining = data.len() - *pos;
                let n = remaining.min(buf.len());
                buf[..n].copy_from_slice(&data[*pos..*pos + n]);
                *pos += n;
                Ok(n)
            }
            MemoryHandle::Write { .. } => Err(Error::new(crate::error::ErrKind::FsError)),
        }
    }

    fn write(&mut self, handle: &mut Self::Handle, buf: &[u8]) -> Result<usize, Error> {
        match handle {
            MemoryHandle::Write { buf: out, .. } => {
                out.extend_from_slice(buf);
                Ok(buf.len())
            }
            MemoryHandle::Read { .. } => Err(Error::new(crate::error::ErrKind::FsError)),
        }
    }

    fn stat(&mut self, path: &str) -> Result<Stat, Error> {
        if let Some(data) = self.files.get(path) {
            return Ok(Stat {
                is_dir: false,
                size: data.len() as u64,
                mtime: 0,
                uid: 0,
                gid: 0,
                mode: 0o755,
            });
        }
        if self.dirs.contains(path) {
            return Ok(Stat {
                is_dir: true,
                size: 0,
                mtime: 0,
                uid: 0,
                gid: 0,
                mode: 0o755,
            });
        }
        Err(Error::new(crate::error::ErrKind::FsError))
    }

    fn exists(&mut self, path: &str) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn mkdir_parents(&mut self, path: &str) -> Result<(), Error> {
        self.dirs.insert(path.to_string());
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), Error> {
        self.files.remove(path);
        self.dirs.remove(path);
        Ok(())
    }

    fn enumerate(
        &mut self,
        dir: &str,
        recursive: bool,
        levels: Option<u32>,
    ) -> Result<Vec<DirEntry>, Error> {
        let prefix = if dir.ends_with('/') {
            dir.to_string()
        } else {
            alloc::format!("{}/", dir)
        };
        // depth 1 == immediate child; a `rest` with `d` separators sits at
        // depth `d + 1` below `dir`.
        let within_levels = |rest: &str| match levels {
            Some(max) => rest.matches('/').count() as u32 + 1 <= max,
            None => true,
        };
        let mut out = Vec::new();
        for (path, data) in self.files.iter() {
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                if !recursive && rest.contains('/') {
                    continue;
                }
                if recursive && !within_levels(rest) {
                    continue;
                }
                out.push(DirEntry {
                    path: path.clone(),
                    is_dir: false,
                    size: data.len() as u64,
                });
            }
        }
        for path in self.dirs.iter() {
            if path == &prefix.trim_end_matches('/').to_string() {
                continue;
            }
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                let rest = rest.trim_end_matches('/');
                if !recursive && rest.contains('/') {
                    continue;
                }
                if recursive && !within_levels(rest) {
                    continue;
                }
                out.push(DirEntry {
                    path: path.clone(),
                    is_dir: true,
                    size: 0,
                });
            }
        }
        Ok(out)
    }
}

/// Adapts a [`MemoryFs`] write handle into a [`Sink`].
pub struct MemoryFsSink<'a> {
    fs: &'a mut MemoryFs,
    handle: MemoryHandle,
}

impl<'a> MemoryFsSink<'a> {
    pub fn create(fs: &'a mut MemoryFs, path: &str) -> Result<Self, Error> {
        let handle = fs.open(path, OpenMode::Write)?;
        Ok(MemoryFsSink { fs, handle })
    }

    pub fn finish(self) -> Result<(), Error> {
        self.fs.close(self.handle)
    }
}

impl<'a> Sink for MemoryFsSink<'a> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.fs.write(&mut self.handle, buf)
    }
}

/// A boxed, erased sink, used where the pipeline needs to choose between a
/// file sink and an [`UpdateSink`] adapter at runtime without generics
/// leaking into its public API.
pub type DynSink<'a> = Box<dyn Sink + 'a>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_fs_write_then_read_round_trips() {
        let mut fs = MemoryFs::new();
        {
            let mut sink = MemoryFsSink::create(&mut fs, "/a/b.txt").unwrap();
            sink.write(b"hello").unwrap();
            sink.finish().unwrap();
        }
        assert_eq!(fs.get_file("/a/b.txt"), Some(b"hello".as_slice()));
        assert!(fs.exists("/a/b.txt"));
    }

    #[test]
    fn enumerate_lists_immediate_children_only_when_not_recursive() {
        let mut fs = MemoryFs::new();
        fs.put_file("/dir/a.txt", b"a".to_vec());
        fs.put_file("/dir/sub/b.txt", b"b".to_vec());
        fs.put_dir("/dir/sub");

        let shallow = fs.enumerate("/dir", false, None).unwrap();
        assert!(shallow.iter().any(|e| e.path == "/dir/a.txt"));
        assert!(!shallow.iter().any(|e| e.path == "/dir/sub/b.txt"));

        let deep = fs.enumerate("/dir", true, None).unwrap();
        assert!(deep.iter().any(|e| e.path == "/dir/sub/b.txt"));
    }

    #[test]
    fn enumerate_levels_bounds_recursion_depth() {
        let mut fs = MemoryFs::new();
        fs.put_file("/dir/a.txt", b"a".to_vec());
        fs.put_file("/dir/sub/b.txt", b"b".to_vec());
        fs.put_dir("/dir/sub");

        let one_level = fs.enumerate("/dir", true, Some(1)).unwrap();
        assert!(one_level.iter().any(|e| e.path == "/dir/a.txt"));
        assert!(!one_level.iter().any(|e| e.path == "/dir/sub/b.txt"));

        let two_levels = fs.enumerate("/dir", true, Some(2)).unwrap();
        assert!(two_levels.iter().any(|e| e.path == "/dir/sub/b.txt"));
    }

    #[test]
    fn slice_source_reports_eof_via_zero_read() {
        let data = [1u8, 2, 3];
        let mut src = SliceSource::new(&data);
        let mut buf = [0u8; 8];
        assert_eq!(src.read(&mut buf).unwrap(), 3);
        assert_eq!(src.read(&mut buf).unwrap(), 0);
    }
}
