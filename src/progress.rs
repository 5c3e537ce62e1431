//! Progress reporting shapes and the fatal-error policy hook (`on_fatal`).
//!
//! Two independent callback slots: a percent callback for the gzip codec
//! and a per-entry callback for the tar reader/writer (tar has no percent
//! figure because, in streaming mode, total input size is not knowable).
//! Both are `FnMut` trait objects stored on [`crate::pipeline::PipelineConfig`]
//! rather than static function pointers, so they are process-scoped but
//! replaceable and never touch global state.

use alloc::boxed::Box;

use crate::error::Error;

/// Codec-level progress: `(bytes_processed, total)`. `total` is `None` when
/// streaming from a non-seekable source whose uncompressed size cannot be
/// pre-read.
pub type CodecProgress<'a> = dyn FnMut(u64, Option<u64>) + 'a;

/// Tar-level per-entry status: `(name, entry_size, total_bytes_so_far)`.
pub type TarProgress<'a> = dyn FnMut(&str, u64, u64) + 'a;

/// Minimal log levels for the optional `on_log` slot. This core carries no
/// logging-crate dependency; a host that wants structured logging adapts
/// these calls to `log`/`tracing` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Debug,
    Verbose,
}

/// Process-scoped callback slots plus the `halt_on_error` policy bit.
/// Must be set before starting a pipeline; changing mid-operation has
/// undefined timing but must not corrupt pipeline state, since the
/// callbacks are only ever read at well-defined yield points.
#[derive(Default)]
pub struct Callbacks<'a> {
    pub on_codec_progress: Option<Box<CodecProgress<'a>>>,
    pub on_tar_progress: Option<Box<TarProgress<'a>>>,
    pub on_log: Option<Box<dyn FnMut(LogLevel, &str) + 'a>>,
    /// When `true` and [`Callbacks::on_fatal`] is set, a terminal pipeline
    /// error is routed to `on_fatal` instead of being returned to the
    /// caller. When `true` with no `on_fatal` configured, this bit is
    /// ignored and the error is returned normally.
    pub halt_on_error: bool,
    pub on_fatal: Option<Box<dyn FnMut(&Error) + 'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn new() -> Self {
        Callbacks::default()
    }

    pub(crate) fn log(&mut self, level: LogLevel, msg: &str) {
        if let Some(cb) = self.on_log.as_mut() {
            cb(level, msg);
        }
    }

    pub(crate) fn codec_progress(&mut self, done: u64, total: Option<u64>) {
        if let Some(cb) = self.on_codec_progress.as_mut() {
            cb(done, total);
        }
    }

    pub(crate) fn tar_progress(&mut self, name: &str, size: u64, total_so_far: u64) {
        if let Some(cb) = self.on_tar_progress.as_mut() {
            cb(name, size, total_so_far);
        }
    }

    /// Route a terminal error through `on_fatal` when `halt_on_error` is
    /// set and a handler is configured; otherwise a no-op, leaving the
    /// caller to propagate the `Result` normally.
    pub(crate) fn maybe_halt(&mut self, err: &Error) {
        if self.halt_on_error {
            if let Some(cb) = self.on_fatal.as_mut() {
                cb(err);
            }
        }
    }
}
