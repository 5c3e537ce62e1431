//! Streaming `ustar` + gzip/DEFLATE core — memory-constrained, pluggable storage.
//!
//! An explicit Rust state machine over four cooperating pieces:
//!
//! | Rust module                | Responsibility                                   |
//! |-----------------------------|---------------------------------------------------|
//! | [`deflate`] / [`inflate`]  | streaming DEFLATE codec (RFC 1951)                |
//! | [`gzip`]                   | RFC 1952 container framing around the codec       |
//! | [`tar`]                    | `ustar` record reader/writer (POSIX 1003.1-1990)  |
//! | [`pipeline`]                | fuses tar + gzip through one sector buffer        |
//!
//! [`storage`] is the only interface the core requires of its host: an
//! abstract byte-oriented source/sink plus filesystem-style `stat`/`open`/
//! `enumerate`. No concrete filesystem, CLI, or firmware-flashing backend
//! ships here — see `storage::FsAdapter` / `storage::UpdateSink`.
//!
//! This crate builds on `core` + `alloc`; the `std` feature (on by default)
//! adds a `std::io::Read`/`Write` bridge on [`bitio`] and a
//! `std::error::Error` impl on [`error::Error`].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bitio;
pub mod checksum;
pub mod config;
pub mod deflate;
pub mod error;
pub mod gzip;
pub mod inflate;
pub mod lz77;
pub mod pipeline;
pub mod progress;
pub mod storage;
pub mod tar;

pub use error::{Error, ErrKind, UpdateErr};
pub use pipeline::{Pipeline, PipelineConfig, PipelineState, Scenario};
