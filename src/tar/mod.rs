//! ustar reading and writing, built on [`header`]'s record layout.

pub mod header;
pub mod reader;
pub mod writer;

pub use header::{Header, TypeFlag, RECORD_SIZE};
