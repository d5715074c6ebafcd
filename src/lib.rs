//! Packs object files into one fixed-size image: a little-endian `u64`
//! count, one `(offset, size)` pair per file, then the file contents.

pub mod err;
pub mod format;
pub mod build;
pub mod read;
pub mod log;

pub use crate::{
    build::{build_archive, discover_inputs, BuildOptions, DiscoveryOrder},
    err::{Error, Result},
    format::{ArchiveIndex, Entry, DEFAULT_CAPACITY},
    read::{open_archive, ArchiveReader},
};
