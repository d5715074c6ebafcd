use std::{fs::{self, File}, io::{BufWriter, Read, Write}, path::{Path, PathBuf}};

use tracing::{debug, info};

use crate::{err::{Error, Result}, format::{header_size, ArchiveIndex, DEFAULT_CAPACITY}};

const OBJECT_SUFFIX: &[u8] = b".o";
pub const DEFAULT_SOURCE_DIR: &str = ".";
pub const DEFAULT_OUTPUT: &str = "output/apps.bin";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryOrder {
    /// Whatever order the directory listing yields
    #[default]
    Listing,
    /// Lexicographic by file name, for reproducible archives
    Sorted,
}

/// Finds every regular file in `dir` whose name ends with `.o`
pub fn discover_inputs<P: AsRef<Path>>(dir: P, order: DiscoveryOrder) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut inputs = Vec::new();

    for dir_entry in fs::read_dir(dir).map_err(Error::io(dir))? {
        let dir_entry = dir_entry.map_err(Error::io(dir))?;
        if !dir_entry.file_name().as_encoded_bytes().ends_with(OBJECT_SUFFIX) {
            continue;
        }

        let path = dir_entry.path();
        // follows symlinks, a link to an object file is still an object file
        let metadata = fs::metadata(&path).map_err(Error::io(&path))?;
        if !metadata.is_file() {
            debug!("skipping {}, not a regular file", path.display());
            continue;
        }
        inputs.push(path);
    }

    if order == DiscoveryOrder::Sorted {
        inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }

    info!(count = inputs.len(), "discovered inputs: {:?}", inputs);

    Ok(inputs)
}

/// Writes the index and the contents of `inputs` into `output`, which ends
/// up exactly `capacity` bytes long.
///
/// Inputs are read in full before the output is opened, so a capacity
/// overflow or an unreadable input leaves any existing `output` untouched.
/// A failure while writing can still leave a partial archive behind.
pub fn build_archive<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q, capacity: u64) -> Result<ArchiveIndex> {
    let output = output.as_ref();

    let mut required = header_size(inputs.len() as u64).unwrap_or(u64::MAX);
    if required > capacity {
        return Err(Error::CapacityOverflow { required, capacity });
    }
    info!("payloads start at offset {required}");

    let mut payloads = Vec::with_capacity(inputs.len());
    for input in inputs {
        let input = input.as_ref();
        // the length read is the size recorded, never more than the space left is read
        let remaining = capacity - required;
        let mut payload = Vec::new();
        File::open(input)
            .and_then(|f| f.take(remaining.saturating_add(1)).read_to_end(&mut payload))
            .map_err(Error::io(input))?;

        let size = payload.len() as u64;
        if size > remaining {
            // only one byte past the capacity was read, the real size is on disk
            let on_disk = fs::metadata(input).map(|m| m.len()).unwrap_or(size);
            return Err(Error::CapacityOverflow {
                required: required.saturating_add(on_disk.max(size)),
                capacity,
            });
        }
        required += size;
        payloads.push(payload);
    }

    let index = ArchiveIndex::from_sizes(payloads.iter().map(|p| p.len() as u64))?;

    let file = File::create(output).map_err(Error::io(output))?;
    file.set_len(capacity).map_err(Error::io(output))?;

    let mut out = BufWriter::new(file);
    index.write_to(&mut out).map_err(|e| e.at(output))?;
    for ((input, entry), payload) in inputs.iter().zip(&index.entries).zip(&payloads) {
        debug!(offset = entry.offset, size = entry.size, "{}", input.as_ref().display());
        out.write_all(payload).map_err(Error::io(output))?;
    }

    let file = out.into_inner().map_err(|e| Error::io(output)(e.into_error()))?;
    file.sync_all().map_err(Error::io(output))?;

    Ok(index)
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source_dir: PathBuf,
    pub output: PathBuf,
    pub capacity: u64,
    pub order: DiscoveryOrder,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            capacity: DEFAULT_CAPACITY,
            order: DiscoveryOrder::Listing,
        }
    }
}

impl BuildOptions {
    pub fn run(&self) -> Result<ArchiveIndex> {
        let inputs = discover_inputs(&self.source_dir, self.order)?;
        build_archive(&inputs, &self.output, self.capacity)
    }
}
