//! On-disk layout of an application archive.
//!
//! ```text
//! 0                count
//! 8 + 16*i         entry[i].offset, entry[i].size
//! 8 + 16*count     payloads, back to back in index order
//! ```
//!
//! Every field is a little-endian `u64`. The file itself is always
//! exactly `capacity` bytes long, trailing bytes are zero.

use std::io::{Read, Write};

use crate::err::{Error, Result};

pub const WORD_SIZE: u64 = 8;
pub const ENTRY_SIZE: u64 = 2 * WORD_SIZE;
/// 32 MiB, what the loader maps from flash
pub const DEFAULT_CAPACITY: u64 = 32 * 1024 * 1024;

/// Size of the count field plus `count` index entries
pub fn header_size(count: u64) -> Option<u64> {
    count.checked_mul(ENTRY_SIZE)?.checked_add(WORD_SIZE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub offset: u64,
    pub size: u64,
}

impl Entry {
    #[inline]
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    pub entries: Vec<Entry>,
}

impl ArchiveIndex {
    /// Lays out payloads of the given sizes contiguously right after the header
    pub fn from_sizes<I: IntoIterator<Item = u64>>(sizes: I) -> Result<Self> {
        let sizes: Vec<u64> = sizes.into_iter().collect();
        let mut offset = header_size(sizes.len() as u64)
            .ok_or_else(|| Error::invalid("too many entries"))?;

        let mut entries = Vec::with_capacity(sizes.len());
        for size in sizes {
            entries.push(Entry { offset, size });
            offset = offset.checked_add(size)
                .ok_or_else(|| Error::invalid("payloads overflow a 64-bit offset"))?;
        }

        Ok(ArchiveIndex { entries })
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.entries.len() as u64
    }
    pub fn header_size(&self) -> u64 {
        // from_sizes and read_from already rejected counts that overflow
        WORD_SIZE + ENTRY_SIZE * self.count()
    }
    /// First byte past the last payload
    pub fn payload_end(&self) -> u64 {
        self.entries
            .last()
            .map(|e| e.offset.saturating_add(e.size))
            .unwrap_or_else(|| self.header_size())
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.count().to_le_bytes())?;
        for &Entry { offset, size } in &self.entries {
            writer.write_all(&offset.to_le_bytes())?;
            writer.write_all(&size.to_le_bytes())?;
        }

        Ok(())
    }

    /// Reads the count and entries. A count above `max_count` is rejected
    /// before anything is allocated for it.
    pub fn read_from<R: Read>(mut reader: R, max_count: u64) -> Result<Self> {
        let count = read_u64(&mut reader)?;
        if count > max_count {
            return Err(Error::invalid(format!("count {count} does not fit in the archive")));
        }

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let offset = read_u64(&mut reader)?;
            let size = read_u64(&mut reader)?;
            entries.push(Entry { offset, size });
        }

        Ok(ArchiveIndex { entries })
    }

    /// Checks every entry points past the header and inside an archive of `archive_len` bytes
    pub fn validate(&self, archive_len: u64) -> Result<()> {
        let header_size = header_size(self.count())
            .ok_or_else(|| Error::invalid("too many entries"))?;
        if header_size > archive_len {
            return Err(Error::invalid("index is longer than the archive"));
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.offset < header_size {
                return Err(Error::invalid(format!("entry {i} starts inside the index")));
            }
            match entry.end() {
                Some(end) if end <= archive_len => (),
                _ => return Err(Error::invalid(format!("entry {i} runs past the end of the archive"))),
            }
        }

        Ok(())
    }
}

fn read_u64<R: Read>(mut reader: R) -> Result<u64> {
    let mut buf = [0; WORD_SIZE as usize];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_of_two() {
        assert_eq!(header_size(0), Some(8));
        assert_eq!(header_size(2), Some(40));
        assert_eq!(header_size(u64::MAX), None);
    }

    #[test]
    fn entries_are_contiguous() {
        let index = ArchiveIndex::from_sizes([4, 2, 0, 9]).unwrap();
        assert_eq!(index.entries[0].offset, 8 + 16 * 4);
        for pair in index.entries.windows(2) {
            assert_eq!(pair[1].offset, pair[0].offset + pair[0].size);
        }
        assert_eq!(index.payload_end(), 72 + 15);
    }

    #[test]
    fn empty_index_is_only_the_count() {
        let index = ArchiveIndex::from_sizes(Vec::new()).unwrap();
        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();

        assert_eq!(buf, [0; 8]);
        assert_eq!(index.payload_end(), 8);
    }

    #[test]
    fn little_endian_layout() {
        let index = ArchiveIndex::from_sizes([4, 2]).unwrap();
        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();

        let mut expected = Vec::new();
        for n in [2u64, 40, 4, 44, 2] {
            expected.extend_from_slice(&n.to_le_bytes());
        }
        assert_eq!(buf, expected);
        assert_eq!(ArchiveIndex::read_from(&buf[..], 10).unwrap(), index);
    }

    #[test]
    fn oversized_count_is_rejected() {
        let buf = u64::MAX.to_le_bytes();
        assert!(matches!(ArchiveIndex::read_from(&buf[..], 100), Err(Error::InvalidIndex(_))));
    }

    #[test]
    fn entry_outside_archive() {
        let index = ArchiveIndex { entries: vec![Entry { offset: 24, size: 10 }] };
        assert!(index.validate(34).is_ok());
        assert!(index.validate(33).is_err());

        let overlapping = ArchiveIndex { entries: vec![Entry { offset: 8, size: 1 }] };
        assert!(overlapping.validate(100).is_err());
    }
}
