use std::{fs::File, io::{self, BufReader, Read, Seek, SeekFrom, Write}, path::Path};

use crate::{err::{Error, Result}, format::{ArchiveIndex, Entry, ENTRY_SIZE, WORD_SIZE}};

pub fn open_archive<P: AsRef<Path>>(path: P) -> Result<ArchiveReader<BufReader<File>>> {
    let path = path.as_ref();
    let f = BufReader::new(File::open(path).map_err(Error::io(path))?);
    ArchiveReader::new(f).map_err(|e| e.at(path))
}

/// Locates payloads through the index at the start of an archive, the way
/// the loader does once the image is in flash
pub struct ArchiveReader<F> {
    file: F,
    len: u64,
    index: ArchiveIndex,
}

impl<F: Read + Seek> ArchiveReader<F> {
    pub fn new(mut file: F) -> Result<Self> {
        let len = file.seek(SeekFrom::End(0))?;
        if len < WORD_SIZE {
            return Err(Error::invalid("archive is shorter than the count field"));
        }
        file.seek(SeekFrom::Start(0))?;

        let index = ArchiveIndex::read_from(&mut file, (len - WORD_SIZE) / ENTRY_SIZE)?;
        index.validate(len)?;

        Ok(ArchiveReader { file, len, index })
    }

    #[inline]
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.index.entries.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.entries.is_empty()
    }
    /// Length of the whole archive, padding included
    pub fn archive_len(&self) -> u64 {
        self.len
    }

    fn entry(&self, index: usize) -> Result<Entry> {
        self.index.entries
            .get(index)
            .copied()
            .ok_or(Error::NoSuchEntry { index, count: self.len() })
    }

    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self.entry(index)?;
        let size = usize::try_from(entry.size)
            .map_err(|_| Error::invalid(format!("entry {index} does not fit in memory")))?;
        let mut buf = vec![0; size];

        self.file.seek(SeekFrom::Start(entry.offset))?;
        self.file.read_exact(&mut buf)?;

        Ok(buf)
    }

    /// Streams one payload into `writer`, returning the number of bytes copied
    pub fn copy_entry<W: Write>(&mut self, index: usize, mut writer: W) -> Result<u64> {
        let entry = self.entry(index)?;

        self.file.seek(SeekFrom::Start(entry.offset))?;
        let n = io::copy(&mut (&mut self.file).take(entry.size), &mut writer)?;
        if n != entry.size {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "archive ended inside a payload").into());
        }

        Ok(n)
    }

    pub fn into_inner(self) -> F {
        self.file
    }
}
