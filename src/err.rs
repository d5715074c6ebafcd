use std::{error::Error as ErrorTrait, fmt::{self, Display}, io, path::{Path, PathBuf}};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Header plus payloads do not fit in the fixed archive size
    #[error("archive needs {required} bytes but capacity is {capacity}")]
    CapacityOverflow {
        required: u64,
        capacity: u64,
    },
    #[error(transparent)]
    Stream(#[from] io::Error),
    #[error("invalid index: {0}")]
    InvalidIndex(Box<str>),
    #[error("no entry {index}, archive has {count}")]
    NoSuchEntry {
        index: usize,
        count: usize,
    },
}

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> Self {
        let path = path.as_ref().to_owned();
        move |source| Error::Io { path, source }
    }
    /// Attaches `path` to an error that came from a bare stream
    pub(crate) fn at(self, path: &Path) -> Self {
        match self {
            Error::Stream(source) => Error::Io { path: path.to_owned(), source },
            e => e,
        }
    }
    pub(crate) fn invalid(reason: impl Into<Box<str>>) -> Self {
        Error::InvalidIndex(reason.into())
    }
    /// Displays this error followed by every source below it, `: `-separated
    pub fn report(&self) -> Report<'_> {
        Report(self)
    }
    /// The underlying `io::ErrorKind`, if this came from the filesystem
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io { source, .. } | Error::Stream(source) => Some(source.kind()),
            _ => None,
        }
    }
}

pub struct Report<'a>(&'a Error);

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        let mut cur = self.0.source();
        while let Some(e) = cur {
            write!(f, ": {e}")?;
            cur = e.source();
        }

        Ok(())
    }
}
