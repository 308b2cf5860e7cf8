//! Read-only access to ZIP archive entries.
//!
//! Thin wrapper over the `zip` crate: the container format, checksums and
//! decompression are its job. The wrapper fixes the enumeration order
//! (central directory index order) and maps failures onto [`Error`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::Error;

/// Handle over an opened ZIP container.
///
/// Accessed from a single thread; the handle owns the file position and
/// index state and lives for the whole extraction run.
pub struct Archive {
    inner: zip::ZipArchive<BufReader<File>>,
}

impl Archive {
    /// Open an archive for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the path does not exist, or
    /// [`Error::Corrupt`] if the container cannot be parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let file = File::open(path)?;
        let inner = zip::ZipArchive::new(BufReader::new(file))?;
        Ok(Self { inner })
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Entry names in central directory order.
    ///
    /// Uses raw index access so nothing is decompressed while listing.
    pub fn entry_names(&mut self) -> Result<Vec<String>, Error> {
        let mut names = Vec::with_capacity(self.inner.len());
        for i in 0..self.inner.len() {
            let entry = self.inner.by_index_raw(i)?;
            names.push(entry.name().to_string());
        }
        Ok(names)
    }

    /// Decompress and return the full content of one entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] on checksum or format failure.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, Error> {
        let mut entry = self.inner.by_name(name)?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }
}
