//! Extraction driver.
//!
//! Walks the archive in directory order, writes each entry to disk, and
//! hands the open output handle to the [`BackgroundCloser`] instead of
//! closing it inline, so close latency overlaps the next entry's
//! decompression and write.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::archive::Archive;
use crate::closer::BackgroundCloser;
use crate::error::Error;

/// Extraction report with statistics.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Number of files written.
    pub files_extracted: usize,
    /// Number of directory placeholder entries materialized.
    pub dirs_created: usize,
    /// Total bytes written.
    pub bytes_written: u64,
}

/// Extracts a ZIP archive to disk.
///
/// Files are opened write-truncate, so existing files are always
/// overwritten.
///
/// # Example
///
/// ```no_run
/// use unzipr::Extractor;
///
/// let report = Extractor::new().destination("out").extract("archive.zip")?;
/// println!("{} files", report.files_extracted);
/// # Ok::<(), unzipr::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Extractor {
    destination: Option<PathBuf>,
}

impl Extractor {
    /// Create an extractor writing relative to the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output base directory (created on demand during extraction).
    pub fn destination<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.destination = Some(dir.into());
        self
    }

    /// Extract every entry of the archive at `archive_path`.
    ///
    /// # Errors
    ///
    /// Any failure aborts the whole run: [`Error::NotFound`] /
    /// [`Error::Corrupt`] from the archive, [`Error::Io`] from the
    /// filesystem, or [`Error::Close`] from a deferred background close.
    /// No retry and no partial-success reporting.
    pub fn extract<P: AsRef<Path>>(&self, archive_path: P) -> Result<Report, Error> {
        let mut archive = Archive::open(archive_path)?;
        let names = archive.entry_names()?;

        let closer = BackgroundCloser::new();
        let mut report = Report::default();

        for name in names {
            let data = archive.read_entry(&name)?;
            let target = self.resolve(&name);

            // Everything up to and including the final '/' is the ancestor
            // directory; create it before opening the file.
            if let Some(idx) = target.rfind('/') {
                fs::create_dir_all(&target[..=idx])?;
            }

            // Trailing '/' marks a directory placeholder: no file to write.
            if target.ends_with('/') {
                report.dirs_created += 1;
                continue;
            }

            let mut out = BufWriter::new(File::create(&target)?);
            out.write_all(&data)?;
            report.bytes_written += data.len() as u64;
            report.files_extracted += 1;

            closer.schedule(out)?;
        }

        // Waits for every scheduled handle; surfaces drain-time failures.
        closer.finish()?;
        Ok(report)
    }

    /// Effective path for an entry name, joined with '/' regardless of the
    /// platform's native separator.
    fn resolve(&self, entry: &str) -> String {
        match &self.destination {
            Some(dir) => format!("{}/{}", dir.display(), entry),
            None => entry.to_string(),
        }
    }
}
