mod archive;
mod closer;
mod error;
mod extractor;

pub use archive::Archive;
pub use closer::{BackgroundCloser, Close, QUEUE_CAPACITY, WORKER_COUNT};
pub use error::Error;
pub use extractor::{Extractor, Report};

/// Convenience function to extract an archive relative to the current
/// directory.
pub fn extract_file<P: AsRef<std::path::Path>>(archive: P) -> Result<Report, Error> {
    Extractor::new().extract(archive)
}

/// Convenience function to extract an archive into `destination`.
pub fn extract_file_to<P, D>(archive: P, destination: D) -> Result<Report, Error>
where
    P: AsRef<std::path::Path>,
    D: Into<std::path::PathBuf>,
{
    Extractor::new().destination(destination).extract(archive)
}
