use std::fmt;

/// Errors that can occur while extracting an archive.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in minor versions without breaking existing code. Always include a
/// catch-all `_ =>` arm when matching.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Archive path does not exist.
    NotFound { path: String },

    /// Archive cannot be parsed, or an entry fails its checksum.
    Corrupt(zip::result::ZipError),

    /// `schedule` was called on a background closer that is no longer
    /// accepting handles.
    NotActive,

    /// A background file close failed. Surfaced on a later `schedule`
    /// call or by `finish`, so it may concern an earlier handle than
    /// the one currently being scheduled.
    Close(std::io::Error),

    /// IO error (directory creation, file open, write).
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "archive '{}' does not exist", path)
            }
            Self::Corrupt(e) => write!(f, "corrupt archive: {}", e),
            Self::NotActive => {
                write!(f, "background closer is not accepting handles")
            }
            Self::Close(e) => write!(f, "deferred file close failed: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Corrupt(e) => Some(e),
            Self::Close(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

// Automatic conversions for ease of use
impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Corrupt(e)
    }
}
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
