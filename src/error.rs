//! Error types for the normalization pipeline and the file commit step.
//!
//! Pure pipeline stages only ever fail with [`FormatInconsistency`]. Anything
//! that touches a real file is reported as a [`FormatError`], which carries the
//! original path so the batch report can name the file.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline position at which a working filename was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Raw basename, before any transformation.
    RawInput,
    /// Splitting on the artist/title divider.
    Divider,
    /// After ad stripping and separator normalization.
    PreAlias,
    /// Canonical result, after alias resolution.
    Final,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Checkpoint::RawInput => "raw input",
            Checkpoint::Divider => "artist/title divider",
            Checkpoint::PreAlias => "pre-alias validation",
            Checkpoint::Final => "final validation",
        };
        f.write_str(name)
    }
}

/// A working filename failed the grammar at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{filename}' does not match the expected format ({checkpoint})")]
pub struct FormatInconsistency {
    pub filename: String,
    pub checkpoint: Checkpoint,
}

impl FormatInconsistency {
    pub fn new(filename: impl Into<String>, checkpoint: Checkpoint) -> Self {
        Self {
            filename: filename.into(),
            checkpoint,
        }
    }
}

/// Reported error categories, one per row of the batch failure list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FormatInconsistency,
    CorruptFile,
    IoFailure,
    UnknownFormattingFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::FormatInconsistency => "format inconsistency",
            ErrorKind::CorruptFile => "corrupt file",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::UnknownFormattingFailure => "unknown formatting failure",
        };
        f.write_str(label)
    }
}

/// Per-file failure.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("{}: {source}", path.display())]
    Inconsistent {
        path: PathBuf,
        #[source]
        source: FormatInconsistency,
    },

    #[error("{}: cannot parse audio tags: {message}", path.display())]
    CorruptFile { path: PathBuf, message: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: destination already exists: {}", path.display(), destination.display())]
    DestinationExists { path: PathBuf, destination: PathBuf },

    #[error("{}: {message}", path.display())]
    Unknown { path: PathBuf, message: String },
}

impl FormatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::Inconsistent { .. } => ErrorKind::FormatInconsistency,
            FormatError::CorruptFile { .. } => ErrorKind::CorruptFile,
            FormatError::Io { .. } | FormatError::DestinationExists { .. } => ErrorKind::IoFailure,
            FormatError::Unknown { .. } => ErrorKind::UnknownFormattingFailure,
        }
    }

    /// Original path of the file that failed.
    pub fn path(&self) -> &PathBuf {
        match self {
            FormatError::Inconsistent { path, .. }
            | FormatError::CorruptFile { path, .. }
            | FormatError::Io { path, .. }
            | FormatError::DestinationExists { path, .. }
            | FormatError::Unknown { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let path = PathBuf::from("/music/a.mp3");
        let inconsistent = FormatError::Inconsistent {
            path: path.clone(),
            source: FormatInconsistency::new("a.mp3", Checkpoint::RawInput),
        };
        assert_eq!(inconsistent.kind(), ErrorKind::FormatInconsistency);

        let exists = FormatError::DestinationExists {
            path: path.clone(),
            destination: PathBuf::from("/music/b.mp3"),
        };
        assert_eq!(exists.kind(), ErrorKind::IoFailure);
        assert_eq!(exists.path(), &path);
    }

    #[test]
    fn test_display_names_checkpoint() {
        let err = FormatInconsistency::new("Bad:Name_-_Title.mp3", Checkpoint::RawInput);
        let text = err.to_string();
        assert!(text.contains("Bad:Name_-_Title.mp3"));
        assert!(text.contains("raw input"));
    }
}
