//! Writes a [`TagRecord`] into a file's tag container.

use id3::frame::ExtendedText;
use id3::{ErrorKind as Id3ErrorKind, Tag, TagLike, Version};
use std::path::Path;

use crate::error::FormatError;
use crate::metadata::TagRecord;

/// User-text frame description holding the multi-artist field.
pub const ARTISTS_FRAME: &str = "ARTISTS";

/// Tag-writing collaborator used by the commit step.
pub trait TagWriter: Sync {
    fn write_tags(&self, path: &Path, record: &TagRecord) -> Result<(), FormatError>;
}

/// ID3v2 writer for MP3 files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3TagWriter;

/// Maps an `id3` failure onto the reported error kinds.
fn classify(path: &Path, err: id3::Error) -> FormatError {
    match err.kind {
        Id3ErrorKind::Io(source) => FormatError::Io {
            path: path.to_path_buf(),
            source,
        },
        _ => FormatError::CorruptFile {
            path: path.to_path_buf(),
            message: err.description.to_string(),
        },
    }
}

impl TagWriter for Id3TagWriter {
    fn write_tags(&self, path: &Path, record: &TagRecord) -> Result<(), FormatError> {
        // A file without a tag starts from an empty one; anything else unreadable is fatal.
        let mut tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(err) if matches!(err.kind, Id3ErrorKind::NoTag) => Tag::new(),
            Err(err) => return Err(classify(path, err)),
        };

        tag.set_artist(record.artist.as_str());
        tag.set_title(record.title.as_str());
        tag.remove_extended_text(Some(ARTISTS_FRAME), None);
        let _ = tag.add_frame(ExtendedText {
            description: ARTISTS_FRAME.to_string(),
            value: record.artists.clone(),
        });

        tag.write_to_path(path, Version::Id3v24)
            .map_err(|err| classify(path, err))
    }
}
