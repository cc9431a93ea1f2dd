//! Commit step: destination safety check, tag write, rename.
//!
//! Nothing here runs until the pipeline has produced a complete [`Plan`],
//! so a file that fails normalization is never touched.

use log::{debug, info};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::FormatError;
use crate::pipeline::Plan;
use crate::tags::TagWriter;

/// Validates that `destination` can receive `source` without overwriting
/// another file.
///
/// # Arguments
/// * `source` - The file being formatted
/// * `destination` - The canonical path it will be renamed to
///
/// # Returns
/// * `Ok(())` if the destination does not exist yet or is the source itself
///   (including a different spelling of it on a case- or
///   normalization-insensitive filesystem)
/// * `Err(FormatError::DestinationExists)` otherwise
pub fn validate_destination(source: &Path, destination: &Path) -> Result<(), FormatError> {
    if source == destination {
        return Ok(());
    }
    if destination.exists() && !is_same_file(source, destination) {
        return Err(FormatError::DestinationExists {
            path: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// True when both paths resolve to one directory entry.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) if a == b => true,
        _ => same_single_link_inode(a, b),
    }
}

/// Same inode with no other hard links: the two names are spellings of one entry.
#[cfg(unix)]
fn same_single_link_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino() && a.nlink() == 1,
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_single_link_inode(_a: &Path, _b: &Path) -> bool {
    false
}

/// Copies `source` to `destination` and removes `source`. On failure the
/// destination copy is removed again, leaving only the source.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(err) = fs::copy(source, destination) {
        let _ = fs::remove_file(destination);
        return Err(err);
    }
    if let Err(err) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(err);
    }
    Ok(())
}

/// Renames `source` to `destination`. A move into another directory that
/// `rename` refuses (e.g. a target directory on another filesystem) falls back
/// to copy and remove.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if source.parent() != destination.parent() => {
            debug!(
                "rename {} failed ({}), copying instead",
                source.display(),
                err
            );
            copy_then_remove(source, destination)
        }
        Err(err) => Err(err),
    }
}

/// Writes the planned tags, then renames the file.
///
/// A failed tag write leaves the name untouched. If the rename fails after the
/// tags were written, running the pipeline again on the old name yields the same
/// plan.
pub fn commit(plan: &Plan, writer: &dyn TagWriter) -> Result<(), FormatError> {
    validate_destination(&plan.source, &plan.destination)?;

    writer.write_tags(&plan.source, &plan.tags)?;

    if plan.is_rename() {
        move_file(&plan.source, &plan.destination).map_err(|source| FormatError::Io {
            path: plan.source.clone(),
            source,
        })?;
        info!(
            "{} -> {}",
            plan.source.display(),
            plan.destination.display()
        );
    } else {
        info!("{}: tags updated", plan.source.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::TagRecord;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records calls instead of touching tags.
    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl TagWriter for RecordingWriter {
        fn write_tags(&self, path: &Path, _record: &TagRecord) -> Result<(), FormatError> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            if self.fail {
                return Err(FormatError::CorruptFile {
                    path: path.to_path_buf(),
                    message: "broken frames".to_string(),
                });
            }
            Ok(())
        }
    }

    fn plan(source: PathBuf, destination: PathBuf) -> Plan {
        Plan {
            source,
            destination,
            tags: TagRecord {
                artist: "A".to_string(),
                title: "T".to_string(),
                artists: "A".to_string(),
            },
        }
    }

    #[test]
    fn test_same_path_is_valid() {
        let path = PathBuf::from("/tmp/a.mp3");
        assert!(validate_destination(&path, &path).is_ok());
    }

    #[test]
    fn test_other_spelling_of_source_is_not_a_clash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let source = dir.path().join("a.mp3");
        std::fs::write(&source, b"audio").unwrap();
        let respelled = dir.path().join("sub").join("..").join("a.mp3");

        assert_ne!(source, respelled);
        assert_eq!(
            std::fs::canonicalize(&source).unwrap(),
            std::fs::canonicalize(&respelled).unwrap()
        );
        assert!(validate_destination(&source, &respelled).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_link_is_a_clash() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mp3");
        let linked = dir.path().join("A_-_T.mp3");
        std::fs::write(&source, b"audio").unwrap();
        std::fs::hard_link(&source, &linked).unwrap();

        assert!(matches!(
            validate_destination(&source, &linked),
            Err(FormatError::DestinationExists { .. })
        ));
    }

    #[test]
    fn test_copy_then_remove_moves_content() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        let source = from.path().join("a - t.mp3");
        let destination = to.path().join("A_-_T.mp3");
        std::fs::write(&source, b"audio").unwrap();

        copy_then_remove(&source, &destination).unwrap();

        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"audio");
    }

    #[test]
    fn test_failed_copy_leaves_source_alone() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a - t.mp3");
        let destination = dir.path().join("missing_dir").join("A_-_T.mp3");
        std::fs::write(&source, b"audio").unwrap();

        assert!(copy_then_remove(&source, &destination).is_err());
        assert!(source.exists());
        assert!(!destination.exists());
    }

    #[test]
    fn test_commit_moves_into_other_directory() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        let source = from.path().join("a - t.mp3");
        let destination = to.path().join("A_-_T.mp3");
        std::fs::write(&source, b"audio").unwrap();

        commit(&plan(source.clone(), destination.clone()), &RecordingWriter::default()).unwrap();

        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"audio");
    }

    #[test]
    fn test_commit_renames_after_tag_write() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a - t.mp3");
        let destination = dir.path().join("A_-_T.mp3");
        std::fs::write(&source, b"audio").unwrap();

        let writer = RecordingWriter::default();
        commit(&plan(source.clone(), destination.clone()), &writer).unwrap();

        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"audio");
        assert_eq!(*writer.calls.lock().unwrap(), vec![source]);
    }

    #[test]
    fn test_existing_destination_blocks_everything() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a - t.mp3");
        let destination = dir.path().join("A_-_T.mp3");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&destination, b"old").unwrap();

        let writer = RecordingWriter::default();
        let err = commit(&plan(source.clone(), destination.clone()), &writer).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(matches!(err, FormatError::DestinationExists { .. }));
        assert!(writer.calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read(&destination).unwrap(), b"old");
        assert!(source.exists());
    }

    #[test]
    fn test_failed_tag_write_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a - t.mp3");
        let destination = dir.path().join("A_-_T.mp3");
        std::fs::write(&source, b"audio").unwrap();

        let writer = RecordingWriter {
            fail: true,
            ..Default::default()
        };
        let err = commit(&plan(source.clone(), destination.clone()), &writer).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CorruptFile);
        assert!(source.exists());
        assert!(!destination.exists());
    }

    #[test]
    fn test_already_canonical_only_writes_tags() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("A_-_T.mp3");
        std::fs::write(&source, b"audio").unwrap();

        let writer = RecordingWriter::default();
        commit(&plan(source.clone(), source.clone()), &writer).unwrap();

        assert!(source.exists());
        assert_eq!(writer.calls.lock().unwrap().len(), 1);
    }
}
