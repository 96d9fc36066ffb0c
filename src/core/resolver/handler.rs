//! What happens to the losing file of a resolved pair.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Invoked once per resolved pair with the kept and the losing file.
///
/// An error aborts the run; the resolver does not retry.
pub trait DuplicateHandler: Send + Sync {
    fn handle(&self, keep: &Path, delete: &Path) -> io::Result<()>;
}

/// The standard handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateAction {
    /// Only log the decision
    #[default]
    Noop,
    /// Remove the losing file
    Delete,
    /// Move the losing file next to the kept one as `<name> delete (<n>)<ext>`,
    /// name and extension taken from the kept file
    Rename,
}

impl DuplicateHandler for DuplicateAction {
    fn handle(&self, keep: &Path, delete: &Path) -> io::Result<()> {
        match self {
            DuplicateAction::Noop => {
                info!(keep = %keep.display(), delete = %delete.display(), "Duplicate left in place");
                Ok(())
            }
            DuplicateAction::Delete => {
                fs::remove_file(delete)?;
                info!(keep = %keep.display(), delete = %delete.display(), "Deleted duplicate");
                Ok(())
            }
            DuplicateAction::Rename => {
                let target = rename_target(keep)?;
                move_file(delete, &target)?;
                info!(
                    keep = %keep.display(),
                    from = %delete.display(),
                    to = %target.display(),
                    "Moved duplicate aside"
                );
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for DuplicateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateAction::Noop => write!(f, "noop"),
            DuplicateAction::Delete => write!(f, "delete"),
            DuplicateAction::Rename => write!(f, "rename"),
        }
    }
}

/// First free `<keep stem> delete (<n>)<keep ext>` in the kept file's
/// folder, counting from 1. The name is derived from the kept file alone,
/// so the moved file takes the kept file's extension.
pub fn rename_target(keep: &Path) -> io::Result<PathBuf> {
    let stem = keep.file_stem().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no file name in {}", keep.display()),
        )
    })?;
    let folder = keep.parent().unwrap_or_else(|| Path::new(""));
    let extension = keep
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 1usize;
    loop {
        let candidate = folder.join(format!(
            "{} delete ({}){}",
            stem.to_string_lossy(),
            n,
            extension
        ));
        if !candidate.exists() {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Rename, falling back to copy + verify + remove across filesystems
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    fs::rename(source, target).or_else(|_| {
        let source_size = fs::metadata(source)?.len();
        fs::copy(source, target)?;

        let target_size = fs::metadata(target)?.len();
        if target_size != source_size {
            let _ = fs::remove_file(target);
            return Err(io::Error::other(format!(
                "Copy verification failed: source {} bytes, target {} bytes",
                source_size, target_size
            )));
        }

        fs::remove_file(source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn noop_leaves_both_files() {
        let dir = TempDir::new().unwrap();
        let keep = touch(&dir, "a.jpg", b"a");
        let delete = touch(&dir, "b.jpg", b"b");

        DuplicateAction::Noop.handle(&keep, &delete).unwrap();

        assert!(keep.exists());
        assert!(delete.exists());
    }

    #[test]
    fn delete_removes_losing_file() {
        let dir = TempDir::new().unwrap();
        let keep = touch(&dir, "a.jpg", b"a");
        let delete = touch(&dir, "b.jpg", b"b");

        DuplicateAction::Delete.handle(&keep, &delete).unwrap();

        assert!(keep.exists());
        assert!(!delete.exists());
    }

    #[test]
    fn delete_of_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let keep = touch(&dir, "a.jpg", b"a");

        let result = DuplicateAction::Delete.handle(&keep, &dir.path().join("gone.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn rename_target_is_named_after_kept_file() {
        let dir = TempDir::new().unwrap();
        let keep = touch(&dir, "IMG_0001.jpg", b"a");

        let target = rename_target(&keep).unwrap();
        assert_eq!(target, dir.path().join("IMG_0001 delete (1).jpg"));
    }

    #[test]
    fn moved_file_takes_kept_extension() {
        let keep_dir = TempDir::new().unwrap();
        let other_dir = TempDir::new().unwrap();
        let keep = touch(&keep_dir, "beach.jpg", b"keep");
        let delete = touch(&other_dir, "DSC_0042.JPEG", b"moved");

        DuplicateAction::Rename.handle(&keep, &delete).unwrap();

        assert!(!delete.exists());
        assert_eq!(
            fs::read(keep_dir.path().join("beach delete (1).jpg")).unwrap(),
            b"moved"
        );
    }

    #[test]
    fn rename_target_skips_taken_names() {
        let dir = TempDir::new().unwrap();
        let keep = touch(&dir, "a.jpg", b"a");
        touch(&dir, "a delete (1).jpg", b"x");
        touch(&dir, "a delete (2).jpg", b"y");

        let target = rename_target(&keep).unwrap();
        assert_eq!(target, dir.path().join("a delete (3).jpg"));
    }

    #[test]
    fn rename_moves_file_next_to_kept_one() {
        let keep_dir = TempDir::new().unwrap();
        let other_dir = TempDir::new().unwrap();
        let keep = touch(&keep_dir, "a.jpg", b"keep");
        let delete = touch(&other_dir, "b.jpg", b"moved");

        DuplicateAction::Rename.handle(&keep, &delete).unwrap();

        let moved = keep_dir.path().join("a delete (1).jpg");
        assert!(!delete.exists());
        assert_eq!(fs::read(moved).unwrap(), b"moved");
        assert!(keep.exists());
    }

    #[test]
    fn action_names_round_trip_through_serde() {
        let json = serde_json::to_string(&DuplicateAction::Rename).unwrap();
        assert_eq!(json, "\"rename\"");
        let action: DuplicateAction = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(action, DuplicateAction::Delete);
        assert_eq!(DuplicateAction::default(), DuplicateAction::Noop);
    }
}
