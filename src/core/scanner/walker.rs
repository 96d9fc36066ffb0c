//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, ImageFilter};
use super::ScanResult;
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanProgress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Extension allow-list (None = jpg and jpeg)
    pub extensions: Option<Vec<String>>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self { config, filter }
    }

    /// Scan every root without progress reporting
    pub fn scan(&self, roots: &[PathBuf]) -> ScanResult {
        self.scan_with_events(roots, &null_sender())
    }

    /// Scan every root, reporting progress via events.
    ///
    /// Roots are canonicalized before walking, so every returned path is
    /// absolute and one file reached through differently spelled roots is
    /// reported once. A missing root is recorded as an error and the
    /// remaining roots are still scanned.
    pub fn scan_with_events(&self, roots: &[PathBuf], events: &EventSender) -> ScanResult {
        events.send(Event::Scan(ScanEvent::Started {
            paths: roots.to_vec(),
        }));

        let mut photos = BTreeSet::new();
        let mut errors = Vec::new();

        for root in roots {
            if let Err(e) = self.scan_directory(root, events, &mut photos, &mut errors) {
                events.send(Event::Scan(ScanEvent::Error {
                    path: root.clone(),
                    message: e.to_string(),
                }));
                errors.push(e);
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_photos: photos.len(),
        }));

        ScanResult {
            photos: photos.into_iter().collect(),
            errors,
        }
    }

    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
        photos: &mut BTreeSet<PathBuf>,
        errors: &mut Vec<ScanError>,
    ) -> Result<(), ScanError> {
        let root = canonical_root(root)?;

        let mut walker = WalkDir::new(&root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            .filter_entry(|entry| include_hidden || entry.depth() == 0 || !is_hidden(entry.path()));

        let mut directories_scanned = 0;

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|err| err.kind())
                        == Some(io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: io::Error::other(e.to_string()),
                        }
                    };

                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    photos_found: photos.len(),
                    current_path: entry.path().to_path_buf(),
                })));
                continue;
            }

            if !self.filter.should_include(entry.path()) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) if metadata.is_file() => {
                    // Below a followed link the walked path is not canonical
                    let path = if self.config.follow_symlinks {
                        match fs::canonicalize(entry.path()) {
                            Ok(path) => path,
                            Err(e) => {
                                let error = ScanError::ReadDirectory {
                                    path: entry.path().to_path_buf(),
                                    source: e,
                                };
                                events.send(Event::Scan(ScanEvent::Error {
                                    path: entry.path().to_path_buf(),
                                    message: error.to_string(),
                                }));
                                errors.push(error);
                                continue;
                            }
                        }
                    } else {
                        entry.path().to_path_buf()
                    };

                    if photos.contains(&path) {
                        continue;
                    }

                    events.send(Event::Scan(ScanEvent::PhotoFound { path: path.clone() }));
                    photos.insert(path);
                }
                Ok(_) => {}
                Err(e) => {
                    let error = ScanError::ReadDirectory {
                        path: entry.path().to_path_buf(),
                        source: io::Error::other(e.to_string()),
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: entry.path().to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok(())
    }
}

/// Resolve a root to its canonical absolute form; it must be a directory
fn canonical_root(root: &Path) -> Result<PathBuf, ScanError> {
    let canonical = fs::canonicalize(root).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => ScanError::PermissionDenied {
            path: root.to_path_buf(),
        },
        _ => ScanError::ReadDirectory {
            path: root.to_path_buf(),
            source,
        },
    })?;

    if !canonical.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_photo(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        // Minimal JPEG header; the scanner never decodes
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);

        assert!(result.photos.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_finds_single_photo() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "photo.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.photos.len(), 1);
        assert!(result.photos[0].ends_with("photo.jpg"));
        assert!(result.photos[0].is_absolute());
    }

    #[test]
    fn scan_applies_extension_allow_list() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "photo.JPG");
        create_test_photo(temp_dir.path(), "photo.png");
        File::create(temp_dir.path().join("notes.txt")).unwrap();

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);
        assert_eq!(result.photos.len(), 1);

        let config = ScanConfig {
            extensions: Some(vec!["png".to_string()]),
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(&[temp_dir.path().to_path_buf()]);
        assert_eq!(result.photos.len(), 1);
        assert!(result.photos[0].ends_with("photo.png"));
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("2019").join("summer");
        fs::create_dir_all(&subdir).unwrap();

        create_test_photo(temp_dir.path(), "root.jpg");
        create_test_photo(&subdir, "nested.jpeg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.photos.len(), 2);
    }

    #[test]
    fn scan_skips_hidden_files_and_directories_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let hidden_dir = temp_dir.path().join(".thumbnails");
        fs::create_dir(&hidden_dir).unwrap();

        create_test_photo(temp_dir.path(), "visible.jpg");
        create_test_photo(temp_dir.path(), ".hidden.jpg");
        create_test_photo(&hidden_dir, "thumb.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);
        assert_eq!(result.photos.len(), 1);
        assert!(result.photos[0].ends_with("visible.jpg"));

        let config = ScanConfig {
            include_hidden: true,
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(&[temp_dir.path().to_path_buf()]);
        assert_eq!(result.photos.len(), 3);
    }

    #[test]
    fn overlapping_roots_report_each_file_once_in_sorted_order() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("sub");
        fs::create_dir(&subdir).unwrap();
        create_test_photo(temp_dir.path(), "b.jpg");
        create_test_photo(&subdir, "a.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[
            temp_dir.path().to_path_buf(),
            subdir.clone(),
            temp_dir.path().to_path_buf(),
        ]);

        assert_eq!(result.photos.len(), 2);
        let paths = result.photos.clone();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn differently_spelled_roots_yield_one_canonical_path() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("sub");
        fs::create_dir(&subdir).unwrap();
        create_test_photo(temp_dir.path(), "a.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf(), subdir.join("..")]);

        let expected = temp_dir.path().canonicalize().unwrap().join("a.jpg");
        assert_eq!(result.photos, vec![expected]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn file_given_as_root_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let photo = create_test_photo(temp_dir.path(), "a.jpg");

        let result = WalkDirScanner::new(ScanConfig::default()).scan(&[photo]);

        assert!(result.photos.is_empty());
        assert!(matches!(
            result.errors.as_slice(),
            [ScanError::DirectoryNotFound { .. }]
        ));
    }

    #[test]
    fn scan_nonexistent_directory_records_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[PathBuf::from("/nonexistent/path/12345")]);

        assert!(result.photos.is_empty());
        assert!(matches!(
            result.errors.as_slice(),
            [ScanError::DirectoryNotFound { .. }]
        ));
    }
}
