//! Source size estimation.
//!
//! Walks a backup source and adds up the size of every regular file that is
//! not excluded. The result is advisory and is shown to the user before a
//! backup is started; files changing during the walk are simply counted as
//! they are seen.

use crate::pattern::{ExcludeMatcher, ExcludeSet};
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Total size and number of files found below a path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSize {
    pub bytes: u64,
    pub files: u64,
}

impl DataSize {
    fn add_file(&mut self, len: u64) {
        self.bytes += len;
        self.files += 1;
    }
}

impl std::ops::Add for DataSize {
    type Output = DataSize;

    fn add(self, other: DataSize) -> DataSize {
        DataSize {
            bytes: self.bytes + other.bytes,
            files: self.files + other.files,
        }
    }
}

/// Size of a single backup source, or why it could not be measured
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEstimate {
    pub path: PathBuf,
    pub size: Option<DataSize>,
    pub error: Option<String>,
}

/// Per-source breakdown and the sum over all measurable sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesSummary {
    pub sources: Vec<SourceEstimate>,
    pub total: DataSize,
}

/// Exclusion-aware directory size scanner
pub struct DatasizeScanner {
    excludes: ExcludeSet,
    matcher: Option<Box<dyn ExcludeMatcher>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl DatasizeScanner {
    /// Create a scanner using shell-style exclusion patterns
    pub fn new(excludes: ExcludeSet) -> Self {
        Self {
            excludes,
            matcher: None,
            cancel: None,
        }
    }

    /// Replace the compiled shell-style patterns with a custom matcher
    pub fn with_matcher(mut self, matcher: impl ExcludeMatcher + 'static) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    /// Abort the scan with [`Error::Cancelled`] once `flag` is set.
    /// The flag is polled at every directory entry.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        match &self.matcher {
            Some(matcher) => self.excludes.is_excluded(path, matcher.as_ref()),
            None => self.excludes.is_match(path),
        }
    }

    /// Measure a file or directory.
    ///
    /// Fails with [`Error::RootInaccessible`] when `path` itself cannot be
    /// read. Problems with individual entries below it are logged and skipped.
    pub fn scan(&self, path: &Path) -> Result<DataSize> {
        self.check_cancelled()?;

        let root = absolute(path)?;
        let metadata = fs::metadata(&root).map_err(|source| Error::RootInaccessible {
            path: root.clone(),
            source,
        })?;

        if self.is_excluded(&root) {
            debug!("Source {} is excluded", root.display());
            return Ok(DataSize::default());
        }

        if !metadata.is_dir() {
            let mut size = DataSize::default();
            if metadata.is_file() {
                size.add_file(metadata.len());
            }
            return Ok(size);
        }

        fs::read_dir(&root).map_err(|source| Error::RootInaccessible {
            path: root.clone(),
            source,
        })?;

        self.walk_directory(&root)
    }

    fn walk_directory(&self, root: &Path) -> Result<DataSize> {
        debug!("Scanning directory: {}", root.display());
        let mut size = DataSize::default();
        let mut seen_inodes = HashSet::new();

        let mut entries = WalkDir::new(root).follow_links(false).into_iter();
        while let Some(entry) = entries.next() {
            self.check_cancelled()?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if self.is_excluded(entry.path()) {
                if file_type.is_dir() {
                    entries.skip_current_dir();
                }
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!("Cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if let Some(inode) = hardlink_key(&metadata) {
                if !seen_inodes.insert(inode) {
                    continue;
                }
            }

            size.add_file(metadata.len());
        }

        debug!(
            "Scanned {}: {} files, {} bytes",
            root.display(),
            size.files,
            size.bytes
        );
        Ok(size)
    }

    /// Measure several sources in parallel.
    ///
    /// A source that cannot be measured is reported with its error and left
    /// out of the total.
    pub fn scan_all<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> SourcesSummary {
        let sources: Vec<SourceEstimate> = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                match self.scan(path) {
                    Ok(size) => SourceEstimate {
                        path: path.to_path_buf(),
                        size: Some(size),
                        error: None,
                    },
                    Err(e) => {
                        warn!("Failed to measure {}: {}", path.display(), e);
                        SourceEstimate {
                            path: path.to_path_buf(),
                            size: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();

        let total = sources
            .iter()
            .filter_map(|source| source.size)
            .fold(DataSize::default(), |acc, size| acc + size);

        SourcesSummary { sources, total }
    }
}

/// Total size and file count of `path`, ignoring anything matched by
/// `exclude_patterns`.
pub fn get_path_datasize<I, S>(path: impl AsRef<Path>, exclude_patterns: I) -> Result<(u64, u64)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let size = DatasizeScanner::new(ExcludeSet::new(exclude_patterns)).scan(path.as_ref())?;
    Ok((size.bytes, size.files))
}

/// Measure several backup sources with a shared exclude list
pub fn estimate_sources<P, I, S>(paths: &[P], exclude_patterns: I) -> SourcesSummary
where
    P: AsRef<Path> + Sync,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    DatasizeScanner::new(ExcludeSet::new(exclude_patterns)).scan_all(paths)
}

/// Absolute, lexically cleaned form of `path`: `.` components are dropped
/// and `..` removes the preceding component.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut clean = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(clean.components().next_back(), Some(Component::Normal(_))) {
                    clean.pop();
                }
            }
            other => clean.push(other),
        }
    }
    Ok(clean)
}

#[cfg(unix)]
fn hardlink_key(metadata: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;

    (metadata.nlink() > 1).then(|| (metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn hardlink_key(_metadata: &fs::Metadata) -> Option<(u64, u64)> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const HELLO: &str = "Hello, World!";

    struct Fixture {
        _temp: TempDir,
        dir: PathBuf,
        file: PathBuf,
        excluded_dir: PathBuf,
    }

    fn create_fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("test_dir");
        fs::create_dir(&dir).unwrap();

        let file = dir.join("test_file.txt");
        File::create(&file).unwrap().write_all(HELLO.as_bytes()).unwrap();

        let excluded_dir = dir.join("excluded_dir");
        fs::create_dir(&excluded_dir).unwrap();
        fs::write(
            excluded_dir.join("excluded_file.txt"),
            "Excluded file, should not be counted.",
        )
        .unwrap();

        Fixture {
            _temp: temp,
            dir,
            file,
            excluded_dir,
        }
    }

    #[test]
    fn test_directory_with_excluded_subdirectory() -> Result<()> {
        let fx = create_fixture();
        let excludes = [fx.excluded_dir.to_string_lossy().to_string()];

        assert_eq!(get_path_datasize(&fx.dir, excludes.clone())?, (13, 1));
        assert_eq!(get_path_datasize(&fx.file, excludes.clone())?, (13, 1));
        assert_eq!(get_path_datasize(&fx.excluded_dir, excludes)?, (0, 0));
        Ok(())
    }

    #[test]
    fn test_without_excludes_counts_everything() -> Result<()> {
        let fx = create_fixture();
        let (bytes, files) = get_path_datasize(&fx.dir, Vec::<String>::new())?;
        assert_eq!(files, 2);
        assert_eq!(bytes, 13 + "Excluded file, should not be counted.".len() as u64);
        Ok(())
    }

    #[test]
    fn test_excluded_file_root() -> Result<()> {
        let fx = create_fixture();
        let pattern = fx.file.to_string_lossy().to_string();
        assert_eq!(get_path_datasize(&fx.file, [pattern])?, (0, 0));
        Ok(())
    }

    #[test]
    fn test_glob_exclusion() -> Result<()> {
        let fx = create_fixture();
        fs::write(fx.dir.join("debug.log"), "0123456789")?;
        assert_eq!(get_path_datasize(&fx.dir, ["*.log", "*/excluded_dir"])?, (13, 1));
        Ok(())
    }

    #[test]
    fn test_scan_is_idempotent() -> Result<()> {
        let fx = create_fixture();
        let first = get_path_datasize(&fx.dir, Vec::<String>::new())?;
        let second = get_path_datasize(&fx.dir, Vec::<String>::new())?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let result = get_path_datasize(&missing, Vec::<String>::new());
        assert!(matches!(result, Err(Error::RootInaccessible { .. })));
    }

    #[test]
    fn test_empty_directory() -> Result<()> {
        let temp = TempDir::new()?;
        assert_eq!(get_path_datasize(temp.path(), Vec::<String>::new())?, (0, 0));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() -> Result<()> {
        let fx = create_fixture();
        std::os::unix::fs::symlink(&fx.file, fx.dir.join("link.txt"))?;
        let excludes = [fx.excluded_dir.to_string_lossy().to_string()];
        assert_eq!(get_path_datasize(&fx.dir, excludes)?, (13, 1));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_hardlinks_counted_once() -> Result<()> {
        let fx = create_fixture();
        fs::hard_link(&fx.file, fx.dir.join("hardlink.txt"))?;
        let excludes = [fx.excluded_dir.to_string_lossy().to_string()];
        assert_eq!(get_path_datasize(&fx.dir, excludes)?, (13, 1));
        Ok(())
    }

    #[test]
    fn test_absolute_cleans_components() -> Result<()> {
        assert_eq!(absolute(Path::new("/a/./b/../c/"))?, PathBuf::from("/a/c"));
        assert_eq!(absolute(Path::new("/../x"))?, PathBuf::from("/x"));
        assert_eq!(absolute(Path::new("./d"))?, std::env::current_dir()?.join("d"));
        Ok(())
    }

    #[test]
    fn test_dot_relative_root_with_absolute_exclude() -> Result<()> {
        let temp = TempDir::new_in(".")?;
        let dir = temp.path().join("d");
        let skip = dir.join("skip");
        fs::create_dir_all(&skip)?;
        fs::write(dir.join("keep.txt"), HELLO)?;
        fs::write(skip.join("big.bin"), "0123456789")?;

        let root = temp.path().join("d");
        let exclude = std::env::current_dir()?
            .join(temp.path().file_name().unwrap())
            .join("d")
            .join("skip");

        assert!(root.starts_with("."));
        assert_eq!(
            get_path_datasize(&root, [exclude.to_string_lossy().to_string()])?,
            (13, 1)
        );
        Ok(())
    }

    /// Directories with all permissions removed; restored on drop so the
    /// temporary tree can be deleted.
    #[cfg(unix)]
    struct Locked(PathBuf);

    #[cfg(unix)]
    impl Locked {
        /// `None` when permissions are not enforced for this user (root)
        fn new(path: &Path) -> Option<Self> {
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
            let locked = Locked(path.to_path_buf());
            fs::read_dir(path).is_err().then_some(locked)
        }
    }

    #[cfg(unix)]
    impl Drop for Locked {
        fn drop(&mut self) {
            use std::os::unix::fs::PermissionsExt;

            let _ = fs::set_permissions(&self.0, fs::Permissions::from_mode(0o755));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() -> Result<()> {
        let fx = create_fixture();
        let private = fx.dir.join("private");
        fs::create_dir(&private)?;
        fs::write(private.join("secret.txt"), "hidden")?;

        let Some(_locked) = Locked::new(&private) else {
            return Ok(());
        };

        let excludes = [fx.excluded_dir.to_string_lossy().to_string()];
        assert_eq!(get_path_datasize(&fx.dir, excludes)?, (13, 1));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_is_an_error() {
        let fx = create_fixture();
        let Some(_locked) = Locked::new(&fx.excluded_dir) else {
            return;
        };

        let result = get_path_datasize(&fx.excluded_dir, Vec::<String>::new());
        assert!(matches!(result, Err(Error::RootInaccessible { .. })));
    }

    #[test]
    fn test_cancelled_scan() {
        let fx = create_fixture();
        let flag = Arc::new(AtomicBool::new(true));
        let scanner = DatasizeScanner::new(ExcludeSet::default()).with_cancel(flag);
        assert!(matches!(scanner.scan(&fx.dir), Err(Error::Cancelled)));
    }

    #[test]
    fn test_custom_matcher() -> Result<()> {
        struct Substring;
        impl ExcludeMatcher for Substring {
            fn matches(&self, path: &str, pattern: &str) -> bool {
                path.contains(pattern)
            }
        }

        let fx = create_fixture();
        let scanner =
            DatasizeScanner::new(ExcludeSet::new(["excluded_"])).with_matcher(Substring);
        assert_eq!(scanner.scan(&fx.dir)?, DataSize { bytes: 13, files: 1 });
        Ok(())
    }

    #[test]
    fn test_estimate_sources_reports_failures() {
        let fx = create_fixture();
        let missing = fx.dir.join("missing");
        let excludes = [fx.excluded_dir.to_string_lossy().to_string()];

        let summary = estimate_sources(&[fx.dir.clone(), fx.file.clone(), missing], excludes);

        assert_eq!(summary.sources.len(), 3);
        assert_eq!(summary.total, DataSize { bytes: 26, files: 2 });
        assert!(summary.sources[2].size.is_none());
        assert!(summary.sources[2].error.is_some());
    }
}
