// file: src/repository/scanner.rs
// description: Directory walking and source file discovery with ignore filtering
// reference: https://docs.rs/ignore

use crate::error::{PipelineError, Result};
use crate::models::language::{extension_of, is_supported_extension};
use crate::repository::ignore::IgnoreFilter;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory names that are never descended into.
pub const EXCLUDED_DIRECTORIES: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".git",
    "out",
    "coverage",
    ".next",
    ".nuxt",
    "bin",
    "obj",
    "target",
    "vendor",
    "venv",
    ".venv",
    "env",
    ".env",
    "__pycache__",
    ".pytest_cache",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// The directory listing primitive the walker is built on.
pub trait DirSource: Send + Sync {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;
}

/// Reads the local file system. Symlinks are reported as `Other` and never
/// followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl DirSource for LocalFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            entries.push(DirEntryInfo {
                path: entry.path(),
                kind,
            });
        }
        Ok(entries)
    }
}

pub struct FileScanner<S: DirSource = LocalFs> {
    source: S,
}

impl FileScanner<LocalFs> {
    pub fn new() -> Self {
        Self { source: LocalFs }
    }
}

impl Default for FileScanner<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DirSource> FileScanner<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Absolute paths of every eligible source file under `root`, honouring
    /// the root's `.gitignore` when present.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = std::path::absolute(root).map_err(|source| PipelineError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let filter = IgnoreFilter::load(&root)?;
        self.scan_with_filter(&root, filter.as_ref())
    }

    pub fn scan_with_filter(
        &self,
        root: &Path,
        filter: Option<&IgnoreFilter>,
    ) -> Result<Vec<PathBuf>> {
        info!("Scanning directory: {}", root.display());

        let mut files = Vec::new();
        let mut frontier = vec![root.to_path_buf()];

        while let Some(dir) = frontier.pop() {
            let entries = self
                .source
                .read_dir(&dir)
                .map_err(|source| PipelineError::Walk {
                    path: dir.clone(),
                    source,
                })?;

            for entry in entries {
                let relative = entry.path.strip_prefix(root).unwrap_or(&entry.path);
                let is_dir = entry.kind == EntryKind::Directory;

                if let Some(filter) = filter
                    && filter.matches(relative, is_dir)
                {
                    debug!("Ignoring (gitignore): {}", relative.display());
                    continue;
                }

                match entry.kind {
                    EntryKind::Directory => {
                        if is_excluded_directory(&entry.path) {
                            debug!("Skipping directory: {}", relative.display());
                            continue;
                        }
                        frontier.push(entry.path);
                    }
                    EntryKind::File => {
                        if extension_of(&entry.path).is_some_and(|ext| is_supported_extension(&ext))
                        {
                            debug!("Found code file: {}", relative.display());
                            files.push(entry.path);
                        }
                    }
                    EntryKind::Other => {}
                }
            }
        }

        info!("Found {} code files", files.len());
        Ok(files)
    }
}

fn is_excluded_directory(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| EXCLUDED_DIRECTORIES.contains(&name))
}

/// Walk `root` on the blocking pool.
pub async fn find_files(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || FileScanner::new().scan(&root))
        .await
        .map_err(|e| PipelineError::Validation(format!("File scanning task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct CountingFs {
        visited: Mutex<Vec<PathBuf>>,
    }

    impl CountingFs {
        fn new() -> Self {
            Self {
                visited: Mutex::new(Vec::new()),
            }
        }

        fn visited(&self) -> Vec<PathBuf> {
            self.visited.lock().unwrap().clone()
        }
    }

    impl DirSource for &CountingFs {
        fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
            self.visited.lock().unwrap().push(dir.to_path_buf());
            LocalFs.read_dir(dir)
        }
    }

    struct FailingFs {
        broken: &'static str,
    }

    impl DirSource for FailingFs {
        fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
            if dir.file_name().is_some_and(|name| name == self.broken) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            LocalFs.read_dir(dir)
        }
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn relative_set(root: &Path, files: &[PathBuf]) -> BTreeSet<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_scan_selects_supported_extensions() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.js");
        touch(temp.path(), "src/b.PY");
        touch(temp.path(), "src/deep/nested/c.rs");
        touch(temp.path(), "README.md");
        touch(temp.path(), "Makefile");

        let files = FileScanner::new().scan(temp.path()).unwrap();

        assert!(files.iter().all(|p| p.is_absolute()));
        let expected: BTreeSet<String> = ["a.js", "src/b.PY", "src/deep/nested/c.rs"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(relative_set(temp.path(), &files), expected);
    }

    #[test]
    fn test_excluded_directories_are_never_read() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "app.ts");
        touch(temp.path(), "node_modules/pkg/index.js");
        touch(temp.path(), "node_modules/pkg/lib/deep/util.js");
        touch(temp.path(), ".git/hooks/pre-commit.py");
        touch(temp.path(), "src/__pycache__/mod.py");
        touch(temp.path(), "src/main.go");

        let counting = CountingFs::new();
        let files = FileScanner::with_source(&counting)
            .scan_with_filter(temp.path(), None)
            .unwrap();

        assert_eq!(
            relative_set(temp.path(), &files),
            BTreeSet::from(["app.ts".to_string(), "src/main.go".to_string()])
        );

        let visited = counting.visited();
        assert_eq!(visited.len(), 2, "only the root and src are read");
        for dir in &visited {
            assert!(
                !dir.components().any(|c| {
                    let name = c.as_os_str().to_string_lossy();
                    EXCLUDED_DIRECTORIES.contains(&name.as_ref())
                }),
                "read excluded directory {}",
                dir.display()
            );
        }
    }

    #[test]
    fn test_ignored_directories_are_pruned() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "generated/\n*.min.js\n").unwrap();
        touch(temp.path(), "index.js");
        touch(temp.path(), "index.min.js");
        touch(temp.path(), "generated/a/b/c/client.ts");

        let filter = IgnoreFilter::load(temp.path()).unwrap();
        let counting = CountingFs::new();
        let files = FileScanner::with_source(&counting)
            .scan_with_filter(temp.path(), filter.as_ref())
            .unwrap();

        assert_eq!(
            relative_set(temp.path(), &files),
            BTreeSet::from(["index.js".to_string()])
        );
        assert_eq!(counting.visited().len(), 1);
    }

    #[test]
    fn test_negated_rule_keeps_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "*.js\n!keep.js\n").unwrap();
        touch(temp.path(), "drop.js");
        touch(temp.path(), "lib/keep.js");
        touch(temp.path(), "lib/other.py");

        let files = FileScanner::new().scan(temp.path()).unwrap();

        assert_eq!(
            relative_set(temp.path(), &files),
            BTreeSet::from(["lib/keep.js".to_string(), "lib/other.py".to_string()])
        );
    }

    #[test]
    fn test_scan_is_idempotent() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.js");
        touch(temp.path(), "pkg/b.kt");
        touch(temp.path(), "pkg/sub/c.swift");

        let scanner = FileScanner::new();
        let first = scanner.scan(temp.path()).unwrap();
        let second = scanner.scan(temp.path()).unwrap();

        assert_eq!(
            first.into_iter().collect::<BTreeSet<_>>(),
            second.into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_unreadable_subtree_fails_whole_walk() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.js");
        touch(temp.path(), "locked/b.js");

        let result = FileScanner::with_source(FailingFs { broken: "locked" })
            .scan_with_filter(temp.path(), None);

        match result {
            Err(PipelineError::Walk { path, .. }) => assert!(path.ends_with("locked")),
            other => panic!("expected walk error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(FileScanner::new().scan(&missing).is_err());
    }

    #[tokio::test]
    async fn test_find_files_async() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.js");
        touch(temp.path(), "target/debug/build.rs");

        let files = find_files(temp.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.js"));
    }
}
