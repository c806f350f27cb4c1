// file: src/repository/ignore.rs
// description: gitignore rule loading and path matching for the scan root
// reference: https://docs.rs/ignore

use crate::error::{PipelineError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Ignore rules read from the `.gitignore` at a scan root.
///
/// Matching follows git's semantics: comments and blank lines are skipped,
/// a trailing `/` only matches directories, a leading `!` re-includes a
/// path, and a path is ignored when any of its parent directories is.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    root: PathBuf,
    matcher: Gitignore,
}

impl IgnoreFilter {
    /// Returns `Ok(None)` when the root has no ignore file.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(IGNORE_FILE_NAME);
        if !path.is_file() {
            debug!("No {} found in {}", IGNORE_FILE_NAME, root.display());
            return Ok(None);
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&path) {
            return Err(PipelineError::Config(format!(
                "Invalid ignore rules in {}: {}",
                path.display(),
                err
            )));
        }

        let filter = Self::build(root, builder)?;
        debug!(
            "Loaded {} ignore rules from {}",
            filter.matcher.num_ignores() + filter.matcher.num_whitelists(),
            path.display()
        );
        Ok(Some(filter))
    }

    /// Build a filter from ignore-file text rather than from disk.
    pub fn from_rules(root: &Path, rules: &str) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for line in rules.lines() {
            builder.add_line(None, line).map_err(|e| {
                PipelineError::Config(format!("Invalid ignore rule {:?}: {}", line, e))
            })?;
        }
        Self::build(root, builder)
    }

    fn build(root: &Path, builder: GitignoreBuilder) -> Result<Self> {
        let matcher = builder
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build ignore rules: {}", e)))?;

        Ok(Self {
            root: root.to_path_buf(),
            matcher,
        })
    }

    /// Whether `path` (relative to the root, or absolute beneath it) is
    /// ignored. Paths outside the root never match.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative.has_root() || relative.as_os_str().is_empty() {
            return false;
        }

        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}
