// file: src/utils/validation.rs
// description: path validation for scan roots and resource requests
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use std::fs;
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(PipelineError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Rejects `path` unless it resolves to a location under `base_dir`.
    /// Both sides are canonicalized, so `..` segments and symlinks cannot
    /// escape the base.
    pub fn validate_within_base_dir(path: &Path, base_dir: &Path) -> Result<()> {
        let canonical_path = fs::canonicalize(path).map_err(|e| {
            PipelineError::Validation(format!(
                "Cannot canonicalize path {}: {}",
                path.display(),
                e
            ))
        })?;

        let canonical_base = fs::canonicalize(base_dir).map_err(|e| {
            PipelineError::Validation(format!(
                "Cannot canonicalize base dir {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        if !canonical_path.starts_with(&canonical_base) {
            return Err(PipelineError::Validation(format!(
                "Path traversal detected ({} outside {})",
                canonical_path.display(),
                canonical_base.display()
            )));
        }

        Ok(())
    }
}
