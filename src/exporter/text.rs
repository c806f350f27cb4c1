// file: src/exporter/text.rs
// description: plain-text summary report rendering
// reference: internal report format

use crate::error::{PipelineError, Result};
use crate::models::SummaryResult;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// One `path\nsummary\n` block per result, blocks separated by a blank line.
pub fn render(results: &[SummaryResult]) -> String {
    results
        .iter()
        .map(|result| format!("{}\n{}\n", result.path, result.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn write_report(results: &[SummaryResult], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| PipelineError::FileOperation {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    fs::write(path, render(results))
        .await
        .map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Wrote {} summaries to {}", results.len(), path.display());
    Ok(())
}
