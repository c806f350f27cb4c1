// file: src/exporter/json.rs
// description: json export of summarization results

use crate::error::{PipelineError, Result};
use crate::models::SummaryResult;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    pretty: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub generated_at: String,
    pub root: String,
    pub total_files: usize,
    pub results: &'a [SummaryResult],
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl JsonExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn report<'a>(&self, results: &'a [SummaryResult], root: &Path) -> SummaryReport<'a> {
        SummaryReport {
            generated_at: Utc::now().to_rfc3339(),
            root: root.display().to_string(),
            total_files: results.len(),
            results,
        }
    }

    pub fn encode(&self, results: &[SummaryResult], root: &Path) -> Result<String> {
        let report = self.report(results, root);
        let encoded = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        encoded.map_err(|e| PipelineError::Serialization(format!("Failed to encode report: {}", e)))
    }

    pub async fn export(&self, results: &[SummaryResult], root: &Path, path: &Path) -> Result<()> {
        info!("Starting JSON export to {:?}", path);

        let contents = self.encode(results, root)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, contents)
            .await
            .map_err(|source| PipelineError::FileOperation {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Export complete: {} results exported", results.len());
        Ok(())
    }
}
