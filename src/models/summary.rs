// file: src/models/summary.rs
// description: summary request options, per-file results and degraded outcomes
// reference: internal data structures

use crate::error::{PipelineError, RemoteErrorKind, Result};
use crate::models::language::LanguageTag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

pub const DEFAULT_MAX_LENGTH: u32 = 500;
pub const MAX_SUMMARY_LENGTH: u32 = 2000;

const FAILED_PLACEHOLDER: &str = "Failed to summarize file.";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::Low => "low",
            DetailLevel::Medium => "medium",
            DetailLevel::High => "high",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a summary should be produced. Passed by value; never mutated once
/// a batch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
}

fn default_max_length() -> u32 {
    DEFAULT_MAX_LENGTH
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            detail_level: DetailLevel::Medium,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl SummaryOptions {
    pub fn new(detail_level: DetailLevel, max_length: u32) -> Result<Self> {
        let options = Self {
            detail_level,
            max_length,
        };
        options.validate()?;
        Ok(options)
    }

    /// Fill unset fields with the defaults and validate the result.
    pub fn resolve(detail_level: Option<DetailLevel>, max_length: Option<u32>) -> Result<Self> {
        Self::new(
            detail_level.unwrap_or_default(),
            max_length.unwrap_or(DEFAULT_MAX_LENGTH),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 || self.max_length > MAX_SUMMARY_LENGTH {
            return Err(PipelineError::Validation(format!(
                "max_length must be between 1 and {}, got {}",
                MAX_SUMMARY_LENGTH, self.max_length
            )));
        }
        Ok(())
    }
}

/// Everything the remote call needs for one file.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub content: &'a str,
    pub language: &'a LanguageTag,
    pub options: SummaryOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summarized,
    TooLarge,
    ExceedsModelLimit,
    NetworkIssue,
    RateLimited,
    Unreadable,
    Failed,
}

impl SummaryOutcome {
    pub fn from_remote_kind(kind: RemoteErrorKind) -> Self {
        match kind {
            RemoteErrorKind::ContentTooLarge => SummaryOutcome::ExceedsModelLimit,
            RemoteErrorKind::TransientNetwork | RemoteErrorKind::TransientStatus => {
                SummaryOutcome::NetworkIssue
            }
            RemoteErrorKind::Quota => SummaryOutcome::RateLimited,
            RemoteErrorKind::Unclassified => SummaryOutcome::Failed,
        }
    }

    /// Fixed text written in place of a model summary.
    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            SummaryOutcome::Summarized => None,
            SummaryOutcome::TooLarge => Some("File is too large to summarize."),
            SummaryOutcome::ExceedsModelLimit => {
                Some("File content exceeds the model's token limit.")
            }
            SummaryOutcome::NetworkIssue => {
                Some("Could not summarize file due to a network issue.")
            }
            SummaryOutcome::RateLimited => Some("Could not summarize file due to API rate limits."),
            SummaryOutcome::Unreadable => Some("Could not read file (appears to be binary)."),
            SummaryOutcome::Failed => Some(FAILED_PLACEHOLDER),
        }
    }

    pub fn is_degraded(self) -> bool {
        self != SummaryOutcome::Summarized
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SummaryOutcome::Summarized => "summarized",
            SummaryOutcome::TooLarge => "too_large",
            SummaryOutcome::ExceedsModelLimit => "exceeds_model_limit",
            SummaryOutcome::NetworkIssue => "network_issue",
            SummaryOutcome::RateLimited => "rate_limited",
            SummaryOutcome::Unreadable => "unreadable",
            SummaryOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub path: String,
    pub language: LanguageTag,
    pub outcome: SummaryOutcome,
    pub summary: String,
}

impl SummaryResult {
    pub fn summarized(path: String, language: LanguageTag, summary: String) -> Self {
        Self {
            path,
            language,
            outcome: SummaryOutcome::Summarized,
            summary,
        }
    }

    pub fn degraded(path: String, language: LanguageTag, outcome: SummaryOutcome) -> Self {
        let summary = outcome.placeholder().unwrap_or(FAILED_PLACEHOLDER).to_string();

        Self {
            path,
            language,
            outcome,
            summary,
        }
    }
}

/// `path` relative to `root`, `/`-separated. Paths outside `root` are
/// returned whole.
pub fn relative_display(path: &Path, root: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return path.to_string_lossy().into_owned();
    };
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        relative.to_string_lossy().into_owned()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_options_defaults() {
        let options = SummaryOptions::resolve(None, None).unwrap();
        assert_eq!(options, SummaryOptions::default());
        assert_eq!(options.detail_level, DetailLevel::Medium);
        assert_eq!(options.max_length, 500);
    }

    #[test]
    fn test_options_validation() {
        assert!(SummaryOptions::new(DetailLevel::High, 1).is_ok());
        assert!(SummaryOptions::new(DetailLevel::High, 2000).is_ok());
        assert!(SummaryOptions::new(DetailLevel::Low, 0).is_err());
        assert!(SummaryOptions::new(DetailLevel::Low, 2001).is_err());
    }

    #[test]
    fn test_detail_level_serde() {
        let level: DetailLevel = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(level, DetailLevel::High);
        assert_eq!(serde_json::to_string(&DetailLevel::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn test_outcome_from_remote_kind() {
        assert_eq!(
            SummaryOutcome::from_remote_kind(RemoteErrorKind::ContentTooLarge),
            SummaryOutcome::ExceedsModelLimit
        );
        assert_eq!(
            SummaryOutcome::from_remote_kind(RemoteErrorKind::TransientStatus),
            SummaryOutcome::NetworkIssue
        );
        assert_eq!(
            SummaryOutcome::from_remote_kind(RemoteErrorKind::Quota),
            SummaryOutcome::RateLimited
        );
        assert_eq!(
            SummaryOutcome::from_remote_kind(RemoteErrorKind::Unclassified),
            SummaryOutcome::Failed
        );
    }

    #[test]
    fn test_degraded_result_uses_placeholder() {
        let result = SummaryResult::degraded(
            "big.js".to_string(),
            LanguageTag::from_extension("js"),
            SummaryOutcome::TooLarge,
        );
        assert_eq!(result.summary, "File is too large to summarize.");
        assert!(result.outcome.is_degraded());
    }

    #[test]
    fn test_relative_display() {
        let root = PathBuf::from("/repo");
        assert_eq!(
            relative_display(Path::new("/repo/src/main.rs"), &root),
            "src/main.rs"
        );
        assert_eq!(
            relative_display(Path::new("/elsewhere/a.py"), &root),
            "/elsewhere/a.py"
        );
    }
}
