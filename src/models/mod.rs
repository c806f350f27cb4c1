// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod language;
pub mod summary;

pub use language::{LanguageTag, EXTENSION_TO_LANGUAGE};
pub use summary::{
    DetailLevel, SummaryOptions, SummaryOutcome, SummaryRequest, SummaryResult, relative_display,
};
