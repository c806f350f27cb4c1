// file: src/repository/mod.rs
// description: source tree discovery module exports
// reference: internal module structure

pub mod ignore;
pub mod scanner;

pub use ignore::IgnoreFilter;
pub use scanner::{DirEntryInfo, DirSource, EntryKind, FileScanner, LocalFs, find_files};
