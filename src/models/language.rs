// file: src/models/language.rs
// description: extension to language mapping used for file selection and prompts
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Extensions (lower-case, no dot) a file must carry to be summarized.
pub const EXTENSION_TO_LANGUAGE: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("jsx", "JavaScript (React)"),
    ("tsx", "TypeScript (React)"),
    ("java", "Java"),
    ("cpp", "C++"),
    ("c", "C"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("cs", "C#"),
    ("swift", "Swift"),
    ("rs", "Rust"),
    ("kt", "Kotlin"),
    ("scala", "Scala"),
    ("vue", "Vue.js"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("less", "Less"),
];

pub const UNKNOWN_LANGUAGE: &str = "unknown";

pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    let extension = normalize_extension(extension);
    EXTENSION_TO_LANGUAGE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
}

pub fn is_supported_extension(extension: &str) -> bool {
    language_for_extension(extension).is_some()
}

/// Lower-cased extension of `path` without the dot, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn from_extension(extension: &str) -> Self {
        let normalized = normalize_extension(extension);
        if normalized.is_empty() {
            return Self::unknown();
        }

        match language_for_extension(&normalized) {
            Some(language) => Self(language.to_string()),
            None => Self(normalized),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        match extension_of(path) {
            Some(ext) => Self::from_extension(&ext),
            None => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_LANGUAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_LANGUAGE
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_extensions() {
        assert_eq!(LanguageTag::from_extension("py").as_str(), "Python");
        assert_eq!(LanguageTag::from_extension(".TSX").as_str(), "TypeScript (React)");
        assert_eq!(LanguageTag::from_path(Path::new("src/lib.RS")).as_str(), "Rust");
    }

    #[test]
    fn test_unmapped_extension_falls_back_to_bare_extension() {
        assert_eq!(LanguageTag::from_extension(".Zig").as_str(), "zig");
        assert_eq!(LanguageTag::from_path(Path::new("build.gradle")).as_str(), "gradle");
    }

    #[test]
    fn test_missing_extension_is_unknown() {
        assert!(LanguageTag::from_extension("").is_unknown());
        assert!(LanguageTag::from_path(Path::new("Makefile")).is_unknown());
        assert!(LanguageTag::from_path(Path::new(".gitignore")).is_unknown());
    }

    #[test]
    fn test_supported_extensions() {
        assert_eq!(EXTENSION_TO_LANGUAGE.len(), 21);
        assert!(is_supported_extension("js"));
        assert!(is_supported_extension(".JS"));
        assert!(!is_supported_extension("md"));
        assert!(!is_supported_extension(""));
    }
}
