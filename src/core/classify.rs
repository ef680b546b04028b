//! Path classification: code versus documentation/configuration.

use crate::core::config::ClassifyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Code,
    Doc,
}

/// Lower-case and convert backslashes so Windows and POSIX paths compare alike.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

/// Classify a file path. Empty paths classify as neither.
pub fn classify_path(path: &str, config: &ClassifyConfig) -> Option<PathClass> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    let normalized = normalize(path);
    let is_doc = config
        .doc_extensions
        .iter()
        .any(|ext| normalized.ends_with(&ext.to_lowercase()))
        || config
            .doc_segments
            .iter()
            .any(|seg| normalized.contains(&seg.to_lowercase()));
    Some(if is_doc { PathClass::Doc } else { PathClass::Code })
}

pub fn is_code(path: &str, config: &ClassifyConfig) -> bool {
    classify_path(path, config) == Some(PathClass::Code)
}

/// True when the normalized path contains any of the given prefixes.
pub fn under_any(path: &str, prefixes: &[String]) -> bool {
    let normalized = normalize(path);
    prefixes
        .iter()
        .any(|p| !p.is_empty() && normalized.contains(&normalize(p)))
}
