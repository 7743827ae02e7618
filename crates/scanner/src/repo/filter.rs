use crate::core::model::CodeFile;
use crate::repo::client::TreeEntry;

/// Directory names whose contents are never worth analyzing.
///
/// Matching is path-segment-aware: `vendor/lib.js` is excluded while
/// `my-vendor/lib.js` is not. (The legacy behavior was a plain substring
/// check on the path, which false-positives on unrelated segments.)
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "coverage",
    ".next",
    ".nuxt",
    "__snapshots__",
    "vendor",
    ".venv",
    "__pycache__",
];

/// Extensions that never contain analyzable source.
pub const IGNORED_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".woff", ".woff2", ".ttf", ".eot", ".pdf",
    ".md", ".txt", ".lock", ".log", ".map",
];

/// Reduces the raw tree listing to candidate files: blobs only, outside
/// ignored directories, without ignored extensions. Pure and
/// order-preserving, so filtering an already-filtered set is a no-op.
pub fn filter_candidates(
    entries: &[TreeEntry],
    ignored_dirs: &[String],
    ignored_extensions: &[String],
) -> Vec<CodeFile> {
    entries
        .iter()
        .filter(|entry| entry.kind == "blob")
        .filter(|entry| !in_ignored_dir(&entry.path, ignored_dirs))
        .filter(|entry| {
            !ignored_extensions
                .iter()
                .any(|ext| entry.path.ends_with(ext.as_str()))
        })
        .map(|entry| CodeFile::new(entry.path.clone(), entry.sha.clone()))
        .collect()
}

fn in_ignored_dir(path: &str, ignored_dirs: &[String]) -> bool {
    let mut components = path.split('/').collect::<Vec<_>>();
    // The last component is the file name, not a directory.
    components.pop();
    components
        .iter()
        .any(|component| ignored_dirs.iter().any(|dir| dir.as_str() == *component))
}
