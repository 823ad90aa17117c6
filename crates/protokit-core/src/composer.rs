//! AppComposer — appends a component's code to an app and deduplicates imports.
//!
//! Import detection is purely textual: a top-level line that starts with
//! `import x` or `from x import y`. Two imports that differ only in spacing or
//! alias are different lines. Indented imports belong to the body.

use crate::error::ComposeError;
use crate::store::{AppId, AppStore};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Marker comment placed above each appended component body.
pub const COMPONENT_MARKER: &str = "# New Component";

static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:import\s+\S.*|from\s+\S+\s+import\s+.+)$").expect("import line pattern")
});

/// True when `line` is an import declaration at column 0.
pub fn is_import_line(line: &str) -> bool {
    IMPORT_LINE.is_match(line.trim_end())
}

/// Unique, sorted set of import lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet(BTreeSet<String>);

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, line: impl Into<String>) -> bool {
        self.0.insert(line.into())
    }

    pub fn union(&self, other: &ImportSet) -> ImportSet {
        ImportSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Newline-joined in lexicographic order.
    pub fn render(&self) -> String {
        self.iter().collect::<Vec<_>>().join("\n")
    }
}

/// Split a source into its import set and the trimmed remainder.
pub fn split_imports(source: &str) -> (ImportSet, String) {
    let mut imports = ImportSet::new();
    let mut body = Vec::new();
    for line in source.lines() {
        if is_import_line(line) {
            imports.insert(line.trim_end());
        } else {
            body.push(line);
        }
    }
    (imports, body.join("\n").trim().to_string())
}

/// Merge `component_source` into `app_source`: combined sorted imports, blank line,
/// app body, blank line, marker, component body. Appends on every call.
pub fn compose(app_source: &str, component_source: &str) -> String {
    let (app_imports, app_body) = split_imports(app_source);
    let (component_imports, component_body) = split_imports(component_source);
    let imports = app_imports.union(&component_imports);

    let mut out = String::new();
    if !imports.is_empty() {
        out.push_str(&imports.render());
        out.push_str("\n\n");
    }
    if !app_body.is_empty() {
        out.push_str(&app_body);
        out.push_str("\n\n");
    }
    out.push_str(COMPONENT_MARKER);
    out.push('\n');
    out.push_str(&component_body);
    out
}

/// Applies [`compose`] to a stored app with a single write.
pub struct AppComposer;

impl AppComposer {
    /// Read the app, compose in memory, write once. On any failure nothing is written.
    pub fn add_component(
        store: &AppStore,
        app_id: &AppId,
        component_source: &str,
    ) -> Result<String, ComposeError> {
        let current = store.read(app_id)?;
        let merged = compose(&current, component_source);
        store.write(app_id, &merged)?;
        tracing::info!(
            "[COMPOSER] Component merged into {} ({} bytes)",
            app_id,
            merged.len()
        );
        Ok(merged)
    }
}
