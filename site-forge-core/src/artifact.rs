//! Splits a generated artifact into named files.
//!
//! The generator is asked to emit every file behind a marker line:
//!
//! ```text
//! FILE: index.html
//! <p>hi</p>
//! FILE: style.css
//! body{}
//! ```
//!
//! [`parse`] is a single pass over the lines with two states (no section open /
//! section open). Only a line starting with the exact, case-sensitive prefix `FILE: `
//! opens a section. Lines before the first marker are dropped. A repeated name
//! restarts that file's content, keeping its original position.

use indexmap::map::Iter;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Marker prefix that opens a new file section.
pub const FILE_MARKER: &str = "FILE: ";

/// Ordered mapping of file name to file content, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: IndexMap<String, String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the entry for `name` with empty content.
    pub fn open(&mut self, name: impl Into<String>) {
        self.files.insert(name.into(), String::new());
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn append_line(&mut self, name: &str, line: &str) {
        if let Some(content) = self.files.get_mut(name) {
            content.push_str(line);
            content.push('\n');
        }
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Parse a raw artifact into a [`FileSet`].
///
/// Never fails: an artifact without markers yields an empty set, which the caller must
/// reject.
pub fn parse(raw: &str) -> FileSet {
    let mut files = FileSet::new();
    let mut current: Option<String> = None;
    let mut discarded = 0usize;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix(FILE_MARKER) {
            let name = rest.trim().to_string();
            if files.get(&name).is_some() {
                warn!(file = %name, "[PARSE] Duplicate file marker, earlier content replaced");
            }
            files.open(name.clone());
            current = Some(name);
            continue;
        }
        match &current {
            Some(name) => files.append_line(name, line),
            None => discarded += 1,
        }
    }

    debug!(
        files = files.len(),
        discarded_lines = discarded,
        "[PARSE] Artifact parsed"
    );
    files
}
