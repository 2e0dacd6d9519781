use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

/// Extensions and filenames accepted out of the box.
pub const DEFAULT_ALLOWED: &[&str] = &[".py", ".ts", ".tsx", ".css", "readme.md"];

/// A file accepted by the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// The extension (".py") or exact filename ("readme.md") that matched.
    pub key: String,
    pub selected: bool,
}

impl FileEntry {
    pub fn new(path: PathBuf, key: String) -> Self {
        Self {
            path,
            key,
            selected: true,
        }
    }
}

/// Allow/deny lists used to classify files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRules {
    pub allowed: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
}

impl Default for TypeRules {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED.iter().map(|s| s.to_string()).collect(),
            blocked: BTreeSet::new(),
        }
    }
}

impl TypeRules {
    /// Lower-cases a user supplied type; bare words like `py` become `.py`.
    pub fn normalize(raw: &str) -> Option<String> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() || value == "." {
            return None;
        }
        if value.contains('.') {
            Some(value)
        } else {
            Some(format!(".{}", value))
        }
    }

    /// Returns the matching key if the file name passes both lists.
    ///
    /// Keys starting with `.` only ever match extensions, everything else
    /// matches whole file names.
    pub fn classify(&self, file_name: &str) -> Option<String> {
        let name = file_name.to_lowercase();
        let ext = name
            .rfind('.')
            .filter(|&idx| idx > 0)
            .map(|idx| name[idx..].to_string());
        let by_name = !name.starts_with('.');

        if by_name && self.blocked.contains(&name) {
            return None;
        }
        if ext.as_ref().is_some_and(|e| self.blocked.contains(e)) {
            return None;
        }

        if by_name && self.allowed.contains(&name) {
            return Some(name);
        }
        ext.filter(|e| self.allowed.contains(e))
    }

    pub fn allow(&mut self, raw: &str) -> bool {
        match Self::normalize(raw) {
            Some(t) => self.allowed.insert(t),
            None => false,
        }
    }

    pub fn disallow(&mut self, raw: &str) -> bool {
        match Self::normalize(raw) {
            Some(t) => self.allowed.remove(&t),
            None => false,
        }
    }

    pub fn block(&mut self, raw: &str) -> bool {
        match Self::normalize(raw) {
            Some(t) => self.blocked.insert(t),
            None => false,
        }
    }

    pub fn unblock(&mut self, raw: &str) -> bool {
        match Self::normalize(raw) {
            Some(t) => self.blocked.remove(&t),
            None => false,
        }
    }

    /// Restores the built-in lists. Returns false if nothing changed.
    pub fn reset(&mut self) -> bool {
        let defaults = Self::default();
        if *self == defaults {
            return false;
        }
        *self = defaults;
        true
    }
}

/// How paths are shown in headers and tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PathStyle {
    #[default]
    Absolute,
    Relative(PathBuf),
}

impl PathStyle {
    /// Collected paths are canonical, so the base has to be as well.
    pub fn relative_to(base: PathBuf) -> Self {
        Self::Relative(fs::canonicalize(&base).unwrap_or(base))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub include_path: bool,
    pub use_xml_tags: bool,
    pub path_style: PathStyle,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            include_path: true,
            use_xml_tags: true,
            path_style: PathStyle::Absolute,
        }
    }
}

/// Walk-time options that are not part of the type rules.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub respect_gitignore: bool,
    pub exclude: Vec<String>,
}

/// A path the collector had to leave out, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Collection {
    pub entries: Vec<FileEntry>,
    pub skipped: Vec<SkippedPath>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FormattedOutput {
    pub text: String,
    /// Files whose content actually made it into `text`.
    pub files_included: usize,
    pub total_chars: usize,
}
