use crate::app::models::{FileEntry, SkippedPath};
use crate::app::scanner::{build_globset, Scanner};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// The entry list a single run works on.
#[derive(Debug, Default)]
pub struct Session {
    entries: Vec<FileEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects `paths` and appends the files not already present.
    /// Returns the number of new entries and what the scanner skipped.
    pub fn add_paths(&mut self, scanner: &Scanner, paths: &[PathBuf]) -> (usize, Vec<SkippedPath>) {
        let collection = scanner.collect(paths);
        let before = self.entries.len();

        for entry in collection.entries {
            if self.contains(&entry.path) {
                log::debug!("Path already added: {}", entry.path.display());
                continue;
            }
            self.entries.push(entry);
        }

        (self.entries.len() - before, collection.skipped)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path != path);
        let removed = self.entries.len() != before;
        if removed {
            log::info!("Removed: {}", path.display());
        }
        removed
    }

    pub fn remove_selected(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.selected);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn set_selected(&mut self, path: &Path, selected: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => {
                entry.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Unchecks every entry whose path matches one of the globs.
    pub fn deselect_matching(&mut self, patterns: &[String]) -> Result<usize> {
        if patterns.is_empty() {
            return Ok(0);
        }

        let set = build_globset(patterns)?;

        let mut count = 0;
        for entry in self.entries.iter_mut().filter(|e| e.selected) {
            if set.is_match(&entry.path) {
                entry.selected = false;
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn selected(&self) -> Vec<FileEntry> {
        self.entries.iter().filter(|e| e.selected).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
