use crate::app::models::{Collection, FileEntry, ScanOptions, SkippedPath, TypeRules};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use indicatif::ProgressBar;
use pathdiff::diff_paths;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Directory names never descended into.
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "__pycache__",
    "venv",
    "env",
    "build",
    "dist",
];

pub struct Scanner<'a> {
    rules: &'a TypeRules,
    respect_gitignore: bool,
    exclude_set: GlobSet,
    progress: ProgressBar,
}

/// Collects with default walk options.
pub fn collect(paths: &[PathBuf], rules: &TypeRules) -> Collection {
    Scanner {
        rules,
        respect_gitignore: false,
        exclude_set: GlobSet::empty(),
        progress: ProgressBar::hidden(),
    }
    .collect(paths)
}

impl<'a> Scanner<'a> {
    pub fn new(rules: &'a TypeRules, options: &ScanOptions) -> Result<Self> {
        Ok(Self {
            rules,
            respect_gitignore: options.respect_gitignore,
            exclude_set: build_globset(&options.exclude)?,
            progress: ProgressBar::hidden(),
        })
    }

    /// Reports every accepted file on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Walks every input path in order and returns the accepted files,
    /// each path at most once.
    pub fn collect(&self, paths: &[PathBuf]) -> Collection {
        let mut collection = Collection::default();
        let mut seen = HashSet::new();

        for input in paths {
            let path = match fs::canonicalize(input) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("Skipping {}: {}", input.display(), e);
                    collection.skipped.push(SkippedPath {
                        path: input.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if path.is_dir() {
                log::debug!("Walking directory: {}", path.display());
                self.walk(&path, &mut seen, &mut collection);
            } else {
                self.process_file(&path, &mut seen, &mut collection);
            }
        }

        collection
    }

    fn walk(&self, root: &Path, seen: &mut HashSet<PathBuf>, collection: &mut Collection) {
        let exclude_set = self.exclude_set.clone();
        let walk_root = root.to_path_buf();

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .git_ignore(self.respect_gitignore)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| keep_entry(entry, &walk_root, &exclude_set))
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    let path = entry.path();
                    // A dangling link fails to open and is recorded as a skip.
                    if path.is_file() || (entry.path_is_symlink() && !path.exists()) {
                        self.process_file(path, seen, collection);
                    }
                }
                Err(err) => {
                    log::warn!("Error walking entry: {}", err);
                    collection.skipped.push(SkippedPath {
                        path: error_path(&err).unwrap_or(root).to_path_buf(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    fn process_file(&self, path: &Path, seen: &mut HashSet<PathBuf>, collection: &mut Collection) {
        let Some(key) = path
            .file_name()
            .and_then(OsStr::to_str)
            .and_then(|name| self.rules.classify(name))
        else {
            log::trace!("Not an allowed type: {}", path.display());
            return;
        };

        if seen.contains(path) {
            return;
        }

        // Reading happens later; only make sure the file can be opened now.
        if let Err(e) = File::open(path) {
            log::warn!("Skipping unreadable file {}: {}", path.display(), e);
            collection.skipped.push(SkippedPath {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            return;
        }

        seen.insert(path.to_path_buf());
        self.progress.inc(1);
        self.progress
            .set_message(format!("Collecting {}", path.display()));
        collection
            .entries
            .push(FileEntry::new(path.to_path_buf(), key));
    }
}

/// Prunes noise directories, hidden entries and user excludes below the root.
fn keep_entry(entry: &DirEntry, root: &Path, exclude_set: &GlobSet) -> bool {
    if entry.depth() == 0 {
        return true;
    }

    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }

    let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
    if is_dir && SKIPPED_DIRS.contains(&&*name) {
        return false;
    }

    match diff_paths(entry.path(), root) {
        Some(relative) => !exclude_set.is_match(&relative),
        None => true,
    }
}

/// The innermost path an `ignore` error is attached to.
fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}

pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat).context(format!("Invalid glob pattern: {}", pat))?);
    }
    Ok(builder.build()?)
}
