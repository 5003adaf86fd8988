//! Candidate file enumeration.
//!
//! Walks a root directory, keeps files with a target extension, prunes
//! excluded directories, and returns paths in lexicographic order so runs
//! are reproducible regardless of filesystem enumeration order.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("root directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Path exclusion entries, matched against paths relative to a root.
///
/// A single-component entry (`Button.tsx`, `node_modules`) matches any path
/// component, ignoring ASCII case. A multi-component entry
/// (`src/components/ui`) matches as a path prefix or suffix.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    root: PathBuf,
    entries: Vec<PathBuf>,
}

impl Exclusions {
    pub fn new<I>(root: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        Self {
            root: root.into(),
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.entries.iter().any(|entry| {
            let mut components = entry.components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => relative.components().any(|c| {
                    c.as_os_str()
                        .to_string_lossy()
                        .eq_ignore_ascii_case(&name.to_string_lossy())
                }),
                _ => relative.starts_with(entry) || relative.ends_with(entry),
            }
        })
    }
}

/// Enumerates candidate files under a root.
#[derive(Debug, Clone)]
pub struct FileCollector {
    root: PathBuf,
    extensions: Vec<String>,
    exclusions: Exclusions,
}

impl FileCollector {
    pub fn new<I>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let root = root.into();
        Self {
            exclusions: Exclusions::new(root.clone(), Vec::<PathBuf>::new()),
            root,
            extensions: extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_string())
                .collect(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|want| want == ext))
    }

    /// Collect every candidate file, sorted.
    ///
    /// Only a missing or non-directory root is an error. Entries that cannot
    /// be read during the walk are logged and skipped.
    pub fn collect(&self) -> Result<Vec<PathBuf>, CollectError> {
        if !self.root.exists() {
            return Err(CollectError::MissingRoot(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(CollectError::NotADirectory(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.exclusions.matches(entry.path()));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.wants(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}
