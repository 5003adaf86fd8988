use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directories under the root that are never rewritten.
const FORBIDDEN_DIRS: &[&str] = &[".git", "node_modules"];

/// Root safety checks to prevent writing files outside the target tree.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Canonical path to the root
    root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl RootGuard {
    /// Create a new guard for `root`.
    ///
    /// The root is canonicalized so symlinked roots compare correctly.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref().canonicalize()?;
        let forbidden_paths = FORBIDDEN_DIRS.iter().map(|dir| root.join(dir)).collect();
        Ok(Self {
            root,
            forbidden_paths,
        })
    }

    /// Check that `path` is safe to write.
    ///
    /// A relative `path` is taken relative to the current directory, the
    /// same way the collector reports it. Returns the canonical path. Call
    /// immediately before writing so the check sees the same filesystem
    /// state as the write.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        // Resolves symlinks and `..` components
        let canonical = path.as_ref().canonicalize()?;

        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical,
                root: self.root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical,
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(canonical)
    }
}
