//! Project root resolution
//!
//! Finds the enclosing project anchor for a working directory by walking
//! ancestors until a version-control marker appears. The result is used
//! only to scope cached decisions; it never changes a classification.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory entries that mark a project root
const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn", ".jj"];

/// Resolver with a per-instance memo so one resolution never re-walks
/// the same working directory
#[derive(Debug, Default)]
pub struct ProjectRootResolver {
    memo: HashMap<PathBuf, Option<PathBuf>>,
}

impl ProjectRootResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the project root for a working directory
    ///
    /// Returns the nearest ancestor (including `cwd` itself) containing a
    /// VCS marker, or `None` when the filesystem root is reached first.
    pub fn resolve(&mut self, cwd: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.memo.get(cwd) {
            return cached.clone();
        }
        let root = find_project_root(cwd);
        self.memo.insert(cwd.to_path_buf(), root.clone());
        root
    }

    /// Resolve from an optional cwd string, as carried by a request
    pub fn resolve_opt(&mut self, cwd: Option<&str>) -> Option<PathBuf> {
        cwd.and_then(|dir| self.resolve(Path::new(dir)))
    }
}

fn find_project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = Some(cwd);
    while let Some(dir) = current {
        for marker in VCS_MARKERS {
            if dir.join(marker).exists() {
                return Some(dir.to_path_buf());
            }
        }
        current = dir.parent();
    }
    None
}
