//! Canonical path resolution for the meta and local configuration trees.
//!
//! Pure path arithmetic, no I/O. The four document paths plus the project
//! descriptor are computed once per invocation and handed around as a unit.

use crate::descriptor::{DEFAULT_LOCAL_DIR, DEFAULT_META_DIR, DeploymentPaths};
use std::path::{Path, PathBuf};

/// File name of the per-environment option document.
pub const OPTION_FILE: &str = "option.json";
/// File name of the constant document.
pub const CONSTANT_FILE: &str = "constant.json";
/// File name of the project descriptor at the root.
pub const DESCRIPTOR_FILE: &str = "package.json";

/// The resolved on-disk layout of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayout {
    pub root: PathBuf,
    pub descriptor: PathBuf,
    pub meta_dir: PathBuf,
    pub meta_option: PathBuf,
    pub meta_constant: PathBuf,
    pub local_dir: PathBuf,
    pub local_option: PathBuf,
    pub local_constant: PathBuf,
}

impl ConfigLayout {
    /// Resolve the layout against a project root. `paths.root_path` pins the
    /// root when configured; unset directories fall back to the defaults.
    pub fn resolve(root: &Path, paths: &DeploymentPaths) -> Self {
        let root = paths
            .root_path
            .clone()
            .unwrap_or_else(|| root.to_path_buf());
        let meta_dir = root.join(paths.meta.as_deref().unwrap_or(DEFAULT_META_DIR));
        let local_dir = root.join(paths.local.as_deref().unwrap_or(DEFAULT_LOCAL_DIR));
        Self {
            descriptor: root.join(DESCRIPTOR_FILE),
            meta_option: meta_dir.join(OPTION_FILE),
            meta_constant: meta_dir.join(CONSTANT_FILE),
            local_option: local_dir.join(OPTION_FILE),
            local_constant: local_dir.join(CONSTANT_FILE),
            meta_dir,
            local_dir,
            root,
        }
    }

    /// Resolve the server entry point against the project root.
    pub fn load_file(&self, load: &str) -> PathBuf {
        self.root.join(load)
    }
}
