//! Typed JSON persistence for configuration documents.
//!
//! All writes are whole-file replacements. There is no partial-write
//! recovery: a failed save after a partial write surfaces as fatal to the
//! caller and leaves no transactional guarantee on disk. This is an accepted
//! limitation of the tool, not something the store papers over.

use crate::descriptor::ProjectDescriptor;
use crate::document::{ConstantDocument, OptionDocument};
use crate::error::{PrimordialError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Filesystem access used by the lifecycle controller. A trait so the state
/// machine stays testable without real disk I/O.
pub trait ConfigStore {
    fn exists(&self, path: &Path) -> bool;

    /// Create the directory and any missing parents. Idempotent.
    fn ensure_dir(&self, path: &Path) -> Result<()>;

    fn load_option(&self, path: &Path) -> Result<OptionDocument>;
    fn save_option(&self, path: &Path, document: &OptionDocument) -> Result<()>;

    fn load_constant(&self, path: &Path) -> Result<ConstantDocument>;
    fn save_constant(&self, path: &Path, document: &ConstantDocument) -> Result<()>;

    fn load_descriptor(&self, path: &Path) -> Result<ProjectDescriptor>;
    fn save_descriptor(&self, path: &Path, descriptor: &ProjectDescriptor) -> Result<()>;
}

/// Store backed by `std::fs` and `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsConfigStore;

impl FsConfigStore {
    fn read<T: DeserializeOwned>(&self, path: &Path, what: &'static str) -> Result<T> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(PrimordialError::not_found(what, path));
            }
            Err(source) => return Err(PrimordialError::io(path, source)),
        };
        serde_json::from_str(&contents).map_err(|source| PrimordialError::parse(path, source))
    }

    fn write<T: Serialize>(&self, path: &Path, document: &T) -> Result<()> {
        let mut serialized = serde_json::to_string_pretty(document)
            .map_err(|source| PrimordialError::parse(path, source))?;
        serialized.push('\n');
        fs::write(path, serialized).map_err(|source| PrimordialError::io(path, source))
    }
}

impl ConfigStore for FsConfigStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|source| PrimordialError::io(path, source))
    }

    fn load_option(&self, path: &Path) -> Result<OptionDocument> {
        self.read(path, "option document")
    }

    fn save_option(&self, path: &Path, document: &OptionDocument) -> Result<()> {
        self.write(path, document)
    }

    fn load_constant(&self, path: &Path) -> Result<ConstantDocument> {
        self.read(path, "constant document")
    }

    fn save_constant(&self, path: &Path, document: &ConstantDocument) -> Result<()> {
        self.write(path, document)
    }

    fn load_descriptor(&self, path: &Path) -> Result<ProjectDescriptor> {
        self.read(path, "project descriptor")
    }

    fn save_descriptor(&self, path: &Path, descriptor: &ProjectDescriptor) -> Result<()> {
        self.write(path, descriptor)
    }
}

impl<T: ConfigStore> ConfigStore for &T {
    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        (*self).ensure_dir(path)
    }

    fn load_option(&self, path: &Path) -> Result<OptionDocument> {
        (*self).load_option(path)
    }

    fn save_option(&self, path: &Path, document: &OptionDocument) -> Result<()> {
        (*self).save_option(path, document)
    }

    fn load_constant(&self, path: &Path) -> Result<ConstantDocument> {
        (*self).load_constant(path)
    }

    fn save_constant(&self, path: &Path, document: &ConstantDocument) -> Result<()> {
        (*self).save_constant(path, document)
    }

    fn load_descriptor(&self, path: &Path) -> Result<ProjectDescriptor> {
        (*self).load_descriptor(path)
    }

    fn save_descriptor(&self, path: &Path, descriptor: &ProjectDescriptor) -> Result<()> {
        (*self).save_descriptor(path, descriptor)
    }
}
