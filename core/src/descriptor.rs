//! Project descriptor (`package.json`) model.
//!
//! The descriptor drives every lifecycle operation. It is read-only from the
//! engine's point of view except for a one-shot in-memory back-fill of
//! `shell` and the `option.meta`/`option.local` directory defaults, which
//! `initialize` persists together with whatever else the file carried.
//! Fields the engine does not recognize are preserved verbatim through the
//! flattened `extra` map so a save never drops caller data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Default meta (template) configuration directory, relative to the root.
pub const DEFAULT_META_DIR: &str = "server/meta";
/// Default local (deployment) configuration directory, relative to the root.
pub const DEFAULT_LOCAL_DIR: &str = "server/local";

/// Package metadata driving the lifecycle engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// CLI namespace token; derived from `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engines: Option<Engines>,

    #[serde(default)]
    pub option: DeploymentPaths,

    /// Fields the engine does not interpret, preserved across saves.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectDescriptor {
    /// An empty descriptor is one that names no package at all; every
    /// operation refuses it before touching the filesystem.
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Back-fill optional fields in memory, returning one warning message per
    /// substitution so the caller can surface them without stopping.
    pub fn backfill_defaults(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.shell.is_none() {
            self.shell = Some(shell_token(&self.name));
            warnings.push("no shell command specified, deriving one from the package name".into());
        }

        if self.option.meta.is_none() {
            self.option.meta = Some(DEFAULT_META_DIR.to_string());
            warnings.push(format!(
                "meta template directory not specified, using {DEFAULT_META_DIR}"
            ));
        }

        if self.option.local.is_none() {
            self.option.local = Some(DEFAULT_LOCAL_DIR.to_string());
            warnings.push(format!(
                "local directory not specified, using {DEFAULT_LOCAL_DIR}"
            ));
        }

        warnings
    }
}

/// Engine requirements declared by the package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Engines {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where the meta and local configuration trees live, plus the server entry
/// point. `root_path`, when present, pins the project root; otherwise the
/// caller's working directory is threaded in explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<String>,

    #[serde(
        default,
        rename = "rootPath",
        skip_serializing_if = "Option::is_none"
    )]
    pub root_path: Option<PathBuf>,
}

/// Derive a CLI namespace token from a package name: lowercase, alphanumeric
/// runs joined by single dashes.
pub fn shell_token(name: &str) -> String {
    let mut token = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !token.is_empty() {
                token.push('-');
            }
            pending_dash = false;
            token.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shell_token_normalizes_names() {
        assert_eq!(shell_token("lire"), "lire");
        assert_eq!(shell_token("My Fancy_App"), "my-fancy-app");
        assert_eq!(shell_token("@scope/pkg"), "scope-pkg");
        assert_eq!(shell_token("--x--"), "x");
    }

    #[test]
    fn backfill_sets_missing_fields_and_warns_once_each() {
        let mut descriptor = ProjectDescriptor {
            name: "lire".into(),
            ..Default::default()
        };
        let warnings = descriptor.backfill_defaults();
        assert_eq!(warnings.len(), 3);
        assert_eq!(descriptor.shell.as_deref(), Some("lire"));
        assert_eq!(descriptor.option.meta.as_deref(), Some(DEFAULT_META_DIR));
        assert_eq!(descriptor.option.local.as_deref(), Some(DEFAULT_LOCAL_DIR));

        // Second pass finds nothing left to fill.
        assert!(descriptor.backfill_defaults().is_empty());
    }

    #[test]
    fn backfill_never_replaces_configured_values() {
        let mut descriptor = ProjectDescriptor {
            name: "lire".into(),
            shell: Some("custom".into()),
            option: DeploymentPaths {
                meta: Some("conf/meta".into()),
                local: Some("conf/local".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        descriptor.backfill_defaults();
        assert_eq!(descriptor.shell.as_deref(), Some("custom"));
        assert_eq!(descriptor.option.meta.as_deref(), Some("conf/meta"));
        assert_eq!(descriptor.option.local.as_deref(), Some("conf/local"));
    }

    #[test]
    fn unknown_descriptor_fields_survive_a_round_trip() {
        let raw = r#"{
            "name": "lire",
            "version": "0.2.0",
            "scripts": {"test": "mocha lire-test.js"},
            "keywords": ["read", "file"]
        }"#;
        let descriptor: ProjectDescriptor = serde_json::from_str(raw).unwrap();
        assert!(descriptor.extra.contains_key("scripts"));
        assert!(descriptor.extra.contains_key("keywords"));

        let back = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(back["scripts"]["test"], "mocha lire-test.js");
        assert_eq!(back["name"], "lire");
    }

    #[test]
    fn empty_descriptor_is_detected() {
        let descriptor: ProjectDescriptor = serde_json::from_str("{}").unwrap();
        assert!(descriptor.is_empty());
    }
}
