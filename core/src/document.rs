//! Persisted configuration document shapes.
//!
//! The engine only recognizes two document shapes: the per-environment
//! [`OptionDocument`] and the free-form [`ConstantDocument`]. Anything else
//! at the top level of an option file is rejected at load time as a parse
//! error rather than being carried along as dynamic data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deployment level selecting the authoritative option branch for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl Environment {
    /// All recognized environments, in document order.
    pub const ALL: [Environment; 3] = [Self::Local, Self::Staging, Self::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application flavor for `run`. Only server wiring exists today; the engine
/// treats the value as pass-through policy for the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    Server,
    Client,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

/// Environment name → environment-specific option mapping.
///
/// Unknown top-level keys are a structural error: the loader surfaces them
/// as `ParseError` instead of guessing at the author's intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionDocument {
    #[serde(default)]
    pub local: Map<String, Value>,
    #[serde(default)]
    pub staging: Map<String, Value>,
    #[serde(default)]
    pub production: Map<String, Value>,
}

impl OptionDocument {
    pub fn branch(&self, environment: Environment) -> &Map<String, Value> {
        match environment {
            Environment::Local => &self.local,
            Environment::Staging => &self.staging,
            Environment::Production => &self.production,
        }
    }

    pub fn branch_mut(&mut self, environment: Environment) -> &mut Map<String, Value> {
        match environment {
            Environment::Local => &mut self.local,
            Environment::Staging => &mut self.staging,
            Environment::Production => &mut self.production,
        }
    }
}

/// Free-form mapping of configuration keys to values, seeded with derived
/// defaults and thereafter owned by the deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstantDocument(pub Map<String, Value>);

impl ConstantDocument {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_option_document_has_three_empty_branches() {
        let doc: OptionDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, OptionDocument::default());
        for env in Environment::ALL {
            assert!(doc.branch(env).is_empty());
        }
    }

    #[test]
    fn unknown_top_level_shape_is_rejected() {
        let result: Result<OptionDocument, _> =
            serde_json::from_str(r#"{"local": {}, "integration": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn environment_names_round_trip() {
        for env in Environment::ALL {
            let json = serde_json::to_string(&env).unwrap();
            assert_eq!(json, format!("\"{env}\""));
            let back: Environment = serde_json::from_str(&json).unwrap();
            assert_eq!(back, env);
        }
    }

    #[test]
    fn constant_document_is_transparent_json() {
        let doc: ConstantDocument = serde_json::from_str(r#"{"server": {"port": 80}}"#).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"server":{"port":80}}"#);
    }
}
