//! Derived server constants.
//!
//! The mapping from selected options to baseline constants is project policy,
//! not algorithm, so it lives behind [`ConstantsDeriver`]: the engine only
//! requires a synchronous, side-effect-free function from an option document
//! to a constant document. [`ServerDefaults`] is the stock policy shipped
//! with the tool.

use crate::document::{ConstantDocument, Environment, OptionDocument};
use serde_json::{Map, Value, json};

/// Pluggable policy computing a baseline constant set from an option set.
pub trait ConstantsDeriver {
    fn derive(&self, options: &OptionDocument) -> ConstantDocument;
}

/// Stock wiring policy: one `server.<environment>` block per recognized
/// environment with port, host, and (when selected) service name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerDefaults;

impl ServerDefaults {
    fn default_port(environment: Environment) -> u16 {
        match environment {
            Environment::Local => 8080,
            Environment::Staging => 9090,
            Environment::Production => 80,
        }
    }

    fn default_host(environment: Environment) -> &'static str {
        match environment {
            Environment::Local => "localhost",
            Environment::Staging | Environment::Production => "0.0.0.0",
        }
    }
}

impl ConstantsDeriver for ServerDefaults {
    fn derive(&self, options: &OptionDocument) -> ConstantDocument {
        let mut server = Map::new();
        for environment in Environment::ALL {
            let branch = options.branch(environment);
            let mut wiring = Map::new();
            wiring.insert(
                "port".to_string(),
                branch
                    .get("port")
                    .cloned()
                    .unwrap_or_else(|| json!(Self::default_port(environment))),
            );
            wiring.insert(
                "host".to_string(),
                branch
                    .get("host")
                    .cloned()
                    .unwrap_or_else(|| json!(Self::default_host(environment))),
            );
            if let Some(service) = branch.get("service") {
                wiring.insert("service".to_string(), service.clone());
            }
            server.insert(environment.as_str().to_string(), Value::Object(wiring));
        }

        let mut root = Map::new();
        root.insert("server".to_string(), Value::Object(server));
        ConstantDocument(root)
    }
}
