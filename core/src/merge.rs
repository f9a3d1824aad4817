//! Right-biased deep merges over JSON mappings.
//!
//! Both lifecycle merges reduce to one primitive: [`backfill`], which inserts
//! keys the target is missing and recurses into nested objects, never
//! replacing a value the target already has. Collision resolution is always
//! "deepest existing target value wins"; there is no timestamp or version
//! tie-break because the system has no concept of conflicting edits, only
//! new keys introduced upstream.

use crate::document::{ConstantDocument, Environment, OptionDocument};
use serde_json::{Map, Value};

/// Insert every key of `source` absent from `target`, recursing where both
/// sides hold an object. Existing target values are never replaced, not even
/// when the source holds a deeper object under the same key.
pub fn backfill(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, incoming) in source {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), incoming.clone());
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(incoming) = incoming {
                    backfill(existing, incoming);
                }
            }
            Some(_) => {}
        }
    }
}

/// Fold meta option branches into the local document. Local values win on
/// every collision at every depth; branches present only in meta are copied.
pub fn reconcile_options(local: &mut OptionDocument, meta: &OptionDocument) {
    for environment in Environment::ALL {
        backfill(local.branch_mut(environment), meta.branch(environment));
    }
}

/// Fold meta constants into the local document under the same rule.
pub fn reconcile_constants(local: &mut ConstantDocument, meta: &ConstantDocument) {
    backfill(&mut local.0, &meta.0);
}
