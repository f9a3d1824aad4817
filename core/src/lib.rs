//! Configuration lifecycle engine for package-driven deployment bootstrap.
//!
//! Given a project's `package.json`, the engine materializes a
//! per-environment local configuration from a canonical meta template
//! (`initialize`), folds newer meta defaults into an existing local
//! configuration without clobbering operator overrides (`transfer`), and
//! launches the project's server entry point with an explicitly selected
//! environment (`run`).
//!
//! The filesystem is the source of truth for lifecycle state: no state file
//! exists, only the presence predicate
//! [`lifecycle::LifecycleController::is_initialized`]. Collision policy is
//! uniform everywhere: existing local values win, meta and derived defaults
//! only ever contribute missing keys.

pub mod derive;
pub mod descriptor;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod launch;
pub mod lifecycle;
pub mod merge;
pub mod paths;
pub mod store;

pub use derive::{ConstantsDeriver, ServerDefaults};
pub use descriptor::{DeploymentPaths, Engines, ProjectDescriptor};
pub use diagnostics::{DiagnosticEvent, Diagnostics, RecordingSink, Severity, TracingSink};
pub use document::{AppType, ConstantDocument, Environment, OptionDocument};
pub use error::{ErrorCategory, PrimordialError, Result};
pub use launch::{LaunchOutcome, LaunchRequest, ProcessLauncher, SystemLauncher, Toolchain};
pub use lifecycle::{InitializeOutcome, LifecycleController, RunRequest};
pub use paths::ConfigLayout;
pub use store::{ConfigStore, FsConfigStore};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
