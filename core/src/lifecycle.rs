//! The initialize/transfer/run state machine.
//!
//! Lifecycle state is never persisted; the filesystem is the source of
//! truth. A project is Uninitialized while either local document is missing,
//! Initialized once both exist, and `transfer` reconciles the divergence
//! that accrues as the meta tree moves on. All fatal conditions are checked
//! before the first write of an operation where possible; once mutation
//! begins there is no rollback, and an error mid-sequence leaves the disk
//! exactly as far as the sequence got.
//!
//! Concurrency is out of scope: two invocations racing on the same local
//! directory interleave writes last-writer-wins per file. The tool assumes a
//! single operator.

use crate::derive::ConstantsDeriver;
use crate::descriptor::ProjectDescriptor;
use crate::diagnostics::Diagnostics;
use crate::document::{AppType, Environment};
use crate::error::{PrimordialError, Result};
use crate::launch::{LaunchRequest, ProcessLauncher, Toolchain};
use crate::merge;
use crate::paths::ConfigLayout;
use crate::store::ConfigStore;
use std::path::Path;

/// What `initialize` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeOutcome {
    /// Local configuration was materialized from the meta template.
    Initialized,
    /// Both local documents already existed; nothing was written.
    AlreadyInitialized,
}

/// Parameters of one `run` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub app_type: AppType,
    pub environment: Environment,
    pub service: Option<String>,
}

/// Orchestrates path resolution, document persistence, merging, and launch.
pub struct LifecycleController<S, L, D> {
    store: S,
    launcher: L,
    diagnostics: D,
    deriver: Box<dyn ConstantsDeriver>,
}

impl
    LifecycleController<
        crate::store::FsConfigStore,
        crate::launch::SystemLauncher,
        crate::diagnostics::TracingSink,
    >
{
    /// Controller wired with the real filesystem, the system process
    /// launcher, the tracing sink, and the stock constants policy.
    pub fn with_defaults() -> Self {
        Self::new(
            crate::store::FsConfigStore,
            crate::launch::SystemLauncher,
            crate::diagnostics::TracingSink,
            Box::new(crate::derive::ServerDefaults),
        )
    }
}

impl<S, L, D> LifecycleController<S, L, D>
where
    S: ConfigStore,
    L: ProcessLauncher,
    D: Diagnostics,
{
    pub fn new(store: S, launcher: L, diagnostics: D, deriver: Box<dyn ConstantsDeriver>) -> Self {
        Self {
            store,
            launcher,
            diagnostics,
            deriver,
        }
    }

    /// The named lifecycle predicate: a project is initialized exactly when
    /// both local documents exist.
    pub fn is_initialized(&self, layout: &ConfigLayout) -> bool {
        self.store.exists(&layout.local_option) && self.store.exists(&layout.local_constant)
    }

    /// Emit the single fatal diagnostic for an error, then hand it back.
    /// Every public operation funnels its failure through here exactly once.
    fn fail(&self, error: PrimordialError) -> PrimordialError {
        self.diagnostics.fatal(error.to_string());
        error
    }

    /// Materialize the local configuration from the meta template.
    ///
    /// Idempotent: when both local documents already exist the operation
    /// reports success without touching the disk. Otherwise the meta tier is
    /// seeded (empty documents for absent files), self-healed with derived
    /// defaults, copied to the local tier, and the descriptor is persisted
    /// with any back-filled fields.
    pub fn initialize(
        &self,
        descriptor: &mut ProjectDescriptor,
        root: &Path,
    ) -> Result<InitializeOutcome> {
        self.initialize_inner(descriptor, root)
            .map_err(|error| self.fail(error))
    }

    fn initialize_inner(
        &self,
        descriptor: &mut ProjectDescriptor,
        root: &Path,
    ) -> Result<InitializeOutcome> {
        if descriptor.is_empty() {
            return Err(PrimordialError::config("empty descriptor"));
        }
        if descriptor.homepage.is_none() {
            self.diagnostics.warning("no home page specified");
        }
        for warning in descriptor.backfill_defaults() {
            self.diagnostics.warning(warning);
        }

        let layout = ConfigLayout::resolve(root, &descriptor.option);
        if !self.store.exists(&layout.descriptor) {
            return Err(PrimordialError::config("missing project descriptor"));
        }

        // Seed the meta tier so a bare checkout still initializes.
        self.store.ensure_dir(&layout.meta_dir)?;
        if !self.store.exists(&layout.meta_option) {
            self.store
                .save_option(&layout.meta_option, &Default::default())?;
        }
        if !self.store.exists(&layout.meta_constant) {
            self.store
                .save_constant(&layout.meta_constant, &Default::default())?;
        }
        self.store.ensure_dir(&layout.local_dir)?;

        if self.is_initialized(&layout) {
            self.diagnostics
                .info("local configuration already initialized");
            return Ok(InitializeOutcome::AlreadyInitialized);
        }

        let meta_option = self.store.load_option(&layout.meta_option)?;
        let derived = self.deriver.derive(&meta_option);
        let mut meta_constant = self.store.load_constant(&layout.meta_constant)?;
        merge::backfill(&mut meta_constant.0, &derived.0);

        // The meta tier self-heals with derived defaults, then the local
        // tier starts as an exact copy of it.
        self.store.save_option(&layout.meta_option, &meta_option)?;
        self.store
            .save_constant(&layout.meta_constant, &meta_constant)?;
        self.store.save_option(&layout.local_option, &meta_option)?;
        self.store
            .save_constant(&layout.local_constant, &meta_constant)?;
        self.store.save_descriptor(&layout.descriptor, descriptor)?;

        self.diagnostics.info(format!(
            "initialized local configuration in {}",
            layout.local_dir.display()
        ));
        Ok(InitializeOutcome::Initialized)
    }

    /// Merge newer meta defaults into the existing local configuration.
    ///
    /// Transfer never creates; it only reconciles structures a prior
    /// `initialize` left behind. Local values win on every collision; meta
    /// contributes new keys only. All four documents are loaded before the
    /// first write so a parse failure never persists a partial merge.
    pub fn transfer(&self, descriptor: &ProjectDescriptor, root: &Path) -> Result<()> {
        self.transfer_inner(descriptor, root)
            .map_err(|error| self.fail(error))
    }

    fn transfer_inner(&self, descriptor: &ProjectDescriptor, root: &Path) -> Result<()> {
        if descriptor.is_empty() {
            return Err(PrimordialError::config("empty descriptor"));
        }
        if descriptor.option.meta.is_none() {
            return Err(PrimordialError::config("option.meta is not configured"));
        }
        if descriptor.option.local.is_none() {
            return Err(PrimordialError::config("option.local is not configured"));
        }

        let layout = ConfigLayout::resolve(root, &descriptor.option);
        for (what, path) in [
            ("meta directory", &layout.meta_dir),
            ("meta option document", &layout.meta_option),
            ("meta constant document", &layout.meta_constant),
            ("local directory", &layout.local_dir),
            ("local option document", &layout.local_option),
            ("local constant document", &layout.local_constant),
        ] {
            if !self.store.exists(path) {
                return Err(PrimordialError::not_found(what, path));
            }
        }

        let meta_option = self.store.load_option(&layout.meta_option)?;
        let meta_constant = self.store.load_constant(&layout.meta_constant)?;
        let mut local_option = self.store.load_option(&layout.local_option)?;
        let mut local_constant = self.store.load_constant(&layout.local_constant)?;

        merge::reconcile_options(&mut local_option, &meta_option);
        let derived = self.deriver.derive(&local_option);
        merge::reconcile_constants(&mut local_constant, &meta_constant);
        merge::backfill(&mut local_constant.0, &derived.0);

        self.store.save_option(&layout.local_option, &local_option)?;
        self.store
            .save_constant(&layout.local_constant, &local_constant)?;

        self.diagnostics.info(format!(
            "transferred meta configuration into {}",
            layout.local_dir.display()
        ));
        Ok(())
    }

    /// Launch the project's server entry point.
    ///
    /// The controller's own success reflects only controller-side fatal
    /// conditions. A child that fails to start or exits nonzero is reported
    /// as an `Issue` and swallowed; revisit deliberately before changing
    /// that asymmetry.
    pub fn run(
        &self,
        descriptor: &ProjectDescriptor,
        root: &Path,
        request: &RunRequest,
    ) -> Result<()> {
        self.run_inner(descriptor, root, request)
            .map_err(|error| self.fail(error))
    }

    fn run_inner(
        &self,
        descriptor: &ProjectDescriptor,
        root: &Path,
        request: &RunRequest,
    ) -> Result<()> {
        let layout = ConfigLayout::resolve(root, &descriptor.option);
        let load = descriptor
            .option
            .load
            .as_deref()
            .ok_or_else(|| PrimordialError::config("no load file specified"))?;
        let load_file = layout.load_file(load);
        if !self.store.exists(&load_file) {
            return Err(PrimordialError::not_found("load file", &load_file));
        }

        let toolchain = Toolchain::select(descriptor.engines.as_ref());
        let launch = LaunchRequest::for_entry_point(
            &toolchain,
            &load_file,
            request.environment,
            request.service.as_deref(),
            &layout.root,
        );
        self.diagnostics.info(format!(
            "launching {} {} on {}: {}",
            descriptor.name,
            request.app_type.as_str(),
            request.environment,
            launch.command_line()
        ));

        match self.launcher.launch(&launch) {
            Err(error) => {
                self.diagnostics
                    .issue(format!("failed to launch {}: {error}", launch.program));
            }
            Ok(outcome) if !outcome.success => {
                let status = outcome
                    .code
                    .map_or_else(|| "signal".to_string(), |code| code.to_string());
                self.diagnostics
                    .issue(format!("server exited with status {status}"));
            }
            Ok(_) => {
                self.diagnostics.info("server exited cleanly");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::ServerDefaults;
    use crate::diagnostics::{RecordingSink, Severity};
    use crate::document::{ConstantDocument, OptionDocument};
    use crate::error::ErrorCategory;
    use crate::launch::LaunchOutcome;
    use std::collections::{HashMap, HashSet};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory store so the state machine is exercised without disk I/O.
    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<PathBuf, String>>,
        dirs: Mutex<HashSet<PathBuf>>,
    }

    impl MemoryStore {
        fn put<T: serde::Serialize>(&self, path: &Path, value: &T) {
            self.files.lock().unwrap().insert(
                path.to_path_buf(),
                serde_json::to_string(value).unwrap(),
            );
        }

        fn get<T: serde::de::DeserializeOwned>(&self, path: &Path, what: &'static str) -> Result<T> {
            let files = self.files.lock().unwrap();
            let raw = files
                .get(path)
                .ok_or_else(|| PrimordialError::not_found(what, path))?;
            serde_json::from_str(raw).map_err(|source| PrimordialError::parse(path, source))
        }
    }

    impl ConfigStore for MemoryStore {
        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
                || self.dirs.lock().unwrap().contains(path)
        }

        fn ensure_dir(&self, path: &Path) -> Result<()> {
            self.dirs.lock().unwrap().insert(path.to_path_buf());
            Ok(())
        }

        fn load_option(&self, path: &Path) -> Result<OptionDocument> {
            self.get(path, "option document")
        }

        fn save_option(&self, path: &Path, document: &OptionDocument) -> Result<()> {
            self.put(path, document);
            Ok(())
        }

        fn load_constant(&self, path: &Path) -> Result<ConstantDocument> {
            self.get(path, "constant document")
        }

        fn save_constant(&self, path: &Path, document: &ConstantDocument) -> Result<()> {
            self.put(path, document);
            Ok(())
        }

        fn load_descriptor(&self, path: &Path) -> Result<ProjectDescriptor> {
            self.get(path, "project descriptor")
        }

        fn save_descriptor(&self, path: &Path, descriptor: &ProjectDescriptor) -> Result<()> {
            self.put(path, descriptor);
            Ok(())
        }
    }

    /// Launcher that records requests instead of spawning.
    #[derive(Default)]
    struct RecordingLauncher {
        requests: Mutex<Vec<LaunchRequest>>,
        outcome: Option<LaunchOutcome>,
    }

    impl ProcessLauncher for RecordingLauncher {
        fn launch(&self, request: &LaunchRequest) -> std::io::Result<LaunchOutcome> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.outcome.unwrap_or(LaunchOutcome {
                success: true,
                code: Some(0),
            }))
        }
    }

    fn controller<'a>(
        store: &'a MemoryStore,
        launcher: &'a RecordingLauncher,
        sink: &'a RecordingSink,
    ) -> LifecycleController<&'a MemoryStore, &'a RecordingLauncher, &'a RecordingSink> {
        LifecycleController::new(store, launcher, sink, Box::new(ServerDefaults))
    }

    fn descriptor(name: &str) -> ProjectDescriptor {
        ProjectDescriptor {
            name: name.into(),
            version: "0.1.0".into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_descriptor_is_fatal_before_any_mutation() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher::default();
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let mut empty = ProjectDescriptor::default();
        let err = lifecycle
            .initialize(&mut empty, Path::new("/proj"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(store.files.lock().unwrap().is_empty());
        assert!(store.dirs.lock().unwrap().is_empty());
        assert_eq!(sink.messages_with(Severity::Fatal).len(), 1);
    }

    #[test]
    fn initialize_requires_the_descriptor_file_on_disk() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher::default();
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let err = lifecycle
            .initialize(&mut descriptor("demo"), Path::new("/proj"))
            .unwrap_err();
        assert!(err.to_string().contains("missing project descriptor"));
    }

    #[test]
    fn fresh_initialize_seeds_meta_and_copies_to_local() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher::default();
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let mut desc = descriptor("demo");
        store.put(Path::new("/proj/package.json"), &desc);
        let outcome = lifecycle
            .initialize(&mut desc, Path::new("/proj"))
            .unwrap();
        assert_eq!(outcome, InitializeOutcome::Initialized);

        // Back-fill happened in memory and was persisted.
        assert_eq!(desc.shell.as_deref(), Some("demo"));
        let saved: ProjectDescriptor = store
            .get(Path::new("/proj/package.json"), "project descriptor")
            .unwrap();
        assert_eq!(saved.option.meta.as_deref(), Some("server/meta"));

        // Local documents are exact copies of the healed meta documents.
        let files = store.files.lock().unwrap();
        assert_eq!(
            files[Path::new("/proj/server/meta/option.json")],
            files[Path::new("/proj/server/local/option.json")]
        );
        assert_eq!(
            files[Path::new("/proj/server/meta/constant.json")],
            files[Path::new("/proj/server/local/constant.json")]
        );
        assert!(files[Path::new("/proj/server/local/constant.json")].contains("8080"));
    }

    #[test]
    fn second_initialize_is_a_no_op() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher::default();
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let mut desc = descriptor("demo");
        store.put(Path::new("/proj/package.json"), &desc);
        lifecycle.initialize(&mut desc, Path::new("/proj")).unwrap();

        // An operator edit must survive the second call untouched.
        let local_option = PathBuf::from("/proj/server/local/option.json");
        store.files.lock().unwrap().insert(
            local_option.clone(),
            r#"{"local":{"port":1}}"#.to_string(),
        );

        let outcome = lifecycle.initialize(&mut desc, Path::new("/proj")).unwrap();
        assert_eq!(outcome, InitializeOutcome::AlreadyInitialized);
        assert_eq!(
            store.files.lock().unwrap()[&local_option],
            r#"{"local":{"port":1}}"#
        );
        assert!(
            sink.messages_with(Severity::Info)
                .iter()
                .any(|m| m.contains("already initialized"))
        );
    }

    #[test]
    fn transfer_refuses_an_uninitialized_tree() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher::default();
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let mut desc = descriptor("demo");
        desc.backfill_defaults();
        let err = lifecycle.transfer(&desc, Path::new("/proj")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn transfer_requires_configured_directories() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher::default();
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let err = lifecycle
            .transfer(&descriptor("demo"), Path::new("/proj"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("option.meta"));
    }

    #[test]
    fn run_fails_before_spawn_when_the_load_file_is_missing() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher::default();
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let mut desc = descriptor("demo");
        desc.option.load = Some("server/server.js".into());
        let request = RunRequest {
            app_type: AppType::Server,
            environment: Environment::Local,
            service: None,
        };
        let err = lifecycle
            .run(&desc, Path::new("/proj"), &request)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(launcher.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn run_swallows_a_failing_child_as_an_issue() {
        let store = MemoryStore::default();
        let launcher = RecordingLauncher {
            outcome: Some(LaunchOutcome {
                success: false,
                code: Some(7),
            }),
            ..Default::default()
        };
        let sink = RecordingSink::new();
        let lifecycle = controller(&store, &launcher, &sink);

        let mut desc = descriptor("demo");
        desc.option.load = Some("server/server.js".into());
        store.put(
            Path::new("/proj/server/server.js"),
            &serde_json::json!("stub"),
        );

        let request = RunRequest {
            app_type: AppType::Server,
            environment: Environment::Staging,
            service: Some("api".into()),
        };
        lifecycle.run(&desc, Path::new("/proj"), &request).unwrap();

        let requests = launcher.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].env,
            vec![("NODE_ENV".to_string(), "staging".to_string())]
        );
        assert!(requests[0].args.iter().any(|a| a == "--staging"));
        assert!(requests[0].args.iter().any(|a| a == "--service=api"));
        let issues = sink.messages_with(Severity::Issue);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("status 7"));
    }
}
