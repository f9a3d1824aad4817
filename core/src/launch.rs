//! Child-process launch for the `run` operation.
//!
//! The launch request is a plain value: program, arguments, extra
//! environment, and working directory. The environment selector the child
//! sees is part of the request rather than ambient process state, so nothing
//! here mutates the parent's environment. Execution is synchronous with
//! inherited standard streams; interruption is expected to arrive as a
//! signal through the shared session, not via cancellation logic here.

use crate::descriptor::Engines;
use crate::document::Environment;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

/// Environment variable carrying the selected deployment level to the child.
pub const ENV_SELECTOR: &str = "NODE_ENV";

#[allow(clippy::expect_used)]
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("static pattern compiles"));

/// Which runtime executes the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// Plain `node` from PATH.
    Default,
    /// A pinned interpreter version, routed through the `n` version manager.
    Pinned(String),
}

impl Toolchain {
    /// Pin the runtime only when `engines.node` is an exact semantic version;
    /// ranges and partial versions fall back to the default toolchain.
    pub fn select(engines: Option<&Engines>) -> Self {
        match engines.and_then(|engines| engines.node.as_deref()) {
            Some(version) if VERSION_PATTERN.is_match(version) => {
                Self::Pinned(version.to_string())
            }
            _ => Self::Default,
        }
    }
}

/// Everything needed to execute the server entry point once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl LaunchRequest {
    /// Build the canonical command line:
    /// `<toolchain> <load-file> --<environment> [--service=<name>]`,
    /// with the deployment level exported as [`ENV_SELECTOR`].
    pub fn for_entry_point(
        toolchain: &Toolchain,
        load_file: &Path,
        environment: Environment,
        service: Option<&str>,
        cwd: &Path,
    ) -> Self {
        let (program, mut args) = match toolchain {
            Toolchain::Default => ("node".to_string(), Vec::new()),
            Toolchain::Pinned(version) => {
                ("n".to_string(), vec!["use".to_string(), version.clone()])
            }
        };
        args.push(load_file.display().to_string());
        args.push(format!("--{environment}"));
        if let Some(service) = service {
            args.push(format!("--service={service}"));
        }
        Self {
            program,
            args,
            env: vec![(ENV_SELECTOR.to_string(), environment.as_str().to_string())],
            cwd: cwd.to_path_buf(),
        }
    }

    /// Render the request for diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// How the child ended, when it could be started at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub success: bool,
    /// Exit code; `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

/// Executes a launch request and reports how the child ended. A trait so the
/// controller can be exercised without spawning real processes.
pub trait ProcessLauncher {
    fn launch(&self, request: &LaunchRequest) -> std::io::Result<LaunchOutcome>;
}

/// Launcher backed by `std::process::Command`, blocking until the child
/// terminates. Standard streams are inherited from the parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, request: &LaunchRequest) -> std::io::Result<LaunchOutcome> {
        let status = Command::new(&request.program)
            .args(&request.args)
            .envs(request.env.iter().map(|(key, value)| (key, value)))
            .current_dir(&request.cwd)
            .status()?;
        Ok(LaunchOutcome {
            success: status.success(),
            code: status.code(),
        })
    }
}

impl<T: ProcessLauncher> ProcessLauncher for &T {
    fn launch(&self, request: &LaunchRequest) -> std::io::Result<LaunchOutcome> {
        (*self).launch(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exact_versions_pin_the_toolchain() {
        let engines = Engines {
            node: Some("18.17.1".into()),
            ..Default::default()
        };
        assert_eq!(
            Toolchain::select(Some(&engines)),
            Toolchain::Pinned("18.17.1".into())
        );
    }

    #[test]
    fn ranges_and_absence_fall_back_to_default() {
        for version in ["^18.0.0", "18.x", "18.17", ""] {
            let engines = Engines {
                node: Some(version.into()),
                ..Default::default()
            };
            assert_eq!(Toolchain::select(Some(&engines)), Toolchain::Default);
        }
        assert_eq!(Toolchain::select(None), Toolchain::Default);
    }

    #[test]
    fn request_shapes_the_canonical_command_line() {
        let request = LaunchRequest::for_entry_point(
            &Toolchain::Default,
            Path::new("/srv/app/server/server.js"),
            Environment::Staging,
            Some("api"),
            Path::new("/srv/app"),
        );
        assert_eq!(request.program, "node");
        assert_eq!(
            request.command_line(),
            "node /srv/app/server/server.js --staging --service=api"
        );
        assert_eq!(
            request.env,
            vec![("NODE_ENV".to_string(), "staging".to_string())]
        );
        assert_eq!(request.cwd, Path::new("/srv/app"));
    }

    #[test]
    fn pinned_toolchain_routes_through_the_version_manager() {
        let request = LaunchRequest::for_entry_point(
            &Toolchain::Pinned("20.11.0".into()),
            Path::new("server.js"),
            Environment::Local,
            None,
            Path::new("."),
        );
        assert_eq!(request.program, "n");
        assert_eq!(request.args[..2], ["use".to_string(), "20.11.0".to_string()]);
        assert_eq!(request.command_line(), "n use 20.11.0 server.js --local");
    }
}
