//! Command-line front end for the deployment bootstrap engine.
//!
//! The front end owns argument parsing and diagnostic rendering; every
//! decision with an invariant attached lives in `primordial-core`. Fatal
//! engine errors surface here as a single rendered line and a nonzero exit;
//! a child process that fails is the engine's `Issue` to report, not ours,
//! and leaves the exit status at zero.

use clap::{Args, Parser, Subcommand, ValueEnum};
use primordial_core::paths::DESCRIPTOR_FILE;
use primordial_core::{
    AppType, ConfigStore, Environment, FsConfigStore, LifecycleController, RunRequest,
};
use std::path::PathBuf;

/// Deployment bootstrap for package-driven projects.
#[derive(Debug, Parser)]
#[command(name = "primordial", version, about)]
pub struct Cli {
    /// Project root; defaults to the current directory
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the project's local configuration from the meta template
    Initialize,
    /// Merge newer meta defaults into the local configuration
    Transfer,
    /// Run the app type on a specific deployment level
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Server or client type application
    #[arg(value_enum, default_value_t = TypeArg::Server)]
    pub app_type: TypeArg,

    /// Level of deployment
    #[arg(value_enum, default_value_t = LevelArg::Local)]
    pub level: LevelArg,

    /// Service to address inside the application
    pub service: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Server,
    Client,
}

impl From<TypeArg> for AppType {
    fn from(value: TypeArg) -> Self {
        match value {
            TypeArg::Server => AppType::Server,
            TypeArg::Client => AppType::Client,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Local,
    Staging,
    Production,
}

impl From<LevelArg> for Environment {
    fn from(value: LevelArg) -> Self {
        match value {
            LevelArg::Local => Environment::Local,
            LevelArg::Staging => Environment::Staging,
            LevelArg::Production => Environment::Production,
        }
    }
}

/// Dispatch a parsed invocation and map it to a process exit code.
pub fn run_main(cli: Cli) -> i32 {
    match dispatch(cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error:#}");
            1
        }
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    let store = FsConfigStore;
    let mut descriptor = match store.load_descriptor(&root.join(DESCRIPTOR_FILE)) {
        Ok(descriptor) => descriptor,
        Err(error) => {
            tracing::error!("{error}");
            return Ok(1);
        }
    };

    // Engine failures below have already been rendered through the tracing
    // sink as a fatal diagnostic; only the exit code is decided here.
    let lifecycle = LifecycleController::with_defaults();
    let outcome = match cli.command {
        Command::Initialize => lifecycle.initialize(&mut descriptor, &root).map(|_| ()),
        Command::Transfer => lifecycle.transfer(&descriptor, &root),
        Command::Run(args) => {
            let request = RunRequest {
                app_type: args.app_type.into(),
                environment: args.level.into(),
                service: args.service,
            };
            lifecycle.run(&descriptor, &root, &request)
        }
    };

    Ok(match outcome {
        Ok(()) => 0,
        Err(_) => 1,
    })
}
