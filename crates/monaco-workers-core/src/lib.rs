#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod bootstrap;
pub mod bundler;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod monaco;
pub mod paths;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod version;
pub mod workers;

pub use bootstrap::{inject_head_prepend, BootstrapConfig};
pub use bundler::{EsbuildBundler, WorkerBundler};
pub use cache::{BuildCache, BuildState};
pub use config::{load_options, DistPath, MonacoEditorOptions, ResolvedOptions};
pub use error::{Error, Result};
pub use middleware::{DevMiddleware, WorkerRoute};
pub use monaco::{FailedWorker, FinalizeReport, MonacoEditorPlugin};
pub use plugin::{HookResult, HostConfig, Plugin, PluginContainer, PluginError, ServerContext};
pub use registry::{WorkerDefinition, EDITOR_WORKER_LABEL};
pub use resolver::{PathResolver, ResolveStrategy};
pub use version::VERSION;
pub use workers::WorkerPathMap;
