pub mod build;
pub mod dev;
pub mod version;
pub mod workers;

use miette::{IntoDiagnostic, Result};
use monaco_workers_core::config::load_options;
use monaco_workers_core::{EsbuildBundler, MonacoEditorOptions, MonacoEditorPlugin, WorkerBundler};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Options from the config file, or defaults when there is none.
pub(crate) fn options(root: &Path, config: Option<&Path>) -> Result<MonacoEditorOptions> {
    match load_options(root, config).into_diagnostic()? {
        Some((path, options)) => {
            debug!(path = %path.display(), "loaded config");
            Ok(options)
        }
        None => Ok(MonacoEditorOptions::default()),
    }
}

/// An explicit esbuild program, or whatever discovery finds.
///
/// A missing esbuild is not fatal here: each worker build reports it.
pub(crate) fn bundler(root: &Path, esbuild: Option<&Path>) -> Arc<dyn WorkerBundler> {
    let bundler = match esbuild {
        Some(program) => EsbuildBundler::new(program).current_dir(root),
        None => EsbuildBundler::discover(root).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to `esbuild` on PATH");
            EsbuildBundler::new("esbuild").current_dir(root)
        }),
    };
    debug!(program = %bundler.program().display(), "using bundler");
    Arc::new(bundler)
}

pub(crate) fn load_plugin(
    root: &Path,
    config: Option<&Path>,
    esbuild: Option<&Path>,
) -> Result<MonacoEditorPlugin> {
    let options = options(root, config)?;
    MonacoEditorPlugin::new(options, bundler(root, esbuild)).into_diagnostic()
}
