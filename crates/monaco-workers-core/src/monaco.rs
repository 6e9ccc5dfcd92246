//! The Monaco editor worker plugin.
//!
//! Ties the pieces together for a host build tool:
//!
//! - `config_resolved`: remembers the host config and opens the build cache.
//! - `configure_server`: clears the cache and mounts [`DevMiddleware`].
//! - `transform_index_html`: injects the `MonacoEnvironment` bootstrap.
//! - `write_bundle`: builds every worker, waits for all of them, then copies
//!   the bundles into the output directory.

use crate::bootstrap::{inject_head_prepend, BootstrapConfig};
use crate::bundler::WorkerBundler;
use crate::cache::BuildCache;
use crate::config::{MonacoEditorOptions, ResolvedOptions};
use crate::error::{Error, Result};
use crate::middleware::DevMiddleware;
use crate::paths::{cache_filename, dist_dir};
use crate::plugin::{HookResult, HostConfig, Plugin, PluginError, ServerContext};
use crate::registry::WorkerDefinition;
use crate::workers::{compute_paths, resolve_workers, WorkerPathMap};
use futures::future::BoxFuture;
use monaco_workers_util::fs::atomic_copy;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info};

const PLUGIN_NAME: &str = "monaco-editor-workers";

/// Outcome of the production finalize step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalizeReport {
    /// Where bundles were copied. `None` when skipped.
    pub dist_dir: Option<PathBuf>,
    /// Files written to `dist_dir`.
    pub copied: Vec<PathBuf>,
    /// Workers that could not be built or copied.
    pub failed: Vec<FailedWorker>,
    /// Finalize did nothing because the public path is remote.
    pub skipped: bool,
}

impl FinalizeReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedWorker {
    pub label: String,
    pub entry: String,
    pub message: String,
}

struct Session {
    host: HostConfig,
    cache: Arc<BuildCache>,
}

/// Build-tool plugin that bundles, serves and emits Monaco editor workers.
pub struct MonacoEditorPlugin {
    options: ResolvedOptions,
    workers: Vec<WorkerDefinition>,
    bundler: Arc<dyn WorkerBundler>,
    session: RwLock<Option<Session>>,
}

impl MonacoEditorPlugin {
    /// Resolve options and the worker set. Unknown labels are rejected here.
    pub fn new(options: MonacoEditorOptions, bundler: Arc<dyn WorkerBundler>) -> Result<Self> {
        let options = options.resolve();
        let workers = resolve_workers(&options.language_workers, &options.custom_workers)?;
        debug!(
            workers = workers.len(),
            public_path = %options.public_path,
            remote = options.is_remote(),
            "resolved monaco workers"
        );

        Ok(Self {
            options,
            workers,
            bundler,
            session: RwLock::new(None),
        })
    }

    #[must_use]
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// The resolved worker set, in build order.
    #[must_use]
    pub fn workers(&self) -> &[WorkerDefinition] {
        &self.workers
    }

    /// Label → URL map for the given base.
    #[must_use]
    pub fn worker_paths(&self, base: &str) -> WorkerPathMap {
        compute_paths(
            &self.workers,
            &self.options.public_path,
            self.options.is_remote(),
            base,
        )
    }

    #[must_use]
    pub fn bootstrap(&self, base: &str) -> BootstrapConfig {
        BootstrapConfig {
            global_api: self.options.global_api,
            worker_paths: self.worker_paths(base),
        }
    }

    /// The build cache, once the host config is known.
    #[must_use]
    pub fn cache(&self) -> Option<Arc<BuildCache>> {
        self.read_session(|s| Arc::clone(&s.cache))
    }

    /// Host config from `config_resolved`, or defaults.
    fn host(&self) -> HostConfig {
        self.read_session(|s| s.host.clone()).unwrap_or_default()
    }

    fn read_session<T>(&self, f: impl FnOnce(&Session) -> T) -> Option<T> {
        let guard = self.session.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f)
    }

    fn cache_or_init(&self) -> Arc<BuildCache> {
        if let Some(cache) = self.cache() {
            return cache;
        }
        let host = HostConfig::default();
        self.open_session(&host)
    }

    fn open_session(&self, host: &HostConfig) -> Arc<BuildCache> {
        let cache = Arc::new(BuildCache::for_project(&host.root, Arc::clone(&self.bundler)));
        let mut guard = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Session {
            host: host.clone(),
            cache: Arc::clone(&cache),
        });
        cache
    }

    /// Where bundles go in production output.
    #[must_use]
    pub fn dist_dir(&self, host: &HostConfig) -> PathBuf {
        match &self.options.custom_dist_path {
            Some(custom) => custom.compute(&host.root, &host.out_dir, &host.base),
            None => dist_dir(&host.root, &host.out_dir, &host.base, &self.options.public_path),
        }
    }

    /// Build every worker, wait for all builds, then copy them into the
    /// distribution directory.
    ///
    /// A worker that fails to build or copy is reported and skipped. Failure
    /// to create the distribution directory aborts the whole step.
    pub async fn finalize(&self) -> Result<FinalizeReport> {
        if self.options.is_remote() && !self.options.force_build_cdn {
            info!(public_path = %self.options.public_path, "remote public path, not emitting workers");
            return Ok(FinalizeReport {
                skipped: true,
                ..FinalizeReport::default()
            });
        }

        let host = self.host();
        let cache = self.cache_or_init();
        let dist = self.dist_dir(&host);

        tokio::fs::create_dir_all(&dist)
            .await
            .map_err(|source| Error::DistDir {
                path: dist.clone(),
                source,
            })?;

        let built = cache
            .ensure_all(self.workers.iter().map(|w| w.entry.clone()))
            .await;

        let mut report = FinalizeReport {
            dist_dir: Some(dist.clone()),
            ..FinalizeReport::default()
        };

        for (worker, (_, result)) in self.workers.iter().zip(built) {
            let target = dist.join(cache_filename(&worker.entry));
            let copied = match result {
                Ok(source) => {
                    let target = target.clone();
                    tokio::task::spawn_blocking(move || atomic_copy(&source, &target))
                        .await
                        .map_err(|e| Error::other(format!("copy task failed: {e}")))
                        .and_then(|r| r.map_err(Error::from))
                }
                Err(e) => Err(e),
            };

            match copied {
                Ok(bytes) => {
                    debug!(label = %worker.label, path = %target.display(), bytes, "emitted worker");
                    if !report.copied.contains(&target) {
                        report.copied.push(target);
                    }
                }
                Err(e) => {
                    error!(label = %worker.label, entry = %worker.entry, error = %e, "worker not emitted");
                    report.failed.push(FailedWorker {
                        label: worker.label.clone(),
                        entry: worker.entry.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            dist = %dist.display(),
            copied = report.copied.len(),
            failed = report.failed.len(),
            "emitted monaco workers"
        );

        Ok(report)
    }

    fn hook_error(hook: &'static str, e: impl ToString) -> PluginError {
        PluginError::new(PLUGIN_NAME, hook, e)
    }
}

impl Plugin for MonacoEditorPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn config_resolved(&self, config: &HostConfig) -> HookResult<()> {
        self.open_session(config);
        Ok(())
    }

    fn configure_server(&self, server: &mut ServerContext) -> HookResult<()> {
        if self.options.is_remote() {
            debug!("remote public path, workers are not served locally");
            return Ok(());
        }

        let cache = match self.cache() {
            Some(cache) => cache,
            None => self.open_session(&server.config),
        };
        cache
            .clear()
            .map_err(|e| Self::hook_error("configure_server", e))?;

        let middleware = DevMiddleware::new(
            cache,
            &self.workers,
            &self.options.public_path,
            &server.config.base,
        );
        for route in middleware.routes() {
            info!(label = %route.label, path = %route.path, "serving worker");
        }
        server.use_router(PLUGIN_NAME, middleware.into_router());
        Ok(())
    }

    fn transform_index_html(&self, html: &str) -> HookResult<Option<String>> {
        let tag = self.bootstrap(&self.host().base).script_tag();
        Ok(Some(inject_head_prepend(html, &tag)))
    }

    fn write_bundle(&self) -> BoxFuture<'_, HookResult<()>> {
        Box::pin(async move {
            let report = self
                .finalize()
                .await
                .map_err(|e| Self::hook_error("write_bundle", e))?;
            if let Some(failed) = report.failed.first() {
                return Err(Self::hook_error(
                    "write_bundle",
                    format!(
                        "{} worker(s) failed, first: {}: {}",
                        report.failed.len(),
                        failed.label,
                        failed.message
                    ),
                ));
            }
            Ok(())
        })
    }
}

impl std::fmt::Debug for MonacoEditorPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonacoEditorPlugin")
            .field("options", &self.options)
            .field("workers", &self.workers)
            .field("bundler", &self.bundler.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EDITOR_WORKER_LABEL;
    use std::path::Path;

    struct EchoBundler;

    impl WorkerBundler for EchoBundler {
        fn name(&self) -> &str {
            "echo"
        }

        fn bundle(&self, entry: &Path) -> Result<Vec<u8>> {
            Ok(std::fs::read(entry)?)
        }
    }

    fn plugin(options: MonacoEditorOptions) -> MonacoEditorPlugin {
        MonacoEditorPlugin::new(options, Arc::new(EchoBundler)).unwrap()
    }

    #[test]
    fn test_unknown_label_rejected_at_construction() {
        let err = MonacoEditorPlugin::new(
            MonacoEditorOptions::new().with_language_workers(["klingon"]),
            Arc::new(EchoBundler),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownWorkerLabel { .. }));
    }

    #[test]
    fn test_json_only_paths() {
        let p = plugin(MonacoEditorOptions::new().with_language_workers(["json"]));
        let labels: Vec<_> = p.workers().iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["json", EDITOR_WORKER_LABEL]);
        assert_eq!(p.worker_paths("/").len(), 2);
    }

    #[test]
    fn test_transform_index_html_injects_first() {
        let p = plugin(MonacoEditorOptions::new().with_global_api(true));
        p.config_resolved(&HostConfig::new("/app").with_base("/editor/"))
            .unwrap();

        let html = p
            .transform_index_html("<html><head><script src=\"/main.js\"></script></head></html>")
            .unwrap()
            .unwrap();
        let bootstrap = html.find("MonacoEnvironment").unwrap();
        let main = html.find("/main.js").unwrap();
        assert!(bootstrap < main);
        assert!(html.contains("\"globalAPI\":true"));
        assert!(html.contains("/editor/monacoeditorwork/ts.worker.bundle.js"));
    }

    #[test]
    fn test_remote_server_registers_nothing() {
        let p = plugin(MonacoEditorOptions::new().with_public_path("https://cdn.example.com/w"));
        let mut server = ServerContext::new(HostConfig::new("/app"));
        p.configure_server(&mut server).unwrap();
        assert!(server.middlewares.is_empty());
    }

    #[test]
    fn test_custom_dist_path_wins() {
        let p = plugin(MonacoEditorOptions::new().with_custom_dist_path(
            crate::config::DistPath::new(|root, _, _| root.join("public").join("w")),
        ));
        let dist = p.dist_dir(&HostConfig::new("/app"));
        assert_eq!(dist, PathBuf::from("/app/public/w"));
    }
}
