//! Dev-server routes for worker bundles.
//!
//! Every worker URL gets a method-agnostic route. The first request for a
//! worker builds it through the [`BuildCache`]; concurrent requests join that
//! build. The response body is the cached file, byte for byte.

use crate::cache::{BuildCache, BuildState};
use crate::error::Error;
use crate::registry::WorkerDefinition;
use crate::workers::worker_url;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const JAVASCRIPT: &str = "text/javascript";

/// One served worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRoute {
    pub label: String,
    /// Absolute URL path the route is mounted at.
    pub path: String,
    pub entry: String,
}

/// Serves worker bundles from the build cache.
#[derive(Debug)]
pub struct DevMiddleware {
    cache: Arc<BuildCache>,
    routes: Vec<WorkerRoute>,
}

impl DevMiddleware {
    /// Routes for `workers` under `{base}{public_path}`. Workers that map to
    /// the same URL share one route; the first one wins.
    pub fn new(
        cache: Arc<BuildCache>,
        workers: &[WorkerDefinition],
        public_path: &str,
        base: &str,
    ) -> Self {
        let mut seen = HashSet::new();
        let routes = workers
            .iter()
            .filter_map(|w| {
                let path = route_path(&worker_url(w, public_path, false, base));
                seen.insert(path.clone()).then(|| WorkerRoute {
                    label: w.label.clone(),
                    path,
                    entry: w.entry.clone(),
                })
            })
            .collect();

        Self { cache, routes }
    }

    #[must_use]
    pub fn routes(&self) -> &[WorkerRoute] {
        &self.routes
    }

    pub fn into_router(self) -> Router {
        let mut router = Router::new();
        for route in self.routes {
            debug!(label = %route.label, path = %route.path, "registering worker route");
            let cache = Arc::clone(&self.cache);
            let entry = route.entry;
            router = router.route(
                &route.path,
                any(move || serve_worker(Arc::clone(&cache), entry.clone())),
            );
        }
        router
    }
}

/// Turn a worker URL into an axum route path. Relative bases serve from `/`.
#[must_use]
pub fn route_path(url: &str) -> String {
    let trimmed = url.trim_start_matches('.');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

async fn serve_worker(cache: Arc<BuildCache>, entry: String) -> Response {
    if cache.state(&entry) != BuildState::Ready {
        debug!(entry = %entry, state = ?cache.state(&entry), "worker requested before ready");
    }

    let bytes = match cache.ensure_built(&entry).await {
        Ok(path) => tokio::fs::read(&path).await.map_err(Error::from),
        Err(e) => Err(e),
    };

    match bytes {
        Ok(bytes) => ([(header::CONTENT_TYPE, JAVASCRIPT)], bytes).into_response(),
        Err(e) => {
            let status = if e.is_not_found() {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            warn!(entry = %entry, status = status.as_u16(), error = %e, "failed to serve worker");
            let message = serde_json::to_string(&format!("[monaco-workers] {e}")).unwrap_or_default();
            (
                status,
                [(header::CONTENT_TYPE, JAVASCRIPT)],
                format!("console.error({message});"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::WorkerBundler;
    use crate::registry;
    use std::path::Path;

    struct NoopBundler;

    impl WorkerBundler for NoopBundler {
        fn name(&self) -> &str {
            "noop"
        }

        fn bundle(&self, _entry: &Path) -> crate::Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn cache() -> Arc<BuildCache> {
        Arc::new(BuildCache::for_project(Path::new("/nonexistent"), Arc::new(NoopBundler)))
    }

    #[test]
    fn test_route_path() {
        assert_eq!(
            route_path("/monacoeditorwork/json.worker.bundle.js"),
            "/monacoeditorwork/json.worker.bundle.js"
        );
        assert_eq!(route_path("./w/json.worker.bundle.js"), "/w/json.worker.bundle.js");
        assert_eq!(route_path("w/json.worker.bundle.js"), "/w/json.worker.bundle.js");
    }

    #[test]
    fn test_routes_per_worker() {
        let workers = vec![registry::lookup("json").unwrap(), registry::editor_worker()];
        let mw = DevMiddleware::new(cache(), &workers, "monacoeditorwork", "/app/");

        let paths: Vec<_> = mw.routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/app/monacoeditorwork/json.worker.bundle.js",
                "/app/monacoeditorwork/editor.worker.bundle.js",
            ]
        );
    }

    #[test]
    fn test_shared_entry_registers_once() {
        let workers = vec![
            WorkerDefinition::new("yaml", "monaco-yaml/yaml.worker"),
            WorkerDefinition::new("yml", "monaco-yaml/yaml.worker"),
        ];
        let mw = DevMiddleware::new(cache(), &workers, "w", "/");
        assert_eq!(mw.routes().len(), 1);
        assert_eq!(mw.routes()[0].label, "yaml");
    }
}
