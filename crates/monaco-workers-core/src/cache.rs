//! On-disk cache of bundled workers.
//!
//! Each worker entry is bundled at most once into
//! `node_modules/.monaco/{name}.bundle.js`. Bundles survive between runs;
//! the dev server wipes the directory once at startup.
//!
//! Concurrent requests for an entry that is being built await the same
//! in-flight build, and nothing reads the cache file before that build has
//! finished writing it.

use crate::bundler::WorkerBundler;
use crate::error::{Error, Result};
use crate::paths::{cache_dir, cache_filename};
use crate::resolver::PathResolver;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use monaco_workers_util::fs::{atomic_write, remove_dir_all_if_exists};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

type BuildFuture = Shared<BoxFuture<'static, Result<PathBuf, Arc<Error>>>>;

/// Lifecycle of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// No bundle on disk and no build running.
    Unbuilt,
    /// A build is in flight; requests wait for it.
    Building,
    /// The bundle is on disk.
    Ready,
}

enum Slot {
    Building(BuildFuture),
    Ready(PathBuf),
}

/// Lazily populated cache of worker bundles.
pub struct BuildCache {
    /// Directory holding `*.bundle.js` files.
    dir: PathBuf,
    resolver: PathResolver,
    bundler: Arc<dyn WorkerBundler>,
    /// Cache filename → state. Absent means unbuilt in this session.
    slots: Mutex<HashMap<String, Slot>>,
}

impl BuildCache {
    pub fn new(dir: PathBuf, resolver: PathResolver, bundler: Arc<dyn WorkerBundler>) -> Self {
        Self {
            dir,
            resolver,
            bundler,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Cache under `<root>/node_modules/.monaco`, resolving entries from `root`.
    pub fn for_project(root: &Path, bundler: Arc<dyn WorkerBundler>) -> Self {
        Self::new(cache_dir(root), PathResolver::for_project(root), bundler)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the bundle for `entry` lives (whether or not it exists yet).
    #[must_use]
    pub fn path_for(&self, entry: &str) -> PathBuf {
        self.dir.join(cache_filename(entry))
    }

    #[must_use]
    pub fn state(&self, entry: &str) -> BuildState {
        match self.slots().get(&cache_filename(entry)) {
            Some(Slot::Building(_)) => BuildState::Building,
            Some(Slot::Ready(_)) => BuildState::Ready,
            None if self.path_for(entry).is_file() => BuildState::Ready,
            None => BuildState::Unbuilt,
        }
    }

    /// Delete the whole cache directory and forget every entry.
    pub fn clear(&self) -> Result<()> {
        let mut slots = self.slots();
        let removed = remove_dir_all_if_exists(&self.dir).map_err(|source| Error::CacheDir {
            path: self.dir.clone(),
            source,
        })?;
        slots.clear();
        if removed {
            info!(dir = %self.dir.display(), "cleared worker cache");
        }
        Ok(())
    }

    /// Return the cached bundle for `entry`, building it first if needed.
    ///
    /// Repeated calls after a successful build never invoke the bundler again.
    /// A failed build is reported to every caller that waited on it; the next
    /// call starts a fresh attempt.
    pub async fn ensure_built(&self, entry: &str) -> Result<PathBuf> {
        let key = cache_filename(entry);

        let build = {
            let mut slots = self.slots();
            match slots.get(&key) {
                Some(Slot::Ready(path)) => return Ok(path.clone()),
                Some(Slot::Building(build)) => {
                    debug!(entry, "joining in-flight worker build");
                    build.clone()
                }
                None => {
                    let output = self.dir.join(&key);
                    if output.is_file() {
                        debug!(entry, path = %output.display(), "reusing cached worker bundle");
                        slots.insert(key, Slot::Ready(output.clone()));
                        return Ok(output);
                    }

                    let build = build_worker(
                        entry.to_string(),
                        output,
                        self.resolver.clone(),
                        Arc::clone(&self.bundler),
                    )
                    .map(|result| result.map_err(Arc::new))
                    .boxed()
                    .shared();
                    slots.insert(key.clone(), Slot::Building(build.clone()));
                    build
                }
            }
        };

        let result = build.clone().await;

        let mut slots = self.slots();
        let still_ours = matches!(slots.get(&key), Some(Slot::Building(b)) if b.ptr_eq(&build));
        if still_ours {
            match &result {
                Ok(path) => {
                    slots.insert(key, Slot::Ready(path.clone()));
                }
                Err(e) => {
                    warn!(entry, error = %e, "worker build failed");
                    slots.remove(&key);
                }
            }
        }

        result.map_err(Error::from_shared)
    }

    /// Build every entry concurrently and wait for all of them.
    ///
    /// Results come back in input order; one failure does not stop the others.
    pub async fn ensure_all<I, S>(&self, entries: I) -> Vec<(String, Result<PathBuf>)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        join_all(entries.into_iter().map(Into::into).map(|entry: String| async move {
            let result = self.ensure_built(&entry).await;
            (entry, result)
        }))
        .await
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BuildCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildCache")
            .field("dir", &self.dir)
            .field("resolver", &self.resolver)
            .field("bundler", &self.bundler.name())
            .finish_non_exhaustive()
    }
}

/// Resolve, bundle and atomically write one worker.
async fn build_worker(
    entry: String,
    output: PathBuf,
    resolver: PathResolver,
    bundler: Arc<dyn WorkerBundler>,
) -> Result<PathBuf> {
    let started = Instant::now();
    let source = resolver.resolve_async(&entry).await?;

    let bundle_source = source.clone();
    let bytes = tokio::task::spawn_blocking(move || bundler.bundle(&bundle_source))
        .await
        .map_err(|e| Error::Build {
            entry: entry.clone(),
            message: format!("bundler task failed: {e}"),
        })??;

    if let Some(dir) = output.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| Error::CacheDir {
                path: dir.to_path_buf(),
                source,
            })?;
    }

    let size = bytes.len();
    let target = output.clone();
    tokio::task::spawn_blocking(move || atomic_write(&target, &bytes))
        .await
        .map_err(|e| Error::other(format!("cache write task failed: {e}")))??;

    info!(
        entry = %entry,
        source = %source.display(),
        bytes = size,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "bundled worker"
    );

    Ok(output)
}
