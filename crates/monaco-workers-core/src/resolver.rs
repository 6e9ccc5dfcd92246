//! Worker entry resolution.
//!
//! Resolves a logical module path (e.g. `monaco-editor/esm/vs/editor/editor.worker`)
//! to a file on disk by trying an ordered list of strategies:
//!
//! 1. [`ProjectDependencies`]: the project's own `node_modules`.
//! 2. [`DirectResolution`]: the raw path, ancestor `node_modules` directories
//!    (hoisted workspace installs, linked packages) and `NODE_PATH`.
//!
//! The first strategy that finds a file wins. Each strategy records the
//! candidates it probed so a failure can report all of them.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Extensions appended to an extensionless entry, in probe order.
const EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs"];

/// One way of locating a module on disk.
pub trait ResolveStrategy: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Try to resolve `logical`. Every probed candidate is appended to `tried`.
    fn resolve(&self, logical: &str, tried: &mut Vec<PathBuf>) -> Option<PathBuf>;
}

/// Looks in `<root>/node_modules`.
#[derive(Debug, Clone)]
pub struct ProjectDependencies {
    root: PathBuf,
}

impl ProjectDependencies {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResolveStrategy for ProjectDependencies {
    fn name(&self) -> &'static str {
        "project-dependencies"
    }

    fn resolve(&self, logical: &str, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        probe_module(&self.root.join("node_modules").join(logical), tried)
    }
}

/// Resolves the raw path the way Node's module lookup would from `base`.
#[derive(Debug, Clone)]
pub struct DirectResolution {
    base: PathBuf,
    node_path: Vec<PathBuf>,
}

impl DirectResolution {
    pub fn new(base: impl Into<PathBuf>, node_path: Vec<PathBuf>) -> Self {
        Self {
            base: base.into(),
            node_path,
        }
    }

    /// Resolution from `base`, with search directories taken from `NODE_PATH`.
    pub fn from_env(base: impl Into<PathBuf>) -> Self {
        let node_path = std::env::var_os("NODE_PATH")
            .map(|v| std::env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();
        Self::new(base, node_path)
    }
}

impl ResolveStrategy for DirectResolution {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn resolve(&self, logical: &str, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        if is_path_like(logical) {
            return probe_module(&self.base.join(logical), tried);
        }

        for dir in self.base.ancestors() {
            if let Some(found) = probe_module(&dir.join("node_modules").join(logical), tried) {
                return Some(found);
            }
        }

        self.node_path
            .iter()
            .find_map(|dir| probe_module(&dir.join(logical), tried))
    }
}

/// Ordered resolution strategies. Cheap to clone.
#[derive(Clone)]
pub struct PathResolver {
    strategies: Arc<Vec<Box<dyn ResolveStrategy>>>,
}

impl PathResolver {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self {
            strategies: Arc::new(strategies),
        }
    }

    /// Project dependencies first, then direct resolution from the project root.
    pub fn for_project(root: &Path) -> Self {
        Self::new(vec![
            Box::new(ProjectDependencies::new(root)),
            Box::new(DirectResolution::from_env(root)),
        ])
    }

    /// Resolve synchronously.
    pub fn resolve(&self, logical: &str) -> Result<PathBuf> {
        let mut tried = Vec::new();

        for strategy in self.strategies.iter() {
            if let Some(found) = strategy.resolve(logical, &mut tried) {
                debug!(entry = logical, strategy = strategy.name(), path = %found.display(), "resolved worker entry");
                return Ok(found);
            }
            trace!(entry = logical, strategy = strategy.name(), "strategy did not resolve");
        }

        Err(Error::Resolution {
            entry: logical.to_string(),
            tried,
        })
    }

    /// Resolve on the blocking pool.
    pub async fn resolve_async(&self, logical: &str) -> Result<PathBuf> {
        let this = self.clone();
        let logical = logical.to_string();
        tokio::task::spawn_blocking(move || this.resolve(&logical))
            .await
            .map_err(|e| Error::other(format!("resolver task failed: {e}")))?
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}

fn is_path_like(logical: &str) -> bool {
    logical.starts_with("./") || logical.starts_with("../") || Path::new(logical).is_absolute()
}

/// Node-style file resolution: exact file, extensions, then directory entry points.
fn probe_module(target: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
    if let Some(found) = probe_file(target, tried) {
        return Some(found);
    }

    if !target.is_dir() {
        return None;
    }

    if let Some(main) = package_main(&target.join("package.json")) {
        if let Some(found) = probe_file(&target.join(main), tried) {
            return Some(found);
        }
    }

    probe_file(&target.join("index"), tried)
}

fn probe_file(target: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
    let mut candidates = vec![target.to_path_buf()];
    for ext in EXTENSIONS {
        let mut with_ext = OsString::from(target.as_os_str());
        with_ext.push(ext);
        candidates.push(PathBuf::from(with_ext));
    }

    for candidate in candidates {
        // Strategies may overlap (project root is also an ancestor)
        if tried.contains(&candidate) {
            continue;
        }
        let is_file = candidate.is_file();
        tried.push(candidate.clone());
        if is_file {
            return Some(dunce::canonicalize(&candidate).unwrap_or(candidate));
        }
    }

    None
}

fn package_main(pkg_json: &Path) -> Option<String> {
    let content = std::fs::read_to_string(pkg_json).ok()?;
    let json: serde_json::Value = serde_json::from_str(&content).ok()?;
    json.get("main")?.as_str().map(str::to_string)
}
