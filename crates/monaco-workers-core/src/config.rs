//! Plugin options and config file discovery.
//!
//! Options may be built in code or loaded from `monaco-workers.json`:
//!
//! ```json
//! {
//!   "languageWorkers": ["editorWorkerService", "json", "typescript"],
//!   "publicPath": "monacoeditorwork",
//!   "globalAPI": false,
//!   "customWorkers": [{ "label": "yaml", "entry": "monaco-yaml/yaml.worker" }],
//!   "forceBuildCDN": false,
//!   "customDistPath": "{root}/{outDir}/static/workers"
//! }
//! ```

use crate::error::{Error, Result};
use crate::paths::{self, DEFAULT_PUBLIC_PATH};
use crate::registry::{self, WorkerDefinition};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file names in priority order.
const CONFIG_FILES: &[&str] = &["monaco-workers.json", ".monaco-workers.json"];

/// Computes the output directory for worker bundles from `(root, outDir, base)`.
#[derive(Clone)]
pub struct DistPath(Arc<dyn Fn(&Path, &Path, &str) -> PathBuf + Send + Sync>);

impl DistPath {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Path, &Path, &str) -> PathBuf + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Build from a template with `{root}`, `{outDir}` and `{base}` placeholders.
    ///
    /// A relative expansion is taken relative to the project root.
    pub fn template(template: impl Into<String>) -> Self {
        let template = template.into();
        Self::new(move |root, out_dir, base| {
            let expanded = template
                .replace("{root}", &root.display().to_string())
                .replace("{outDir}", &out_dir.display().to_string())
                .replace("{base}", base.trim_matches('/'));
            root.join(expanded)
        })
    }

    #[must_use]
    pub fn compute(&self, root: &Path, out_dir: &Path, base: &str) -> PathBuf {
        (self.0)(root, out_dir, base)
    }
}

impl fmt::Debug for DistPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DistPath(..)")
    }
}

impl<'de> Deserialize<'de> for DistPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::template)
    }
}

/// Caller-facing plugin options. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonacoEditorOptions {
    /// Built-in worker labels to include (default: all).
    pub language_workers: Option<Vec<String>>,
    /// URL prefix for worker bundles (default: `monacoeditorwork`).
    pub public_path: Option<String>,
    /// Passed verbatim to the editor's `MonacoEnvironment.globalAPI`.
    #[serde(rename = "globalAPI")]
    pub global_api: Option<bool>,
    /// Extra workers, appended after the built-in ones.
    pub custom_workers: Option<Vec<WorkerDefinition>>,
    /// Copy workers into the output even when the public path is remote.
    #[serde(rename = "forceBuildCDN")]
    pub force_build_cdn: Option<bool>,
    /// Override for the output directory of worker bundles.
    pub custom_dist_path: Option<DistPath>,
}

impl MonacoEditorOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_language_workers<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language_workers = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = Some(public_path.into());
        self
    }

    #[must_use]
    pub fn with_global_api(mut self, global_api: bool) -> Self {
        self.global_api = Some(global_api);
        self
    }

    #[must_use]
    pub fn with_custom_worker(mut self, worker: WorkerDefinition) -> Self {
        self.custom_workers.get_or_insert_with(Vec::new).push(worker);
        self
    }

    #[must_use]
    pub fn with_force_build_cdn(mut self, force: bool) -> Self {
        self.force_build_cdn = Some(force);
        self
    }

    #[must_use]
    pub fn with_custom_dist_path(mut self, dist: DistPath) -> Self {
        self.custom_dist_path = Some(dist);
        self
    }

    /// Apply defaults. Repeated labels keep their first position.
    #[must_use]
    pub fn resolve(self) -> ResolvedOptions {
        let requested = self
            .language_workers
            .unwrap_or_else(|| registry::labels().map(str::to_string).collect());

        let mut language_workers: Vec<String> = Vec::with_capacity(requested.len());
        for label in requested {
            if !language_workers.contains(&label) {
                language_workers.push(label);
            }
        }

        ResolvedOptions {
            language_workers,
            public_path: self
                .public_path
                .unwrap_or_else(|| DEFAULT_PUBLIC_PATH.to_string()),
            global_api: self.global_api.unwrap_or(false),
            custom_workers: self.custom_workers.unwrap_or_default(),
            force_build_cdn: self.force_build_cdn.unwrap_or(false),
            custom_dist_path: self.custom_dist_path,
        }
    }
}

/// Options after defaults are applied. Immutable for the life of a plugin.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub language_workers: Vec<String>,
    pub public_path: String,
    pub global_api: bool,
    pub custom_workers: Vec<WorkerDefinition>,
    pub force_build_cdn: bool,
    pub custom_dist_path: Option<DistPath>,
}

impl ResolvedOptions {
    /// Whether workers are hosted on a CDN rather than served by this tool.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        paths::is_remote(&self.public_path)
    }
}

/// Find a config file in the given root directory.
#[must_use]
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load options from a config file in the given root directory.
///
/// If `config_path` is `Some`, that file must exist. Otherwise the root is
/// searched and `Ok(None)` means no config file is present.
pub fn load_options(
    root: &Path,
    config_path: Option<&Path>,
) -> Result<Option<(PathBuf, MonacoEditorOptions)>> {
    let path = match config_path {
        Some(p) => {
            let abs = if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            };
            if !abs.is_file() {
                return Err(Error::ConfigRead {
                    path: abs,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                });
            }
            abs
        }
        None => match find_config_file(root) {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    let source = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
        path: path.clone(),
        source,
    })?;
    let options = serde_json::from_str(&source).map_err(|source| Error::ConfigParse {
        path: path.clone(),
        source,
    })?;

    Ok(Some((path, options)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let opts = MonacoEditorOptions::new().resolve();
        assert_eq!(opts.public_path, "monacoeditorwork");
        assert!(!opts.global_api);
        assert!(!opts.force_build_cdn);
        assert!(opts.custom_workers.is_empty());
        assert!(opts.custom_dist_path.is_none());
        assert_eq!(opts.language_workers.len(), 5);
        assert!(!opts.is_remote());
    }

    #[test]
    fn test_duplicate_labels_collapse() {
        let opts = MonacoEditorOptions::new()
            .with_language_workers(["json", "css", "json"])
            .resolve();
        assert_eq!(opts.language_workers, vec!["json", "css"]);
    }

    #[test]
    fn test_parse_camel_case_json() {
        let json = r#"{
            "languageWorkers": ["json"],
            "publicPath": "https://cdn.example.com/workers",
            "globalAPI": true,
            "customWorkers": [{ "label": "yaml", "entry": "monaco-yaml/yaml.worker" }],
            "forceBuildCDN": true,
            "customDistPath": "{outDir}/static/{base}"
        }"#;
        let opts: MonacoEditorOptions = serde_json::from_str(json).unwrap();
        let opts = opts.resolve();

        assert_eq!(opts.language_workers, vec!["json"]);
        assert!(opts.global_api);
        assert!(opts.force_build_cdn);
        assert!(opts.is_remote());
        assert_eq!(opts.custom_workers[0].label, "yaml");

        let dist = opts.custom_dist_path.unwrap();
        assert_eq!(
            dist.compute(Path::new("/app"), Path::new("dist"), "/editor/"),
            PathBuf::from("/app/dist/static/editor")
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = serde_json::from_str::<MonacoEditorOptions>(r#"{"publicpath": "x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_dist_path_closure() {
        let dist = DistPath::new(|root, out_dir, _base| root.join(out_dir).join("workers"));
        assert_eq!(
            dist.compute(Path::new("/r"), Path::new("out"), "/"),
            PathBuf::from("/r/out/workers")
        );
    }

    #[test]
    fn test_load_options_discovers_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("monaco-workers.json"),
            r#"{"publicPath": "workers"}"#,
        )
        .unwrap();

        let (path, opts) = load_options(dir.path(), None).unwrap().unwrap();
        assert!(path.ends_with("monaco-workers.json"));
        assert_eq!(opts.public_path.as_deref(), Some("workers"));
    }

    #[test]
    fn test_load_options_none_without_file() {
        let dir = tempdir().unwrap();
        assert!(load_options(dir.path(), None).unwrap().is_none());
    }

    #[test]
    fn test_load_options_explicit_missing() {
        let dir = tempdir().unwrap();
        let err = load_options(dir.path(), Some(Path::new("nope.json"))).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_load_options_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".monaco-workers.json"), "{ not json").unwrap();
        let err = load_options(dir.path(), None).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}
