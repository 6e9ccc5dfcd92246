//! Worker set resolution and public URL mapping.
//!
//! The resolved set is what gets built, served and copied; the path map is
//! what the browser-side `getWorkerUrl` consults by label.

use crate::error::{Error, Result};
use crate::paths::cache_filename;
use crate::registry::{self, WorkerDefinition, EDITOR_WORKER_LABEL};
use std::collections::BTreeMap;

/// Label → public URL of its worker bundle.
pub type WorkerPathMap = BTreeMap<String, String>;

/// Labels served by another label's worker implementation.
const LABEL_ALIASES: &[(&str, &[&str])] = &[
    ("typescript", &["javascript"]),
    ("css", &["less", "scss"]),
    ("html", &["handlebars", "razor"]),
];

/// Build the ordered worker set.
///
/// Registry entries in request order, then custom workers in supplied order,
/// then the editor worker if no entry carries its label yet. Unknown labels
/// fail fast with [`Error::UnknownWorkerLabel`].
pub fn resolve_workers(
    requested: &[String],
    custom: &[WorkerDefinition],
) -> Result<Vec<WorkerDefinition>> {
    let mut workers = Vec::with_capacity(requested.len() + custom.len() + 1);

    for label in requested {
        let worker = registry::lookup(label).ok_or_else(|| Error::UnknownWorkerLabel {
            label: label.clone(),
        })?;
        workers.push(worker);
    }

    workers.extend(custom.iter().cloned());

    if !workers.iter().any(|w| w.label == EDITOR_WORKER_LABEL) {
        workers.push(registry::editor_worker());
    }

    Ok(workers)
}

/// Public URL for one worker.
///
/// Remote public paths are already absolute, so `base` is not prepended.
/// Local segments are joined with exactly one `/` between them.
#[must_use]
pub fn worker_url(worker: &WorkerDefinition, public_path: &str, remote: bool, base: &str) -> String {
    let filename = cache_filename(&worker.entry);
    if remote {
        return format!("{}/{filename}", public_path.trim_end_matches('/'));
    }

    let prefix = base.trim_end_matches('/');
    match public_path.trim_matches('/') {
        "" => format!("{prefix}/{filename}"),
        public => format!("{prefix}/{public}/{filename}"),
    }
}

/// Compute the label → URL map, including labels that share a worker.
#[must_use]
pub fn compute_paths(
    workers: &[WorkerDefinition],
    public_path: &str,
    remote: bool,
    base: &str,
) -> WorkerPathMap {
    let mut paths: WorkerPathMap = workers
        .iter()
        .map(|w| (w.label.clone(), worker_url(w, public_path, remote, base)))
        .collect();

    for (source, aliases) in LABEL_ALIASES {
        if let Some(url) = paths.get(*source).cloned() {
            for alias in *aliases {
                paths.insert((*alias).to_string(), url.clone());
            }
        }
    }

    paths
}
