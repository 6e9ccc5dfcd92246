//! Built-in catalog of editor language workers.

use serde::{Deserialize, Serialize};

/// Label of the core editor worker, which every page needs.
pub const EDITOR_WORKER_LABEL: &str = "editorWorkerService";

/// A language worker: the label the editor asks for and the module that implements it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerDefinition {
    /// Label passed by the editor to `getWorkerUrl`.
    pub label: String,
    /// Logical module path of the worker source (e.g. `monaco-editor/esm/vs/language/json/json.worker`).
    pub entry: String,
}

impl WorkerDefinition {
    pub fn new(label: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entry: entry.into(),
        }
    }
}

/// Built-in workers in catalog order.
const BUILTIN_WORKERS: &[(&str, &str)] = &[
    (EDITOR_WORKER_LABEL, "monaco-editor/esm/vs/editor/editor.worker"),
    ("css", "monaco-editor/esm/vs/language/css/css.worker"),
    ("html", "monaco-editor/esm/vs/language/html/html.worker"),
    ("json", "monaco-editor/esm/vs/language/json/json.worker"),
    ("typescript", "monaco-editor/esm/vs/language/typescript/ts.worker"),
];

/// Look up a built-in worker by label.
#[must_use]
pub fn lookup(label: &str) -> Option<WorkerDefinition> {
    BUILTIN_WORKERS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(l, e)| WorkerDefinition::new(*l, *e))
}

/// All built-in labels, in catalog order.
pub fn labels() -> impl Iterator<Item = &'static str> {
    BUILTIN_WORKERS.iter().map(|(l, _)| *l)
}

/// The core editor worker definition.
#[must_use]
pub fn editor_worker() -> WorkerDefinition {
    let (label, entry) = BUILTIN_WORKERS[0];
    WorkerDefinition::new(label, entry)
}
