//! `monaco-workers workers`: show what would be built and where it is served.

use miette::{IntoDiagnostic, Result};
use monaco_workers_core::workers::{compute_paths, resolve_workers};
use monaco_workers_core::{WorkerDefinition, WorkerPathMap};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct WorkersAction {
    pub root: PathBuf,
    pub base: String,
    pub config: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkersJson<'a> {
    public_path: &'a str,
    remote: bool,
    workers: &'a [WorkerDefinition],
    paths: &'a WorkerPathMap,
}

pub fn run(action: WorkersAction, json: bool) -> Result<()> {
    let options = super::options(&action.root, action.config.as_deref())?.resolve();
    let workers =
        resolve_workers(&options.language_workers, &options.custom_workers).into_diagnostic()?;
    let remote = options.is_remote();
    let paths = compute_paths(&workers, &options.public_path, remote, &action.base);

    if json {
        let out = WorkersJson {
            public_path: &options.public_path,
            remote,
            workers: &workers,
            paths: &paths,
        };
        println!("{}", serde_json::to_string(&out).into_diagnostic()?);
        return Ok(());
    }

    println!("Workers ({}):", workers.len());
    for worker in &workers {
        println!("  {:<22} {}", worker.label, worker.entry);
    }
    println!();
    println!("Paths{}:", if remote { " (remote)" } else { "" });
    for (label, url) in &paths {
        println!("  {:<22} {}", label, url);
    }
    Ok(())
}
