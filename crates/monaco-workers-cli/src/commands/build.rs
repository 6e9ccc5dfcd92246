//! `monaco-workers build` command implementation.

use miette::{IntoDiagnostic, Result};
use monaco_workers_core::{FinalizeReport, HostConfig, Plugin};
use monaco_workers_util::fs::{atomic_write, read_to_string_lossy};
use serde::Serialize;
use std::path::PathBuf;

/// Build command action.
#[derive(Debug, Clone)]
pub struct BuildAction {
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub base: String,
    pub config: Option<PathBuf>,
    pub esbuild: Option<PathBuf>,
}

/// Build result for JSON output.
#[derive(Serialize)]
struct BuildResultJson<'a> {
    schema_version: u32,
    ok: bool,
    /// `index.html` that received the bootstrap script, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    index_html: Option<PathBuf>,
    #[serde(flatten)]
    report: &'a FinalizeReport,
}

pub async fn run(action: BuildAction, json: bool) -> Result<()> {
    let plugin = super::load_plugin(
        &action.root,
        action.config.as_deref(),
        action.esbuild.as_deref(),
    )?;

    let host = HostConfig::new(&action.root)
        .with_out_dir(&action.out_dir)
        .with_base(&action.base);
    plugin.config_resolved(&host).into_diagnostic()?;

    let report = plugin.finalize().await.into_diagnostic()?;

    let index_path = action.root.join(&action.out_dir).join("index.html");
    let index_html = if index_path.is_file() {
        let html = read_to_string_lossy(&index_path).into_diagnostic()?;
        if let Some(html) = plugin.transform_index_html(&html).into_diagnostic()? {
            atomic_write(&index_path, html.as_bytes()).into_diagnostic()?;
        }
        Some(index_path)
    } else {
        None
    };

    if json {
        let result = BuildResultJson {
            schema_version: 1,
            ok: report.is_success(),
            index_html,
            report: &report,
        };
        println!("{}", serde_json::to_string(&result).into_diagnostic()?);
    } else {
        print_report(&report, index_html.as_ref());
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &FinalizeReport, index_html: Option<&PathBuf>) {
    if report.skipped {
        println!("Public path is remote, no workers emitted");
    } else if let Some(dist) = &report.dist_dir {
        println!(
            "Emitted {} worker(s) to {}",
            report.copied.len(),
            dist.display()
        );
        for path in &report.copied {
            let name = path.file_name().map_or_else(
                || path.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            );
            println!("✓ {name}");
        }
    }

    for failed in &report.failed {
        println!("✗ {} ({})", failed.label, failed.entry);
        eprintln!("  error: {}", failed.message);
    }

    if let Some(path) = index_html {
        println!("Injected MonacoEnvironment into {}", path.display());
    }
}
