#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use monaco_workers_core::paths;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "monaco-workers")]
#[command(author, version, about = "Bundle, serve and emit Monaco editor web workers", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (used as the project root)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Start a dev server that builds workers on first request
    Dev {
        /// Port to listen on
        #[arg(long, default_value_t = 5173)]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Base public path of the app
        #[arg(long, default_value = "/")]
        base: String,

        /// Path to a monaco-workers.json config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// esbuild executable (default: node_modules/.bin, then PATH)
        #[arg(long, env = "MONACO_WORKERS_ESBUILD", value_name = "PATH")]
        esbuild: Option<PathBuf>,
    },

    /// Build every worker and copy the bundles into the output directory
    Build {
        /// Output directory, relative to the project root
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,

        /// Base public path of the app
        #[arg(long, default_value = "/")]
        base: String,

        /// Path to a monaco-workers.json config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// esbuild executable (default: node_modules/.bin, then PATH)
        #[arg(long, env = "MONACO_WORKERS_ESBUILD", value_name = "PATH")]
        esbuild: Option<PathBuf>,
    },

    /// Show the resolved worker set and label to URL map
    Workers {
        /// Base public path of the app
        #[arg(long, default_value = "/")]
        base: String,

        /// Path to a monaco-workers.json config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit --cwd is the root; otherwise walk up to the nearest project
    let root = match cli.cwd {
        Some(cwd) => cwd,
        None => {
            let cwd = std::env::current_dir().into_diagnostic()?;
            paths::project_root(&cwd).unwrap_or(cwd)
        }
    };

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Dev {
            port,
            host,
            base,
            config,
            esbuild,
        }) => {
            let action = commands::dev::DevAction {
                root,
                port,
                host,
                base,
                config,
                esbuild,
            };
            let rt = tokio::runtime::Runtime::new().into_diagnostic()?;
            rt.block_on(commands::dev::run(action))
        }
        Some(Commands::Build {
            out_dir,
            base,
            config,
            esbuild,
        }) => {
            let action = commands::build::BuildAction {
                root,
                out_dir,
                base,
                config,
                esbuild,
            };
            let rt = tokio::runtime::Runtime::new().into_diagnostic()?;
            rt.block_on(commands::build::run(action, cli.json))
        }
        Some(Commands::Workers { base, config }) => {
            let action = commands::workers::WorkersAction { root, base, config };
            commands::workers::run(action, cli.json)
        }
    }
}
