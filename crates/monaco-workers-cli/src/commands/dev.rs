//! `monaco-workers dev` command implementation.
//!
//! Hosts the plugin the way a dev server would:
//!
//! ```text
//! GET /                       -> index.html with the MonacoEnvironment bootstrap
//! ANY {base}{publicPath}/*.js -> worker bundle, built on first request
//! GET /*                      -> static files from the project root
//! ```

use axum::{response::Html, routing::get, Router};
use miette::{IntoDiagnostic, Result};
use monaco_workers_core::{HostConfig, PluginContainer, ServerContext};
use monaco_workers_util::fs::read_to_string_lossy;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

/// Dev server action.
#[derive(Debug, Clone)]
pub struct DevAction {
    /// Project root.
    pub root: PathBuf,
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Base public path.
    pub base: String,
    /// Explicit config file.
    pub config: Option<PathBuf>,
    /// Explicit esbuild program.
    pub esbuild: Option<PathBuf>,
}

pub async fn run(action: DevAction) -> Result<()> {
    let plugin = super::load_plugin(
        &action.root,
        action.config.as_deref(),
        action.esbuild.as_deref(),
    )?;

    let host_config = HostConfig {
        root: action.root.clone(),
        out_dir: PathBuf::from("dist"),
        base: action.base.clone(),
        host: action.host.clone(),
        port: action.port,
    };

    let mut plugins = PluginContainer::new();
    plugins.add(Box::new(plugin));
    plugins.call_config_resolved(&host_config).into_diagnostic()?;

    let mut server = ServerContext::new(host_config);
    plugins.call_configure_server(&mut server).into_diagnostic()?;

    let index_path = action.root.join("index.html");
    let index_html = if index_path.is_file() {
        read_to_string_lossy(&index_path).into_diagnostic()?
    } else {
        generate_index_html()
    };
    let index_html: Arc<str> = plugins
        .call_transform_index_html(&index_html)
        .into_diagnostic()?
        .into();

    let serve_index = move || {
        let html = Arc::clone(&index_html);
        async move { Html(html.to_string()) }
    };

    let app: Router = server
        .into_router()
        .route("/", get(serve_index.clone()))
        .route("/index.html", get(serve_index))
        .fallback_service(ServeDir::new(&action.root));

    let host_ip = if action.host == "localhost" {
        "127.0.0.1"
    } else {
        action.host.as_str()
    };
    let addr: SocketAddr = format!("{}:{}", host_ip, action.port)
        .parse()
        .into_diagnostic()?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    let local = listener.local_addr().into_diagnostic()?;
    info!(addr = %local, root = %action.root.display(), "dev server listening");

    println!();
    println!("  Dev server running at http://{}:{}", action.host, local.port());
    println!("  Monaco workers are built on first request");
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .into_diagnostic()?;

    Ok(())
}

/// Page served when the project has no `index.html`.
fn generate_index_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>monaco-workers dev</title>
  <style>
    body { margin: 0; font-family: system-ui, sans-serif; }
    #container { width: 100vw; height: 100vh; }
  </style>
</head>
<body>
  <div id="container"></div>
  <script type="module" src="/src/main.js"></script>
</body>
</html>"#
        .to_string()
}
