//! Build-tool plugin interface.
//!
//! A Vite-style subset of hooks: the host resolves its config, lets plugins
//! contribute dev-server routes, passes the index HTML through every plugin,
//! and calls `write_bundle` once the production output has been written.
//!
//! ## Example
//!
//! ```ignore
//! use monaco_workers_core::plugin::{HookResult, Plugin};
//!
//! struct Banner;
//!
//! impl Plugin for Banner {
//!     fn name(&self) -> &str { "banner" }
//!
//!     fn transform_index_html(&self, html: &str) -> HookResult<Option<String>> {
//!         Ok(Some(html.replace("<body>", "<body><!-- built -->")))
//!     }
//! }
//! ```

use axum::Router;
use futures::future::BoxFuture;
use std::path::PathBuf;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: impl Into<String>, hook: &'static str, message: impl ToString) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// The host build tool's resolved configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Project root.
    pub root: PathBuf,
    /// Production output directory, relative to `root` unless absolute.
    pub out_dir: PathBuf,
    /// Base public URL segment (e.g. `/` or `/app/`).
    pub base: String,
    /// Dev server host.
    pub host: String,
    /// Dev server port.
    pub port: u16,
}

impl HostConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    #[must_use]
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_default(),
            out_dir: PathBuf::from("dist"),
            base: "/".to_string(),
            host: "localhost".to_string(),
            port: 3000,
        }
    }
}

/// Context for the dev server, passed to the `configure_server` hook.
pub struct ServerContext {
    /// Host configuration.
    pub config: HostConfig,
    /// Routes contributed by plugins, consulted before the server's own handlers.
    pub middlewares: Vec<ServerMiddleware>,
}

/// A router registered by a plugin.
pub struct ServerMiddleware {
    /// Name for debugging.
    pub name: String,
    /// The routes.
    pub router: Router,
}

impl ServerContext {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            middlewares: Vec::new(),
        }
    }

    /// Register a router.
    pub fn use_router(&mut self, name: impl Into<String>, router: Router) {
        self.middlewares.push(ServerMiddleware {
            name: name.into(),
            router,
        });
    }

    /// All registered routes merged into one router.
    pub fn into_router(self) -> Router {
        self.middlewares
            .into_iter()
            .fold(Router::new(), |acc, m| acc.merge(m.router))
    }
}

/// The main plugin trait.
///
/// All hooks have default implementations that do nothing.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Called once the host config is final.
    fn config_resolved(&self, _config: &HostConfig) -> HookResult<()> {
        Ok(())
    }

    /// Configure the dev server. Called once at dev server startup.
    fn configure_server(&self, _server: &mut ServerContext) -> HookResult<()> {
        Ok(())
    }

    /// Transform the index HTML page.
    ///
    /// Return `Some(html)` to replace the HTML, or `None` to pass through.
    fn transform_index_html(&self, _html: &str) -> HookResult<Option<String>> {
        Ok(None)
    }

    /// Called after the production bundle has been written.
    fn write_bundle(&self) -> BoxFuture<'_, HookResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Runs hooks on plugins in insertion order.
#[derive(Default)]
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Check if any plugins are registered.
    #[must_use]
    pub fn has_plugins(&self) -> bool {
        !self.plugins.is_empty()
    }

    pub fn call_config_resolved(&self, config: &HostConfig) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.config_resolved(config)?;
        }
        Ok(())
    }

    pub fn call_configure_server(&self, server: &mut ServerContext) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.configure_server(server)?;
        }
        Ok(())
    }

    /// Call `transform_index_html` on all plugins (chained).
    pub fn call_transform_index_html(&self, html: &str) -> HookResult<String> {
        let mut current = html.to_string();
        for plugin in &self.plugins {
            if let Some(transformed) = plugin.transform_index_html(&current)? {
                current = transformed;
            }
        }
        Ok(current)
    }

    /// Call `write_bundle` on all plugins, one after another.
    pub async fn call_write_bundle(&self) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.write_bundle().await?;
        }
        Ok(())
    }
}
