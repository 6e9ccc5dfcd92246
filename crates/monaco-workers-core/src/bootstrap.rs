//! The page-load script that installs `self.MonacoEnvironment`.
//!
//! The configuration is serialised as JSON and handed to a fixed
//! initialiser, so the only generated part of the script is data.

use crate::workers::WorkerPathMap;
use serde::Serialize;

/// Data passed to the page initialiser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    #[serde(rename = "globalAPI")]
    pub global_api: bool,
    pub worker_paths: WorkerPathMap,
}

/// Installs `MonacoEnvironment`. Cross-origin worker URLs are wrapped in a
/// same-origin blob that loads the real script with `importScripts`.
const INITIALIZER: &str = r#"(function (config) {
  var paths = config.workerPaths;
  function sameOrigin(url) {
    try {
      return new URL(url, self.location.href).origin === self.location.origin;
    } catch (e) {
      return true;
    }
  }
  self.MonacoEnvironment = {
    globalAPI: config.globalAPI,
    getWorkerUrl: function (moduleId, label) {
      var url = paths[label];
      if (url && !sameOrigin(url)) {
        var shim = "/*" + label + "*/importScripts(" + JSON.stringify(url) + ");";
        return URL.createObjectURL(new Blob([shim], { type: "application/javascript" }));
      }
      return url;
    }
  };
})"#;

impl BootstrapConfig {
    /// The script body (without the `<script>` element).
    #[must_use]
    pub fn script(&self) -> String {
        // A map of strings plus a bool always serialises.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("{INITIALIZER}({});", escape_script_close(&json))
    }

    /// The inline `<script>` element.
    #[must_use]
    pub fn script_tag(&self) -> String {
        format!("<script>{}</script>", self.script())
    }
}

/// Keep `</script` inside a string literal from ending the element early.
fn escape_script_close(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Insert `tag` as the first child of `<head>`.
///
/// Without a `<head>`, one is opened right after `<html ...>`. Without
/// either, the tag is prepended to the document.
#[must_use]
pub fn inject_head_prepend(html: &str, tag: &str) -> String {
    if let Some(end) = find_open_tag(html, "head") {
        return format!("{}{tag}{}", &html[..end], &html[end..]);
    }
    if let Some(end) = find_open_tag(html, "html") {
        return format!("{}<head>{tag}</head>{}", &html[..end], &html[end..]);
    }
    format!("{tag}{html}")
}

/// Byte offset just past the first `<name>` or `<name ...>` open tag.
fn find_open_tag(html: &str, name: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{name}");
    let mut from = 0;

    while let Some(pos) = lower[from..].find(&needle) {
        let start = from + pos;
        let after = start + needle.len();
        match lower.as_bytes().get(after).copied() {
            Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/') => {
                return lower[after..].find('>').map(|gt| after + gt + 1);
            }
            // `<header>` and friends
            _ => from = after,
        }
    }

    None
}
