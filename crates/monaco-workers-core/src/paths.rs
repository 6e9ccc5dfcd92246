use std::path::{Path, PathBuf};

/// Default public path under which worker bundles are served and emitted.
pub const DEFAULT_PUBLIC_PATH: &str = "monacoeditorwork";

/// Cache directory, relative to the project root.
pub const CACHE_DIR: &str = "node_modules/.monaco";

/// Suffix appended to every bundled worker filename.
pub const BUNDLE_SUFFIX: &str = ".bundle.js";

/// Script extensions removed from an entry's base name before the suffix is added.
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".ts", ".jsx", ".tsx"];

/// URL prefixes that mark a public path as hosted elsewhere.
const REMOTE_PREFIXES: &[&str] = &["http:", "https:", "file:", "//"];

/// Find the project root by walking up from `cwd` looking for `package.json` or `.git`.
///
/// Returns the first directory containing either marker, or `None` if neither is found.
#[must_use]
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        if current.join("package.json").exists() || current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Directory holding bundled workers for a project.
#[must_use]
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(CACHE_DIR)
}

/// Whether a public path points at a CDN / absolute URL rather than this server.
#[must_use]
pub fn is_remote(public_path: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|p| public_path.starts_with(p))
}

/// Cache (and served) filename for a worker entry.
///
/// `monaco-editor/esm/vs/language/json/json.worker` becomes `json.worker.bundle.js`.
#[must_use]
pub fn cache_filename(entry: &str) -> String {
    let base = entry.rsplit(&['/', '\\'][..]).next().unwrap_or(entry);
    let stem = SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| base.strip_suffix(ext))
        .unwrap_or(base);
    format!("{stem}{BUNDLE_SUFFIX}")
}

/// Default output directory for worker bundles: `root/outDir/base/publicPath`.
///
/// `base` and `public_path` are URL segments and are always appended below
/// the output directory, even when they start with `/`.
#[must_use]
pub fn dist_dir(root: &Path, out_dir: &Path, base: &str, public_path: &str) -> PathBuf {
    let mut dir = root.join(out_dir);
    for segment in base.split('/').chain(public_path.split('/')) {
        if !segment.is_empty() && segment != "." {
            dir.push(segment);
        }
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_project_root_with_package_json() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("src").join("editor");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();

        assert_eq!(project_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.example.com/workers"));
        assert!(is_remote("http://localhost:8080/w"));
        assert!(is_remote("file:///tmp/workers"));
        assert!(is_remote("//cdn.example.com"));
        assert!(!is_remote("monacoeditorwork"));
        assert!(!is_remote("/monacoeditorwork"));
        assert!(!is_remote("assets/https:"));
    }

    #[test]
    fn test_cache_filename() {
        assert_eq!(
            cache_filename("monaco-editor/esm/vs/language/json/json.worker"),
            "json.worker.bundle.js"
        );
        assert_eq!(
            cache_filename("monaco-editor/esm/vs/editor/editor.worker"),
            "editor.worker.bundle.js"
        );
        assert_eq!(cache_filename("./src/yaml.worker.js"), "yaml.worker.bundle.js");
        assert_eq!(cache_filename("graphql.worker.ts"), "graphql.worker.bundle.js");
    }

    #[test]
    fn test_dist_dir_default_layout() {
        let dir = dist_dir(Path::new("/app"), Path::new("dist"), "/", DEFAULT_PUBLIC_PATH);
        assert_eq!(dir, PathBuf::from("/app/dist/monacoeditorwork"));
    }

    #[test]
    fn test_dist_dir_nested_base() {
        let dir = dist_dir(Path::new("/app"), Path::new("dist"), "/editor/", "workers");
        assert_eq!(dir, PathBuf::from("/app/dist/editor/workers"));

        let dir = dist_dir(Path::new("/app"), Path::new("dist"), "./", "workers");
        assert_eq!(dir, PathBuf::from("/app/dist/workers"));
    }

    #[test]
    fn test_dist_dir_absolute_out_dir() {
        let dir = dist_dir(Path::new("/app"), Path::new("/srv/www"), "/", "w");
        assert_eq!(dir, PathBuf::from("/srv/www/w"));
    }
}
