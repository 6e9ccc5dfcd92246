//! The bundler seam.
//!
//! Worker sources are bundled into one self-contained script by an external
//! tool. [`EsbuildBundler`] shells out to `esbuild`; tests and embedders can
//! supply any other [`WorkerBundler`].

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Produces a single runnable script from a worker entry file.
///
/// Implementations are synchronous; callers run them on a blocking thread.
pub trait WorkerBundler: Send + Sync {
    /// Bundler name for logs.
    fn name(&self) -> &str;

    /// Bundle `entry` and everything it imports into one script.
    fn bundle(&self, entry: &Path) -> Result<Vec<u8>>;
}

/// Runs the `esbuild` executable and captures the bundle from stdout.
#[derive(Debug, Clone)]
pub struct EsbuildBundler {
    program: PathBuf,
    cwd: Option<PathBuf>,
    args: Vec<String>,
}

impl EsbuildBundler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cwd: None,
            args: Vec::new(),
        }
    }

    /// Find `esbuild` in the project's `node_modules/.bin`, then on `PATH`.
    pub fn discover(root: &Path) -> Result<Self> {
        let local = root.join("node_modules").join(".bin").join(if cfg!(windows) {
            "esbuild.cmd"
        } else {
            "esbuild"
        });
        if local.is_file() {
            return Ok(Self::new(local).current_dir(root));
        }

        which::which("esbuild")
            .map(|p| Self::new(p).current_dir(root))
            .map_err(|e| Error::other(format!("esbuild not found in node_modules/.bin or PATH: {e}")))
    }

    /// Working directory for the bundler process.
    #[must_use]
    pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Extra argument passed after the defaults (e.g. `--minify`).
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl WorkerBundler for EsbuildBundler {
    fn name(&self) -> &str {
        "esbuild"
    }

    fn bundle(&self, entry: &Path) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(entry)
            .arg("--bundle")
            .arg("--log-level=error")
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        debug!(program = %self.program.display(), entry = %entry.display(), "spawning bundler");

        let output = cmd.output().map_err(|e| Error::Build {
            entry: entry.display().to_string(),
            message: format!("failed to spawn {}: {e}", self.program.display()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Build {
                entry: entry.display().to_string(),
                message: format!("{} exited with {}: {}", self.name(), output.status, stderr.trim()),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_prefers_local_bin() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("node_modules").join(".bin");
        std::fs::create_dir_all(&bin).unwrap();
        let name = if cfg!(windows) { "esbuild.cmd" } else { "esbuild" };
        std::fs::write(bin.join(name), "").unwrap();

        let bundler = EsbuildBundler::discover(dir.path()).unwrap();
        assert_eq!(bundler.program(), bin.join(name));
    }

    #[test]
    fn test_missing_program_is_build_error() {
        let bundler = EsbuildBundler::new("/definitely/not/esbuild");
        let err = bundler.bundle(Path::new("entry.js")).unwrap_err();
        assert!(matches!(err, Error::Build { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_failures() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("fake-esbuild");
        std::fs::write(
            &script,
            "#!/bin/sh\ncase \"$1\" in *broken*) echo 'syntax error' >&2; exit 1;; esac\ncat \"$1\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let entry = dir.path().join("json.worker.js");
        std::fs::write(&entry, "postMessage(1);").unwrap();
        let bundler = EsbuildBundler::new(&script);
        assert_eq!(bundler.bundle(&entry).unwrap(), b"postMessage(1);");

        let broken = dir.path().join("broken.worker.js");
        std::fs::write(&broken, "").unwrap();
        match bundler.bundle(&broken).unwrap_err() {
            Error::Build { message, .. } => assert!(message.contains("syntax error")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
