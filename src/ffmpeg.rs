//! FFmpeg binary discovery and sanity probing.
//!
//! Resolves the path to the FFmpeg executable and the directory of its
//! supporting shared libraries, and verifies the binary actually runs on
//! this machine before any merge is attempted. A binary that launches but
//! prints nothing for `-version` is treated as broken; on a bundled-binary
//! layout that usually means an architecture mismatch, so probe failures
//! name the host platform.

use crate::error::{AvmuxError, Result};
use crate::runner::{self, Invocation};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Primary environment variable naming the FFmpeg binary.
pub const ENV_FFMPEG: &str = "AVMUX_FFMPEG";

/// Fallback environment variable, shared with other tools.
pub const ENV_FFMPEG_FALLBACK: &str = "FFMPEG_PATH";

/// Timeout for the `-version` sanity probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A resolved FFmpeg binary plus the library directory its invocations need.
#[derive(Debug, Clone)]
pub struct FfmpegBinary {
    path: PathBuf,
    lib_dir: Option<PathBuf>,
}

impl FfmpegBinary {
    /// Resolve the FFmpeg binary.
    ///
    /// Resolution order: `explicit` path, then the `AVMUX_FFMPEG` and
    /// `FFMPEG_PATH` environment variables, then `ffmpeg` on PATH.
    ///
    /// For explicit and environment-supplied paths the library directory
    /// defaults to the binary's own directory (bundled layout, where the
    /// shared objects sit next to the executable). For a PATH lookup no
    /// library override is applied unless `lib_dir` is given.
    pub fn resolve(explicit: Option<&Path>, lib_dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_explicit_path(path, lib_dir);
        }

        for var in [ENV_FFMPEG, ENV_FFMPEG_FALLBACK] {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    let path = PathBuf::from(&value);
                    if !path.exists() {
                        return Err(AvmuxError::PreconditionFailed(format!(
                            "FFmpeg binary named by {} not found: '{}'",
                            var, value
                        )));
                    }
                    return Self::from_explicit_path(&path, lib_dir);
                }
            }
        }

        let path = which::which("ffmpeg").map_err(|_| {
            AvmuxError::PreconditionFailed(format!(
                "ffmpeg not found on PATH; pass --ffmpeg or set {}",
                ENV_FFMPEG
            ))
        })?;

        Ok(Self {
            path,
            lib_dir: lib_dir.map(Path::to_path_buf),
        })
    }

    fn from_explicit_path(path: &Path, lib_dir: Option<&Path>) -> Result<Self> {
        if !path.exists() {
            return Err(AvmuxError::PreconditionFailed(format!(
                "FFmpeg binary not found: '{}'",
                path.display()
            )));
        }

        let lib_dir = lib_dir
            .map(Path::to_path_buf)
            .or_else(|| path.parent().map(Path::to_path_buf));

        Ok(Self {
            path: path.to_path_buf(),
            lib_dir,
        })
    }

    /// Path to the resolved binary.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment overrides every invocation of this binary carries.
    pub fn env_overrides(&self) -> Vec<(String, String)> {
        match &self.lib_dir {
            Some(dir) => vec![(
                "LD_LIBRARY_PATH".to_string(),
                dir.to_string_lossy().into_owned(),
            )],
            None => Vec::new(),
        }
    }

    /// Base invocation for this binary with its environment applied.
    pub fn invocation(&self) -> Invocation {
        let mut invocation = Invocation::new(&self.path);
        for (key, value) in self.env_overrides() {
            invocation = invocation.env(key, value);
        }
        invocation
    }

    /// Run the `-version` sanity probe.
    ///
    /// The binary must exit zero AND print something; the runner itself does
    /// not judge empty output, so the non-empty requirement lives here.
    /// Returns the first output line (the version banner).
    pub fn verify(&self) -> Result<String> {
        let invocation = self.invocation().arg("-version").timeout(PROBE_TIMEOUT);

        let outcome = runner::run(&invocation).map_err(|e| {
            AvmuxError::PreconditionFailed(format!(
                "FFmpeg sanity probe failed for '{}' on {}/{}: {}",
                self.path.display(),
                std::env::consts::OS,
                std::env::consts::ARCH,
                e
            ))
        })?;

        let banner = outcome
            .output
            .iter()
            .find(|line| !line.trim().is_empty())
            .cloned();

        match banner {
            Some(line) => Ok(line),
            None => Err(AvmuxError::PreconditionFailed(format!(
                "FFmpeg at '{}' ran but produced no version output; the binary may be built \
                 for a different architecture (host is {}/{})",
                self.path.display(),
                std::env::consts::OS,
                std::env::consts::ARCH,
            ))),
        }
    }
}
