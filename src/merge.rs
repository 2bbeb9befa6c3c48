//! The merge operation: remux one video stream and one audio stream into a
//! single output file with an external FFmpeg binary.
//!
//! FFmpeg does all the media work; this module validates the inputs, builds
//! the fixed remux command, supervises the run through the runner, and
//! verifies the output file actually exists afterwards. Success means zero
//! exit AND output file present; there is no partial success.

use crate::config::Config;
use crate::error::{AvmuxError, Result};
use crate::ffmpeg::FfmpegBinary;
use crate::runner::{self, ExecutionError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How many trailing output lines to embed in failure messages.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// One merge request: source video, source audio, destination output.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
}

impl MergeRequest {
    pub fn new(
        video: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video: video.into(),
            audio: audio.into(),
            output: output.into(),
        }
    }

    /// Reject empty paths and missing input files before anything runs.
    ///
    /// Empty paths are a user error (bad arguments); existing-but-missing
    /// files are a precondition failure with the offending path named.
    pub fn validate(&self) -> Result<()> {
        for (label, path) in [
            ("video", &self.video),
            ("audio", &self.audio),
            ("output", &self.output),
        ] {
            if path.as_os_str().is_empty() {
                return Err(AvmuxError::UserError(format!("{} path is empty", label)));
            }
        }

        if !self.video.is_file() {
            return Err(AvmuxError::PreconditionFailed(format!(
                "video file not found: '{}'",
                self.video.display()
            )));
        }
        if !self.audio.is_file() {
            return Err(AvmuxError::PreconditionFailed(format!(
                "audio file not found: '{}'",
                self.audio.display()
            )));
        }

        Ok(())
    }
}

/// Summary of a successful merge.
#[derive(Debug)]
pub struct MergeReport {
    /// Wall-clock duration of the FFmpeg run.
    pub duration: Duration,
    /// Number of output lines FFmpeg produced.
    pub lines_captured: usize,
}

/// Merge the request's streams with the given FFmpeg binary.
///
/// Runs the sanity probe first so an unusable binary fails fast with an
/// actionable message instead of a cryptic merge error. Each FFmpeg output
/// line is forwarded to `observer` as it arrives.
pub fn merge<F>(
    ffmpeg: &FfmpegBinary,
    request: &MergeRequest,
    config: &Config,
    observer: F,
) -> Result<MergeReport>
where
    F: Fn(&str) + Send + 'static,
{
    request.validate()?;
    ffmpeg.verify()?;

    let mut invocation = ffmpeg
        .invocation()
        .arg("-i")
        .arg(path_arg(&request.video))
        .arg("-i")
        .arg(path_arg(&request.audio))
        .arg("-c")
        .arg("copy");

    for extra in config.extra_ffmpeg_args()? {
        invocation = invocation.arg(extra);
    }

    let invocation = invocation
        .arg("-y")
        .arg(path_arg(&request.output))
        .timeout(Duration::from_secs(config.timeout_seconds))
        .reader_grace(Duration::from_millis(config.reader_grace_ms));

    let command_line = invocation.command_line();
    let outcome = runner::run_observed(&invocation, observer)
        .map_err(|e| translate(e, request, &command_line))?;

    // FFmpeg can exit zero without writing anything (e.g. when arguments
    // cancel each other out); the contract is "output file exists".
    if !request.output.is_file() {
        return Err(AvmuxError::MergeFailed(format!(
            "FFmpeg exited cleanly but the output file was not created: '{}'",
            request.output.display()
        )));
    }

    Ok(MergeReport {
        duration: outcome.duration,
        lines_captured: outcome.output.len(),
    })
}

/// Translate a runner failure into the user-facing error channel.
fn translate(err: ExecutionError, request: &MergeRequest, command_line: &str) -> AvmuxError {
    match err {
        ExecutionError::LaunchFailed { .. } => {
            AvmuxError::LaunchFailed(format!("{} (command: {})", err, command_line))
        }
        ExecutionError::Timeout {
            timeout, elapsed, ..
        } => AvmuxError::Timeout(format!(
            "FFmpeg did not finish within {:?} (killed after {:?})",
            timeout, elapsed
        )),
        ExecutionError::NonZeroExit { code, output } => AvmuxError::MergeFailed(format!(
            "FFmpeg exited with code {} while writing '{}'\n{}",
            code,
            request.output.display(),
            diagnostic_tail(&output)
        )),
        ExecutionError::Interrupted { .. } => {
            AvmuxError::MergeFailed("FFmpeg was terminated by a signal".to_string())
        }
        other => AvmuxError::MergeFailed(other.to_string()),
    }
}

/// Last lines of captured output, for embedding in error messages.
fn diagnostic_tail(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].join("\n")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn drop_line(_line: &str) {}

    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, body: &str) -> FfmpegBinary {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg");
        // Every invocation must answer the -version probe; otherwise run the
        // test body. "$@" keeps the real arguments visible to the body.
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then echo 'ffmpeg version 6.0-test'; exit 0; fi\n{}\n",
            body
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        FfmpegBinary::resolve(Some(&path), None).unwrap()
    }

    fn request_with_inputs(dir: &Path) -> MergeRequest {
        let video = dir.join("video.m4s");
        let audio = dir.join("audio.m4s");
        std::fs::write(&video, b"video-bytes").unwrap();
        std::fs::write(&audio, b"audio-bytes").unwrap();
        MergeRequest::new(video, audio, dir.join("merged.mp4"))
    }

    #[test]
    fn empty_video_path_is_a_user_error() {
        let request = MergeRequest::new("", "a.m4a", "out.mp4");
        let err = request.validate().unwrap_err();
        assert!(matches!(err, AvmuxError::UserError(_)));
    }

    #[test]
    fn missing_video_is_a_precondition_failure_naming_the_path() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("audio.m4s");
        std::fs::write(&audio, b"audio").unwrap();

        let request = MergeRequest::new(
            temp.path().join("missing-video.m4s"),
            audio,
            temp.path().join("out.mp4"),
        );

        let err = request.validate().unwrap_err();
        assert!(matches!(err, AvmuxError::PreconditionFailed(_)));
        assert!(err.to_string().contains("missing-video.m4s"));
    }

    #[test]
    fn missing_audio_is_a_precondition_failure() {
        let temp = TempDir::new().unwrap();
        let video = temp.path().join("video.m4s");
        std::fs::write(&video, b"video").unwrap();

        let request = MergeRequest::new(
            video,
            temp.path().join("missing-audio.m4s"),
            temp.path().join("out.mp4"),
        );

        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("missing-audio.m4s"));
    }

    #[cfg(unix)]
    #[test]
    fn successful_merge_requires_the_output_file() {
        let temp = TempDir::new().unwrap();
        let request = request_with_inputs(temp.path());

        // The last argument is the output path; create it like ffmpeg would.
        let ffmpeg = fake_ffmpeg(
            temp.path(),
            "echo 'Stream mapping:'; for last in \"$@\"; do :; done; : > \"$last\"",
        );

        let report = merge(&ffmpeg, &request, &Config::default(), drop_line).unwrap();
        assert!(request.output.is_file());
        assert_eq!(report.lines_captured, 1);
    }

    #[cfg(unix)]
    #[test]
    fn clean_exit_without_output_file_fails() {
        let temp = TempDir::new().unwrap();
        let request = request_with_inputs(temp.path());
        let ffmpeg = fake_ffmpeg(temp.path(), "echo 'doing nothing'; exit 0");

        let err = merge(&ffmpeg, &request, &Config::default(), drop_line).unwrap_err();
        assert!(matches!(err, AvmuxError::MergeFailed(_)));
        assert!(err.to_string().contains("was not created"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_surfaces_code_and_diagnostics() {
        let temp = TempDir::new().unwrap();
        let request = request_with_inputs(temp.path());
        let ffmpeg = fake_ffmpeg(
            temp.path(),
            "echo 'error: bad format' 1>&2; exit 1",
        );

        let err = merge(&ffmpeg, &request, &Config::default(), drop_line).unwrap_err();
        assert!(matches!(err, AvmuxError::MergeFailed(_)));
        let message = err.to_string();
        assert!(message.contains("code 1"));
        assert!(message.contains("error: bad format"));
    }

    #[cfg(unix)]
    #[test]
    fn hung_ffmpeg_times_out() {
        let temp = TempDir::new().unwrap();
        let request = request_with_inputs(temp.path());
        let ffmpeg = fake_ffmpeg(temp.path(), "sleep 60");

        let config = Config {
            timeout_seconds: 1,
            ..Default::default()
        };

        let err = merge(&ffmpeg, &request, &config, drop_line).unwrap_err();
        assert!(matches!(err, AvmuxError::Timeout(_)));
    }

    #[cfg(unix)]
    #[test]
    fn extra_args_are_passed_through() {
        let temp = TempDir::new().unwrap();
        let request = request_with_inputs(temp.path());

        // Record the argv so the test can assert on it, then create the
        // output file.
        let argv_log = temp.path().join("argv.txt");
        let ffmpeg = fake_ffmpeg(
            temp.path(),
            &format!(
                "printf '%s\\n' \"$@\" > '{}'; for last in \"$@\"; do :; done; : > \"$last\"",
                argv_log.display()
            ),
        );

        let config = Config {
            extra_args: Some("-loglevel error".to_string()),
            ..Default::default()
        };

        merge(&ffmpeg, &request, &config, drop_line).unwrap();

        let argv = std::fs::read_to_string(&argv_log).unwrap();
        let args: Vec<&str> = argv.lines().collect();
        assert!(args.windows(2).any(|w| w == ["-loglevel", "error"]));
        assert!(args.windows(2).any(|w| w == ["-c", "copy"]));
        assert_eq!(args.last().copied(), request.output.to_str());
    }

    #[test]
    fn diagnostic_tail_keeps_only_recent_lines() {
        let lines: Vec<String> = (0..50).map(|i| format!("line {}", i)).collect();
        let tail = diagnostic_tail(&lines);

        assert!(tail.contains("line 49"));
        assert!(!tail.contains("line 10\n"));
        assert_eq!(tail.lines().count(), DIAGNOSTIC_TAIL_LINES);
    }
}
