//! The merge command: resolve FFmpeg, run the merge, report the outcome.

use super::log_event;
use crate::cli::MergeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventAction};
use crate::ffmpeg::FfmpegBinary;
use crate::merge::{self, MergeRequest};
use serde_json::json;

pub fn cmd_merge(args: MergeArgs) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(timeout) = args.timeout {
        config.timeout_seconds = timeout;
    }
    config.validate()?;

    let explicit = args.ffmpeg.as_deref().or(config.ffmpeg_path.as_deref());
    let lib_dir = args.lib_dir.as_deref().or(config.lib_dir.as_deref());
    let ffmpeg = FfmpegBinary::resolve(explicit, lib_dir)?;

    let request = MergeRequest::new(args.video, args.audio, args.output);

    log_event(
        &config,
        Event::new(EventAction::MergeStart).with_details(json!({
            "video": request.video.display().to_string(),
            "audio": request.audio.display().to_string(),
            "output": request.output.display().to_string(),
            "ffmpeg": ffmpeg.path().display().to_string(),
            "timeout_seconds": config.timeout_seconds,
        })),
    );

    let verbose = args.verbose;
    let observer = move |line: &str| {
        if verbose {
            eprintln!("ffmpeg: {}", line);
        }
    };

    match merge::merge(&ffmpeg, &request, &config, observer) {
        Ok(report) => {
            log_event(
                &config,
                Event::new(EventAction::MergeComplete).with_details(json!({
                    "output": request.output.display().to_string(),
                    "duration_ms": report.duration.as_millis() as u64,
                    "lines_captured": report.lines_captured,
                })),
            );
            println!(
                "Merged '{}' + '{}' -> '{}' in {:.1}s",
                request.video.display(),
                request.audio.display(),
                request.output.display(),
                report.duration.as_secs_f64()
            );
            Ok(())
        }
        Err(err) => {
            log_event(
                &config,
                Event::new(EventAction::MergeFailed).with_details(json!({
                    "output": request.output.display().to_string(),
                    "error": err.to_string(),
                })),
            );
            Err(err)
        }
    }
}
