//! The probe command: resolve FFmpeg and run the `-version` sanity check.

use super::log_event;
use crate::cli::ProbeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventAction};
use crate::ffmpeg::FfmpegBinary;
use serde_json::json;

pub fn cmd_probe(args: ProbeArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let explicit = args.ffmpeg.as_deref().or(config.ffmpeg_path.as_deref());
    let lib_dir = args.lib_dir.as_deref().or(config.lib_dir.as_deref());
    let ffmpeg = FfmpegBinary::resolve(explicit, lib_dir)?;

    let banner = ffmpeg.verify()?;

    log_event(
        &config,
        Event::new(EventAction::Probe).with_details(json!({
            "ffmpeg": ffmpeg.path().display().to_string(),
            "banner": banner,
        })),
    );

    println!("binary:  {}", ffmpeg.path().display());
    println!("version: {}", banner);
    Ok(())
}
