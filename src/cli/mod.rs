//! CLI argument parsing for avmux.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Avmux: merge a video stream and an audio stream into one file with an
/// external FFmpeg binary.
///
/// FFmpeg does the media work; avmux resolves the binary, checks it runs on
/// this machine, validates the inputs, and supervises the run with a
/// wall-clock timeout.
#[derive(Parser, Debug)]
#[command(name = "avmux")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for avmux.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge a video stream and an audio stream into one output file.
    ///
    /// Runs `ffmpeg -i <video> -i <audio> -c copy -y <output>` under a
    /// timeout and reports a typed success or failure.
    Merge(MergeArgs),

    /// Check that the FFmpeg binary can be found and runs on this machine.
    ///
    /// Resolves the binary the same way `merge` does, runs `-version`,
    /// and prints the detected version banner.
    Probe(ProbeArgs),
}

/// Arguments for the merge command.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Path to the video input.
    #[arg(long)]
    pub video: PathBuf,

    /// Path to the audio input.
    #[arg(long)]
    pub audio: PathBuf,

    /// Path of the merged output file (overwritten if it exists).
    #[arg(long)]
    pub output: PathBuf,

    /// Path to the FFmpeg binary (overrides config and environment).
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Directory with FFmpeg's shared libraries (exported as
    /// LD_LIBRARY_PATH to the child process).
    #[arg(long)]
    pub lib_dir: Option<PathBuf>,

    /// Wall-clock timeout in seconds for the FFmpeg run.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to a YAML config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Forward each FFmpeg output line to stderr as it arrives.
    #[arg(long, short)]
    pub verbose: bool,
}

/// Arguments for the probe command.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Path to the FFmpeg binary (overrides config and environment).
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Directory with FFmpeg's shared libraries.
    #[arg(long)]
    pub lib_dir: Option<PathBuf>,

    /// Path to a YAML config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn merge_requires_all_three_paths() {
        let result = Cli::try_parse_from(["avmux", "merge", "--video", "v.mp4"]);
        assert!(result.is_err());
    }

    #[test]
    fn merge_parses_paths_and_flags() {
        let cli = Cli::try_parse_from([
            "avmux", "merge", "--video", "v.mp4", "--audio", "a.m4a", "--output", "out.mp4",
            "--timeout", "15", "--verbose",
        ])
        .unwrap();

        match cli.command {
            Command::Merge(args) => {
                assert_eq!(args.video, PathBuf::from("v.mp4"));
                assert_eq!(args.audio, PathBuf::from("a.m4a"));
                assert_eq!(args.output, PathBuf::from("out.mp4"));
                assert_eq!(args.timeout, Some(15));
                assert!(args.verbose);
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }
}
