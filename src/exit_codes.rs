//! Exit code constants for the avmux CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Precondition failure (missing inputs, failed binary probe)
//! - 3: Launch failure (FFmpeg could not be started)
//! - 4: Merge failure (FFmpeg reported nonzero exit or produced no output file)
//! - 5: Timeout (FFmpeg was killed after exceeding its time limit)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Precondition failure: missing input files or failed FFmpeg sanity probe.
pub const PRECONDITION_FAILURE: i32 = 2;

/// Launch failure: the FFmpeg binary is missing or not runnable.
pub const LAUNCH_FAILURE: i32 = 3;

/// Merge failure: FFmpeg exited nonzero or the output file was not created.
pub const MERGE_FAILURE: i32 = 4;

/// Timeout: FFmpeg exceeded the allotted duration and was killed.
pub const TIMEOUT: i32 = 5;
