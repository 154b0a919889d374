//! Remuxing through external tools.
//!
//! - **Command**: the ffmpeg argument list for a stream-copy remux
//! - **Probe**: ffprobe stream listing, used to drop blocked codecs
//! - **Tool**: the `RemuxTool` trait and the `Ffmpeg` implementation
//!
//! Failures are reported as `InvocationError`, which keeps "tool not
//! found", "could not start", "exited non-zero" and "produced nothing"
//! apart.

mod command;
mod errors;
mod probe;
mod tool;

pub use command::{RemuxCommand, OUTPUT_FORMAT};
pub use errors::{FailureKind, InvocationError};
pub use probe::{blocked_stream_indices, probe_streams, StreamInfo};
pub use tool::{Ffmpeg, RemuxTool};
