//! Stream probing using ffprobe.
//!
//! Closed caption tracks (`eia_608`) are not really supported inside MP4
//! and are what trips up playback, so they are located here and left out
//! of the remuxed file.

use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;

use super::errors::InvocationError;

/// A stream as reported by `ffprobe -show_streams`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Input stream index.
    pub index: usize,
    /// Codec name (e.g. "h264", "aac", "eia_608").
    pub codec_name: String,
    /// Codec type (video, audio, subtitle, data).
    pub codec_type: String,
}

/// List the streams of `path`.
pub fn probe_streams(ffprobe: &str, path: &Path) -> Result<Vec<StreamInfo>, InvocationError> {
    tracing::debug!("Probing streams: {}", path.display());

    let output = Command::new(ffprobe)
        .args(["-v", "error", "-show_streams", "-of", "json"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| InvocationError::from_spawn(ffprobe, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return match output.status.code() {
            Some(exit_code) => Err(InvocationError::NonZeroExit {
                tool: ffprobe.to_string(),
                exit_code,
                stderr_tail: stderr.lines().map(str::to_string).collect(),
            }),
            None => Err(InvocationError::Terminated {
                tool: ffprobe.to_string(),
            }),
        };
    }

    let json: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| InvocationError::probe_failed(format!("invalid ffprobe JSON: {}", e)))?;

    Ok(parse_streams(&json))
}

/// Parse the `streams` array of ffprobe JSON output.
fn parse_streams(json: &Value) -> Vec<StreamInfo> {
    let Some(streams) = json.get("streams").and_then(|s| s.as_array()) else {
        return Vec::new();
    };

    streams
        .iter()
        .filter_map(|stream| {
            let index = stream.get("index")?.as_u64()? as usize;
            Some(StreamInfo {
                index,
                codec_name: stream
                    .get("codec_name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                codec_type: stream
                    .get("codec_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            })
        })
        .collect()
}

/// Indices of streams whose codec is in `blocked`.
pub fn blocked_stream_indices(streams: &[StreamInfo], blocked: &[String]) -> Vec<usize> {
    streams
        .iter()
        .filter(|s| blocked.iter().any(|b| b.eq_ignore_ascii_case(&s.codec_name)))
        .map(|s| s.index)
        .collect()
}
