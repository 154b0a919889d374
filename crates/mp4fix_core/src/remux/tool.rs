//! The remux tool seam and its ffmpeg implementation.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::{RemuxSettings, ToolSettings};
use crate::logging::RunLogger;

use super::command::RemuxCommand;
use super::errors::InvocationError;
use super::probe::{blocked_stream_indices, probe_streams};

/// Number of stderr lines carried in a `NonZeroExit` error.
const STDERR_TAIL_LINES: usize = 10;

/// Something that can remux one file into another without re-encoding.
///
/// `remux` must only ever create `output`; it never touches `input`.
pub trait RemuxTool: Send + Sync {
    /// Tool name for logging.
    fn name(&self) -> &str;

    /// Version string of the underlying tool.
    fn version(&self) -> Result<String, InvocationError>;

    /// Remux `input` into the (not yet existing) `output`.
    fn remux(&self, input: &Path, output: &Path, logger: &RunLogger)
        -> Result<(), InvocationError>;
}

/// ffmpeg stream-copy remuxer.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: String,
    ffprobe: String,
    loglevel: String,
    probe_streams: bool,
    blocked_codecs: Vec<String>,
}

impl Ffmpeg {
    /// ffmpeg/ffprobe from PATH with default remux settings.
    pub fn new() -> Self {
        Self::from_settings(&ToolSettings::default(), &RemuxSettings::default())
    }

    /// Build from config sections.
    pub fn from_settings(tools: &ToolSettings, remux: &RemuxSettings) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
            loglevel: remux.ffmpeg_loglevel.clone(),
            probe_streams: remux.probe_streams,
            blocked_codecs: remux.blocked_codecs.clone(),
        }
    }

    /// Streams of `input` that should be left out.
    fn excluded_streams(
        &self,
        input: &Path,
        logger: &RunLogger,
    ) -> Result<Vec<usize>, InvocationError> {
        if !self.probe_streams || self.blocked_codecs.is_empty() {
            return Ok(Vec::new());
        }

        logger.command(&format!(
            "{} -v error -show_streams -of json {}",
            self.ffprobe,
            input.display()
        ));
        let streams = probe_streams(&self.ffprobe, input)?;
        let excluded = blocked_stream_indices(&streams, &self.blocked_codecs);
        for stream in streams.iter().filter(|s| excluded.contains(&s.index)) {
            logger.info(&format!(
                "Dropping stream {} ({} {})",
                stream.index, stream.codec_type, stream.codec_name
            ));
        }
        Ok(excluded)
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new()
    }
}

impl RemuxTool for Ffmpeg {
    fn name(&self) -> &str {
        &self.ffmpeg
    }

    fn version(&self) -> Result<String, InvocationError> {
        let output = Command::new(&self.ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| InvocationError::from_spawn(&self.ffmpeg, e))?;

        if !output.status.success() {
            return Err(InvocationError::NonZeroExit {
                tool: self.ffmpeg.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr_tail: Vec::new(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string())
    }

    fn remux(
        &self,
        input: &Path,
        output: &Path,
        logger: &RunLogger,
    ) -> Result<(), InvocationError> {
        let excluded = self.excluded_streams(input, logger)?;

        let cmd = RemuxCommand::new(input, output)
            .loglevel(&self.loglevel)
            .exclude_streams(excluded);
        logger.command(&cmd.display(&self.ffmpeg));

        let result = Command::new(&self.ffmpeg)
            .args(cmd.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| InvocationError::from_spawn(&self.ffmpeg, e))?;

        logger.clear_tail();
        let stdout = String::from_utf8_lossy(&result.stdout);
        for line in stdout.lines() {
            logger.output_line(line, false);
        }
        let stderr = String::from_utf8_lossy(&result.stderr);
        for line in stderr.lines() {
            logger.output_line(line, true);
        }

        match result.status.code() {
            Some(0) => Ok(()),
            Some(exit_code) => {
                logger.show_tail("ffmpeg output");
                let lines: Vec<&str> = stderr.lines().collect();
                let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
                Err(InvocationError::NonZeroExit {
                    tool: self.ffmpeg.clone(),
                    exit_code,
                    stderr_tail: lines[start..].iter().map(|l| l.to_string()).collect(),
                })
            }
            None => Err(InvocationError::Terminated {
                tool: self.ffmpeg.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;

    #[test]
    fn missing_ffmpeg_is_tool_not_found() {
        let tools = ToolSettings {
            ffmpeg: "/nonexistent/mp4fix-test/ffmpeg".into(),
            ffprobe: "/nonexistent/mp4fix-test/ffprobe".into(),
        };
        let remux = RemuxSettings {
            probe_streams: false,
            ..Default::default()
        };
        let tool = Ffmpeg::from_settings(&tools, &remux);
        let logger = RunLogger::tracing_only(LogConfig::default());

        let err = tool
            .remux(Path::new("in.mp4"), Path::new("out.tmp"), &logger)
            .unwrap_err();
        assert!(matches!(err, InvocationError::ToolNotFound { .. }));
        assert!(matches!(
            tool.version().unwrap_err(),
            InvocationError::ToolNotFound { .. }
        ));
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;
        use tempfile::{tempdir, TempDir};

        fn script(dir: &TempDir, name: &str, body: &str) -> String {
            let path: PathBuf = dir.path().join(name);
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn tool(ffmpeg: String, ffprobe: String) -> Ffmpeg {
            Ffmpeg::from_settings(&ToolSettings { ffmpeg, ffprobe }, &RemuxSettings::default())
        }

        #[test]
        fn passes_blocked_streams_and_output() {
            let dir = tempdir().unwrap();
            let args_log = dir.path().join("args.txt");
            let ffprobe = script(
                &dir,
                "ffprobe",
                r#"echo '{"streams":[{"index":0,"codec_name":"h264"},{"index":1,"codec_name":"eia_608"}]}'"#,
            );
            let ffmpeg = script(
                &dir,
                "ffmpeg",
                &format!(
                    "echo \"$@\" > '{}'\nfor a in \"$@\"; do out=\"$a\"; done\necho remuxed > \"$out\"",
                    args_log.display()
                ),
            );

            let input = dir.path().join("video.mp4");
            let output = dir.path().join("out.tmp");
            fs::write(&input, b"original").unwrap();

            let logger = RunLogger::tracing_only(LogConfig::default());
            tool(ffmpeg, ffprobe).remux(&input, &output, &logger).unwrap();

            let args = fs::read_to_string(&args_log).unwrap();
            assert!(args.contains("-map 0 -map -0:1 -c copy"));
            assert_eq!(fs::read_to_string(&output).unwrap().trim(), "remuxed");
            assert_eq!(fs::read(&input).unwrap(), b"original");
        }

        #[test]
        fn non_zero_exit_carries_stderr() {
            let dir = tempdir().unwrap();
            let ffprobe = script(&dir, "ffprobe", r#"echo '{"streams":[]}'"#);
            let ffmpeg = script(
                &dir,
                "ffmpeg",
                "echo 'moov atom not found' >&2\nexit 1",
            );

            let logger = RunLogger::tracing_only(LogConfig::default());
            let err = tool(ffmpeg, ffprobe)
                .remux(Path::new("video.mp4"), &dir.path().join("out.tmp"), &logger)
                .unwrap_err();

            match err {
                InvocationError::NonZeroExit {
                    exit_code,
                    stderr_tail,
                    ..
                } => {
                    assert_eq!(exit_code, 1);
                    assert_eq!(stderr_tail, vec!["moov atom not found".to_string()]);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(logger.get_tail(), vec!["moov atom not found".to_string()]);
        }

        #[test]
        fn probe_failure_stops_before_ffmpeg() {
            let dir = tempdir().unwrap();
            let marker = dir.path().join("ffmpeg-ran");
            let ffprobe = script(&dir, "ffprobe", "echo 'not json'");
            let ffmpeg = script(&dir, "ffmpeg", &format!("touch '{}'", marker.display()));

            let logger = RunLogger::tracing_only(LogConfig::default());
            let err = tool(ffmpeg, ffprobe)
                .remux(Path::new("video.mp4"), &dir.path().join("out.tmp"), &logger)
                .unwrap_err();

            assert!(matches!(err, InvocationError::ProbeFailed { .. }));
            assert!(!marker.exists());
        }

        #[test]
        fn version_is_first_line() {
            let dir = tempdir().unwrap();
            let ffmpeg = script(
                &dir,
                "ffmpeg",
                "echo 'ffmpeg version 6.1.1 Copyright (c) 2000-2023'\necho 'built with gcc'",
            );
            let version = tool(ffmpeg, "ffprobe".into()).version().unwrap();
            assert_eq!(version, "ffmpeg version 6.1.1 Copyright (c) 2000-2023");
        }
    }
}
