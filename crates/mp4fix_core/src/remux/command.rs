//! ffmpeg argument builder for stream-copy remuxing.

use std::ffi::OsString;
use std::path::PathBuf;

/// Container format forced on the output, since the temp file name has
/// no usable extension.
pub const OUTPUT_FORMAT: &str = "mp4";

/// Arguments for one ffmpeg remux invocation.
///
/// Produces:
/// `-hide_banner -nostdin -v <level> -n -i <input> -map 0 [-map -0:<i>]... -c copy -f mp4 <output>`
#[derive(Debug, Clone)]
pub struct RemuxCommand {
    input: PathBuf,
    output: PathBuf,
    loglevel: String,
    excluded_streams: Vec<usize>,
}

impl RemuxCommand {
    /// Remux `input` into `output`, copying all streams.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            loglevel: "warning".to_string(),
            excluded_streams: Vec::new(),
        }
    }

    /// Set ffmpeg's `-v` level.
    pub fn loglevel(mut self, level: impl Into<String>) -> Self {
        self.loglevel = level.into();
        self
    }

    /// Exclude these input stream indices from the output.
    pub fn exclude_streams(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.excluded_streams.extend(indices);
        self
    }

    /// Build the argument list.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-v".into(),
            self.loglevel.clone().into(),
            // never overwrite, the caller picks a fresh path
            "-n".into(),
            "-i".into(),
            self.input.clone().into_os_string(),
            "-map".into(),
            "0".into(),
        ];

        for index in &self.excluded_streams {
            args.push("-map".into());
            args.push(format!("-0:{}", index).into());
        }

        args.push("-c".into());
        args.push("copy".into());
        args.push("-f".into());
        args.push(OUTPUT_FORMAT.into());
        args.push(self.output.clone().into_os_string());
        args
    }

    /// Render for logging, e.g. `ffmpeg -hide_banner ... out`.
    pub fn display(&self, program: &str) -> String {
        let mut parts = vec![program.to_string()];
        parts.extend(self.args().iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cmd: &RemuxCommand) -> Vec<String> {
        cmd.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn stream_copies_all_streams() {
        let cmd = RemuxCommand::new("/in/video.mp4", "/in/.video.tmp");
        assert_eq!(
            strings(&cmd),
            vec![
                "-hide_banner",
                "-nostdin",
                "-v",
                "warning",
                "-n",
                "-i",
                "/in/video.mp4",
                "-map",
                "0",
                "-c",
                "copy",
                "-f",
                "mp4",
                "/in/.video.tmp",
            ]
        );
    }

    #[test]
    fn excluded_streams_are_negative_maps() {
        let cmd = RemuxCommand::new("a.mp4", "b.tmp")
            .loglevel("error")
            .exclude_streams([2, 4]);
        let args = strings(&cmd);

        let joined = args.join(" ");
        assert!(joined.contains("-v error"));
        assert!(joined.contains("-map 0 -map -0:2 -map -0:4 -c copy"));
        assert_eq!(args.last().unwrap(), "b.tmp");
    }

    #[test]
    fn display_prefixes_program() {
        let cmd = RemuxCommand::new("a.mp4", "b.tmp");
        assert!(cmd.display("/usr/bin/ffmpeg").starts_with("/usr/bin/ffmpeg -hide_banner"));
    }
}
