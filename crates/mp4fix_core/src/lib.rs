//! mp4fix core - remux MP4 files in a directory tree without re-encoding.
//!
//! This crate holds everything except argument parsing, so it can be
//! driven by the `mp4fix` binary or embedded elsewhere.
//!
//! - `discovery`: find candidate files under a root
//! - `remux`: ffmpeg/ffprobe invocation
//! - `runner`: the dispatch loop, progress and run summary
//! - `config` and `logging`: settings file and log output

pub mod checksum;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod remux;
pub mod runner;
