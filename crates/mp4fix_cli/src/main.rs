//! mp4fix - remux MP4 files in a directory tree with ffmpeg.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mp4fix_core::config::{ConfigManager, Settings};
use mp4fix_core::logging::{init_tracing, RunLoggerBuilder};
use mp4fix_core::remux::Ffmpeg;
use mp4fix_core::runner::{write_report, RunOptions, Runner};

use cli::{Cli, Exit};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    exit_status(run(cli).await).into()
}

/// Map the outcome of `run` to the process exit status.
fn exit_status(result: Result<Exit>) -> Exit {
    match result {
        Ok(exit) => exit,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            Exit::Fatal
        }
    }
}

async fn run(cli: Cli) -> Result<Exit> {
    let config_path = config_path(&cli)?;
    let mut manager = ConfigManager::new(&config_path);

    if cli.write_default_config {
        if config_path.exists() && !cli.force {
            bail!(
                "{} already exists; pass --force to replace it",
                config_path.display()
            );
        }
        manager
            .save()
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(Exit::Success);
    }

    // An explicit config must exist; the default one is optional.
    let loaded = if cli.config.is_some() {
        manager.load()
    } else {
        manager.load_or_default().map(|_| ())
    };
    loaded.with_context(|| format!("loading config {}", config_path.display()))?;

    let unknown = manager.unknown_sections().to_vec();
    let mut settings: Settings = manager.into_settings();
    cli.apply(&mut settings);

    let level = settings.logging.level.more_verbose(cli.verbose);
    init_tracing(level);
    for key in &unknown {
        tracing::warn!(
            "Ignoring unknown section '{}' in {}",
            key,
            config_path.display()
        );
    }

    let root = match &cli.target {
        Some(target) => target.clone(),
        None => std::env::current_dir().context("resolving current directory")?,
    };
    tracing::debug!("Target directory: {}", root.display());

    let options = RunOptions::from_settings(&root, &settings)
        .with_output_root(cli.output_dir.clone())
        .with_dry_run(cli.dry_run);

    let run_name = format!("mp4fix_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let logger = RunLoggerBuilder::new(run_name)
        .log_dir(settings.logging.log_dir.as_ref())
        .config(settings.logging.to_log_config())
        .level(level)
        .build()
        .context("creating run log")?;
    if let Some(path) = logger.log_path() {
        tracing::info!("Logging to {}", path.display());
    }

    let tool = Ffmpeg::from_settings(&settings.tools, &settings.remux);
    let runner = Runner::new(tool, Arc::new(logger));
    let cancel = runner.cancel_handle();

    let mut task = tokio::task::spawn_blocking(move || runner.run(&options));
    let joined = tokio::select! {
        joined = &mut task => joined,
        Ok(()) = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; stopping after the current file");
            cancel.cancel();
            task.await
        }
    };
    let summary = joined
        .context("run task panicked")?
        .with_context(|| format!("processing {}", root.display()))?;

    if let Some(report) = &cli.report {
        write_report(&summary, report)?;
    }

    Ok(Exit::for_summary(&summary, cli.strict))
}

/// Config file to use: `--config`, or `config.toml` in the user config dir.
fn config_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.config {
        return Ok(path.clone());
    }
    let dirs = directories::ProjectDirs::from("", "", "mp4fix")
        .context("could not determine the user config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mp4fix").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn missing_target_exits_fatal() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "").unwrap();
        let missing = dir.path().join("missing");

        let exit = exit_status(
            run(cli(&[
                missing.to_str().unwrap(),
                "--config",
                config.to_str().unwrap(),
            ]))
            .await,
        );

        assert_eq!(exit, Exit::Fatal);
        assert_eq!(exit.code(), 1);
    }

    #[tokio::test]
    async fn empty_target_exits_success() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "").unwrap();
        let media = dir.path().join("media");
        fs::create_dir(&media).unwrap();

        let exit = exit_status(
            run(cli(&[
                media.to_str().unwrap(),
                "--config",
                config.to_str().unwrap(),
            ]))
            .await,
        );

        assert_eq!(exit, Exit::Success);
    }

    #[tokio::test]
    async fn default_config_is_not_overwritten_without_force() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "[scan]\nextensions = [\"m4v\"]\n").unwrap();
        let path = config.to_str().unwrap();

        let exit = exit_status(run(cli(&["--config", path, "--write-default-config"])).await);
        assert_eq!(exit, Exit::Fatal);
        assert!(fs::read_to_string(&config).unwrap().contains("m4v"));

        let exit = exit_status(
            run(cli(&["--config", path, "--write-default-config", "--force"])).await,
        );
        assert_eq!(exit, Exit::Success);
        let content = fs::read_to_string(&config).unwrap();
        assert!(content.contains("# mp4fix configuration"));
        assert!(!content.contains("m4v"));
    }

    #[tokio::test]
    async fn default_config_is_written_when_absent() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("nested").join("config.toml");

        let exit = exit_status(
            run(cli(&[
                "--config",
                config.to_str().unwrap(),
                "--write-default-config",
            ]))
            .await,
        );

        assert_eq!(exit, Exit::Success);
        assert!(config.exists());
    }
}
