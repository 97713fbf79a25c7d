// src/lib.rs

pub mod bus;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::bus::{ChangeMessage, LocalBus, FILE_CHANGED_TOPIC};
use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile, ProjectSpec};
use crate::discovery::PatternDiscovery;
use crate::errors::WatchError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::parse_duration;
use crate::watch::{watch_key, FileHashSnapshot, Supervisor};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - discovery collaborator and local event bus
/// - the supervisor and one watcher per project
/// - printing change events to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let targets = watch_targets(&cfg, &args)?;

    if targets.is_empty() {
        bail!("nothing to watch: pass a PATH or add [[project]] entries to the config");
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let discovery = Arc::new(PatternDiscovery::new(cfg.patterns.clone()));

    if args.dry_run {
        print_dry_run(&cfg, &targets, fs, discovery).await?;
        return Ok(());
    }

    let bus = Arc::new(LocalBus::new());
    let mut events = bus.subscribe(FILE_CHANGED_TOPIC);

    let supervisor =
        Supervisor::new(fs, discovery, bus.clone()).with_restart_policy(cfg.restart_policy);

    for target in &targets {
        match supervisor.start_watching(&target.path, target.options.clone()) {
            Ok(_) => {}
            Err(WatchError::AlreadyWatching(path)) => {
                warn!(path = %path.display(), "path listed twice; watching it once");
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(watched = ?supervisor.list_watched(), "pollwatch running");

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("failed to listen for Ctrl+C: {e}");
                }
                break;
            }
            msg = events.recv() => match msg {
                Ok(msg) => print_event(&msg, args.json)?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event output fell behind; some changes were not printed");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    supervisor.shutdown().await;
    info!("pollwatch exiting");
    Ok(())
}

/// Projects from the config plus paths from the command line.
///
/// `--interval` applies to command-line paths only; config projects keep
/// their own settings.
fn watch_targets(cfg: &ConfigFile, args: &CliArgs) -> Result<Vec<ProjectSpec>> {
    let interval_override = args
        .interval
        .as_deref()
        .map(|s| parse_duration(s).map_err(|e| anyhow!("--interval: {e}")))
        .transpose()?;

    if interval_override.is_some_and(|d| d.is_zero()) {
        bail!("--interval must be greater than zero");
    }

    let mut targets = cfg.projects.clone();

    for path in &args.paths {
        if targets.iter().any(|t| &t.path == path) {
            continue;
        }
        let mut options = cfg.options_for(path);
        if let Some(interval) = interval_override {
            options.interval = interval;
        }
        targets.push(ProjectSpec {
            path: path.clone(),
            options,
        });
    }

    Ok(targets)
}

fn print_event(msg: &ChangeMessage, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(msg)?);
    } else {
        println!("{}", msg.path().display());
    }
    Ok(())
}

/// Print the resolved configuration and a baseline count per project.
async fn print_dry_run(
    cfg: &ConfigFile,
    targets: &[ProjectSpec],
    fs: Arc<dyn FileSystem>,
    discovery: Arc<PatternDiscovery>,
) -> Result<()> {
    println!("pollwatch dry-run");
    println!("  patterns = {:?}", cfg.patterns);
    println!(
        "  restart policy = {} restarts per {:?}",
        cfg.restart_policy.max_restarts, cfg.restart_policy.window
    );
    println!();

    println!("projects ({}):", targets.len());
    for target in targets {
        let root = watch_key(&target.path);
        let snapshot = FileHashSnapshot::spawn_scan(
            Arc::clone(&fs),
            discovery.clone(),
            root.clone(),
            target.options.exclude.clone(),
        )
        .await?;

        println!("  - {}", root.display());
        println!("      interval: {:?}", target.options.interval);
        if !target.options.exclude.is_empty() {
            println!("      exclude: {:?}", target.options.exclude);
        }
        println!("      tracked files: {}", snapshot.len());
    }

    debug!("dry-run complete (no watchers started)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn cli_paths_get_interval_override_and_are_deduplicated() {
        let cfg = ConfigFile {
            projects: vec![ProjectSpec {
                path: PathBuf::from("/docs"),
                options: Default::default(),
            }],
            ..Default::default()
        };
        let args = CliArgs::parse_from(["pollwatch", "/docs", "/notes", "--interval", "10ms"]);

        let targets = watch_targets(&cfg, &args).unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].path, PathBuf::from("/docs"));
        assert_eq!(targets[0].options.interval, Duration::from_secs(30));
        assert_eq!(targets[1].path, PathBuf::from("/notes"));
        assert_eq!(targets[1].options.interval, Duration::from_millis(10));
    }

    #[test]
    fn zero_interval_flag_is_rejected() {
        let args = CliArgs::parse_from(["pollwatch", "/notes", "--interval", "0ms"]);
        assert!(watch_targets(&ConfigFile::default(), &args).is_err());
    }
}
