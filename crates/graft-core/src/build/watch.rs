//! Watch mode: long-running build processes whose output is re-installed on
//! every completed rebuild.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::fs::copy_into;

/// One library to watch.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub name: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    pub cwd: PathBuf,
    pub success_marker: String,
    pub output: PathBuf,
    pub install_locations: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Completed rebuilds seen per library.
    pub rebuilds: BTreeMap<String, usize>,
}

/// Start each target in turn, waiting for its first success marker before
/// starting the next, then run until every process has exited.
pub fn run_watch(targets: Vec<WatchTarget>) -> anyhow::Result<WatchReport> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
    runtime.block_on(watch_all(targets))
}

async fn watch_all(targets: Vec<WatchTarget>) -> anyhow::Result<WatchReport> {
    let mut handles = Vec::with_capacity(targets.len());
    for target in targets {
        let name = target.name.clone();
        let (ready_tx, ready_rx) = oneshot::channel();
        handles.push(tokio::spawn(watch_one(target, ready_tx)));

        tracing::info!(library = %name, "waiting for initial build");
        if ready_rx.await.is_err() {
            tracing::warn!(library = %name, "watch process ended before its first build");
        }
    }

    let mut report = WatchReport::default();
    for handle in handles {
        let (name, rebuilds) = handle.await.context("Watch task panicked")??;
        report.rebuilds.insert(name, rebuilds);
    }
    Ok(report)
}

async fn watch_one(
    target: WatchTarget,
    ready: oneshot::Sender<()>,
) -> anyhow::Result<(String, usize)> {
    let (program, args) = target
        .command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Empty watch command for {}", target.name))?;

    let mut child = Command::new(program)
        .args(args)
        .current_dir(&target.cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start watch for {}: {:?}", target.name, target.command))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("Watch process for {} has no stdout", target.name))?;
    let mut lines = BufReader::new(stdout).lines();
    let mut ready = Some(ready);
    let mut rebuilds = 0;

    while let Some(line) = lines.next_line().await? {
        tracing::debug!(library = %target.name, "{}", line);
        if !line.contains(&target.success_marker) {
            continue;
        }

        rebuilds += 1;
        for install in &target.install_locations {
            if let Err(err) = copy_into(&target.output, install) {
                tracing::warn!(library = %target.name, "install after rebuild failed: {:#}", err);
            }
        }
        tracing::info!(library = %target.name, rebuilds, "rebuilt and installed");

        if let Some(tx) = ready.take() {
            let _ = tx.send(());
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for watch of {}", target.name))?;
    if !status.success() {
        tracing::warn!(library = %target.name, %status, "watch process exited with failure");
    }
    Ok((target.name, rebuilds))
}
