//! Rebuild-on-change loop.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Events arriving within this window after the first one are folded into a single rebuild.
const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Watch `root` recursively and call `rebuild` after every burst of relevant changes.
///
/// Changes to `outputs` and to hidden entries under `root` are ignored, matching what input
/// expansion skips, so writing a bundle does not retrigger the loop. Rebuild
/// errors are logged and the loop keeps going; it only returns when the watcher shuts down.
pub fn watch<F>(root: &Path, outputs: &[PathBuf], mut rebuild: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let root = fs::canonicalize(root)
        .with_context(|| format!("failed to resolve watch root {}", root.display()))?;
    let outputs: Vec<PathBuf> = outputs
        .iter()
        .map(|path| fs::canonicalize(path).unwrap_or_else(|_| path.clone()))
        .collect();

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("failed to create file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;
    tracing::info!(root = %root.display(), "watching for changes");

    while let Ok(first) = rx.recv() {
        let mut relevant = is_relevant(&first, &root, &outputs);
        while let Ok(next) = rx.recv_timeout(QUIET_PERIOD) {
            relevant |= is_relevant(&next, &root, &outputs);
        }
        if !relevant {
            continue;
        }
        if let Err(err) = rebuild() {
            tracing::error!(error = %format!("{err:#}"), "rebuild failed");
        }
    }

    Ok(())
}

fn is_relevant(event: &notify::Result<Event>, root: &Path, outputs: &[PathBuf]) -> bool {
    let event = match event {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "watch error");
            return false;
        }
    };
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|path| !outputs.contains(path) && !is_hidden(path, root))
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|component| match component {
            Component::Normal(part) => part.to_string_lossy().starts_with('.'),
            _ => false,
        })
}
