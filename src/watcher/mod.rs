//! Filesystem watcher driving incremental re-indexing (spec §5).

pub mod debouncer;

use crate::config::Settings;
use crate::discovery::to_repo_relative;
use crate::error::{IndexError, IndexResult};
use crate::indexing::IndexBuilder;
use crate::model::ProjectIndex;
use crate::persistence;
use crossbeam_channel::{select, unbounded, Receiver};
use debouncer::Debouncer;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::Duration;

/// Runs the watch loop until `shutdown` fires, persisting the index after
/// every coalesced batch of changes. Paths that fail to update (read error
/// mid-flight, parse failure) are re-queued for the next debounce window
/// rather than dropped.
pub fn watch(
    settings: &Settings,
    index: &mut ProjectIndex,
    builder: &IndexBuilder,
    now: impl Fn() -> String,
    shutdown: Receiver<()>,
) -> IndexResult<()> {
    let (tx, rx) = unbounded::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .map_err(|e| IndexError::General(format!("failed to start filesystem watcher: {e}")))?;

    watcher
        .watch(&settings.project_root, RecursiveMode::Recursive)
        .map_err(|e| IndexError::General(format!("failed to watch '{}': {e}", settings.project_root.display())))?;

    let mut debouncer = Debouncer::new(Duration::from_millis(settings.watcher.debounce_ms));
    let tick = crossbeam_channel::tick(Duration::from_millis(100));

    loop {
        select! {
            recv(shutdown) -> _ => {
                flush(&mut debouncer, settings, index, builder, &now)?;
                return Ok(());
            }
            recv(rx) -> event => {
                if let Ok(Ok(event)) = event {
                    handle_event(&event, settings, &mut debouncer);
                }
            }
            recv(tick) -> _ => {
                let ready = debouncer.take_ready();
                if !ready.is_empty() {
                    apply_batch(ready, settings, index, builder, &now)?;
                }
            }
        }
    }
}

fn handle_event(event: &Event, settings: &Settings, debouncer: &mut Debouncer) {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }

    for path in &event.paths {
        if to_repo_relative(&settings.project_root, path).is_some() {
            debouncer.record(path.clone());
        }
    }
}

fn flush(
    debouncer: &mut Debouncer,
    settings: &Settings,
    index: &mut ProjectIndex,
    builder: &IndexBuilder,
    now: &impl Fn() -> String,
) -> IndexResult<()> {
    if debouncer.has_pending() {
        let ready: Vec<PathBuf> = debouncer.take_ready();
        apply_batch(ready, settings, index, builder, now)?;
    }
    Ok(())
}

fn apply_batch(
    paths: Vec<PathBuf>,
    settings: &Settings,
    index: &mut ProjectIndex,
    builder: &IndexBuilder,
    now: &impl Fn() -> String,
) -> IndexResult<()> {
    let relative: Vec<String> = paths
        .iter()
        .filter_map(|p| to_repo_relative(&settings.project_root, p))
        .collect();
    if relative.is_empty() {
        return Ok(());
    }

    let timestamp = now();
    builder.update(index, &settings.project_root, &relative, &timestamp);
    persistence::save_index(&settings.index_path(), index)?;
    tracing::info!(count = relative.len(), "re-indexed changed files");
    Ok(())
}
