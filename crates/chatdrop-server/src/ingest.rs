use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chatdrop_api::AppState;
use chatdrop_store::Store;
use chatdrop_store::import::read_definition;
use chatdrop_store::layout::{PROCESSED_DIR, REJECTED_DIR};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What happened to one inbox file.
#[derive(Debug)]
pub enum Outcome {
    Imported { conversation_id: u64, moved_to: PathBuf },
    Rejected { reason: String, moved_to: PathBuf },
    /// The file could not be moved out of the inbox, so nothing was imported
    /// and it stays where it is.
    Skipped { reason: String },
}

/// Inbox files worth importing: visible `.json` files that are not templates.
pub fn is_eligible(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.starts_with('.') && name.ends_with(".json") && !name.contains("template")
}

/// Import one definition file and move it out of the inbox.
///
/// The file is moved into `processed/` before the conversation is created,
/// so a file that cannot be moved is never imported, and a file that was
/// imported is never seen again.
pub async fn ingest_file(store: &Store, path: &Path) -> Outcome {
    let inbox = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let definition = match read_definition(path).await {
        Ok(definition) => definition,
        Err(e) => return reject(inbox, path, &name, e.to_string()).await,
    };

    let claimed = match archive(path, &name, &inbox.join(PROCESSED_DIR), "processed").await {
        Ok(claimed) => claimed,
        Err(e) => {
            error!("Leaving {} in the inbox, cannot archive it: {}", path.display(), e);
            return Outcome::Skipped {
                reason: e.to_string(),
            };
        }
    };

    match store.import_definition(definition).await {
        Ok(record) => {
            info!(
                "Imported {} as conversation {} ({} messages)",
                name,
                record.id,
                record.messages.len()
            );
            Outcome::Imported {
                conversation_id: record.id,
                moved_to: claimed,
            }
        }
        Err(e) => reject(inbox, &claimed, &name, e.to_string()).await,
    }
}

async fn reject(inbox: &Path, current: &Path, name: &str, reason: String) -> Outcome {
    match archive(current, name, &inbox.join(REJECTED_DIR), "rejected").await {
        Ok(moved_to) => {
            warn!("Rejected {}: {} (moved to {})", name, reason, moved_to.display());
            Outcome::Rejected { reason, moved_to }
        }
        Err(e) if current.parent() == Some(inbox) => {
            error!("Rejected {}: {}, and cannot archive it: {}", name, reason, e);
            Outcome::Skipped { reason }
        }
        Err(e) => {
            error!("Rejected {}: {}, left at {}: {}", name, reason, current.display(), e);
            Outcome::Rejected {
                reason,
                moved_to: current.to_path_buf(),
            }
        }
    }
}

/// Import everything already sitting in the inbox, oldest name first. A
/// failure on one file does not stop the others.
pub async fn sweep(store: &Store, dir: &Path) -> Result<Vec<Outcome>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match entry.file_type().await {
            Ok(kind) if kind.is_file() && is_eligible(&path) => paths.push(path),
            Ok(_) => {}
            Err(e) => warn!("Cannot stat {}: {}", path.display(), e),
        }
    }
    paths.sort();

    info!("Found {} pending file(s) in {}", paths.len(), dir.display());
    let mut outcomes = Vec::with_capacity(paths.len());
    for path in paths {
        outcomes.push(ingest_file(store, &path).await);
    }
    Ok(outcomes)
}

/// Watch the inbox, then sweep what is already there. A file is imported
/// once it has seen no events for `settle`, so half-written files are left
/// alone.
pub async fn run(state: AppState, settle: Duration) -> Result<()> {
    let dir = state.store.inbox_dir();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => error!("Inbox watch error: {:?}", e),
        },
        Config::default(),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!("Watching {} for new conversation files", dir.display());

    // Files swept here may also show up as events; they are gone by the time
    // those settle.
    if let Err(e) = sweep(&state.store, &dir).await {
        error!("Initial inbox sweep failed: {}", e);
    }

    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
    let poll = settle.clamp(Duration::from_millis(10), Duration::from_millis(250));
    let mut tick = tokio::time::interval(poll);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    continue;
                }
                for path in event.paths {
                    if is_eligible(&path) {
                        debug!("Inbox activity on {}", path.display());
                        pending.insert(path, Instant::now());
                    }
                }
            }
            _ = tick.tick() => {
                let ready: Vec<PathBuf> = pending
                    .iter()
                    .filter(|(_, seen)| seen.elapsed() >= settle)
                    .map(|(path, _)| path.clone())
                    .collect();

                for path in ready {
                    pending.remove(&path);
                    // Renames out of the inbox also raise events.
                    if !fs::try_exists(&path).await.unwrap_or(false) {
                        continue;
                    }
                    ingest_file(&state.store, &path).await;
                }
            }
        }
    }
}

async fn archive(
    from: &Path,
    name: &str,
    target_dir: &Path,
    suffix: &str,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(target_dir).await?;
    let target = target_dir.join(format!(
        "{}.{}-{}",
        name,
        suffix,
        chrono::Utc::now().timestamp_millis()
    ));
    fs::rename(from, &target).await?;
    Ok(target)
}
