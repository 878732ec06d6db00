//! `hearth watch`: Keep a live store in sync with the document.

use hearth_config::{LayerStore, WatchConfig};
use hearth_watch::{ConfigWatcher, ReloadEvent, SharedStore};
use std::path::Path;
use tracing::info;

pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = LayerStore::load(path)?;
    let summary = store.summary();
    let shared = SharedStore::new(store);
    let config = WatchConfig::from_env();

    println!("👀 Watching {}", path.display());
    println!(
        "   Poll every {} ms, debounce {} ms",
        config.poll_interval_ms, config.debounce_ms
    );
    println!(
        "   {} time periods, {} rooms, {} groups, {} members",
        summary.time_periods, summary.rooms, summary.family_groups, summary.family_members
    );

    let watcher = ConfigWatcher::new(path, shared, config);
    let (mut events, handle) = watcher.start();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ReloadEvent::Applied { hash, summary }) => {
                    println!(
                        "   ✅ Reloaded ({}): {} time periods, {} rooms, {} groups, {} members",
                        &hash[..12.min(hash.len())],
                        summary.time_periods,
                        summary.rooms,
                        summary.family_groups,
                        summary.family_members
                    );
                }
                Some(ReloadEvent::Rejected { error, .. }) => {
                    println!("   ❌ Reload rejected, keeping previous config: {error}");
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping watcher");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}
