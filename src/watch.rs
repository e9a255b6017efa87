use crossbeam_channel::{Receiver, Sender, select, unbounded};
use notify::{Event, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;

use crate::diagnostics::GenError;

/// Watch a device description and regenerate whenever it changes.
pub fn watch(config_path: &Path, out_dir: &Path, no_clear: bool) -> Result<(), GenError> {
    println!("Watching {} for changes...", config_path.display());

    // Initial generation
    run_once(config_path, out_dir);

    // Setup file watcher
    let (tx, rx) = unbounded();
    let mut watcher = create_watcher(tx)?;
    watcher
        .watch(config_path, RecursiveMode::NonRecursive)
        .map_err(|e| {
            GenError::io(format!(
                "failed to watch file {}: {e}",
                config_path.display()
            ))
        })?;

    // Event loop
    loop {
        // Wait for file change
        wait_for_change(&rx);

        // Debounce
        debounce_events(&rx);

        // Clear terminal
        if !no_clear {
            clearscreen::clear().ok();
        }

        println!("Config changed, regenerating...");
        run_once(config_path, out_dir);
    }
}

/// One generation pass; failures are reported but never stop the watch.
fn run_once(config_path: &Path, out_dir: &Path) {
    match crate::generate_file(config_path, out_dir, None) {
        Ok(summary) => {
            let path = summary.main_cpp.path.display();
            if summary.main_cpp.written {
                println!("  wrote {path}");
            } else {
                println!("  unchanged {path}");
            }
        }
        Err(e) => {
            eprintln!("Generation failed: {e}");
        }
    }
    print_separator();
}

/// Wait for the first file change event
fn wait_for_change(rx: &Receiver<Event>) {
    // Block until we get an event
    let _ = rx.recv();
}

/// Debounce events by waiting for a quiet period
fn debounce_events(rx: &Receiver<Event>) {
    loop {
        select! {
            recv(rx) -> _event => {
                // Got another event, keep waiting
            }
            default(Duration::from_millis(100)) => {
                // No events for 100ms, we're done
                break;
            }
        }
    }
}

/// Create a file watcher with the given sender
fn create_watcher(tx: Sender<Event>) -> Result<notify::RecommendedWatcher, GenError> {
    notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            // Only react to write events
            if matches!(event.kind, notify::EventKind::Modify(_) | notify::EventKind::Create(_)) {
                let _ = tx.send(event);
            }
        }
    })
    .map_err(|e| GenError::io(format!("failed to create file watcher: {e}")))
}

fn print_separator() {
    println!("\n{}\n", "=".repeat(60));
}
