//! Serve command - expose a loaded file over a local HTTP API.

use std::path::PathBuf;

use colored::Colorize;
use dataeater::{DataEaterConfig, FavoriteStore};

use super::open_store;
use crate::server::{app, state::AppState};

pub fn run(
    file: PathBuf,
    port: u16,
    favorites: Option<PathBuf>,
    config: DataEaterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&file, config)?;
    let favorites = match &favorites {
        Some(path) => FavoriteStore::open(path)?,
        None => FavoriteStore::in_memory(),
    };

    println!();
    println!(
        "{} {}",
        "Serving".cyan().bold(),
        format!("http://localhost:{}/api", port).white().bold()
    );
    println!();
    println!("  File: {}", file.display());
    println!(
        "  Rows: {}, columns: {}",
        store.row_count(),
        store.columns().len()
    );
    println!("  Favorites: {}", favorites.list().len());
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    let state = AppState::new(store, favorites);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            println!();
            println!("{}", "Shutting down...".yellow());
            state_clone.cancel();
            let unsaved = state_clone
                .store
                .try_lock()
                .map(|store| store.has_unsaved_changes())
                .unwrap_or(false);
            if unsaved {
                eprintln!(
                    "{} unsaved changes are discarded; use `dataeater apply --export` to keep them",
                    "Warning:".yellow()
                );
            }
            std::process::exit(0);
        });

        if let Err(e) = app::run_server(state, port).await {
            eprintln!("Server error: {}", e);
        }
    });

    Ok(())
}
