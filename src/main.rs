use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use allwatch::backing::Backing;
use allwatch::config::Config;
use allwatch::state::memory::InMemoryState;
use allwatch::store::Store;

/// Loads the seeded document store, resynchronises a snapshot from it and
/// prints the snapshot as JSON.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load(&PathBuf::from(path))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let state = Arc::new(InMemoryState::with_collections(config.collections.clone()));
    if let Some(seed) = config.read_seed()? {
        let count = state.load_seed(seed).await?;
        tracing::info!(documents = count, "seed loaded");
    }

    let backing = Backing::new(
        Arc::clone(&state),
        &config.collections,
        tracing::info_span!("backing"),
    )?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    backing.watch(&tx);

    let store = Store::new();
    backing.get_all(&store).await?;
    while let Ok(change) = rx.try_recv() {
        backing.changed(&store, &change).await?;
    }
    backing.unwatch(&tx);

    println!("{}", serde_json::to_string_pretty(&store.all().await)?);
    Ok(())
}
