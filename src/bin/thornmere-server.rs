//! Process entry point: loads configuration, wires the in-memory
//! collaborator doubles (swap for real ones when this is embedded), and
//! runs the game loop until `Ctrl+C`. Grounded on `valence`'s own
//! `examples/` launcher pattern of `App::new().add_plugins(...).run()`,
//! adapted to this design's plain tokio task layout instead of a bevy
//! `App`.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

use thornmere::server::catalog::StaticCatalog;
use thornmere::server::config::ServerConfig;
use thornmere::server::gameloop::GameLoop;
use thornmere::server::testing::{InMemoryAuth, InMemoryStore};
use thornmere::server::world::World;
use thornmere::net;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::var("THORNMERE_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)?;
            ServerConfig::from_toml_str(&text)?
        }
        Err(_) => ServerConfig::default(),
    };

    let addr = config.network.socket_addr()?;
    let auth = Arc::new(InMemoryAuth::new());
    let store = Arc::new(InMemoryStore::new());
    let catalog = Arc::new(StaticCatalog::default());

    let world = World::new(config.clone(), catalog);
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let game_loop = GameLoop::new(world, store, inbound_rx);
    let loop_handle = tokio::spawn(game_loop.run(shutdown_rx));

    let net_handle = tokio::spawn(net::accept_loop(
        addr,
        auth,
        inbound_tx,
        config.validation.sequence_window,
        config.validation.nonce_expiry_ms,
    ));

    info!(%addr, "thornmere server listening");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
            let _ = shutdown_tx.send(());
        }
        result = net_handle => {
            if let Err(err) = result? {
                tracing::error!(error = %err, "accept loop exited");
            }
        }
    }

    loop_handle.await?;
    Ok(())
}
