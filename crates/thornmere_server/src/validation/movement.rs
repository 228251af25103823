//! Movement plausibility checks (spec §4.2.1): speed, teleport distance, and
//! fly/wall-clip heuristics against a per-character position history.

use std::collections::VecDeque;

use thornmere_math::{distance, Vec3};

use thornmere_protocol::MovementKind;

use crate::config::ValidationConfig;
use crate::error::MovementError;

#[derive(Debug, Clone, Copy)]
struct Sample {
    position: Vec3,
    timestamp_ms: u64,
}

#[derive(Debug)]
pub struct MovementValidator {
    history: VecDeque<Sample>,
    capacity: usize,
    last_ability_use_ms: Option<u64>,
    corrections_sent: VecDeque<u64>,
}

impl MovementValidator {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            last_ability_use_ms: None,
            corrections_sent: VecDeque::new(),
        }
    }

    pub fn note_ability_use(&mut self, now_ms: u64) {
        self.last_ability_use_ms = Some(now_ms);
    }

    fn ability_grace_active(&self, now_ms: u64, window_ms: u64) -> bool {
        self.last_ability_use_ms
            .is_some_and(|t| now_ms.saturating_sub(t) <= window_ms)
    }

    /// Validates a claimed move from the last recorded position to `to` at
    /// `timestamp_ms`, recording `to` into history on success. Returns the
    /// specific violation on failure without mutating history, so the
    /// caller can resend a correction from the last known-good position.
    /// Teleport-kind moves skip the speed ceiling entirely; the navmesh
    /// oracle check on the caller's side covers them instead.
    pub fn validate_move(
        &mut self,
        to: Vec3,
        timestamp_ms: u64,
        kind: MovementKind,
        config: &ValidationConfig,
    ) -> Result<(), MovementError> {
        let Some(last) = self.history.back().copied() else {
            self.push(to, timestamp_ms);
            return Ok(());
        };

        if timestamp_ms <= last.timestamp_ms {
            return Ok(());
        }

        let dt_s = (timestamp_ms - last.timestamp_ms) as f64 / 1000.0;
        let dist = distance(last.position, to);

        if kind == MovementKind::Teleport {
            self.push(to, timestamp_ms);
            return Ok(());
        }

        if dist > config.teleport_threshold_units
            && !self.ability_grace_active(timestamp_ms, ValidationConfig::MOVEMENT_ABILITY_WINDOW_MS)
        {
            return Err(MovementError::TeleportHack);
        }

        if self.ability_grace_active(timestamp_ms, ValidationConfig::MOVEMENT_ABILITY_WINDOW_MS) {
            self.push(to, timestamp_ms);
            return Ok(());
        }

        let base_speed = match kind {
            MovementKind::Walk => config.base_walk_speed,
            MovementKind::Run | MovementKind::Teleport => config.base_run_speed,
        };
        let max_speed = base_speed * config.max_speed_multiplier;
        if dt_s > 0.0 {
            let speed = dist / dt_s;
            if speed > max_speed {
                return Err(MovementError::SpeedHack);
            }
        }

        self.push(to, timestamp_ms);
        Ok(())
    }

    fn push(&mut self, position: Vec3, timestamp_ms: u64) {
        self.history.push_back(Sample { position, timestamp_ms });
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }

    /// Reseeds history with a single authoritative position, used after a
    /// teleport the navmesh oracle has accepted so the next ordinary move is
    /// judged against the new location rather than the pre-teleport one.
    pub fn reset_to(&mut self, position: Vec3, timestamp_ms: u64) {
        self.history.clear();
        self.push(position, timestamp_ms);
    }

    /// Records that a correction was sent, pruning entries older than one
    /// minute, and returns whether the per-minute correction budget still
    /// has room for one more.
    pub fn record_correction(&mut self, now_ms: u64, max_per_minute: u32) -> bool {
        self.corrections_sent
            .retain(|t| now_ms.saturating_sub(*t) < ValidationConfig::RUBBER_BAND_WINDOW_MS);
        if self.corrections_sent.len() as u32 >= max_per_minute {
            return false;
        }
        self.corrections_sent.push_back(now_ms);
        true
    }
}
