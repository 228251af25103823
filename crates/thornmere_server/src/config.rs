//! The operator-visible configuration surface, assembled the way `valence`'s
//! `ServerPlugin<A>` is: typed fields with documented defaults and `with_*`
//! builders, loadable from TOML via `serde`.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    pub tick_rate_hz: u32,
    pub max_players_per_zone: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 7777,
            tick_rate_hz: 20,
            max_players_per_zone: 200,
        }
    }
}

impl NetworkConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        if self.host == "0.0.0.0" {
            return Ok(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port).into());
        }
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            low: 100,
            medium: 25,
            high: 5,
            critical: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_speed_multiplier: f64,
    pub teleport_threshold_units: f64,
    pub position_history_samples: usize,
    pub max_corrections_per_minute: u32,
    pub base_walk_speed: f64,
    pub base_run_speed: f64,
    pub tick_duration_ms: u64,
    pub max_actions_per_tick: u32,
    pub max_prayer_switches_per_tick: u32,
    pub global_cooldown_ms: u64,
    pub max_packet_age_ms: u64,
    pub clock_skew_tolerance_ms: u64,
    pub key_rotation_minutes: u64,
    pub sequence_window: u32,
    pub nonce_expiry_ms: u64,
    pub flag_retention_days: u32,
    pub severity_thresholds: SeverityThresholds,
    /// Movement abilities that grant unlimited speed for 1500ms after use.
    pub movement_abilities: Vec<String>,
    /// Maximum distance between a skill action's client-claimed position and
    /// the authoritative one before the action is rejected (spec §4.7 step 2).
    pub position_claim_tolerance_units: f64,
    /// Maximum distance to a skill action's target before it is out of reach
    /// (spec §4.7 step 2, "interaction range (default 10 units)").
    pub interaction_range_units: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_speed_multiplier: 1.15,
            teleport_threshold_units: 100.0,
            position_history_samples: 60,
            max_corrections_per_minute: 5,
            base_walk_speed: 220.0,
            base_run_speed: 440.0,
            tick_duration_ms: 600,
            max_actions_per_tick: 1,
            max_prayer_switches_per_tick: 3,
            global_cooldown_ms: 580,
            max_packet_age_ms: 30_000,
            clock_skew_tolerance_ms: 5_000,
            key_rotation_minutes: 60,
            sequence_window: 1000,
            nonce_expiry_ms: 60_000,
            flag_retention_days: 90,
            severity_thresholds: SeverityThresholds::default(),
            movement_abilities: [
                "surge",
                "escape",
                "bladed_dive",
                "barge",
                "dive",
                "double_surge",
                "mobile_perk",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            position_claim_tolerance_units: 10.0,
            interaction_range_units: 10.0,
        }
    }
}

impl ValidationConfig {
    /// Window of unlimited speed after a movement ability use, per spec
    /// §4.2.1. Not operator-configurable; it is a property of how movement
    /// abilities are modeled, not a tunable rate limit.
    pub const MOVEMENT_ABILITY_WINDOW_MS: u64 = 1500;
    pub const RUBBER_BAND_WINDOW_MS: u64 = 60_000;
    /// Position history entries older than this are not pruned by count but
    /// movement-ability usages older than this are garbage-collected.
    pub const MOVEMENT_ABILITY_GC_MS: u64 = 5_000;
    pub const SESSION_IDLE_TIMEOUT_MS: u64 = 60_000;

    pub fn session_expiry_ms(&self) -> u64 {
        self.key_rotation_minutes * 60_000
    }

    pub fn key_rotation_window_ms(&self) -> u64 {
        self.session_expiry_ms()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub max_active_offers: usize,
    pub max_quantity_per_offer: u32,
    pub min_price_per_item: u64,
    pub max_price_per_item: u64,
    pub buy_limit_window_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_active_offers: 8,
            max_quantity_per_offer: i32::MAX as u32,
            min_price_per_item: 1,
            max_price_per_item: i32::MAX as u64,
            buy_limit_window_ms: 4 * 60 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub validation: ValidationConfig,
    pub exchange: ExchangeConfig,
    /// Ticks between persistence flushes of all live characters. ~15s at
    /// 20Hz, per spec §4.11.
    pub save_interval_ticks: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            validation: ValidationConfig::default(),
            exchange: ExchangeConfig::default(),
            save_interval_ticks: 25,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.network.tick_rate_hz, 20);
        assert_eq!(cfg.validation.tick_duration_ms, 600);
        assert_eq!(cfg.exchange.max_active_offers, 8);
    }

    #[test]
    fn empty_toml_uses_all_defaults() {
        let cfg = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.validation.base_walk_speed, 220.0);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = ServerConfig::from_toml_str("[network]\nport = 9000\n").unwrap();
        assert_eq!(cfg.network.port, 9000);
        assert_eq!(cfg.network.tick_rate_hz, 20);
    }
}
