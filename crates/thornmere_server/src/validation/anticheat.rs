//! Flag accumulation and escalation (spec §4.2.3): every rejected packet
//! raises a severity-tagged flag against the offending character; once the
//! configured threshold for a severity is reached within the retention
//! window, the character escalates to the next enforcement tier.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::SeverityThresholds;
use crate::error::{ActionError, MovementError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementTier {
    None,
    Monitor,
    Throttle,
    Suspend,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Flag {
    severity: Severity,
    raised_at_ms: u64,
}

/// Classifies a rejected movement validation into a flag severity. Speed
/// and teleport violations are more likely to be deliberate cheating than
/// wall-clip/fly, which can also trigger on buggy pathing, so they weigh
/// heavier.
pub fn movement_severity(err: MovementError) -> Severity {
    match err {
        MovementError::SpeedHack => Severity::High,
        MovementError::TeleportHack => Severity::Critical,
        MovementError::WallClip => Severity::Medium,
        MovementError::FlyHack => Severity::High,
    }
}

pub fn action_severity(err: ActionError) -> Severity {
    match err {
        ActionError::TickBudgetExceeded | ActionError::RateLimitExceeded => Severity::Low,
        ActionError::GlobalCooldown => Severity::Low,
        ActionError::AbilityOnCooldown { .. } => Severity::Low,
        ActionError::InvalidAction => Severity::Medium,
        ActionError::InsufficientResources => Severity::Low,
    }
}

#[derive(Debug, Default)]
pub struct FlagHistory {
    flags: VecDeque<Flag>,
}

impl FlagHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, severity: Severity, now_ms: u64, retention_ms: u64) {
        self.prune(now_ms, retention_ms);
        self.flags.push_back(Flag {
            severity,
            raised_at_ms: now_ms,
        });
    }

    fn prune(&mut self, now_ms: u64, retention_ms: u64) {
        self.flags.retain(|f| now_ms.saturating_sub(f.raised_at_ms) < retention_ms);
    }

    fn count(&self, severity: Severity) -> usize {
        self.flags.iter().filter(|f| f.severity == severity).count()
    }

    /// Determines the enforcement tier implied by the current flag counts
    /// against the configured per-severity thresholds. Evaluated from
    /// highest severity down, since one critical flag should never be
    /// masked by an otherwise-clean low-severity count.
    pub fn enforcement_tier(&self, thresholds: &SeverityThresholds) -> EnforcementTier {
        if self.count(Severity::Critical) >= thresholds.critical as usize {
            return EnforcementTier::Suspend;
        }
        if self.count(Severity::High) >= thresholds.high as usize {
            return EnforcementTier::Suspend;
        }
        if self.count(Severity::Medium) >= thresholds.medium as usize {
            return EnforcementTier::Throttle;
        }
        if self.count(Severity::Low) >= thresholds.low as usize {
            return EnforcementTier::Monitor;
        }
        EnforcementTier::None
    }
}

/// Lightweight bot-detection signal: tracks the interval between successive
/// actions and flags characters whose action timing is suspiciously
/// regular, a hallmark of scripted input rather than human play.
#[derive(Debug, Default)]
pub struct TimingAnalyzer {
    intervals: VecDeque<u64>,
    last_action_ms: Option<u64>,
}

impl TimingAnalyzer {
    const SAMPLE_WINDOW: usize = 20;
    /// Standard deviation (ms) below which interval timing is considered
    /// suspiciously mechanical.
    const SUSPICIOUS_STDDEV_MS: f64 = 5.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_action(&mut self, now_ms: u64) {
        if let Some(last) = self.last_action_ms {
            self.intervals.push_back(now_ms.saturating_sub(last));
            while self.intervals.len() > Self::SAMPLE_WINDOW {
                self.intervals.pop_front();
            }
        }
        self.last_action_ms = Some(now_ms);
    }

    pub fn looks_automated(&self) -> bool {
        if self.intervals.len() < Self::SAMPLE_WINDOW {
            return false;
        }
        let mean = self.intervals.iter().sum::<u64>() as f64 / self.intervals.len() as f64;
        let variance = self
            .intervals
            .iter()
            .map(|v| {
                let d = *v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.intervals.len() as f64;
        variance.sqrt() < Self::SUSPICIOUS_STDDEV_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_critical_flag_triggers_suspend() {
        let mut h = FlagHistory::new();
        h.raise(Severity::Critical, 0, 86_400_000);
        let tiers = SeverityThresholds::default();
        assert_eq!(h.enforcement_tier(&tiers), EnforcementTier::Suspend);
    }

    #[test]
    fn flags_outside_retention_window_do_not_count() {
        let mut h = FlagHistory::new();
        let tiers = SeverityThresholds {
            low: 2,
            ..SeverityThresholds::default()
        };
        h.raise(Severity::Low, 0, 1000);
        h.raise(Severity::Low, 2000, 1000);
        assert_eq!(h.enforcement_tier(&tiers), EnforcementTier::None);
    }

    #[test]
    fn clean_history_has_no_enforcement() {
        let h = FlagHistory::new();
        assert_eq!(h.enforcement_tier(&SeverityThresholds::default()), EnforcementTier::None);
    }

    #[test]
    fn perfectly_regular_intervals_are_flagged_as_automated() {
        let mut t = TimingAnalyzer::new();
        for i in 0..25 {
            t.record_action(i * 580);
        }
        assert!(t.looks_automated());
    }

    #[test]
    fn human_like_jitter_is_not_flagged() {
        let mut t = TimingAnalyzer::new();
        let jitter = [580, 612, 550, 700, 490, 640, 520, 680, 560, 610];
        let mut now = 0u64;
        for (i, d) in jitter.iter().cycle().take(25).enumerate() {
            now += *d + (i as u64 % 3) * 37;
            t.record_action(now);
        }
        assert!(!t.looks_automated());
    }
}
