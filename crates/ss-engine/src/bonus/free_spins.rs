//! Free Spins bonus
//!
//! Scatters on a settled grid award free spins; each following spin consumes
//! one while any remain. Landing the trigger again during the feature
//! retriggers for extra spins.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{Bonus, BonusId, BonusResult, SpinEndContext, SpinStartContext};

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Free Spins configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsConfig {
    /// Scatters needed anywhere on the grid
    pub trigger_count: usize,
    /// Spins awarded on the initial trigger
    pub spins_awarded: u32,
    /// Can retrigger during the feature
    pub can_retrigger: bool,
    /// Extra spins on retrigger
    pub retrigger_spins: u32,
}

impl Default for FreeSpinsConfig {
    fn default() -> Self {
        Self {
            trigger_count: 3,
            spins_awarded: 10,
            can_retrigger: true,
            retrigger_spins: 5,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
struct FreeSpinsState {
    remaining: u32,
    consumed: u32,
    total_awarded: u32,
    triggers: u32,
    retriggers: u32,
    /// The spin in flight is a free spin
    current_is_free: bool,
}

/// Point-in-time view of the bonus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSpinsStatus {
    pub remaining: u32,
    pub consumed: u32,
    pub total_awarded: u32,
    pub triggers: u32,
    pub retriggers: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BONUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Free Spins bonus
#[derive(Debug, Default)]
pub struct FreeSpinsBonus {
    config: FreeSpinsConfig,
    state: Mutex<FreeSpinsState>,
}

impl FreeSpinsBonus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FreeSpinsConfig) -> Self {
        Self {
            config,
            state: Mutex::new(FreeSpinsState::default()),
        }
    }

    pub fn config(&self) -> &FreeSpinsConfig {
        &self.config
    }

    pub fn remaining(&self) -> u32 {
        self.state.lock().remaining
    }

    pub fn consumed(&self) -> u32 {
        self.state.lock().consumed
    }

    pub fn total_awarded(&self) -> u32 {
        self.state.lock().total_awarded
    }

    pub fn triggers(&self) -> u32 {
        self.state.lock().triggers
    }

    /// In the feature: spins remain or the current spin is free
    pub fn is_active(&self) -> bool {
        let state = self.state.lock();
        state.remaining > 0 || state.current_is_free
    }

    pub fn status(&self) -> FreeSpinsStatus {
        let state = self.state.lock();
        FreeSpinsStatus {
            remaining: state.remaining,
            consumed: state.consumed,
            total_awarded: state.total_awarded,
            triggers: state.triggers,
            retriggers: state.retriggers,
        }
    }

    pub fn reset(&self) {
        *self.state.lock() = FreeSpinsState::default();
    }
}

#[async_trait]
impl Bonus for FreeSpinsBonus {
    fn id(&self) -> BonusId {
        BonusId::new("free_spins")
    }

    fn name(&self) -> &str {
        "Free Spins"
    }

    fn description(&self) -> &str {
        "Scatter-triggered free spins with retriggers"
    }

    async fn on_spin_start(&self, ctx: &SpinStartContext) -> BonusResult<()> {
        let mut state = self.state.lock();
        if state.remaining > 0 {
            state.remaining -= 1;
            state.consumed = state.consumed.saturating_add(1);
            state.current_is_free = true;
            log::debug!(
                "Spin {} is a free spin ({} left)",
                ctx.spin_index,
                state.remaining
            );
        } else {
            state.current_is_free = false;
        }
        Ok(())
    }

    async fn on_spin_end(&self, ctx: &SpinEndContext) -> BonusResult<()> {
        let scatters = ctx.scatter_count();
        if scatters < self.config.trigger_count {
            return Ok(());
        }

        let mut state = self.state.lock();
        let in_feature = state.remaining > 0 || state.current_is_free;
        if !in_feature {
            state.remaining = state.remaining.saturating_add(self.config.spins_awarded);
            state.total_awarded = state.total_awarded.saturating_add(self.config.spins_awarded);
            state.triggers = state.triggers.saturating_add(1);
            log::debug!(
                "Free spins triggered by {} scatters on spin {}: {} awarded",
                scatters,
                ctx.spin_index,
                self.config.spins_awarded
            );
        } else if self.config.can_retrigger {
            state.remaining = state.remaining.saturating_add(self.config.retrigger_spins);
            state.total_awarded = state.total_awarded.saturating_add(self.config.retrigger_spins);
            state.retriggers = state.retriggers.saturating_add(1);
            log::debug!(
                "Free spins retriggered on spin {}: +{}",
                ctx.spin_index,
                self.config.retrigger_spins
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::grid::{Grid, GridSnapshot};
    use crate::symbols::SymbolId::{self, *};

    fn snapshot(row: Vec<SymbolId>) -> GridSnapshot {
        Grid::from_rows(&[row]).unwrap().snapshot()
    }

    async fn start(bonus: &FreeSpinsBonus, index: u64) -> BonusResult<()> {
        let ctx = SpinStartContext::new(
            index,
            snapshot(vec![Bear; 5]),
            Arc::new(EngineConfig::default()),
        );
        bonus.on_spin_start(&ctx).await
    }

    fn end_ctx(index: u64, row: Vec<SymbolId>) -> SpinEndContext {
        SpinEndContext::new(index, snapshot(row), Vec::new(), 0, Arc::new(EngineConfig::default()))
    }

    const THREE_SCATTERS: [SymbolId; 5] = [Scatter, Bear, Scatter, Wolf, Scatter];

    #[tokio::test]
    async fn test_trigger_awards_spins() {
        let bonus = FreeSpinsBonus::new();
        assert!(!bonus.is_active());

        start(&bonus, 1).await.unwrap();
        bonus.on_spin_end(&end_ctx(1, THREE_SCATTERS.to_vec())).await.unwrap();

        assert_eq!(bonus.remaining(), 10);
        assert_eq!(bonus.triggers(), 1);
        assert!(bonus.is_active());
    }

    #[tokio::test]
    async fn test_two_scatters_do_not_trigger() {
        let bonus = FreeSpinsBonus::new();
        start(&bonus, 1).await.unwrap();
        bonus
            .on_spin_end(&end_ctx(1, vec![Scatter, Bear, Scatter, Wolf, Elk]))
            .await
            .unwrap();
        assert_eq!(bonus.remaining(), 0);
        assert_eq!(bonus.total_awarded(), 0);
    }

    #[tokio::test]
    async fn test_spins_are_consumed_then_feature_ends() {
        let bonus = FreeSpinsBonus::with_config(FreeSpinsConfig {
            spins_awarded: 2,
            ..FreeSpinsConfig::default()
        });
        start(&bonus, 1).await.unwrap();
        bonus.on_spin_end(&end_ctx(1, THREE_SCATTERS.to_vec())).await.unwrap();

        for index in 2..=3 {
            start(&bonus, index).await.unwrap();
            bonus.on_spin_end(&end_ctx(index, vec![Bear; 5])).await.unwrap();
        }
        assert_eq!(bonus.consumed(), 2);
        assert_eq!(bonus.remaining(), 0);

        start(&bonus, 4).await.unwrap();
        assert!(!bonus.is_active());
        assert_eq!(bonus.consumed(), 2);
    }

    #[tokio::test]
    async fn test_retrigger_during_feature() {
        let bonus = FreeSpinsBonus::new();
        start(&bonus, 1).await.unwrap();
        bonus.on_spin_end(&end_ctx(1, THREE_SCATTERS.to_vec())).await.unwrap();

        start(&bonus, 2).await.unwrap();
        bonus.on_spin_end(&end_ctx(2, THREE_SCATTERS.to_vec())).await.unwrap();

        let status = bonus.status();
        assert_eq!(status.remaining, 9 + 5);
        assert_eq!(status.retriggers, 1);
        assert_eq!(status.triggers, 1);
        assert_eq!(status.total_awarded, 15);
    }

    #[tokio::test]
    async fn test_huge_awards_saturate() {
        let bonus = FreeSpinsBonus::with_config(FreeSpinsConfig {
            spins_awarded: u32::MAX,
            retrigger_spins: u32::MAX,
            ..FreeSpinsConfig::default()
        });
        start(&bonus, 1).await.unwrap();
        bonus.on_spin_end(&end_ctx(1, THREE_SCATTERS.to_vec())).await.unwrap();
        assert_eq!(bonus.remaining(), u32::MAX);

        start(&bonus, 2).await.unwrap();
        bonus.on_spin_end(&end_ctx(2, THREE_SCATTERS.to_vec())).await.unwrap();

        let status = bonus.status();
        assert_eq!(status.remaining, u32::MAX);
        assert_eq!(status.total_awarded, u32::MAX);
        assert_eq!(status.retriggers, 1);
    }

    #[tokio::test]
    async fn test_retrigger_disabled() {
        let bonus = FreeSpinsBonus::with_config(FreeSpinsConfig {
            can_retrigger: false,
            ..FreeSpinsConfig::default()
        });
        start(&bonus, 1).await.unwrap();
        bonus.on_spin_end(&end_ctx(1, THREE_SCATTERS.to_vec())).await.unwrap();
        start(&bonus, 2).await.unwrap();
        bonus.on_spin_end(&end_ctx(2, THREE_SCATTERS.to_vec())).await.unwrap();

        assert_eq!(bonus.remaining(), 9);
        assert_eq!(bonus.status().retriggers, 0);

        bonus.reset();
        assert_eq!(bonus.status(), FreeSpinsStatus {
            remaining: 0,
            consumed: 0,
            total_awarded: 0,
            triggers: 0,
            retriggers: 0,
        });
    }
}
