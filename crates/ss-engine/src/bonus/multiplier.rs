//! Progressive win multiplier
//!
//! Each winning spin is credited at the live multiplier, which then steps up
//! for the next spin. A losing spin drops it back to base.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{Bonus, BonusError, BonusId, BonusResult, SpinEndContext, SpinStartContext};

/// Multiplier progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierConfig {
    pub base: f64,
    /// Added after each winning spin
    pub step: f64,
    pub max: f64,
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            step: 1.0,
            max: 5.0,
        }
    }
}

impl MultiplierConfig {
    fn validate(&self) -> BonusResult<()> {
        if !(self.base.is_finite() && self.step.is_finite() && self.max.is_finite()) {
            return Err(BonusError::InvalidState("multiplier values must be finite".into()));
        }
        if self.base <= 0.0 || self.step < 0.0 || self.max < self.base {
            return Err(BonusError::InvalidState(format!(
                "bad progression: base {} step {} max {}",
                self.base, self.step, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct MultiplierState {
    current: f64,
    peak: f64,
    accumulated_win: f64,
}

impl MultiplierState {
    fn at(base: f64) -> Self {
        Self {
            current: base,
            peak: base,
            accumulated_win: 0.0,
        }
    }
}

/// Progressive multiplier bonus
#[derive(Debug)]
pub struct MultiplierBonus {
    config: MultiplierConfig,
    state: Mutex<MultiplierState>,
}

impl Default for MultiplierBonus {
    fn default() -> Self {
        Self::unchecked(MultiplierConfig::default())
    }
}

impl MultiplierBonus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build with a custom progression; rejects a non-positive base, a
    /// negative step or a max below base.
    pub fn with_config(config: MultiplierConfig) -> BonusResult<Self> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    fn unchecked(config: MultiplierConfig) -> Self {
        let state = Mutex::new(MultiplierState::at(config.base));
        Self { config, state }
    }

    pub fn config(&self) -> &MultiplierConfig {
        &self.config
    }

    /// Multiplier the next winning spin is credited at
    pub fn current(&self) -> f64 {
        self.state.lock().current
    }

    /// Highest multiplier reached
    pub fn peak(&self) -> f64 {
        self.state.lock().peak
    }

    /// Sum of payout × multiplier over every spin seen
    pub fn accumulated_win(&self) -> f64 {
        self.state.lock().accumulated_win
    }

    pub fn reset(&self) {
        *self.state.lock() = MultiplierState::at(self.config.base);
    }
}

#[async_trait]
impl Bonus for MultiplierBonus {
    fn id(&self) -> BonusId {
        BonusId::new("multiplier")
    }

    fn name(&self) -> &str {
        "Win Multiplier"
    }

    fn description(&self) -> &str {
        "Multiplier grows on consecutive wins and resets on a loss"
    }

    async fn on_spin_start(&self, ctx: &SpinStartContext) -> BonusResult<()> {
        log::debug!("Spin {} multiplier x{}", ctx.spin_index, self.current());
        Ok(())
    }

    async fn on_spin_end(&self, ctx: &SpinEndContext) -> BonusResult<()> {
        let mut state = self.state.lock();
        if ctx.is_win() {
            state.accumulated_win += ctx.total_payout() * state.current;
            state.current = (state.current + self.config.step).min(self.config.max);
            state.peak = state.peak.max(state.current);
        } else {
            state.current = self.config.base;
        }
        Ok(())
    }
}
