//! Reel Engine — spin orchestration
//!
//! ```text
//! spin() ─> guard ─> start hooks ─> fill_all ─> evaluate ─┬─> end hooks ─> stats
//!                                                         └─ cascading: resolve chain
//! ```
//!
//! The engine is shared by reference (`&self` everywhere, `Send + Sync`).
//! Config is an `Arc` snapshot swapped on write; grid and RNG live behind a
//! mutex that is only taken for the synchronous steps, never across a hook
//! `.await`.

use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::bonus::{
    BonusId, BonusRegistry, BonusResult, SharedBonus, SpinEndContext, SpinStartContext,
};
use crate::cascade::{CascadeReport, CascadeResolver};
use crate::config::{ConfigPatch, EngineConfig, SpinStyle};
use crate::error::EngineResult;
use crate::grid::{Grid, GridSize, GridSnapshot};
use crate::paytable::{Paytable, Win, total_payout};
use crate::rng::Xorshift32;
use crate::selector::SymbolSelector;
use crate::symbols::SymbolId;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOME & STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of one spin
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Every win of the spin; in cascading style the union of all passes
    pub wins: Vec<Win>,
    /// Completed cascades (always 0 in regular style)
    pub cascades: u32,
    /// The cascade chain was cut off by the cap
    pub capped: bool,
}

impl SpinOutcome {
    /// Outcome of a rejected spin
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sum of all win payouts
    pub fn total_payout(&self) -> f64 {
        total_payout(&self.wins)
    }

    /// At least one win
    pub fn is_win(&self) -> bool {
        !self.wins.is_empty()
    }
}

impl From<CascadeReport> for SpinOutcome {
    fn from(report: CascadeReport) -> Self {
        Self {
            wins: report.wins,
            cascades: report.cascades,
            capped: report.capped,
        }
    }
}

/// Where the engine is in the spin lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    #[default]
    Idle,
    /// Start hooks running, reels turning
    Spinning,
    Evaluating,
    Cascading,
    /// Grid at rest, end hooks running
    Settled,
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub winning_spins: u64,
    pub total_payout: f64,
    /// Individual wins across all spins
    pub total_wins: u64,
    pub total_cascades: u64,
    /// Longest cascade chain seen
    pub max_cascade_depth: u32,
    /// Chains stopped by the cascade cap
    pub capped_chains: u64,
    /// Spins rejected because one was already running
    pub skipped_spins: u64,
    /// Bonus hook calls that returned an error
    pub bonus_failures: u64,
}

impl SessionStats {
    /// Calculate hit rate (percent of spins that paid)
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.winning_spins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Mean payout per completed spin
    pub fn average_payout(&self) -> f64 {
        if self.total_spins > 0 {
            self.total_payout / self.total_spins as f64
        } else {
            0.0
        }
    }

    fn record(&mut self, outcome: &SpinOutcome, bonus_failures: u64) {
        self.total_spins += 1;
        if outcome.is_win() {
            self.winning_spins += 1;
        }
        self.total_payout += outcome.total_payout();
        self.total_wins += outcome.wins.len() as u64;
        self.total_cascades += u64::from(outcome.cascades);
        self.max_cascade_depth = self.max_cascade_depth.max(outcome.cascades);
        if outcome.capped {
            self.capped_chains += 1;
        }
        self.bonus_failures += bonus_failures;
    }
}

/// Mutable reel state; locked only for synchronous steps
#[derive(Debug)]
struct ReelState {
    grid: Grid,
    rng: Xorshift32,
    phase: SpinPhase,
    cascades_in_chain: u32,
    spin_count: u64,
}

/// Holds the spinning flag for one spin; releases it (and resets the phase)
/// on drop, including when the spin future is dropped or unwinds.
struct SpinGuard<'a> {
    engine: &'a ReelEngine,
}

impl<'a> SpinGuard<'a> {
    fn acquire(engine: &'a ReelEngine) -> Option<Self> {
        engine
            .spinning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { engine })
    }
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.engine.state.lock().phase = SpinPhase::Idle;
        self.engine.spinning.store(false, Ordering::Release);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Reel Engine
///
/// Owns the grid, its RNG, the config snapshot and the ordered bonus list.
/// Independent instances never share state.
pub struct ReelEngine {
    config: RwLock<Arc<EngineConfig>>,
    state: Mutex<ReelState>,
    bonuses: RwLock<BonusRegistry>,
    stats: Mutex<SessionStats>,
    spinning: AtomicBool,
}

impl ReelEngine {
    /// Create from a partial config merged over the defaults
    pub fn new(patch: ConfigPatch) -> EngineResult<Self> {
        Self::with_config(patch.resolve()?)
    }

    /// Create with a complete config
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let mut rng = config
            .rng_seed
            .map(Xorshift32::new)
            .unwrap_or_else(Xorshift32::from_entropy);
        let mut grid = Grid::blank(config.grid);
        grid.fill_all(&mut SymbolSelector::new(&config.symbol_weights, &mut rng));
        log::debug!(
            "Reel engine created: {}x{} {:?}, seed {}",
            config.grid.cols,
            config.grid.rows,
            config.spin_style,
            rng.seed()
        );

        Self {
            config: RwLock::new(Arc::new(config)),
            state: Mutex::new(ReelState {
                grid,
                rng,
                phase: SpinPhase::Idle,
                cascades_in_chain: 0,
                spin_count: 0,
            }),
            bonuses: RwLock::new(BonusRegistry::new()),
            stats: Mutex::new(SessionStats::default()),
            spinning: AtomicBool::new(false),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run one spin to completion.
    ///
    /// A call made while another spin is in flight returns
    /// [`SpinOutcome::empty`] and leaves the engine untouched.
    pub async fn spin(&self) -> SpinOutcome {
        let Some(_guard) = SpinGuard::acquire(self) else {
            log::debug!("Spin rejected: a spin is already in progress");
            self.stats.lock().skipped_spins += 1;
            return SpinOutcome::empty();
        };

        let config = self.config();
        let (spin_index, snapshot) = {
            let mut state = self.state.lock();
            state.spin_count += 1;
            state.phase = SpinPhase::Spinning;
            state.cascades_in_chain = 0;
            (state.spin_count, state.grid.snapshot())
        };
        log::debug!("Spin {} started ({:?})", spin_index, config.spin_style);

        let bonuses: Vec<SharedBonus> = self.bonuses.read().iter().cloned().collect();
        let mut bonus_failures = 0u64;

        let start_ctx = SpinStartContext::new(spin_index, snapshot, Arc::clone(&config));
        for bonus in &bonuses {
            if !run_hook(bonus, "spin start", bonus.on_spin_start(&start_ctx)).await {
                bonus_failures += 1;
            }
        }

        let (outcome, snapshot) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let mut selector = SymbolSelector::new(&config.symbol_weights, &mut state.rng);
            state.grid.fill_all(&mut selector);

            state.phase = SpinPhase::Evaluating;
            let wins = config.paytable.evaluate(&state.grid);

            let outcome = match config.spin_style {
                SpinStyle::Regular => SpinOutcome {
                    wins,
                    ..SpinOutcome::default()
                },
                SpinStyle::Cascading => {
                    state.phase = SpinPhase::Cascading;
                    CascadeResolver::new(config.max_cascades)
                        .resolve(&mut state.grid, &mut selector, &config.paytable, wins)
                        .into()
                }
            };
            state.cascades_in_chain = outcome.cascades;
            state.phase = SpinPhase::Settled;
            (outcome, state.grid.snapshot())
        };

        let end_ctx = SpinEndContext::new(
            spin_index,
            snapshot,
            outcome.wins.clone(),
            outcome.cascades,
            Arc::clone(&config),
        );
        for bonus in &bonuses {
            if !run_hook(bonus, "spin end", bonus.on_spin_end(&end_ctx)).await {
                bonus_failures += 1;
            }
        }

        self.stats.lock().record(&outcome, bonus_failures);
        log::debug!(
            "Spin {} settled: {} wins, payout {}, {} cascades",
            spin_index,
            outcome.wins.len(),
            outcome.total_payout(),
            outcome.cascades
        );
        outcome
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Clone the current config, apply `edit`, validate and swap it in
    fn update_config(
        &self,
        edit: impl FnOnce(&mut EngineConfig) -> EngineResult<()>,
    ) -> EngineResult<Arc<EngineConfig>> {
        let mut current = self.config.write();
        let mut next = EngineConfig::clone(&**current);
        edit(&mut next)?;
        next.validate()?;
        let next = Arc::new(next);
        *current = Arc::clone(&next);
        Ok(next)
    }

    /// Resize the grid; the new matrix is refilled immediately
    pub fn set_grid(&self, size: GridSize) -> EngineResult<()> {
        size.validate()?;
        let config = self.update_config(|c| {
            c.grid = size;
            Ok(())
        })?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut selector = SymbolSelector::new(&config.symbol_weights, &mut state.rng);
        state.grid.resize(size, &mut selector)?;
        log::debug!("Grid resized to {}x{}", size.cols, size.rows);
        Ok(())
    }

    /// Switch between regular and cascading spins
    pub fn set_spin_style(&self, style: SpinStyle) -> EngineResult<()> {
        self.update_config(|c| {
            c.spin_style = style;
            Ok(())
        })?;
        Ok(())
    }

    /// Set spin speed and, optionally, fall speed
    pub fn set_speed(&self, spin_speed: f64, fall_speed: Option<f64>) -> EngineResult<()> {
        self.update_config(|c| {
            c.spin_speed = spin_speed;
            if let Some(fall) = fall_speed {
                c.fall_speed = fall;
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Merge a partial weight table into the current one
    pub fn set_weights(&self, weights: &BTreeMap<SymbolId, f64>) -> EngineResult<()> {
        self.update_config(|c| c.symbol_weights.merge(weights))?;
        Ok(())
    }

    /// Replace the paytable
    pub fn set_paytable(&self, paytable: Paytable) -> EngineResult<()> {
        self.update_config(|c| {
            c.paytable = paytable;
            Ok(())
        })?;
        Ok(())
    }

    /// Set the cascade cap (must be at least 1)
    pub fn set_max_cascades(&self, max_cascades: u32) -> EngineResult<()> {
        self.update_config(|c| {
            c.max_cascades = max_cascades;
            Ok(())
        })?;
        Ok(())
    }

    /// Current config snapshot
    pub fn config(&self) -> Arc<EngineConfig> {
        Arc::clone(&*self.config.read())
    }

    /// Export config as JSON
    pub fn export_config(&self) -> EngineResult<String> {
        self.config().to_json()
    }

    /// Import a complete config from JSON.
    ///
    /// A changed grid size resizes and refills; a seed in the document
    /// restarts the RNG from it.
    pub fn import_config(&self, json: &str) -> EngineResult<()> {
        let next = EngineConfig::from_json(json)?;
        let previous = std::mem::replace(&mut *self.config.write(), Arc::new(next.clone()));

        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(seed) = next.rng_seed {
            state.rng = Xorshift32::new(seed);
        }
        if previous.grid != next.grid {
            let mut selector = SymbolSelector::new(&next.symbol_weights, &mut state.rng);
            state.grid.resize(next.grid, &mut selector)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BONUSES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a bonus; hooks run in registration order
    pub fn register_bonus(&self, bonus: SharedBonus) -> EngineResult<()> {
        let id = bonus.id();
        self.bonuses.write().register(bonus)?;
        log::debug!("Bonus registered: {}", id);
        Ok(())
    }

    /// Remove a bonus, returning it
    pub fn unregister_bonus(&self, id: &BonusId) -> EngineResult<SharedBonus> {
        self.bonuses.write().unregister(id)
    }

    /// Registered bonus ids in hook order
    pub fn bonus_ids(&self) -> Vec<BonusId> {
        self.bonuses.read().ids()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Read-only copy of the grid
    pub fn snapshot(&self) -> GridSnapshot {
        self.state.lock().grid.snapshot()
    }

    /// A spin is in flight
    pub fn is_spinning(&self) -> bool {
        self.spinning.load(Ordering::Acquire)
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SpinPhase {
        self.state.lock().phase
    }

    /// Cascades completed by the current (or last) spin
    pub fn cascades_in_chain(&self) -> u32 {
        self.state.lock().cascades_in_chain
    }

    /// Spins started so far
    pub fn spin_count(&self) -> u64 {
        self.state.lock().spin_count
    }

    /// Effective RNG seed
    pub fn seed(&self) -> u32 {
        self.state.lock().rng.seed()
    }

    /// Get session stats
    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    /// Reset session stats
    pub fn reset_stats(&self) {
        *self.stats.lock() = SessionStats::default();
    }
}

/// Await one hook, turning an error or a panic into a logged failure.
/// Returns false when the hook failed.
async fn run_hook<F>(bonus: &SharedBonus, stage: &str, hook: F) -> bool
where
    F: Future<Output = BonusResult<()>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            log::warn!("Bonus '{}' failed on {}: {}", bonus.id(), stage, e);
            false
        }
        Err(_) => {
            log::warn!("Bonus '{}' panicked on {}", bonus.id(), stage);
            false
        }
    }
}

impl Default for ReelEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl std::fmt::Debug for ReelEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReelEngine")
            .field("config", &self.config())
            .field("phase", &self.phase())
            .field("spinning", &self.is_spinning())
            .field("bonuses", &self.bonus_ids())
            .finish()
    }
}
