//! Bonus trait — the hook interface every bonus implements

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::grid::GridSnapshot;
use crate::paytable::{Win, total_payout};
use crate::symbols::SymbolId;

/// Unique bonus identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BonusId(pub String);

impl BonusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BonusId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BonusId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for BonusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hook failure. The engine logs it and keeps going.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BonusError {
    #[error("Bonus hook failed: {0}")]
    Failed(String),

    #[error("Invalid bonus state: {0}")]
    InvalidState(String),
}

pub type BonusResult<T> = Result<T, BonusError>;

// ═══════════════════════════════════════════════════════════════════════════════
// CONTEXTS
// ═══════════════════════════════════════════════════════════════════════════════

/// What a bonus sees when a spin starts
///
/// Owned copies only: a hook can read the grid and config but has no path to
/// mutate engine state.
#[derive(Debug, Clone)]
pub struct SpinStartContext {
    /// 1-based spin counter of the engine
    pub spin_index: u64,
    /// Grid as left by the previous spin
    pub snapshot: GridSnapshot,
    /// Config snapshot this spin runs with
    pub config: Arc<EngineConfig>,
}

impl SpinStartContext {
    pub fn new(spin_index: u64, snapshot: GridSnapshot, config: Arc<EngineConfig>) -> Self {
        Self {
            spin_index,
            snapshot,
            config,
        }
    }
}

/// What a bonus sees when a spin has settled
#[derive(Debug, Clone)]
pub struct SpinEndContext {
    pub spin_index: u64,
    /// Settled grid
    pub snapshot: GridSnapshot,
    /// Every win of the spin, across all cascade passes
    pub wins: Vec<Win>,
    /// Completed cascades
    pub cascades: u32,
    pub config: Arc<EngineConfig>,
}

impl SpinEndContext {
    pub fn new(
        spin_index: u64,
        snapshot: GridSnapshot,
        wins: Vec<Win>,
        cascades: u32,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            spin_index,
            snapshot,
            wins,
            cascades,
            config,
        }
    }

    pub fn is_win(&self) -> bool {
        !self.wins.is_empty()
    }

    pub fn total_payout(&self) -> f64 {
        total_payout(&self.wins)
    }

    /// Scatters on the settled grid
    pub fn scatter_count(&self) -> usize {
        self.snapshot.count(SymbolId::Scatter)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A pluggable observer of the spin lifecycle.
///
/// Both hooks are optional (default no-op). Hooks run sequentially in
/// registration order and are awaited one at a time. An `Err` or a panic
/// from one hook is logged and counted; the spin and the remaining hooks
/// carry on. A bonus keeps its own
/// state behind interior mutability; the engine never looks at it.
///
/// ## Example
///
/// ```rust,ignore
/// struct SpinCounter(AtomicU64);
///
/// #[async_trait]
/// impl Bonus for SpinCounter {
///     fn id(&self) -> BonusId { BonusId::new("spin_counter") }
///     fn name(&self) -> &str { "Spin Counter" }
///
///     async fn on_spin_end(&self, _ctx: &SpinEndContext) -> BonusResult<()> {
///         self.0.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Bonus: Send + Sync {
    /// Unique identifier
    fn id(&self) -> BonusId;

    /// Human-readable name
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Called before the grid is refilled
    async fn on_spin_start(&self, _ctx: &SpinStartContext) -> BonusResult<()> {
        Ok(())
    }

    /// Called after the grid has settled, with the full win list
    async fn on_spin_end(&self, _ctx: &SpinEndContext) -> BonusResult<()> {
        Ok(())
    }

    /// Info for UI display
    fn info(&self) -> BonusInfo {
        BonusInfo {
            id: self.id(),
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Bonus information for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusInfo {
    pub id: BonusId,
    pub name: String,
    pub description: String,
}

/// Shared bonus handle; callers keep their own clone to read bonus state
pub type SharedBonus = Arc<dyn Bonus>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    struct Inert;

    #[async_trait]
    impl Bonus for Inert {
        fn id(&self) -> BonusId {
            BonusId::new("inert")
        }

        fn name(&self) -> &str {
            "Inert"
        }
    }

    fn snapshot() -> GridSnapshot {
        Grid::from_rows(&[vec![SymbolId::Scatter, SymbolId::Bear, SymbolId::Scatter]])
            .unwrap()
            .snapshot()
    }

    #[test]
    fn test_bonus_id() {
        let id = BonusId::new("free_spins");
        assert_eq!(id.as_str(), "free_spins");
        let from_str: BonusId = "multiplier".into();
        assert_eq!(from_str.to_string(), "multiplier");
    }

    #[tokio::test]
    async fn test_default_hooks_are_noops() {
        let bonus = Inert;
        let config = Arc::new(EngineConfig::default());
        let start = SpinStartContext::new(1, snapshot(), config.clone());
        let end = SpinEndContext::new(1, snapshot(), Vec::new(), 0, config);

        assert_eq!(bonus.on_spin_start(&start).await, Ok(()));
        assert_eq!(bonus.on_spin_end(&end).await, Ok(()));
        assert_eq!(bonus.info().name, "Inert");
        assert_eq!(bonus.info().description, "");
    }

    #[test]
    fn test_end_context_helpers() {
        let ctx = SpinEndContext::new(3, snapshot(), Vec::new(), 0, Arc::new(EngineConfig::default()));
        assert!(!ctx.is_win());
        assert_eq!(ctx.total_payout(), 0.0);
        assert_eq!(ctx.scatter_count(), 2);
    }
}
