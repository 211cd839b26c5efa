//! Cascade resolution (tumbling reels)
//!
//! ```text
//! Evaluate ──(wins)──> Delete ─> Gravity ─> Refill ─> Evaluate ─> ...
//!     │
//!     └──(no wins)──> Done
//! ```
//!
//! Every pass's wins are accumulated, so a chain reports everything it paid.
//! The chain is bounded by a configurable cap; hitting it logs a warning and
//! marks the report as capped instead of hanging.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::paytable::{Paytable, Position, Win};
use crate::selector::SymbolSelector;

/// Default upper bound on cascades per spin
pub const DEFAULT_MAX_CASCADES: u32 = 250;

/// One evaluate pass inside a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadePass {
    /// 0 = the initial evaluation of the spin
    pub index: u32,
    pub wins: Vec<Win>,
    /// Cells removed after this pass
    pub removed: usize,
    /// Cells refilled after this pass
    pub refilled: usize,
}

/// Outcome of resolving a chain
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Union of all passes' wins, in pass order
    pub wins: Vec<Win>,
    /// Every pass that produced wins
    pub passes: Vec<CascadePass>,
    /// Completed delete→gravity→refill→evaluate iterations
    pub cascades: u32,
    /// The chain was stopped by the cap while wins remained
    pub capped: bool,
}

/// Runs cascade chains on a grid
#[derive(Debug, Clone, Copy)]
pub struct CascadeResolver {
    max_cascades: u32,
}

impl Default for CascadeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CASCADES)
    }
}

impl CascadeResolver {
    /// Create a resolver; a zero cap is treated as 1
    pub fn new(max_cascades: u32) -> Self {
        Self {
            max_cascades: max_cascades.max(1),
        }
    }

    pub fn max_cascades(&self) -> u32 {
        self.max_cascades
    }

    /// Resolve a chain starting from `initial_wins` (the spin's first evaluation).
    ///
    /// On return the grid is full and settled.
    pub fn resolve(
        &self,
        grid: &mut Grid,
        selector: &mut SymbolSelector<'_>,
        paytable: &Paytable,
        initial_wins: Vec<Win>,
    ) -> CascadeReport {
        let mut report = CascadeReport::default();
        let mut current = initial_wins;

        while !current.is_empty() {
            if report.cascades >= self.max_cascades {
                log::warn!(
                    "Cascade chain capped at {} iterations with {} wins pending",
                    self.max_cascades,
                    current.len()
                );
                report.capped = true;
                report.wins.extend(current);
                break;
            }

            let (removed, refilled) = Self::step(grid, selector, &current);
            report.passes.push(CascadePass {
                index: report.cascades,
                wins: current.clone(),
                removed,
                refilled,
            });
            report.wins.extend(current);
            report.cascades += 1;

            current = paytable.evaluate(grid);
            log::debug!(
                "Cascade {}: removed {}, refilled {}, {} new wins",
                report.cascades,
                removed,
                refilled,
                current.len()
            );
        }

        grid.settle();
        report
    }

    /// One delete → gravity → refill iteration. Returns (removed, refilled).
    pub fn step(grid: &mut Grid, selector: &mut SymbolSelector<'_>, wins: &[Win]) -> (usize, usize) {
        grid.settle();
        let positions: Vec<Position> = wins.iter().flat_map(|w| w.cells.iter().copied()).collect();
        let removed = grid.clear(&positions);
        grid.apply_gravity();
        let refilled = grid.fill_empty(selector);
        (removed, refilled)
    }
}
