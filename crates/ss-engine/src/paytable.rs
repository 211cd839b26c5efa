//! Paytable and win evaluation
//!
//! Wins are horizontal runs: for each row, maximal sequences of adjacent
//! equal symbols scanned left to right. Empty cells break a run and never
//! pay. Evaluation is a pure function of the grid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::grid::Grid;
use crate::symbols::SymbolId;

/// Shortest run that pays
pub const MIN_RUN_LENGTH: usize = 3;

/// Default credits awarded per symbol in a winning run
pub const DEFAULT_CREDITS_PER_SYMBOL: f64 = 10.0;

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub col: u16,
    pub row: u16,
}

impl Position {
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}

/// A single winning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Win {
    /// Symbol forming the run
    pub symbol: SymbolId,
    /// Cells in the run, left to right
    pub cells: Vec<Position>,
    /// Credits awarded
    pub payout: f64,
    /// Row the run was found on
    pub line: Option<u32>,
}

impl Win {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Leftmost column of the run
    pub fn start_col(&self) -> Option<u16> {
        self.cells.first().map(|p| p.col)
    }
}

/// Sum of payouts
pub fn total_payout(wins: &[Win]) -> f64 {
    wins.iter().map(|w| w.payout).sum()
}

/// Payout rules for runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paytable {
    /// Credits per symbol in a qualifying run
    pub credits_per_symbol: f64,
    /// Optional per-symbol factor (missing = 1.0)
    #[serde(default)]
    pub symbol_factors: BTreeMap<SymbolId, f64>,
}

impl Default for Paytable {
    fn default() -> Self {
        Self {
            credits_per_symbol: DEFAULT_CREDITS_PER_SYMBOL,
            symbol_factors: BTreeMap::new(),
        }
    }
}

impl Paytable {
    /// Flat paytable: every run pays `length × credits_per_symbol`
    pub fn flat(credits_per_symbol: f64) -> EngineResult<Self> {
        let table = Self {
            credits_per_symbol,
            symbol_factors: BTreeMap::new(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Builder: set a per-symbol factor
    pub fn with_factor(mut self, symbol: SymbolId, factor: f64) -> Self {
        self.symbol_factors.insert(symbol, factor);
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.credits_per_symbol.is_finite() && self.credits_per_symbol > 0.0) {
            return Err(EngineError::InvalidPaytable(format!(
                "credits_per_symbol must be finite and > 0, got {}",
                self.credits_per_symbol
            )));
        }
        for (symbol, factor) in &self.symbol_factors {
            if !(factor.is_finite() && *factor >= 0.0) {
                return Err(EngineError::InvalidPaytable(format!(
                    "factor for {symbol} must be finite and >= 0, got {factor}"
                )));
            }
        }
        Ok(())
    }

    /// Payout for a run of `length` symbols
    pub fn run_payout(&self, symbol: SymbolId, length: usize) -> f64 {
        if length < MIN_RUN_LENGTH {
            return 0.0;
        }
        let factor = self.symbol_factors.get(&symbol).copied().unwrap_or(1.0);
        length as f64 * self.credits_per_symbol * factor
    }

    /// Evaluate the grid.
    ///
    /// One [`Win`] per qualifying run, ordered by row and then by leftmost
    /// column. The grid is not touched.
    pub fn evaluate(&self, grid: &Grid) -> Vec<Win> {
        let mut wins = Vec::new();
        let cols = grid.cols();

        for row in 0..grid.rows() {
            let mut col = 0;
            while col < cols {
                let Some(symbol) = grid.symbol_at(col, row) else {
                    col += 1;
                    continue;
                };

                let start = col;
                while col < cols && grid.symbol_at(col, row) == Some(symbol) {
                    col += 1;
                }

                let length = col - start;
                if length >= MIN_RUN_LENGTH {
                    wins.push(Win {
                        symbol,
                        cells: (start..col)
                            .map(|c| Position::new(c as u16, row as u16))
                            .collect(),
                        payout: self.run_payout(symbol, length),
                        line: Some(row as u32),
                    });
                }
            }
        }

        wins
    }
}
