//! Reel grid model
//!
//! Column-major storage: `cells[col][row]`, row 0 is the top of the reel.
//! At rest every cell holds a symbol; empty cells only exist between the
//! delete and refill steps of a cascade.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::paytable::Position;
use crate::selector::SymbolSelector;
use crate::symbols::SymbolId;

/// Grid dimensions (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of reels (columns)
    pub cols: u16,
    /// Visible rows per reel
    pub rows: u16,
}

impl GridSize {
    pub fn new(cols: u16, rows: u16) -> EngineResult<Self> {
        let size = Self { cols, rows };
        size.validate()?;
        Ok(size)
    }

    /// Standard 5×3
    pub const fn standard_5x3() -> Self {
        Self { cols: 5, rows: 3 }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(EngineError::InvalidGrid {
                cols: self.cols as usize,
                rows: self.rows as usize,
            });
        }
        Ok(())
    }

    /// Total cell count
    pub fn total_positions(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub symbol: Option<SymbolId>,
    /// Moved or dropped in during the current cascade pass
    pub falling: bool,
}

impl Cell {
    pub fn with_symbol(symbol: SymbolId) -> Self {
        Self {
            symbol: Some(symbol),
            falling: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
    }
}

/// The reel grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: GridSize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// All-empty grid of the given size
    pub fn empty(size: GridSize) -> EngineResult<Self> {
        size.validate()?;
        Ok(Self::blank(size))
    }

    /// Caller has already validated `size`
    pub(crate) fn blank(size: GridSize) -> Self {
        Self {
            size,
            cells: vec![vec![Cell::default(); size.rows as usize]; size.cols as usize],
        }
    }

    /// Build from columns (`columns[col][row]`)
    pub fn from_columns(columns: Vec<Vec<Option<SymbolId>>>) -> EngineResult<Self> {
        let cols = columns.len();
        let rows = columns.first().map(Vec::len).unwrap_or(0);
        if cols == 0 || rows == 0 || cols > u16::MAX as usize || rows > u16::MAX as usize {
            return Err(EngineError::InvalidGrid { cols, rows });
        }
        for (column, cells) in columns.iter().enumerate() {
            if cells.len() != rows {
                return Err(EngineError::RaggedGrid {
                    column,
                    expected: rows,
                    found: cells.len(),
                });
            }
        }
        let cells = columns
            .into_iter()
            .map(|column| {
                column
                    .into_iter()
                    .map(|symbol| Cell {
                        symbol,
                        falling: false,
                    })
                    .collect()
            })
            .collect();
        Ok(Self {
            size: GridSize {
                cols: cols as u16,
                rows: rows as u16,
            },
            cells,
        })
    }

    /// Build a fully populated grid from rows (`rows[row][col]`), as a
    /// player reads it. Convenient for fixtures and editor previews.
    pub fn from_rows(rows: &[Vec<SymbolId>]) -> EngineResult<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(EngineError::RaggedRows {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            for (col, &symbol) in row.iter().enumerate() {
                columns[col].push(Some(symbol));
            }
        }
        Self::from_columns(columns)
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn cols(&self) -> usize {
        self.size.cols as usize
    }

    pub fn rows(&self) -> usize {
        self.size.rows as usize
    }

    /// Cell at (col, row)
    pub fn get(&self, col: usize, row: usize) -> Option<&Cell> {
        self.cells.get(col).and_then(|c| c.get(row))
    }

    /// Symbol at (col, row); None for empty or out of range
    pub fn symbol_at(&self, col: usize, row: usize) -> Option<SymbolId> {
        self.get(col, row).and_then(|c| c.symbol)
    }

    /// Column cells, top to bottom
    pub fn column(&self, col: usize) -> Option<&[Cell]> {
        self.cells.get(col).map(Vec::as_slice)
    }

    /// Every cell holds a symbol
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|c| !c.is_empty())
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_empty()).count()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUTATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replace the matrix with a new one of `size` and fill every cell.
    pub fn resize(&mut self, size: GridSize, selector: &mut SymbolSelector<'_>) -> EngineResult<()> {
        *self = Self::empty(size)?;
        self.fill_all(selector);
        Ok(())
    }

    /// Overwrite every cell with a fresh draw, column by column.
    pub fn fill_all(&mut self, selector: &mut SymbolSelector<'_>) {
        for cell in self.cells.iter_mut().flatten() {
            *cell = Cell::with_symbol(selector.draw());
        }
    }

    /// Fill only the empty cells, marking them as falling. Returns the number filled.
    pub fn fill_empty(&mut self, selector: &mut SymbolSelector<'_>) -> usize {
        let mut filled = 0;
        for cell in self.cells.iter_mut().flatten() {
            if cell.is_empty() {
                *cell = Cell {
                    symbol: Some(selector.draw()),
                    falling: true,
                };
                filled += 1;
            }
        }
        filled
    }

    /// Empty the given cells. Out-of-range positions are ignored.
    pub fn clear(&mut self, positions: &[Position]) -> usize {
        let mut cleared = 0;
        for pos in positions {
            if let Some(cell) = self
                .cells
                .get_mut(pos.col as usize)
                .and_then(|c| c.get_mut(pos.row as usize))
            {
                if !cell.is_empty() {
                    cleared += 1;
                }
                *cell = Cell::default();
            }
        }
        cleared
    }

    /// Compact every column toward the bottom (highest row index).
    ///
    /// Stable: surviving symbols keep their relative order; vacated cells
    /// end up at the top. Cells that moved are flagged as falling.
    /// Returns the number of cells that moved.
    pub fn apply_gravity(&mut self) -> usize {
        let mut moved = 0;
        for column in &mut self.cells {
            let mut write = column.len();
            for read in (0..column.len()).rev() {
                if column[read].is_empty() {
                    continue;
                }
                write -= 1;
                if write != read {
                    column[write] = Cell {
                        symbol: column[read].symbol,
                        falling: true,
                    };
                    column[read] = Cell::default();
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Clear every falling flag
    pub fn settle(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            cell.falling = false;
        }
    }

    /// Positions currently flagged as falling
    pub fn falling_positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for (col, column) in self.cells.iter().enumerate() {
            for (row, cell) in column.iter().enumerate() {
                if cell.falling {
                    out.push(Position::new(col as u16, row as u16));
                }
            }
        }
        out
    }

    /// Read-only deep copy of the symbols
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            columns: self
                .cells
                .iter()
                .map(|column| column.iter().map(|c| c.symbol).collect())
                .collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOT
// ═══════════════════════════════════════════════════════════════════════════════

/// Detached copy of the grid symbols for renderers, bonuses and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// `columns[col][row]`
    pub columns: Vec<Vec<Option<SymbolId>>>,
}

impl GridSnapshot {
    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn get(&self, col: usize, row: usize) -> Option<SymbolId> {
        self.columns.get(col).and_then(|c| c.get(row)).copied().flatten()
    }

    pub fn column(&self, col: usize) -> Option<&[Option<SymbolId>]> {
        self.columns.get(col).map(Vec::as_slice)
    }

    /// One row, left to right
    pub fn row(&self, row: usize) -> Vec<Option<SymbolId>> {
        self.columns
            .iter()
            .map(|c| c.get(row).copied().flatten())
            .collect()
    }

    /// Occurrences of a symbol anywhere on the grid
    pub fn count(&self, symbol: SymbolId) -> usize {
        self.columns
            .iter()
            .flatten()
            .filter(|s| **s == Some(symbol))
            .count()
    }

    pub fn positions_of(&self, symbol: SymbolId) -> Vec<Position> {
        let mut out = Vec::new();
        for (col, column) in self.columns.iter().enumerate() {
            for (row, s) in column.iter().enumerate() {
                if *s == Some(symbol) {
                    out.push(Position::new(col as u16, row as u16));
                }
            }
        }
        out
    }

    /// No empty cells
    pub fn is_settled(&self) -> bool {
        self.columns.iter().flatten().all(Option::is_some)
    }
}
