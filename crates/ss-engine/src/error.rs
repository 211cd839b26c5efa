//! Error types for the reel engine

use thiserror::Error;

use crate::bonus::BonusId;
use crate::symbols::SymbolId;

/// Engine error type
///
/// Every setter validates its input and returns one of these instead of
/// accepting a configuration that would corrupt later spins. A rejected
/// call leaves the engine unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid grid size: {cols}x{rows} (both dimensions must be > 0)")]
    InvalidGrid { cols: usize, rows: usize },

    #[error("Ragged grid: column {column} has {found} rows, expected {expected}")]
    RaggedGrid {
        column: usize,
        expected: usize,
        found: usize,
    },

    #[error("Ragged grid: row {row} has {found} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Symbol weight table is empty")]
    EmptyWeights,

    #[error("Invalid weight for {symbol}: {weight} (must be finite and > 0)")]
    InvalidWeight { symbol: SymbolId, weight: f64 },

    #[error("Symbol weight total is not finite")]
    WeightTotalOverflow,

    #[error("Invalid {name}: {value} (must be finite and > 0)")]
    InvalidSpeed { name: &'static str, value: f64 },

    #[error("Invalid paytable: {0}")]
    InvalidPaytable(String),

    #[error("Cascade cap must be at least 1")]
    InvalidCascadeCap,

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Bonus already registered: {0}")]
    BonusAlreadyRegistered(BonusId),

    #[error("Bonus not found: {0}")]
    BonusNotFound(BonusId),

    #[error("Config parse error: {0}")]
    ConfigParse(String),
}

/// Result type alias
pub type EngineResult<T> = Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::ConfigParse(e.to_string())
    }
}

impl From<serde_yml::Error> for EngineError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigParse(e.to_string())
    }
}
