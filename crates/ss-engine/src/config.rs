//! Engine configuration
//!
//! [`EngineConfig`] is an immutable snapshot: the engine holds it in an
//! `Arc` and every setter builds a modified copy, validates it, and swaps it
//! in. A spin reads one snapshot for its whole lifetime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cascade::DEFAULT_MAX_CASCADES;
use crate::error::{EngineError, EngineResult};
use crate::grid::GridSize;
use crate::paytable::Paytable;
use crate::symbols::{SymbolId, SymbolWeights};

/// How a spin resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinStyle {
    /// Refill once, evaluate once
    #[default]
    Regular,
    /// Remove wins, drop, refill and re-evaluate until no wins remain
    Cascading,
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grid: GridSize,
    pub spin_style: SpinStyle,
    /// Reel spin speed, consumed by the presentation layer
    pub spin_speed: f64,
    /// Cascade fall speed, consumed by the presentation layer
    pub fall_speed: f64,
    pub symbol_weights: SymbolWeights,
    /// None = seed from entropy at construction
    pub rng_seed: Option<u32>,
    #[serde(default)]
    pub paytable: Paytable,
    /// Upper bound on cascades per spin
    pub max_cascades: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::standard_5x3(),
            spin_style: SpinStyle::Regular,
            spin_speed: 1.0,
            fall_speed: 1.0,
            symbol_weights: SymbolWeights::default(),
            rng_seed: None,
            paytable: Paytable::default(),
            max_cascades: DEFAULT_MAX_CASCADES,
        }
    }
}

impl EngineConfig {
    /// Default config with a fixed seed
    pub fn seeded(seed: u32) -> Self {
        Self {
            rng_seed: Some(seed),
            ..Self::default()
        }
    }

    /// Builder: spin style
    pub fn with_spin_style(mut self, style: SpinStyle) -> Self {
        self.spin_style = style;
        self
    }

    /// Builder: grid size
    pub fn with_grid(mut self, grid: GridSize) -> Self {
        self.grid = grid;
        self
    }

    /// Check every field
    pub fn validate(&self) -> EngineResult<()> {
        self.grid.validate()?;
        validate_speed("spin speed", self.spin_speed)?;
        validate_speed("fall speed", self.fall_speed)?;
        if self.symbol_weights.is_empty() {
            return Err(EngineError::EmptyWeights);
        }
        self.paytable.validate()?;
        if self.max_cascades == 0 {
            return Err(EngineError::InvalidCascadeCap);
        }
        Ok(())
    }

    /// Apply a patch on top of this config and validate the result
    pub fn merged(&self, patch: &ConfigPatch) -> EngineResult<Self> {
        let mut next = self.clone();
        if let Some(grid) = patch.grid {
            next.grid = grid;
        }
        if let Some(style) = patch.spin_style {
            next.spin_style = style;
        }
        if let Some(speed) = patch.spin_speed {
            next.spin_speed = speed;
        }
        if let Some(speed) = patch.fall_speed {
            next.fall_speed = speed;
        }
        if let Some(ref weights) = patch.symbol_weights {
            next.symbol_weights.merge(weights)?;
        }
        if patch.rng_seed.is_some() {
            next.rng_seed = patch.rng_seed;
        }
        if let Some(ref paytable) = patch.paytable {
            next.paytable = paytable.clone();
        }
        if let Some(cap) = patch.max_cascades {
            next.max_cascades = cap;
        }
        next.validate()?;
        Ok(next)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a complete config from JSON
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_speed(name: &'static str, value: f64) -> EngineResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSpeed { name, value })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARTIAL CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Partial configuration; unset fields keep their current (or default) value.
///
/// `symbol_weights` is merged into the existing table rather than replacing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub grid: Option<GridSize>,
    pub spin_style: Option<SpinStyle>,
    pub spin_speed: Option<f64>,
    pub fall_speed: Option<f64>,
    pub symbol_weights: Option<BTreeMap<SymbolId, f64>>,
    pub rng_seed: Option<u32>,
    pub paytable: Option<Paytable>,
    pub max_cascades: Option<u32>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(mut self, cols: u16, rows: u16) -> Self {
        self.grid = Some(GridSize { cols, rows });
        self
    }

    pub fn spin_style(mut self, style: SpinStyle) -> Self {
        self.spin_style = Some(style);
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn weight(mut self, symbol: SymbolId, weight: f64) -> Self {
        self.symbol_weights
            .get_or_insert_with(BTreeMap::new)
            .insert(symbol, weight);
        self
    }

    pub fn max_cascades(mut self, cap: u32) -> Self {
        self.max_cascades = Some(cap);
        self
    }

    /// Parse from a JSON document
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from a YAML document
    pub fn from_yaml(yaml: &str) -> EngineResult<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Defaults with this patch applied
    pub fn resolve(&self) -> EngineResult<EngineConfig> {
        EngineConfig::default().merged(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.grid, GridSize { cols: 5, rows: 3 });
        assert_eq!(config.spin_style, SpinStyle::Regular);
        assert_eq!(config.rng_seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_patch_merges_weights() {
        let config = ConfigPatch::new()
            .weight(SymbolId::Bear, 50.0)
            .seed(7)
            .resolve()
            .unwrap();
        assert_eq!(config.symbol_weights.get(SymbolId::Bear), Some(50.0));
        assert_eq!(config.symbol_weights.get(SymbolId::Wild), Some(1.0));
        assert_eq!(config.rng_seed, Some(7));
    }

    #[test]
    fn test_patch_rejects_invalid() {
        assert!(matches!(
            ConfigPatch::new().grid(0, 3).resolve(),
            Err(EngineError::InvalidGrid { cols: 0, rows: 3 })
        ));
        assert!(ConfigPatch::new().weight(SymbolId::Elk, 0.0).resolve().is_err());
        assert!(ConfigPatch::new().max_cascades(0).resolve().is_err());

        let patch = ConfigPatch {
            spin_speed: Some(f64::INFINITY),
            ..ConfigPatch::default()
        };
        assert!(matches!(
            patch.resolve(),
            Err(EngineError::InvalidSpeed { name: "spin speed", .. })
        ));
    }

    #[test]
    fn test_patch_rejects_overflowing_weight_total() {
        let patch = ConfigPatch::new()
            .weight(SymbolId::Bear, 1e308)
            .weight(SymbolId::Wolf, 1e308);
        assert_eq!(patch.resolve(), Err(EngineError::WeightTotalOverflow));

        let yaml = "symbol_weights:\n  elk: 1.0e308\n  ace: 1.0e308\n";
        let patch = ConfigPatch::from_yaml(yaml).unwrap();
        assert_eq!(patch.resolve(), Err(EngineError::WeightTotalOverflow));
    }

    #[test]
    fn test_patch_from_json() {
        let patch = ConfigPatch::from_json(
            r#"{
                "grid": {"cols": 6, "rows": 4},
                "spin_style": "cascading",
                "symbol_weights": {"wolf": 12.5}
            }"#,
        )
        .unwrap();
        let config = patch.resolve().unwrap();
        assert_eq!(config.grid.cols, 6);
        assert_eq!(config.spin_style, SpinStyle::Cascading);
        assert_eq!(config.symbol_weights.get(SymbolId::Wolf), Some(12.5));
    }

    #[test]
    fn test_patch_from_yaml() {
        let yaml = "spin_style: cascading\nrng_seed: 42\nfall_speed: 2.5\nsymbol_weights:\n  scatter: 0.5\n";
        let config = ConfigPatch::from_yaml(yaml).unwrap().resolve().unwrap();
        assert_eq!(config.spin_style, SpinStyle::Cascading);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.fall_speed, 2.5);
        assert_eq!(config.symbol_weights.get(SymbolId::Scatter), Some(0.5));
    }

    #[test]
    fn test_bad_document() {
        assert!(matches!(
            ConfigPatch::from_json("{ not json"),
            Err(EngineError::ConfigParse(_))
        ));
        assert!(matches!(
            ConfigPatch::from_json(r#"{"spin_style": "sideways"}"#),
            Err(EngineError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_json_export_import() {
        let config = EngineConfig::seeded(99)
            .with_spin_style(SpinStyle::Cascading)
            .with_grid(GridSize { cols: 6, rows: 4 });
        let json = config.to_json().unwrap();
        let back = EngineConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.grid.total_positions(), 24);
    }
}
