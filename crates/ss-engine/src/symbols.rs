//! Symbol vocabulary and weight table

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Symbol identifier
///
/// Declaration order is the iteration order of every weight table, which
/// keeps weighted selection deterministic for a given seed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SymbolId {
    Bear = 0,
    Wolf = 1,
    Buffalo = 2,
    Elk = 3,
    Nine = 4,
    Ten = 5,
    Jack = 6,
    Queen = 7,
    King = 8,
    Ace = 9,
    /// Counted anywhere on the grid by bonuses
    Scatter = 10,
    Wild = 11,
}

impl SymbolId {
    /// All symbols in declaration order
    pub const ALL: [SymbolId; 12] = [
        SymbolId::Bear,
        SymbolId::Wolf,
        SymbolId::Buffalo,
        SymbolId::Elk,
        SymbolId::Nine,
        SymbolId::Ten,
        SymbolId::Jack,
        SymbolId::Queen,
        SymbolId::King,
        SymbolId::Ace,
        SymbolId::Scatter,
        SymbolId::Wild,
    ];

    /// Lowercase name, matching the serialized form
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bear => "bear",
            Self::Wolf => "wolf",
            Self::Buffalo => "buffalo",
            Self::Elk => "elk",
            Self::Nine => "nine",
            Self::Ten => "ten",
            Self::Jack => "jack",
            Self::Queen => "queen",
            Self::King => "king",
            Self::Ace => "ace",
            Self::Scatter => "scatter",
            Self::Wild => "wild",
        }
    }

    /// Short label as printed on the reel (card ranks use their rank)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ace => "A",
            other => other.name(),
        }
    }

    /// Is this one of the animal (high paying) symbols?
    pub fn is_animal(&self) -> bool {
        matches!(self, Self::Bear | Self::Wolf | Self::Buffalo | Self::Elk)
    }

    /// Is this a card-rank (low paying) symbol?
    pub fn is_card(&self) -> bool {
        matches!(
            self,
            Self::Nine | Self::Ten | Self::Jack | Self::Queen | Self::King | Self::Ace
        )
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymbolId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        SymbolId::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(needle) || id.label() == needle)
            .ok_or_else(|| EngineError::UnknownSymbol(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEIGHT TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Relative draw weights per symbol
///
/// Invariants: never empty, every weight finite and > 0. Both are enforced
/// at construction and on every merge, so selection can never degenerate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SymbolWeights(BTreeMap<SymbolId, f64>);

impl SymbolWeights {
    /// Build a table from explicit entries
    pub fn new(entries: impl IntoIterator<Item = (SymbolId, f64)>) -> EngineResult<Self> {
        let map: BTreeMap<SymbolId, f64> = entries.into_iter().collect();
        if map.is_empty() {
            return Err(EngineError::EmptyWeights);
        }
        for (&symbol, &weight) in &map {
            validate_weight(symbol, weight)?;
        }
        validate_total(&map)?;
        Ok(Self(map))
    }

    /// Merge a partial update into the table.
    ///
    /// All entries and the merged total are validated before anything is
    /// written, so a bad entry rejects the whole update.
    pub fn merge(&mut self, partial: &BTreeMap<SymbolId, f64>) -> EngineResult<()> {
        for (&symbol, &weight) in partial {
            validate_weight(symbol, weight)?;
        }
        let mut merged = self.0.clone();
        merged.extend(partial.iter().map(|(&s, &w)| (s, w)));
        validate_total(&merged)?;
        self.0 = merged;
        Ok(())
    }

    /// Weight of a symbol (None if absent from the table)
    pub fn get(&self, symbol: SymbolId) -> Option<f64> {
        self.0.get(&symbol).copied()
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Draw probability of a symbol
    pub fn probability(&self, symbol: SymbolId) -> f64 {
        self.get(symbol).map(|w| w / self.total()).unwrap_or(0.0)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, f64)> + '_ {
        self.0.iter().map(|(&s, &w)| (s, w))
    }

    /// Last symbol in iteration order (selection fallback)
    pub fn last_symbol(&self) -> SymbolId {
        // Non-empty by construction
        self.0
            .keys()
            .next_back()
            .copied()
            .unwrap_or(SymbolId::Wild)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow as a plain map
    pub fn as_map(&self) -> &BTreeMap<SymbolId, f64> {
        &self.0
    }
}

impl Default for SymbolWeights {
    /// Animals are rarer than card ranks; wild and scatter are rarest.
    fn default() -> Self {
        Self(BTreeMap::from([
            (SymbolId::Bear, 4.0),
            (SymbolId::Wolf, 5.0),
            (SymbolId::Buffalo, 5.0),
            (SymbolId::Elk, 6.0),
            (SymbolId::Nine, 10.0),
            (SymbolId::Ten, 10.0),
            (SymbolId::Jack, 9.0),
            (SymbolId::Queen, 8.0),
            (SymbolId::King, 7.0),
            (SymbolId::Ace, 6.0),
            (SymbolId::Scatter, 2.0),
            (SymbolId::Wild, 1.0),
        ]))
    }
}

impl<'de> Deserialize<'de> for SymbolWeights {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<SymbolId, f64>::deserialize(deserializer)?;
        Self::new(map).map_err(serde::de::Error::custom)
    }
}

/// A total that overflows to infinity would make every draw fall through
/// to the last symbol.
fn validate_total(map: &BTreeMap<SymbolId, f64>) -> EngineResult<()> {
    if map.values().sum::<f64>().is_finite() {
        Ok(())
    } else {
        Err(EngineError::WeightTotalOverflow)
    }
}

fn validate_weight(symbol: SymbolId, weight: f64) -> EngineResult<()> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidWeight { symbol, weight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order() {
        let weights = SymbolWeights::default();
        let order: Vec<SymbolId> = weights.iter().map(|(s, _)| s).collect();
        assert_eq!(order, SymbolId::ALL.to_vec());
        assert_eq!(weights.last_symbol(), SymbolId::Wild);
    }

    #[test]
    fn test_parse_names_and_labels() {
        assert_eq!("bear".parse::<SymbolId>().unwrap(), SymbolId::Bear);
        assert_eq!("Buffalo".parse::<SymbolId>().unwrap(), SymbolId::Buffalo);
        assert_eq!("10".parse::<SymbolId>().unwrap(), SymbolId::Ten);
        assert_eq!("Q".parse::<SymbolId>().unwrap(), SymbolId::Queen);
        assert!(matches!(
            "moose".parse::<SymbolId>(),
            Err(EngineError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&SymbolId::Scatter).unwrap();
        assert_eq!(json, "\"scatter\"");
        let back: SymbolId = serde_json::from_str("\"elk\"").unwrap();
        assert_eq!(back, SymbolId::Elk);
    }

    #[test]
    fn test_merge_is_partial() {
        let mut weights = SymbolWeights::default();
        weights
            .merge(&BTreeMap::from([(SymbolId::Bear, 20.0)]))
            .unwrap();
        assert_eq!(weights.get(SymbolId::Bear), Some(20.0));
        assert_eq!(weights.get(SymbolId::Wolf), Some(5.0));
        assert_eq!(weights.len(), 12);
    }

    #[test]
    fn test_merge_rejects_whole_update() {
        let mut weights = SymbolWeights::default();
        let before = weights.clone();
        let result = weights.merge(&BTreeMap::from([
            (SymbolId::Bear, 3.0),
            (SymbolId::Wolf, 0.0),
        ]));
        assert!(matches!(
            result,
            Err(EngineError::InvalidWeight { symbol: SymbolId::Wolf, .. })
        ));
        assert_eq!(weights, before);
    }

    #[test]
    fn test_new_rejects_empty_and_negative() {
        assert_eq!(
            SymbolWeights::new(Vec::new()),
            Err(EngineError::EmptyWeights)
        );
        assert!(SymbolWeights::new([(SymbolId::Elk, -1.0)]).is_err());
        assert!(SymbolWeights::new([(SymbolId::Elk, f64::NAN)]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: SymbolWeights = serde_json::from_str(r#"{"bear": 1.0, "wild": 2.0}"#).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<SymbolWeights>(r#"{"bear": -1.0}"#).is_err());
        assert!(serde_json::from_str::<SymbolWeights>("{}").is_err());
    }

    #[test]
    fn test_overflowing_total_rejected() {
        assert_eq!(
            SymbolWeights::new([(SymbolId::Bear, 1e308), (SymbolId::Wolf, 1e308)]),
            Err(EngineError::WeightTotalOverflow)
        );

        let mut weights = SymbolWeights::default();
        let before = weights.clone();
        let result = weights.merge(&BTreeMap::from([
            (SymbolId::Bear, 1e308),
            (SymbolId::Wolf, 1e308),
        ]));
        assert_eq!(result, Err(EngineError::WeightTotalOverflow));
        assert_eq!(weights, before);
        assert!(serde_json::from_str::<SymbolWeights>(r#"{"bear": 1e308, "elk": 1e308}"#).is_err());
    }

    #[test]
    fn test_symbol_classes() {
        let animals: Vec<SymbolId> = SymbolId::ALL.into_iter().filter(SymbolId::is_animal).collect();
        assert_eq!(
            animals,
            vec![SymbolId::Bear, SymbolId::Wolf, SymbolId::Buffalo, SymbolId::Elk]
        );
        assert_eq!(SymbolId::ALL.iter().filter(|s| s.is_card()).count(), 6);
        assert!(!SymbolId::Scatter.is_animal() && !SymbolId::Scatter.is_card());
        assert!(!SymbolId::Wild.is_card());
    }

    #[test]
    fn test_as_map_matches_iter() {
        let weights = SymbolWeights::default();
        let map = weights.as_map();
        assert_eq!(map.len(), weights.len());
        assert_eq!(map.get(&SymbolId::Nine), Some(&10.0));
        assert_eq!(map.values().sum::<f64>(), weights.total());
    }

    #[test]
    fn test_probability() {
        let weights = SymbolWeights::new([(SymbolId::Bear, 1.0), (SymbolId::Wolf, 3.0)]).unwrap();
        assert!((weights.probability(SymbolId::Wolf) - 0.75).abs() < 1e-12);
        assert_eq!(weights.probability(SymbolId::Elk), 0.0);
    }
}
