//! Weighted symbol selection

use crate::rng::Xorshift32;
use crate::symbols::{SymbolId, SymbolWeights};

/// Draws symbols from a weight table using the engine RNG.
///
/// One call to [`SymbolSelector::draw`] consumes exactly one RNG value, so
/// the number of draws per spin (and therefore replay) depends only on the
/// grid shape and the cascade chain.
pub struct SymbolSelector<'a> {
    weights: &'a SymbolWeights,
    rng: &'a mut Xorshift32,
}

impl<'a> SymbolSelector<'a> {
    pub fn new(weights: &'a SymbolWeights, rng: &'a mut Xorshift32) -> Self {
        Self { weights, rng }
    }

    /// Draw one symbol
    pub fn draw(&mut self) -> SymbolId {
        let r = self.rng.next_f64();
        Self::pick(self.weights, r)
    }

    /// Map a draw in [0, 1) onto the weight table.
    ///
    /// Walks symbols in declaration order subtracting each weight from
    /// `draw * total`; the first symbol that brings the remainder to <= 0 is
    /// returned. Float drift that leaves a positive remainder falls back to
    /// the last symbol.
    pub fn pick(weights: &SymbolWeights, draw: f64) -> SymbolId {
        let mut t = draw * weights.total();
        for (symbol, weight) in weights.iter() {
            t -= weight;
            if t <= 0.0 {
                return symbol;
            }
        }
        weights.last_symbol()
    }

    pub fn weights(&self) -> &SymbolWeights {
        self.weights
    }
}
