//! # ss-engine — Reel Grid Engine for Slot Studio
//!
//! Deterministic reel-grid core: weighted symbol draws from a seeded RNG,
//! horizontal run evaluation, cascading (tumbling) resolution and async bonus
//! hooks around each spin. Rendering, audio and wagering live elsewhere.
//!
//! ## Features
//!
//! - **Deterministic RNG**: xorshift32, same seed gives the same session
//! - **Weighted Symbols**: 12 symbols (animals, card ranks, scatter, wild)
//! - **Win Evaluation**: runs of 3+ equal symbols along each row
//! - **Cascades**: delete, gravity, refill, re-evaluate with a safety cap
//! - **Bonus Hooks**: free spins, progressive multiplier, or your own
//!
//! ## Architecture
//!
//! ```text
//! ReelEngine
//!     │
//!     ├── EngineConfig (grid, style, speeds, weights, paytable)
//!     ├── Grid ◄── SymbolSelector ◄── Xorshift32
//!     ├── Paytable::evaluate → Vec<Win>
//!     ├── CascadeResolver (cascading style)
//!     └── BonusRegistry (on_spin_start / on_spin_end)
//!           │
//!           v
//!     SpinOutcome { wins, cascades }
//! ```

pub mod bonus;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod paytable;
pub mod rng;
pub mod selector;
pub mod symbols;

pub use bonus::*;
pub use cascade::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use grid::*;
pub use paytable::*;
pub use rng::*;
pub use selector::*;
pub use symbols::*;
