//! Bonus hooks
//!
//! A bonus observes each spin through two async hooks: one before the grid
//! refills and one after it settles. Bonuses are registered on the engine in
//! order and invoked in that order. A failing hook is logged and skipped; it
//! never aborts the spin or the hooks after it.

mod free_spins;
mod hook;
mod multiplier;
mod registry;

pub use free_spins::{FreeSpinsBonus, FreeSpinsConfig, FreeSpinsStatus};
pub use hook::{
    Bonus, BonusError, BonusId, BonusInfo, BonusResult, SharedBonus, SpinEndContext,
    SpinStartContext,
};
pub use multiplier::{MultiplierBonus, MultiplierConfig};
pub use registry::BonusRegistry;
