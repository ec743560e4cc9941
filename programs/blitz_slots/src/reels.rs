//! Weighted reel strips and the inverse-CDF sampler.
//!
//! Each reel position has two strips: the unmodified one used for regular
//! spins and an improved one used for boosted spins. Strips are written as
//! integer symbol weights and folded into cumulative thresholds over
//! `TOTAL_MASS` at compile time, so the last threshold is always exactly
//! `TOTAL_MASS` and lookups never recompute sums.

use anchor_lang::prelude::*;

use crate::constants::{SLICE_MASK, SYMBOL_COUNT, TOTAL_MASS};
use crate::SlotError;

pub type DistributionTable = [u32; SYMBOL_COUNT];
pub type SymbolWeights     = [u32; SYMBOL_COUNT];

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReelPosition {
    Left,
    Center,
    Right,
}

impl ReelPosition {
    pub const ALL: [ReelPosition; 3] = [ReelPosition::Left, ReelPosition::Center, ReelPosition::Right];
}

// ── Symbol weights (per 1000) ─────────────────────────────────────────────
// Low indices are the rare, high-paying symbols. The improved strips move
// weight off the two filler symbols (17, 18) onto indices 0..=8.

pub const UNMODIFIED_LEFT_WEIGHTS: SymbolWeights =
    [ 8, 24, 88, 35, 35, 35, 35, 35, 35, 35, 35, 35, 35, 35, 35, 45, 65, 135, 215];
pub const UNMODIFIED_CENTER_WEIGHTS: SymbolWeights =
    [ 6, 20, 75, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 45, 65, 141, 216];
pub const UNMODIFIED_RIGHT_WEIGHTS: SymbolWeights =
    [ 8, 24, 90, 35, 35, 35, 35, 35, 35, 35, 35, 35, 35, 35, 35, 45, 65, 134, 214];

pub const IMPROVED_LEFT_WEIGHTS: SymbolWeights =
    [20, 50, 95, 60, 60, 55, 55, 45, 45, 40, 35, 35, 30, 30, 30, 40, 50, 100, 125];
pub const IMPROVED_CENTER_WEIGHTS: SymbolWeights =
    [18, 46, 90, 60, 60, 55, 55, 45, 45, 40, 35, 35, 30, 30, 30, 40, 50, 106, 130];
pub const IMPROVED_RIGHT_WEIGHTS: SymbolWeights =
    [22, 48, 95, 60, 60, 55, 55, 45, 45, 40, 35, 35, 30, 30, 30, 40, 50, 101, 124];

// ── Cumulative tables ─────────────────────────────────────────────────────

pub const UNMODIFIED_LEFT_REEL:   DistributionTable = cumulative(&UNMODIFIED_LEFT_WEIGHTS);
pub const UNMODIFIED_CENTER_REEL: DistributionTable = cumulative(&UNMODIFIED_CENTER_WEIGHTS);
pub const UNMODIFIED_RIGHT_REEL:  DistributionTable = cumulative(&UNMODIFIED_RIGHT_WEIGHTS);
pub const IMPROVED_LEFT_REEL:     DistributionTable = cumulative(&IMPROVED_LEFT_WEIGHTS);
pub const IMPROVED_CENTER_REEL:   DistributionTable = cumulative(&IMPROVED_CENTER_WEIGHTS);
pub const IMPROVED_RIGHT_REEL:    DistributionTable = cumulative(&IMPROVED_RIGHT_WEIGHTS);

/// Folds symbol weights into thresholds `floor(running_sum * TOTAL_MASS / total)`.
/// The final running sum equals the total, so the last entry is `TOTAL_MASS`
/// with no rounding drift regardless of the weights chosen.
pub const fn cumulative(weights: &SymbolWeights) -> DistributionTable {
    let mut total: u64 = 0;
    let mut i = 0;
    while i < SYMBOL_COUNT {
        total += weights[i] as u64;
        i += 1;
    }
    assert!(total > 0, "reel strip has no weight");

    let mut table = [0u32; SYMBOL_COUNT];
    let mut running: u64 = 0;
    let mut i = 0;
    while i < SYMBOL_COUNT {
        running += weights[i] as u64;
        table[i] = (running * TOTAL_MASS as u64 / total) as u32;
        i += 1;
    }
    table
}

pub fn table(reel: ReelPosition, boosted: bool) -> &'static DistributionTable {
    match (reel, boosted) {
        (ReelPosition::Left,   false) => &UNMODIFIED_LEFT_REEL,
        (ReelPosition::Center, false) => &UNMODIFIED_CENTER_REEL,
        (ReelPosition::Right,  false) => &UNMODIFIED_RIGHT_REEL,
        (ReelPosition::Left,   true)  => &IMPROVED_LEFT_REEL,
        (ReelPosition::Center, true)  => &IMPROVED_CENTER_REEL,
        (ReelPosition::Right,  true)  => &IMPROVED_RIGHT_REEL,
    }
}

/// Inverse-CDF lookup: the smallest index whose threshold lies above the
/// 30-bit slice. The all-ones slice equals `TOTAL_MASS` and falls past every
/// threshold, so it is assigned to the last bucket when the table closes at
/// `TOTAL_MASS`.
pub fn sample(table: &DistributionTable, slice: u32) -> Result<u8> {
    let point = slice & SLICE_MASK;
    if let Some(index) = table.iter().position(|&threshold| point < threshold) {
        return Ok(index as u8);
    }
    require!(
        point == TOTAL_MASS && table[SYMBOL_COUNT - 1] == TOTAL_MASS,
        SlotError::OutcomeOutOfBounds
    );
    Ok((SYMBOL_COUNT - 1) as u8)
}

pub fn sample_reel(reel: ReelPosition, boosted: bool, slice: u32) -> Result<u8> {
    sample(table(reel, boosted), slice)
}

pub fn sample_unmodified_left_reel(slice: u32) -> Result<u8> {
    sample(&UNMODIFIED_LEFT_REEL, slice)
}

pub fn sample_unmodified_center_reel(slice: u32) -> Result<u8> {
    sample(&UNMODIFIED_CENTER_REEL, slice)
}

pub fn sample_unmodified_right_reel(slice: u32) -> Result<u8> {
    sample(&UNMODIFIED_RIGHT_REEL, slice)
}

pub fn sample_improved_left_reel(slice: u32) -> Result<u8> {
    sample(&IMPROVED_LEFT_REEL, slice)
}

pub fn sample_improved_center_reel(slice: u32) -> Result<u8> {
    sample(&IMPROVED_CENTER_REEL, slice)
}

pub fn sample_improved_right_reel(slice: u32) -> Result<u8> {
    sample(&IMPROVED_RIGHT_REEL, slice)
}
