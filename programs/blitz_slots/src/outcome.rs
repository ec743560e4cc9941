use anchor_lang::prelude::*;

use crate::constants::{REEL_COUNT, SLICE_BITS};
use crate::entropy::Entropy;
use crate::reels::{sample_reel, ReelPosition};

/// Symbols landed on the three reels plus whatever entropy was not consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub left:              u8,
    pub center:            u8,
    pub right:             u8,
    pub remaining_entropy: Entropy,
}

impl Outcome {
    pub fn symbols(&self) -> (u8, u8, u8) {
        (self.left, self.center, self.right)
    }
}

/// Resolves a spin. Slices are taken lowest bits first: left, center, right.
/// The same boost flag selects the strip for every reel.
pub fn resolve(entropy: Entropy, boosted: bool) -> Result<Outcome> {
    let mut remaining = entropy;
    let mut symbols = [0u8; REEL_COUNT];

    for (symbol, reel) in symbols.iter_mut().zip(ReelPosition::ALL) {
        let slice = remaining.low_bits(SLICE_BITS) as u32;
        *symbol = sample_reel(reel, boosted, slice)?;
        remaining = remaining >> SLICE_BITS;
    }

    Ok(Outcome {
        left:              symbols[0],
        center:            symbols[1],
        right:             symbols[2],
        remaining_entropy: remaining,
    })
}
