//! 256-bit entropy values and the sources that supply them.

use anchor_lang::prelude::*;

use crate::constants::SLOT_HASHES_DEPTH;
use crate::SlotError;

pub use self::uint_types::Entropy;

// Kept out of scope of the anchor prelude, whose `Result<T>` alias would
// shadow the `Result<T, E>` the macro expansion relies on.
mod uint_types {
    use uint::construct_uint;

    construct_uint! {
        /// A 256-bit unsigned integer, stored as little-endian `u64` limbs.
        pub struct Entropy(4);
    }
}

impl Entropy {
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self::from_big_endian(&bytes)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        bytes
    }

    /// The lowest `bits` bits (at most 64).
    pub fn low_bits(&self, bits: u32) -> u64 {
        match bits {
            0 => 0,
            b if b >= 64 => self.low_u64(),
            _ => self.low_u64() & ((1u64 << bits) - 1),
        }
    }
}

/// Supplies the entropy for a spin placed at `spin_slot`. The value must not
/// be knowable inside `spin_slot` and must not change afterwards, so every
/// accept inside the window settles the same outcome.
pub trait EntropySource {
    fn entropy_for(&self, player: &Pubkey, spin_slot: u64) -> Result<Entropy>;
}

/// Blake3( player || spin_slot || slot_hash ), read as a big-endian integer.
pub fn slot_hash_seed(player: &Pubkey, spin_slot: u64, slot_hash: &[u8; 32]) -> Entropy {
    let mut hasher = blake3::Hasher::new();
    hasher.update(player.as_ref());
    hasher.update(&spin_slot.to_le_bytes());
    hasher.update(slot_hash);
    Entropy::from_be_bytes(*hasher.finalize().as_bytes())
}

/// On-chain source: the SlotHashes entry of the spin's own slot. That hash
/// only exists once the slot has closed, which is why accept waits a tick,
/// and it stays in the sysvar for `SLOT_HASHES_DEPTH` slots.
pub struct SlotHashEntropy<'a, 'info> {
    slot_hashes: &'a AccountInfo<'info>,
}

impl<'a, 'info> SlotHashEntropy<'a, 'info> {
    pub fn new(slot_hashes: &'a AccountInfo<'info>) -> Self {
        Self { slot_hashes }
    }

    fn hash_of(&self, target_slot: u64) -> Result<[u8; 32]> {
        let data = self.slot_hashes.try_borrow_data()?;
        // Layout: u64 entry count, then (u64 slot, [u8; 32] hash) newest first.
        require!(data.len() >= 8, SlotError::EntropyUnavailable);
        let count = u64::from_le_bytes(read_array(&data[0..8])?) as usize;

        for i in 0..count.min(SLOT_HASHES_DEPTH) {
            let off = 8 + i * 40;
            require!(data.len() >= off + 40, SlotError::EntropyUnavailable);
            let slot = u64::from_le_bytes(read_array(&data[off..off + 8])?);
            if slot == target_slot {
                return read_array(&data[off + 8..off + 40]);
            }
            if slot < target_slot {
                break;
            }
        }
        err!(SlotError::EntropyUnavailable)
    }
}

impl EntropySource for SlotHashEntropy<'_, '_> {
    fn entropy_for(&self, player: &Pubkey, spin_slot: u64) -> Result<Entropy> {
        let slot_hash = self.hash_of(spin_slot)?;
        Ok(slot_hash_seed(player, spin_slot, &slot_hash))
    }
}

fn read_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| error!(SlotError::EntropyUnavailable))
}

/// Deterministic off-chain source keyed by a seed. Used by the simulator to
/// replay long sessions without a validator.
#[derive(Clone, Debug)]
pub struct SeededEntropy {
    seed: [u8; 32],
}

impl SeededEntropy {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed }
    }
}

impl EntropySource for SeededEntropy {
    fn entropy_for(&self, player: &Pubkey, spin_slot: u64) -> Result<Entropy> {
        Ok(slot_hash_seed(player, spin_slot, &self.seed))
    }
}

/// Returns the same value for every player and slot.
#[derive(Clone, Copy, Debug)]
pub struct FixedEntropy(pub Entropy);

impl EntropySource for FixedEntropy {
    fn entropy_for(&self, _player: &Pubkey, _spin_slot: u64) -> Result<Entropy> {
        Ok(self.0)
    }
}

/// Serialised SlotHashes sysvar as seen from a bank at `current_slot`:
/// every slot from `current_slot - 1` down, newest first.
#[cfg(test)]
pub(crate) fn slot_hashes_at(current_slot: u64) -> Vec<u8> {
    let oldest = current_slot.saturating_sub(SLOT_HASHES_DEPTH as u64);
    let slots: Vec<u64> = (oldest..current_slot).rev().collect();

    let mut data = (slots.len() as u64).to_le_bytes().to_vec();
    for slot in slots {
        data.extend_from_slice(&slot.to_le_bytes());
        data.extend_from_slice(blake3::hash(&slot.to_le_bytes()).as_bytes());
    }
    data
}
