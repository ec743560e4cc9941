//! Per-player spin/respin/accept lifecycle.
//!
//! Everything here is pure over a `SessionRecord`: the program and the
//! simulator both load a record, run one of these transitions, and write it
//! back only on success. Each transition checks every precondition before
//! touching the record, so an `Err` leaves it exactly as it was.

use anchor_lang::prelude::*;

use crate::constants::MAX_BLOCKS_TO_ACT;
use crate::entropy::EntropySource;
use crate::outcome::{resolve, Outcome};
use crate::payout::payout;
use crate::SlotError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    pub blocks_to_act:  u64, // slots after a spin during which respin/accept are open
    pub cost_to_spin:   u64, // lamports, fresh spin
    pub cost_to_respin: u64, // lamports, spin inside the window
}

impl MachineConfig {
    pub const LEN: usize = 8 * 3;

    pub fn validate(&self) -> Result<()> {
        require!(self.cost_to_spin > 0,                     SlotError::InvalidPricing);
        require!(self.cost_to_respin <= self.cost_to_spin,  SlotError::InvalidPricing);
        require!(self.blocks_to_act > 0,                    SlotError::InvalidWindow);
        require!(self.blocks_to_act <= MAX_BLOCKS_TO_ACT,   SlotError::InvalidWindow);
        Ok(())
    }

    /// Last slot (inclusive) at which the player may still respin or accept.
    pub fn acting_deadline(&self, record: &SessionRecord) -> u64 {
        record.last_action_slot.saturating_add(self.blocks_to_act)
    }

    pub fn spin_cost(&self, record: &SessionRecord, slot: u64) -> u64 {
        if slot <= self.acting_deadline(record) {
            self.cost_to_respin
        } else {
            self.cost_to_spin
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub last_action_slot:    u64,
    pub last_action_boosted: bool,
    pub pending:             bool, // a spin is waiting to be accepted
}

impl SessionRecord {
    pub const LEN: usize = 8 + 1 + 1;

    /// The record of a player who has never spun.
    pub fn fresh() -> Self {
        Self {
            last_action_slot:    0,
            last_action_boosted: false,
            pending:             false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpinReceipt {
    pub price: u64,
    pub paid:  u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub outcome: Outcome,
    pub boosted: bool,
    pub amount:  u64,
}

/// Records a spin. The whole `value` is staked; anything above the quoted
/// price is absorbed by the pool.
pub fn spin(
    config:  &MachineConfig,
    record:  &mut SessionRecord,
    slot:    u64,
    boosted: bool,
    value:   u64,
) -> Result<SpinReceipt> {
    let price = config.spin_cost(record, slot);
    require!(value >= price, SlotError::InsufficientValue);

    record.last_action_slot    = slot;
    record.last_action_boosted = boosted;
    record.pending             = true;
    Ok(SpinReceipt { price, paid: value })
}

pub fn check_accept(config: &MachineConfig, record: &SessionRecord, slot: u64) -> Result<()> {
    require!(record.pending,                          SlotError::NoPendingSpin);
    require!(slot > record.last_action_slot,          SlotError::WaitForTick);
    require!(slot <= config.acting_deadline(record),  SlotError::DeadlineExceeded);
    Ok(())
}

/// Settles the pending spin against the pool balance observed at `slot`.
/// Entropy is keyed by the spin's slot, not `slot`, so the outcome does not
/// depend on when inside the window the player accepts. The caller moves
/// `amount` from the pool to the player.
pub fn accept<E: EntropySource + ?Sized>(
    config: &MachineConfig,
    record: &mut SessionRecord,
    player: &Pubkey,
    slot:   u64,
    source: &E,
    pool_balance: u64,
) -> Result<Settlement> {
    check_accept(config, record, slot)?;

    let entropy = source.entropy_for(player, record.last_action_slot)?;
    let boosted = record.last_action_boosted;
    let outcome = resolve(entropy, boosted)?;
    let amount  = payout(
        outcome.left,
        outcome.center,
        outcome.right,
        config.cost_to_spin,
        pool_balance,
    );

    record.pending = false;
    Ok(Settlement { outcome, boosted, amount })
}
