//! Host-side replay of the machine.
//!
//! Holds the same state the program keeps in accounts (pool, per-player
//! session records, bonus credits) in plain keyed maps, plus player wallets
//! and the notification log. Every operation is all-or-nothing: it validates
//! against a copy, then commits.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::constants::CREDITS_PER_BOOST;
use crate::entropy::EntropySource;
use crate::payout;
use crate::session::{self, MachineConfig, SessionRecord, Settlement, SpinReceipt};
use crate::SlotError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    Spin {
        player:  Pubkey,
        boosted: bool,
        price:   u64,
        paid:    u64,
        slot:    u64,
    },
    Award {
        player: Pubkey,
        amount: u64,
    },
}

pub struct Simulator<E> {
    config:        MachineConfig,
    source:        E,
    slot:          u64,
    pool:          u64,
    wallets:       BTreeMap<Pubkey, u64>,
    sessions:      BTreeMap<Pubkey, SessionRecord>,
    bonus_credits: BTreeMap<Pubkey, u64>,
    notifications: Vec<Notification>,
}

impl<E: EntropySource> Simulator<E> {
    pub fn new(config: MachineConfig, source: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            slot:          0,
            pool:          0,
            wallets:       BTreeMap::new(),
            sessions:      BTreeMap::new(),
            bonus_credits: BTreeMap::new(),
            notifications: Vec::new(),
        })
    }

    // ── Environment ───────────────────────────────────────────────────────

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn set_slot(&mut self, slot: u64) {
        self.slot = slot;
    }

    pub fn advance(&mut self, slots: u64) {
        self.slot = self.slot.saturating_add(slots);
    }

    pub fn fund_pool(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, SlotError::InvalidAmount);
        self.pool = self.pool.checked_add(amount).ok_or(SlotError::AccountingBroken)?;
        Ok(())
    }

    pub fn deposit(&mut self, player: Pubkey, amount: u64) -> Result<()> {
        let wallet = self.wallets.entry(player).or_insert(0);
        *wallet = wallet.checked_add(amount).ok_or(SlotError::AccountingBroken)?;
        Ok(())
    }

    pub fn grant_bonus(&mut self, player: Pubkey, credits: u64) -> Result<()> {
        require!(credits > 0, SlotError::InvalidAmount);
        let held = self.bonus_credits.entry(player).or_insert(0);
        *held = held.checked_add(credits).ok_or(SlotError::AccountingBroken)?;
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn pool_balance(&self) -> u64 {
        self.pool
    }

    pub fn balance_of(&self, player: &Pubkey) -> u64 {
        self.wallets.get(player).copied().unwrap_or(0)
    }

    pub fn bonus_credits_of(&self, player: &Pubkey) -> u64 {
        self.bonus_credits.get(player).copied().unwrap_or(0)
    }

    /// The stored record, or the zero record for a player who never spun.
    pub fn session(&self, player: &Pubkey) -> SessionRecord {
        self.sessions.get(player).copied().unwrap_or_else(SessionRecord::fresh)
    }

    pub fn spin_cost(&self, player: &Pubkey) -> u64 {
        self.config.spin_cost(&self.session(player), self.slot)
    }

    /// Award the combination would pay against the pool right now.
    pub fn payout(&self, left: u8, center: u8, right: u8) -> u64 {
        payout::payout(left, center, right, self.config.cost_to_spin, self.pool)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    // ── Player actions ────────────────────────────────────────────────────

    pub fn spin(&mut self, player: Pubkey, boosted: bool, value: u64) -> Result<SpinReceipt> {
        let wallet = self.balance_of(&player);
        require!(wallet >= value, SlotError::InsufficientFunds);

        let credits = self.bonus_credits_of(&player);
        if boosted {
            require!(credits >= CREDITS_PER_BOOST, SlotError::BonusCreditRequired);
        }
        let pool = self.pool.checked_add(value).ok_or(SlotError::AccountingBroken)?;

        let mut record = self.session(&player);
        let receipt = session::spin(&self.config, &mut record, self.slot, boosted, value)?;

        self.wallets.insert(player, wallet - value);
        self.pool = pool;
        if boosted {
            self.bonus_credits.insert(player, credits - CREDITS_PER_BOOST);
        }
        self.sessions.insert(player, record);
        self.notifications.push(Notification::Spin {
            player,
            boosted,
            price: receipt.price,
            paid:  receipt.paid,
            slot:  self.slot,
        });
        Ok(receipt)
    }

    pub fn accept(&mut self, player: Pubkey) -> Result<Settlement> {
        let mut record = self.session(&player);
        let settlement = session::accept(
            &self.config,
            &mut record,
            &player,
            self.slot,
            &self.source,
            self.pool,
        )?;

        let pool = self
            .pool
            .checked_sub(settlement.amount)
            .ok_or(SlotError::AccountingBroken)?;
        let wallet = self
            .balance_of(&player)
            .checked_add(settlement.amount)
            .ok_or(SlotError::AccountingBroken)?;

        self.pool = pool;
        self.wallets.insert(player, wallet);
        self.sessions.insert(player, record);
        if settlement.amount > 0 {
            self.notifications.push(Notification::Award { player, amount: settlement.amount });
        }
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{Entropy, FixedEntropy, SeededEntropy};
    use anchor_lang::error::Error;

    const SPIN:   u64 = 100_000_000; // 0.1 SOL
    const RESPIN: u64 = 70_000_000;  // 0.07 SOL
    const WINDOW: u64 = 20;

    fn config() -> MachineConfig {
        MachineConfig { blocks_to_act: WINDOW, cost_to_spin: SPIN, cost_to_respin: RESPIN }
    }

    fn triple_two() -> FixedEntropy {
        FixedEntropy(Entropy::from(143_946_520_351_854_296_877_309_383u128))
    }

    fn machine<E: EntropySource>(source: E, pool: u64) -> (Simulator<E>, Pubkey) {
        let mut sim = Simulator::new(config(), source).unwrap();
        if pool > 0 {
            sim.fund_pool(pool).unwrap();
        }
        let player = Pubkey::new_unique();
        sim.deposit(player, 10 * SPIN).unwrap();
        (sim, player)
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = MachineConfig { cost_to_respin: SPIN * 2, ..config() };
        assert!(Simulator::new(bad, triple_two()).is_err());
    }

    #[test]
    fn pricing_window_for_a_new_player() {
        let (mut sim, player) = machine(triple_two(), 0);
        for slot in 1..=WINDOW {
            sim.set_slot(slot);
            assert_eq!(sim.spin_cost(&player), RESPIN);
        }
        sim.set_slot(WINDOW + 1);
        assert_eq!(sim.spin_cost(&player), SPIN);
        assert_eq!(sim.session(&player), SessionRecord::fresh());
    }

    #[test]
    fn insufficient_payment_changes_nothing() {
        let (mut sim, player) = machine(triple_two(), SPIN);
        sim.set_slot(500);

        let err = sim.spin(player, false, SPIN - 1).unwrap_err();
        assert_eq!(err, Error::from(SlotError::InsufficientValue));
        assert_eq!(sim.balance_of(&player), 10 * SPIN);
        assert_eq!(sim.pool_balance(), SPIN);
        assert_eq!(sim.session(&player), SessionRecord::fresh());
        assert!(sim.notifications().is_empty());
    }

    #[test]
    fn overpayment_is_absorbed() {
        let (mut sim, player) = machine(triple_two(), 0);
        sim.set_slot(500);

        let receipt = sim.spin(player, false, 2 * SPIN).unwrap();
        assert_eq!(receipt.price, SPIN);
        assert_eq!(sim.balance_of(&player), 8 * SPIN);
        assert_eq!(sim.pool_balance(), 2 * SPIN);
        assert_eq!(
            sim.notifications(),
            &[Notification::Spin { player, boosted: false, price: SPIN, paid: 2 * SPIN, slot: 500 }]
        );
    }

    #[test]
    fn wallet_must_cover_the_stake() {
        let (mut sim, player) = machine(triple_two(), 0);
        sim.set_slot(500);
        let err = sim.spin(player, false, 11 * SPIN).unwrap_err();
        assert_eq!(err, Error::from(SlotError::InsufficientFunds));
        assert_eq!(sim.balance_of(&player), 10 * SPIN);
    }

    #[test]
    fn respin_at_deadline_is_discounted() {
        let (mut sim, player) = machine(triple_two(), 0);
        sim.set_slot(500);
        sim.spin(player, false, SPIN).unwrap();

        sim.advance(WINDOW);
        assert_eq!(sim.spin(player, false, RESPIN).unwrap().price, RESPIN);
        assert_eq!(sim.session(&player).last_action_slot, 500 + WINDOW);
    }

    #[test]
    fn respin_one_past_deadline_is_repriced() {
        let (mut sim, player) = machine(triple_two(), 0);
        sim.set_slot(500);
        sim.spin(player, false, SPIN).unwrap();

        sim.advance(WINDOW + 1);
        assert_eq!(sim.spin_cost(&player), SPIN);
        let err = sim.spin(player, false, RESPIN).unwrap_err();
        assert_eq!(err, Error::from(SlotError::InsufficientValue));
        assert_eq!(sim.session(&player).last_action_slot, 500);
        assert_eq!(sim.balance_of(&player), 9 * SPIN);
    }

    #[test]
    fn known_entropy_pays_fifty_times_on_a_deep_pool() {
        let pool = 10_000 * SPIN;
        let (mut sim, player) = machine(triple_two(), pool);
        sim.set_slot(500);
        sim.spin(player, false, SPIN).unwrap();
        sim.advance(1);

        let settlement = sim.accept(player).unwrap();
        assert_eq!(settlement.outcome.symbols(), (2, 2, 2));
        assert!(settlement.outcome.remaining_entropy.is_zero());
        assert_eq!(settlement.amount, 50 * SPIN);
        assert_eq!(sim.payout(2, 2, 2), 50 * SPIN);

        assert_eq!(sim.balance_of(&player), 9 * SPIN + 50 * SPIN);
        assert_eq!(sim.pool_balance(), pool + SPIN - 50 * SPIN);
        assert_eq!(
            sim.notifications().last(),
            Some(&Notification::Award { player, amount: 50 * SPIN })
        );
    }

    #[test]
    fn known_entropy_is_clamped_on_a_shallow_pool() {
        // The pool holds only the stake itself when accept runs.
        let (mut sim, player) = machine(triple_two(), 0);
        sim.set_slot(500);
        sim.spin(player, false, SPIN).unwrap();
        sim.advance(1);

        let settlement = sim.accept(player).unwrap();
        assert_eq!(settlement.amount, SPIN >> 6);
        assert_eq!(sim.pool_balance(), SPIN - (SPIN >> 6));
        assert_eq!(sim.balance_of(&player), 9 * SPIN + (SPIN >> 6));
        assert_eq!(
            sim.notifications().last(),
            Some(&Notification::Award { player, amount: SPIN >> 6 })
        );
    }

    #[test]
    fn accept_in_the_spin_slot_must_wait() {
        let (mut sim, player) = machine(triple_two(), SPIN);
        sim.set_slot(500);
        sim.spin(player, false, SPIN).unwrap();
        let err = sim.accept(player).unwrap_err();
        assert_eq!(err, Error::from(SlotError::WaitForTick));
        assert!(sim.session(&player).pending);
    }

    #[test]
    fn missed_deadline_forfeits_the_stake() {
        let (mut sim, player) = machine(triple_two(), 1_000 * SPIN);
        sim.set_slot(500);
        sim.spin(player, false, SPIN).unwrap();
        sim.advance(WINDOW + 1);

        let err = sim.accept(player).unwrap_err();
        assert_eq!(err, Error::from(SlotError::DeadlineExceeded));
        assert_eq!(sim.pool_balance(), 1_001 * SPIN);
        assert_eq!(sim.balance_of(&player), 9 * SPIN);

        // A fresh spin supersedes the stale one.
        sim.spin(player, false, SPIN).unwrap();
        sim.advance(1);
        assert!(sim.accept(player).is_ok());
    }

    #[test]
    fn double_accept_is_rejected() {
        let (mut sim, player) = machine(triple_two(), 1_000 * SPIN);
        sim.set_slot(500);
        sim.spin(player, false, SPIN).unwrap();
        sim.advance(1);
        sim.accept(player).unwrap();

        let pool = sim.pool_balance();
        let err = sim.accept(player).unwrap_err();
        assert_eq!(err, Error::from(SlotError::NoPendingSpin));
        assert_eq!(sim.pool_balance(), pool);
    }

    #[test]
    fn boosted_spin_needs_and_burns_a_credit() {
        let (mut sim, player) = machine(SeededEntropy::new([3; 32]), 1_000 * SPIN);
        sim.set_slot(500);

        let err = sim.spin(player, true, SPIN).unwrap_err();
        assert_eq!(err, Error::from(SlotError::BonusCreditRequired));
        assert_eq!(sim.balance_of(&player), 10 * SPIN);

        sim.grant_bonus(player, 1).unwrap();
        sim.spin(player, true, SPIN).unwrap();
        assert_eq!(sim.bonus_credits_of(&player), 0);
        assert!(sim.session(&player).last_action_boosted);

        sim.advance(1);
        assert!(sim.accept(player).unwrap().boosted);
    }

    #[test]
    fn players_do_not_share_sessions() {
        let (mut sim, alice) = machine(triple_two(), 1_000 * SPIN);
        let bob = Pubkey::new_unique();
        sim.deposit(bob, SPIN).unwrap();
        sim.set_slot(500);

        sim.spin(alice, false, SPIN).unwrap();
        sim.advance(1);
        assert_eq!(sim.accept(bob).unwrap_err(), Error::from(SlotError::NoPendingSpin));
        assert!(sim.accept(alice).is_ok());
    }

    #[test]
    fn long_session_conserves_lamports() {
        let (mut sim, player) = machine(SeededEntropy::new([42; 32]), 100 * SPIN);
        sim.deposit(player, 990 * SPIN).unwrap();
        let total = sim.pool_balance() + sim.balance_of(&player);

        sim.set_slot(1_000);
        for _ in 0..200 {
            let cost = sim.spin_cost(&player);
            if sim.balance_of(&player) < cost {
                break;
            }
            sim.spin(player, false, cost).unwrap();
            sim.advance(1);
            sim.accept(player).unwrap();
            sim.advance(2);
        }
        assert_eq!(sim.pool_balance() + sim.balance_of(&player), total);
    }
}
