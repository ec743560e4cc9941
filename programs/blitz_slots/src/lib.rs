use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke;
use anchor_lang::solana_program::system_instruction;
use anchor_lang::solana_program::sysvar::slot_hashes;
use anchor_spl::token::{self, Burn, Mint, MintTo, Token, TokenAccount};

pub mod constants;
pub mod entropy;
pub mod outcome;
pub mod payout;
pub mod reels;
pub mod session;
#[cfg(not(target_os = "solana"))]
pub mod simulator;

use constants::*;
use entropy::{Entropy, SlotHashEntropy};
use reels::ReelPosition;
use session::{MachineConfig, SessionRecord};

declare_id!("7Qm3vKzYJ1TzJrS8bXhC4nUwqDq9Gd2pLXoE5aFtS1ot");

#[cfg(not(feature = "no-entrypoint"))]
use solana_security_txt::security_txt;

#[cfg(not(feature = "no-entrypoint"))]
security_txt! {
    name: "Blitz99 Slots",
    project_url: "https://www.blitz99.win",
    contacts: "email:contact@blitz99.win",
    policy: "https://www.blitz99.win/terms",
    preferred_languages: "en,es",
    source_code: "https://github.com/Blitz99Win/blitz-games",
    auditors: "Unaudited. Outcomes derived on-chain from SlotHashes via Blake3"
}

#[program]
pub mod blitz_slots {
    use super::*;

    // ── Initialize ────────────────────────────────────────────────
    pub fn initialize(
        ctx: Context<Initialize>,
        blocks_to_act:  u64,
        cost_to_spin:   u64,
        cost_to_respin: u64,
    ) -> Result<()> {
        let config = MachineConfig { blocks_to_act, cost_to_spin, cost_to_respin };
        config.validate()?;

        let machine = &mut ctx.accounts.machine;
        machine.authority       = ctx.accounts.authority.key();
        machine.bonus_mint      = ctx.accounts.bonus_mint.key();
        machine.config          = config;
        machine.total_balance   = 0;
        machine.total_spins     = 0;
        machine.total_wagered   = 0;
        machine.total_awarded   = 0;
        machine.biggest_award   = 0;
        machine.bump            = ctx.bumps.machine;
        machine.bonus_mint_bump = ctx.bumps.bonus_mint;

        msg!(
            "Slot machine ready: window {} slots, spin {} / respin {} lamports",
            blocks_to_act, cost_to_spin, cost_to_respin
        );
        Ok(())
    }

    // ── Fund the pool (anyone can add liquidity) ──────────────────
    pub fn fund_pool(ctx: Context<FundPool>, amount: u64) -> Result<()> {
        require!(amount > 0, SlotError::InvalidAmount);
        let ix = system_instruction::transfer(
            &ctx.accounts.funder.key(),
            &ctx.accounts.machine.key(),
            amount,
        );
        invoke(&ix, &[
            ctx.accounts.funder.to_account_info(),
            ctx.accounts.machine.to_account_info(),
        ])?;
        let machine = &mut ctx.accounts.machine;
        let machine_ai = machine.to_account_info();
        sync_pool_balance(machine, &machine_ai)?;
        emit!(PoolFunded { amount, funder: ctx.accounts.funder.key() });
        Ok(())
    }

    // ── Spin / respin ─────────────────────────────────────────────
    // The whole `value` moves into the pool. A respin inside the window
    // supersedes any unaccepted outcome.
    pub fn spin(ctx: Context<SpinReels>, boosted: bool, value: u64) -> Result<()> {
        let clock = Clock::get()?;

        let player_key = ctx.accounts.player.key();
        let player_ai  = ctx.accounts.player.to_account_info();
        let machine_ai = ctx.accounts.machine.to_account_info();

        let player_session = &mut ctx.accounts.session;
        if player_session.player == Pubkey::default() {
            player_session.player = player_key;
            player_session.record = SessionRecord::fresh();
            player_session.bump   = ctx.bumps.session;
        }

        let machine = &mut ctx.accounts.machine;
        let receipt = session::spin(
            &machine.config,
            &mut player_session.record,
            clock.slot,
            boosted,
            value,
        )?;

        // ── Burn one bonus credit for an improved-strip spin ─────
        if boosted {
            let player_bonus = ctx
                .accounts
                .player_bonus
                .as_ref()
                .ok_or(SlotError::BonusCreditRequired)?;
            require!(player_bonus.amount >= CREDITS_PER_BOOST, SlotError::BonusCreditRequired);
            token::burn(
                CpiContext::new(
                    ctx.accounts.token_program.to_account_info(),
                    Burn {
                        mint:      ctx.accounts.bonus_mint.to_account_info(),
                        from:      player_bonus.to_account_info(),
                        authority: player_ai.clone(),
                    },
                ),
                CREDITS_PER_BOOST,
            )?;
        }

        // ── Transfer SOL player → pool ───────────────────────────
        if value > 0 {
            let ix = system_instruction::transfer(&player_key, &machine.key(), value);
            invoke(&ix, &[player_ai, machine_ai.clone()])?;
        }
        sync_pool_balance(machine, &machine_ai)?;

        machine.total_spins   = machine.total_spins.wrapping_add(1);
        machine.total_wagered = machine.total_wagered.wrapping_add(value);

        emit!(SpinPlaced {
            player: player_key,
            boosted,
            price:  receipt.price,
            paid:   receipt.paid,
            slot:   clock.slot,
        });
        Ok(())
    }

    // ── Accept the pending outcome ────────────────────────────────
    pub fn accept(ctx: Context<Accept>) -> Result<()> {
        let clock = Clock::get()?;

        let player_key  = ctx.accounts.player.key();
        let player_ai   = ctx.accounts.player.to_account_info();
        let machine_ai  = ctx.accounts.machine.to_account_info();
        let hashes_ai   = ctx.accounts.slot_hashes.to_account_info();
        let source      = SlotHashEntropy::new(&hashes_ai);

        let machine = &mut ctx.accounts.machine;
        sync_pool_balance(machine, &machine_ai)?;

        let player_session = &mut ctx.accounts.session;
        let settlement = session::accept(
            &machine.config,
            &mut player_session.record,
            &player_key,
            clock.slot,
            &source,
            machine.total_balance,
        )?;
        let amount = settlement.amount;

        // ── Pay out by direct lamport move (no CPI) ──────────────
        if amount > 0 {
            **machine_ai.try_borrow_mut_lamports()? -= amount;
            **player_ai.try_borrow_mut_lamports()? += amount;

            machine.total_awarded = machine.total_awarded.wrapping_add(amount);
            if amount > machine.biggest_award {
                machine.biggest_award = amount;
            }
        }
        sync_pool_balance(machine, &machine_ai)?;

        let outcome = settlement.outcome;
        msg!(
            "Settled [{}, {}, {}] boosted={} award={}",
            outcome.left, outcome.center, outcome.right, settlement.boosted, amount
        );
        emit!(SpinSettled {
            player:  player_key,
            left:    outcome.left,
            center:  outcome.center,
            right:   outcome.right,
            boosted: settlement.boosted,
            amount,
            slot:    clock.slot,
        });
        if amount > 0 {
            msg!("Paid {} lamports to {}", amount, player_key);
            emit!(AwardPaid { player: player_key, amount });
        }
        Ok(())
    }

    // ── Bonus credits (authority mints, boosted spins burn) ───────
    pub fn grant_bonus_credits(ctx: Context<GrantBonus>, amount: u64) -> Result<()> {
        require!(amount > 0, SlotError::InvalidAmount);

        let bump = [ctx.accounts.machine.bump];
        let signer_seeds: &[&[&[u8]]] = &[&[MACHINE_SEED, &bump]];
        token::mint_to(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                MintTo {
                    mint:      ctx.accounts.bonus_mint.to_account_info(),
                    to:        ctx.accounts.recipient.to_account_info(),
                    authority: ctx.accounts.machine.to_account_info(),
                },
                signer_seeds,
            ),
            amount,
        )?;

        emit!(BonusGranted { player: ctx.accounts.recipient.owner, amount });
        Ok(())
    }

    // ── Views ─────────────────────────────────────────────────────

    /// Price the player would pay if they spun in the current slot.
    pub fn spin_cost(ctx: Context<ReadSession>) -> Result<u64> {
        let slot = Clock::get()?.slot;
        let record = ctx
            .accounts
            .session
            .as_ref()
            .map(|s| s.record)
            .unwrap_or_else(SessionRecord::fresh);
        Ok(ctx.accounts.machine.config.spin_cost(&record, slot))
    }

    /// Award for a combination against the pool as it stands now.
    pub fn payout(ctx: Context<ReadMachine>, left: u8, center: u8, right: u8) -> Result<u64> {
        let machine = &ctx.accounts.machine;
        let pool = available_pool(&machine.to_account_info())?;
        Ok(payout::payout(left, center, right, machine.config.cost_to_spin, pool))
    }

    pub fn outcome(_ctx: Context<Stateless>, entropy: [u8; 32], boosted: bool) -> Result<OutcomeView> {
        let resolved = outcome::resolve(Entropy::from_be_bytes(entropy), boosted)?;
        Ok(OutcomeView {
            left:              resolved.left,
            center:            resolved.center,
            right:             resolved.right,
            remaining_entropy: resolved.remaining_entropy.to_be_bytes(),
        })
    }

    pub fn sample_reel(
        _ctx: Context<Stateless>,
        reel: ReelPosition,
        boosted: bool,
        slice: u32,
    ) -> Result<u8> {
        reels::sample_reel(reel, boosted, slice)
    }

    pub fn distribution_table(
        _ctx: Context<Stateless>,
        reel: ReelPosition,
        boosted: bool,
    ) -> Result<Vec<u32>> {
        Ok(reels::table(reel, boosted).to_vec())
    }
}

// ══════════════════════════════════════════════════════════════════════════
//  HELPERS
// ══════════════════════════════════════════════════════════════════════════

/// Lamports held by the machine above its rent-exempt minimum.
fn available_pool(machine_ai: &AccountInfo) -> Result<u64> {
    let rent = Rent::get()?.minimum_balance(machine_ai.data_len());
    let physical = machine_ai.lamports();
    require!(physical >= rent, SlotError::AccountingBroken);
    Ok(physical - rent)
}

/// Recompute total_balance from physical lamports. The cached value is
/// never trusted across instructions.
fn sync_pool_balance(machine: &mut Account<SlotMachine>, machine_ai: &AccountInfo) -> Result<()> {
    machine.total_balance = available_pool(machine_ai)?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════
//  ACCOUNTS
// ══════════════════════════════════════════════════════════════════════════

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(init, payer = authority, space = 8 + SlotMachine::LEN,
              seeds = [MACHINE_SEED], bump)]
    pub machine: Account<'info, SlotMachine>,
    #[account(init, payer = authority, seeds = [BONUS_MINT_SEED], bump,
              mint::decimals = BONUS_DECIMALS, mint::authority = machine)]
    pub bonus_mint: Account<'info, Mint>,
    #[account(mut)] pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct FundPool<'info> {
    #[account(mut, seeds = [MACHINE_SEED], bump = machine.bump)]
    pub machine: Account<'info, SlotMachine>,
    #[account(mut)] pub funder: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct SpinReels<'info> {
    #[account(mut)] pub player: Signer<'info>,
    #[account(mut, seeds = [MACHINE_SEED], bump = machine.bump)]
    pub machine: Account<'info, SlotMachine>,
    #[account(init_if_needed, payer = player, space = 8 + PlayerSession::LEN,
              seeds = [SESSION_SEED, player.key().as_ref()], bump)]
    pub session: Account<'info, PlayerSession>,
    #[account(mut, address = machine.bonus_mint)]
    pub bonus_mint: Account<'info, Mint>,
    /// Only read when `boosted` is set.
    #[account(mut, token::mint = bonus_mint, token::authority = player)]
    pub player_bonus: Option<Account<'info, TokenAccount>>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct Accept<'info> {
    #[account(mut)] pub player: Signer<'info>,
    #[account(mut, seeds = [MACHINE_SEED], bump = machine.bump)]
    pub machine: Account<'info, SlotMachine>,
    #[account(mut, seeds = [SESSION_SEED, player.key().as_ref()],
              bump = session.bump, has_one = player)]
    pub session: Account<'info, PlayerSession>,
    /// CHECK: address validated below, not injectable
    #[account(address = slot_hashes::ID)]
    pub slot_hashes: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct GrantBonus<'info> {
    #[account(seeds = [MACHINE_SEED], bump = machine.bump,
              has_one = authority, has_one = bonus_mint)]
    pub machine: Account<'info, SlotMachine>,
    #[account(mut, seeds = [BONUS_MINT_SEED], bump = machine.bonus_mint_bump)]
    pub bonus_mint: Account<'info, Mint>,
    #[account(mut, token::mint = bonus_mint)]
    pub recipient: Account<'info, TokenAccount>,
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ReadMachine<'info> {
    #[account(seeds = [MACHINE_SEED], bump = machine.bump)]
    pub machine: Account<'info, SlotMachine>,
}

#[derive(Accounts)]
pub struct ReadSession<'info> {
    #[account(seeds = [MACHINE_SEED], bump = machine.bump)]
    pub machine: Account<'info, SlotMachine>,
    /// CHECK: any wallet; only used to derive the session address
    pub player: UncheckedAccount<'info>,
    /// Absent for a player who has never spun.
    #[account(seeds = [SESSION_SEED, player.key().as_ref()],
              bump = session.bump, has_one = player)]
    pub session: Option<Account<'info, PlayerSession>>,
}

#[derive(Accounts)]
pub struct Stateless {}

// ══════════════════════════════════════════════════════════════════════════
//  STATE
// ══════════════════════════════════════════════════════════════════════════

#[account]
pub struct SlotMachine {
    pub authority:       Pubkey,         // 32
    pub bonus_mint:      Pubkey,         // 32
    pub config:          MachineConfig,  // 24
    pub total_balance:   u64,            // 8
    // ── Transparency counters ──
    pub total_spins:     u64,            // 8
    pub total_wagered:   u64,            // 8
    pub total_awarded:   u64,            // 8
    pub biggest_award:   u64,            // 8
    pub bump:            u8,             // 1
    pub bonus_mint_bump: u8,             // 1
}
impl SlotMachine { pub const LEN: usize = 32 + 32 + MachineConfig::LEN + 8 + 8 + 8 + 8 + 8 + 1 + 1; }

#[account]
pub struct PlayerSession {
    pub player: Pubkey,        // 32
    pub record: SessionRecord, // 10
    pub bump:   u8,            // 1
}
impl PlayerSession { pub const LEN: usize = 32 + SessionRecord::LEN + 1; }

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct OutcomeView {
    pub left:              u8,
    pub center:            u8,
    pub right:             u8,
    pub remaining_entropy: [u8; 32], // big-endian
}

// ══════════════════════════════════════════════════════════════════════════
//  ERRORS & EVENTS
// ══════════════════════════════════════════════════════════════════════════

#[error_code]
pub enum SlotError {
    #[msg("Payment below the current spin cost")]
    InsufficientValue,
    #[msg("Outcome not available until a later slot")]
    WaitForTick,
    #[msg("Acting window has closed")]
    DeadlineExceeded,
    #[msg("Slice fell outside the distribution table")]
    OutcomeOutOfBounds,
    #[msg("No spin waiting to be accepted")]
    NoPendingSpin,
    #[msg("Boosted spin requires a bonus credit")]
    BonusCreditRequired,
    #[msg("Slot hashes unavailable")]
    EntropyUnavailable,
    #[msg("Invalid pricing (respin must not exceed spin, spin must be positive)")]
    InvalidPricing,
    #[msg("Acting window must be at least one slot")]
    InvalidWindow,
    #[msg("Amount must be positive")]
    InvalidAmount,
    #[msg("Insufficient funds")]
    InsufficientFunds,
    #[msg("Accounting invariant violated")]
    AccountingBroken,
}

#[event] pub struct PoolFunded   { pub amount: u64, pub funder: Pubkey }
#[event] pub struct SpinPlaced   { pub player: Pubkey, pub boosted: bool, pub price: u64, pub paid: u64, pub slot: u64 }
#[event] pub struct SpinSettled  { pub player: Pubkey, pub left: u8, pub center: u8, pub right: u8, pub boosted: bool, pub amount: u64, pub slot: u64 }
#[event] pub struct AwardPaid    { pub player: Pubkey, pub amount: u64 }
#[event] pub struct BonusGranted { pub player: Pubkey, pub amount: u64 }
