// ── PDA Seeds ─────────────────────────────────────────────────────────────
pub const MACHINE_SEED:    &[u8] = b"slot_machine";
pub const SESSION_SEED:    &[u8] = b"session";
pub const BONUS_MINT_SEED: &[u8] = b"bonus_mint";

// ── Reel Geometry ─────────────────────────────────────────────────────────
pub const REEL_COUNT:   usize = 3;
pub const SYMBOL_COUNT: usize = 19;

// ── Fixed-Point Sampling ──────────────────────────────────────────────────
// Every distribution table is a cumulative array over TOTAL_MASS. Entropy is
// consumed SLICE_BITS at a time, lowest bits first.
pub const SLICE_BITS: u32 = 30;
pub const SLICE_MASK: u32 = (1 << SLICE_BITS) - 1;
pub const TOTAL_MASS: u32 = SLICE_MASK; // 2^30 - 1

// ── Entropy ───────────────────────────────────────────────────────────────
// The SlotHashes sysvar keeps this many recent entries. A spin's own slot
// hash must still be present when it is accepted, which bounds the window.
pub const SLOT_HASHES_DEPTH:  usize = 512;
pub const MAX_BLOCKS_TO_ACT:  u64   = SLOT_HASHES_DEPTH as u64 - 1;

// ── Solvency ──────────────────────────────────────────────────────────────
// A single award never exceeds pool >> SOLVENCY_SHIFT (1/64 of the pool).
pub const SOLVENCY_SHIFT: u32 = 6;

// ── Bonus Credits ─────────────────────────────────────────────────────────
pub const BONUS_DECIMALS:      u8  = 0;
pub const CREDITS_PER_BOOST:   u64 = 1;
