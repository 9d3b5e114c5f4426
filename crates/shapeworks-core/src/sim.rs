//! Simulation clock and state hashing.
//!
//! The engine owns a [`SimClock`] and advances it once per
//! [`crate::engine::Engine::step`] by the elapsed seconds the caller passes
//! in. Every structure sees the same `now` and `delta` for the tick.

use crate::fixed::{Fixed64, Ticks};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Monotonic simulation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimClock {
    tick: Ticks,
    now: Fixed64,
    delta: Fixed64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `delta` seconds. Negative deltas are treated as zero so
    /// time never runs backwards.
    pub fn advance(&mut self, delta: Fixed64) {
        let delta = delta.max(Fixed64::ZERO);
        self.tick += 1;
        self.now += delta;
        self.delta = delta;
    }

    /// Number of completed advances.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    /// Seconds since the simulation started.
    pub fn now(&self) -> Fixed64 {
        self.now
    }

    /// Seconds covered by the latest advance.
    pub fn delta(&self) -> Fixed64 {
        self.delta
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// Deterministic FNV-1a (64-bit) hash of simulation state, for comparing
/// two runs. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
