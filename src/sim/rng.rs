//! Seeded RNG that can be snapshotted
//!
//! PCG32 state is not exported directly. Instead the seed, stream and the
//! number of draws made so far are recorded, and import replays the
//! generator forward with PCG's O(log n) jump-ahead.

use rand::RngCore;
use rand_pcg::Pcg32;

use crate::error::SyncError;
use crate::fixed::Fixed;
use crate::sync::StateBuffer;

/// RNG state wrapper for serialization
#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    stream: u64,
    draws: u64,
    rng: Pcg32,
}

impl RngState {
    pub fn new(seed: u64, stream: u64) -> Self {
        Self {
            seed,
            stream,
            draws: 0,
            rng: Pcg32::new(seed, stream),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Number of 32-bit values drawn since seeding
    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn next_u32(&mut self) -> u32 {
        // PCG32's period is 2^64, so the count wraps together with the generator
        self.draws = self.draws.wrapping_add(1);
        self.rng.next_u32()
    }

    /// Uniform integer in `[0, bound)`; zero when `bound` is zero
    pub fn below(&mut self, bound: u32) -> u32 {
        ((u64::from(self.next_u32()) * u64::from(bound)) >> 32) as u32
    }

    /// Uniform fraction in `[0, 1)` with the full 32 fractional bits
    pub fn unit(&mut self) -> Fixed {
        Fixed::from_raw(i64::from(self.next_u32()))
    }

    /// Uniform value in `[lo, hi)`
    pub fn range(&mut self, lo: Fixed, hi: Fixed) -> Fixed {
        lo + (hi - lo) * self.unit()
    }

    pub fn export(&self, buffer: &mut StateBuffer) {
        buffer.write_u64(self.seed);
        buffer.write_u64(self.stream);
        buffer.write_u64(self.draws);
    }

    pub fn import(buffer: &mut StateBuffer) -> Result<Self, SyncError> {
        let seed = buffer.read_u64()?;
        let stream = buffer.read_u64()?;
        let draws = buffer.read_u64()?;
        let mut rng = Pcg32::new(seed, stream);
        rng.advance(draws);
        Ok(Self {
            seed,
            stream,
            draws,
            rng,
        })
    }
}

impl PartialEq for RngState {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.stream == other.stream && self.draws == other.draws
    }
}

impl Eq for RngState {}
