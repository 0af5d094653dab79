//! Deterministic pseudo-random generator used for weight initialization.
//!
//! This is a 32-bit, eight-word variant of the xoshiro family (two of the
//! XOR steps are replaced by wrapping additions). It is small, fast and fully
//! reproducible: the same seed always yields the same infinite sequence.
//! It makes no cryptographic claims.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{RngCore, SeedableRng};

const INITIAL_STATE: [u32; 8] = [
    0xBAD5_EED1,
    0x0620_81DE,
    0xEAD3_D6C8,
    0x7F4A_7C15,
    0x3D62_7E37,
    0xA5A5_A5A5,
    0x1234_5678,
    0x8765_4321,
];

const SEED_MULTIPLIER: u32 = 0x2545_F492;

/// Outputs thrown away after seeding.
const WARMUP_DRAWS: usize = 16;

/// Eight-word pseudo-random generator.
///
/// Pass it explicitly to [`crate::Network::init_weights`]; there is no hidden
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomGenerator {
    state: [u32; 8],
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            state: INITIAL_STATE,
        }
    }
}

impl RandomGenerator {
    /// Build a generator already seeded with `seed`.
    pub fn new(seed: u32) -> Self {
        let mut rng = Self::default();
        rng.seed(seed);
        rng
    }

    /// Build a generator seeded from the system clock.
    pub fn from_time() -> Self {
        Self::new(clock_seed())
    }

    /// Re-seed the generator.
    ///
    /// The seed is expanded through an xorshift mix into all eight state words,
    /// then the first outputs are discarded so low-entropy seeds (0, 1, ...)
    /// do not show through.
    pub fn seed(&mut self, seed: u32) {
        let mut s = seed;
        for (i, word) in self.state.iter_mut().enumerate() {
            s ^= s >> 13;
            s ^= s << 17;
            s ^= s >> 5;
            *word = s.wrapping_mul(SEED_MULTIPLIER).wrapping_add(i as u32);
        }

        for _ in 0..WARMUP_DRAWS {
            self.next_u32();
        }
    }

    /// Advance the state and return one 32-bit word.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let s = &mut self.state;

        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 9;

        s[2] ^= s[0];
        s[5] = s[5].wrapping_add(s[1]);
        s[1] ^= s[2];
        s[7] ^= s[3];
        s[3] = s[3].wrapping_add(s[4]);
        s[4] ^= s[5];
        s[0] ^= s[6];
        s[6] ^= s[7];

        s[6] ^= t;
        s[2] = s[2].rotate_left(11);

        result
    }

    /// Map one draw onto `[min, max)`.
    ///
    /// Returns `min` exactly when `min >= max`.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }

        // 24 bits is the full f32 mantissa, so `unit` is exactly representable and < 1.
        let unit = (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32);
        let value = min + unit * (max - min);

        if value < max { value } else { min }
    }
}

impl RngCore for RandomGenerator {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        RandomGenerator::next_u32(self)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(RandomGenerator::next_u32(self));
        let lo = u64::from(RandomGenerator::next_u32(self));
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = RandomGenerator::next_u32(self).to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for RandomGenerator {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new((state ^ (state >> 32)) as u32)
    }
}

fn clock_seed() -> u32 {
    // A clock before the epoch only happens on badly configured hosts; any seed will do there.
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    (secs ^ (secs >> 32)) as u32
}
