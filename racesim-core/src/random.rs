//! Random source port and its seeded / scripted implementations.
//!
//! The race core never touches a global RNG. Every draw goes through a
//! [`RandomSource`] handed to the executor, so a fixed seed (or a scripted
//! test double) reproduces a run bit for bit.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Capability set the race core draws randomness from.
pub trait RandomSource {
    /// Uniform non-negative integer.
    fn next_u32(&mut self) -> u32;

    /// Uniform float in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `[0, max)`; returns 0 when `max` is 0.
    fn next_below(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        let scaled = (self.next_f64() * f64::from(max)).floor();
        let index = crate::numbers::ceil_f64_to_u32(scaled);
        index.min(max - 1)
    }

    /// Uniform integer in `[min, max)`; returns `min` when the range is empty.
    fn next_in_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = u32::try_from(i64::from(max) - i64::from(min)).unwrap_or(u32::MAX);
        let offset = i64::from(self.next_below(span));
        i32::try_from(i64::from(min) + offset).unwrap_or(min)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }

    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }

    fn next_below(&mut self, max: u32) -> u32 {
        (**self).next_below(max)
    }

    fn next_in_range(&mut self, min: i32, max: i32) -> i32 {
        (**self).next_in_range(min, max)
    }
}

/// ChaCha20 stream derived from a user-visible seed, counting draws.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha20Rng,
    seed: u64,
    draws: u64,
}

impl SeededRandom {
    /// Construct the race stream from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self::with_domain(seed, b"race")
    }

    /// Construct a stream for an explicit domain tag.
    #[must_use]
    pub fn with_domain(seed: u64, domain_tag: &[u8]) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, domain_tag)),
            seed,
            draws: 0,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    fn count(&mut self) {
        self.draws = self.draws.saturating_add(1);
    }
}

impl RandomSource for SeededRandom {
    fn next_u32(&mut self) -> u32 {
        self.count();
        self.rng.next_u32()
    }

    fn next_f64(&mut self) -> f64 {
        self.count();
        self.rng.r#gen::<f64>()
    }

    fn next_below(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.count();
        self.rng.gen_range(0..max)
    }

    fn next_in_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.count();
        self.rng.gen_range(min..max)
    }
}

/// Constant source; every float draw returns the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom {
    value: f64,
}

impl FixedRandom {
    #[must_use]
    pub fn new(value: f64) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0 - f64::EPSILON)
        } else {
            0.5
        };
        Self { value }
    }

    /// Midpoint source: random variance collapses to exactly 1.0.
    #[must_use]
    pub fn midpoint() -> Self {
        Self::new(0.5)
    }
}

impl RandomSource for FixedRandom {
    fn next_u32(&mut self) -> u32 {
        crate::numbers::ceil_f64_to_u32((self.value * f64::from(u32::MAX)).floor())
    }

    fn next_f64(&mut self) -> f64 {
        self.value
    }
}

/// Replays a script of float draws in a loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedRandom {
    script: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// An empty script behaves like [`FixedRandom::midpoint`].
    #[must_use]
    pub fn new(script: Vec<f64>) -> Self {
        let script = script
            .into_iter()
            .map(|value| FixedRandom::new(value).value)
            .collect();
        Self { script, cursor: 0 }
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_u32(&mut self) -> u32 {
        let value = self.next_f64();
        crate::numbers::ceil_f64_to_u32((value * f64::from(u32::MAX)).floor())
    }

    fn next_f64(&mut self) -> f64 {
        if self.script.is_empty() {
            self.cursor += 1;
            return 0.5;
        }
        let value = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        value
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
