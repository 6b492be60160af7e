// Seedable PRNG (xorshift64)
//
// The pipeline owns one `Random` and lends it to every step, so a fixed seed
// reproduces a build exactly. Not cryptographically secure.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct Random {
    state: u64,
}

impl Random {
    /// Deterministic generator for `seed`.
    pub fn seeded(seed: u64) -> Self {
        // splitmix64 scramble so that small seeds do not start in a
        // low-entropy region; xorshift64 requires a non-zero state.
        let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        Self {
            state: if z == 0 { 0x517c_c1b7_2722_0a95 } else { z },
        }
    }

    /// Generator seeded from the system clock.
    pub fn from_clock() -> Self {
        Self::seeded(clock_seed())
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// True with probability `probability`: never for 0, always for 1.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Uniform integer in `low..=high`.
    pub fn range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        debug_assert!(low <= high);
        let span = (high - low) as u64 + 1;
        low + (self.next_u64() % span) as i64
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_inclusive(0, i as i64) as usize;
            items.swap(i, j);
        }
    }
}

/// Seed derived from the current time, used when no seed is configured.
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0xdead_beef)
}
