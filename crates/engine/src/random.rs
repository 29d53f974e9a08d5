//! Injectable randomness. Guards use it to break out of steering deadlocks, houses and
//! guards use it to roll loot.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f32;

    /// Uniform integer in `min..=max`.
    fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = u64::from(max - min) + 1;
        let offset = (f64::from(self.next_unit()) * span as f64) as u64;
        min + offset.min(u64::from(max - min)) as u32
    }

    /// True with probability `1 / n`.
    fn one_in(&mut self, n: u32) -> bool {
        n <= 1 || self.range_inclusive(0, n - 1) == 0
    }
}

pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Replays a fixed list of unit values, cycling when exhausted. An empty script always
/// yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    values: VecDeque<f32>,
}

impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = f32>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|value| value.clamp(0.0, 0.999_999))
                .collect(),
        }
    }

    pub fn constant(value: f32) -> Self {
        Self::new([value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f32 {
        match self.values.pop_front() {
            Some(value) => {
                self.values.push_back(value);
                value
            }
            None => 0.0,
        }
    }
}
