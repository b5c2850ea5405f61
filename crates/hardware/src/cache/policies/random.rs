//! Random Replacement Policy.
//!
//! This policy evicts a uniformly chosen line from the set. The random source is
//! supplied by the caller, never drawn from a global generator, so a given seed
//! always produces the same sequence of victims. A copy of the source as it was
//! at construction is kept so `reset()` replays the same sequence.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::ReplacementPolicy;
use crate::cache::CacheLine;

/// Random policy state.
#[derive(Clone, Debug)]
pub struct RandomPolicy<R = StdRng> {
    /// Source as constructed, restored on reset.
    initial: R,
    /// Source consumed by victim selection.
    rng: R,
}

impl<R: RngCore + Clone> RandomPolicy<R> {
    /// Creates a Random policy drawing from `rng`.
    pub fn new(rng: R) -> Self {
        Self {
            initial: rng.clone(),
            rng,
        }
    }
}

impl RandomPolicy<StdRng> {
    /// Creates a Random policy backed by a `StdRng` seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R> ReplacementPolicy for RandomPolicy<R>
where
    R: RngCore + Clone + Send + Sync,
{
    fn name(&self) -> &'static str {
        "Random"
    }

    /// Access patterns do not affect the victim choice.
    fn refresh_on_hit(&self) -> bool {
        false
    }

    fn get_victim(&mut self, lines: &[CacheLine]) -> usize {
        self.rng.gen_range(0..lines.len().max(1))
    }

    fn reset(&mut self) {
        self.rng = self.initial.clone();
    }
}
