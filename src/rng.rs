//! Deterministic tie-break randomness. A thin wrapper over `rand::SmallRng`
//! seeded from `LpParameters::random_seed`, used only where the spec
//! explicitly permits randomization among otherwise-equal choices: entering
//! column ties, Harris ratio-test ties, and polish-phase candidate sampling.
//! Never consulted when there's a unique best choice, so it cannot change
//! whether a solve reaches OPTIMAL or what objective it reports.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub struct TieBreaker {
    rng: SmallRng,
}

impl TieBreaker {
    pub fn new(seed: u64) -> Self {
        TieBreaker { rng: SmallRng::seed_from_u64(seed) }
    }

    /// Picks one index out of `candidates` uniformly at random. Panics if
    /// `candidates` is empty; callers only invoke this once a nonempty tied
    /// set has already been identified.
    pub fn pick(&mut self, candidates: &[usize]) -> usize {
        assert!(!candidates.is_empty(), "pick requires at least one candidate");
        let i = self.rng.random_range(0..candidates.len());
        candidates[i]
    }

    pub fn next_bool(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Uniform sample in `[0, 1)`, used to scale cost perturbations.
    pub fn next_unit_fraction(&mut self) -> f64 {
        self.rng.random_range(0.0..1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_returns_one_of_the_candidates() {
        let mut tb = TieBreaker::new(42);
        let candidates = [3, 7, 11];
        let picked = tb.pick(&candidates);
        assert!(candidates.contains(&picked));
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = TieBreaker::new(7);
        let mut b = TieBreaker::new(7);
        let candidates = [0, 1, 2, 3, 4];
        for _ in 0..10 {
            assert_eq!(a.pick(&candidates), b.pick(&candidates));
        }
    }
}
