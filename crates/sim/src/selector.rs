use guessfire_shared::SelectionMode;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Exploration temperature for Boltzmann selection. Lowered by a fixed
/// step on every confirmed hit, never below `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    value: f64,
    min: f64,
    step: f64,
}

impl Temperature {
    pub fn new(initial: f64, min: f64, step: f64) -> Self {
        Self {
            value: initial.max(min),
            min,
            step,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn decrease(&mut self) {
        self.value = (self.value - self.step).max(self.min);
    }

    pub fn raise(&mut self, amount: f64) {
        self.value = (self.value + amount).max(self.min);
    }
}

/// Weight of a score under the Boltzmann distribution. A temperature at
/// (or below) zero passes the score through unchanged.
pub fn boltzmann(score: f64, temperature: f64) -> f64 {
    if temperature < f64::EPSILON {
        return score;
    }
    (score / temperature).exp()
}

/// Boltzmann weights for a whole row. Scores are shifted by their maximum
/// before exponentiation; the weights stay proportional to
/// `exp(score / temperature)` but cannot overflow.
pub fn boltzmann_weights(scores: &[f64], temperature: f64) -> Vec<f64> {
    if temperature < f64::EPSILON {
        return scores.to_vec();
    }
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return scores.iter().map(|&s| boltzmann(s, temperature)).collect();
    }
    scores
        .iter()
        .map(|&s| boltzmann(s - max, temperature))
        .collect()
}

/// Walk the actions in order accumulating `score / sum` until the running
/// total exceeds `draw`. Returns `None` when no action qualifies, which is
/// the case for an all-zero row (the division yields NaN).
///
/// A lone high score among many low ones is under-weighted here because
/// mass is normalized by the raw sum, not by rank.
pub fn select_by_sum_prob(scores: &[f64], draw: f64) -> Option<usize> {
    let sum: f64 = scores.iter().sum();
    let mut running = 0.0;
    for (i, score) in scores.iter().enumerate() {
        running += score / sum;
        if draw < running {
            return Some(i);
        }
    }
    None
}

/// Picks an action index from a row of averaged scores.
#[derive(Debug, Clone)]
pub struct PolicySelector {
    mode: SelectionMode,
    temperature: Temperature,
    draw_rng: Pcg64,
    fallback_rng: Pcg64,
}

impl PolicySelector {
    pub fn new(mode: SelectionMode, temperature: Temperature, seed: u64) -> Self {
        let mut seeder = Pcg64::seed_from_u64(seed);
        Self {
            mode,
            temperature,
            draw_rng: Pcg64::seed_from_u64(seeder.gen()),
            fallback_rng: Pcg64::seed_from_u64(seeder.gen()),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn temperature(&self) -> &Temperature {
        &self.temperature
    }

    pub fn temperature_mut(&mut self) -> &mut Temperature {
        &mut self.temperature
    }

    pub fn decrease_temperature(&mut self) {
        self.temperature.decrease();
    }

    pub fn select(&mut self, scores: &[f64]) -> usize {
        let draw: f64 = self.draw_rng.gen();
        self.select_with_draw(scores, draw)
    }

    /// [`Self::select`] with the uniform draw supplied by the caller. The
    /// fallback pick for degenerate rows still comes from the selector.
    pub fn select_with_draw(&mut self, scores: &[f64], draw: f64) -> usize {
        let picked = match self.mode {
            SelectionMode::SumOfProbabilities => select_by_sum_prob(scores, draw),
            SelectionMode::Boltzmann => {
                let weights = boltzmann_weights(scores, self.temperature.value());
                select_by_sum_prob(&weights, draw)
            }
        };
        match picked {
            Some(action) => action,
            None if scores.is_empty() => 0,
            None => self.fallback_rng.gen_range(0..scores.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_prob_uniform_edges() {
        let scores = [1.0, 1.0, 1.0, 1.0];
        assert_eq!(select_by_sum_prob(&scores, 0.0), Some(0));
        assert_eq!(select_by_sum_prob(&scores, 0.999), Some(3));
        assert_eq!(select_by_sum_prob(&scores, 0.3), Some(1));
    }

    #[test]
    fn test_sum_prob_zero_row_has_no_pick() {
        assert_eq!(select_by_sum_prob(&[0.0, 0.0, 0.0], 0.5), None);
    }

    #[test]
    fn test_zero_row_falls_back_to_random_index() {
        let mut selector = PolicySelector::new(
            SelectionMode::SumOfProbabilities,
            Temperature::new(1.0, 0.1, 0.1),
            3,
        );
        for _ in 0..50 {
            let action = selector.select(&[0.0; 5]);
            assert!(action < 5);
        }
    }

    #[test]
    fn test_sum_prob_underweights_standout_score() {
        // The standout gets exactly half the mass despite being 4x the others.
        let scores = [0.25, 0.25, 1.0, 0.25, 0.25];
        assert_eq!(select_by_sum_prob(&scores, 0.1), Some(0));
        assert_eq!(select_by_sum_prob(&scores, 0.26), Some(2));
        assert_eq!(select_by_sum_prob(&scores, 0.76), Some(3));
    }

    #[test]
    fn test_boltzmann_pass_through_at_zero() {
        assert_eq!(boltzmann(0.7, 0.0), 0.7);
        assert!((boltzmann(1.0, 1.0) - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_cold_boltzmann_matches_greedy() {
        let scores = [0.1, 0.5, 0.2];
        let mut selector = PolicySelector::new(
            SelectionMode::Boltzmann,
            Temperature::new(0.01, 0.01, 0.0),
            1,
        );
        for i in 1..100 {
            let draw = i as f64 / 100.0;
            assert_eq!(selector.select_with_draw(&scores, draw), 1);
        }
    }

    #[test]
    fn test_boltzmann_weights_do_not_overflow() {
        let weights = boltzmann_weights(&[900.0, 1000.0], 0.005);
        assert!(weights.iter().all(|w| w.is_finite()));
        assert_eq!(select_by_sum_prob(&weights, 0.5), Some(1));
    }

    #[test]
    fn test_temperature_never_below_min() {
        let mut t = Temperature::new(0.2, 0.005, 0.01);
        for _ in 0..1000 {
            t.decrease();
            assert!(t.value() >= t.min());
        }
        assert_eq!(t.value(), 0.005);
        t.raise(0.05);
        assert!((t.value() - 0.055).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let scores = [0.3, 0.2, 0.9, 0.4];
        let mut a = PolicySelector::new(SelectionMode::Boltzmann, Temperature::new(0.2, 0.005, 0.01), 11);
        let mut b = PolicySelector::new(SelectionMode::Boltzmann, Temperature::new(0.2, 0.005, 0.01), 11);
        let picks_a: Vec<usize> = (0..20).map(|_| a.select(&scores)).collect();
        let picks_b: Vec<usize> = (0..20).map(|_| b.select(&scores)).collect();
        assert_eq!(picks_a, picks_b);
    }
}
