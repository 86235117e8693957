use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use super::{orbit, Steering, TargetPattern, TargetView};

/// Circles the gunner and flips direction at random.
pub struct Wanderer {
    reversal_probability: f64,
    direction: f64,
    rng: Pcg64,
}

impl Wanderer {
    pub fn new(reversal_probability: f64, seed: u64) -> Self {
        Self {
            reversal_probability: reversal_probability.clamp(0.0, 1.0),
            direction: 1.0,
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl TargetPattern for Wanderer {
    fn name(&self) -> &str {
        "wanderer"
    }

    fn steer(&mut self, view: &TargetView) -> Steering {
        if self.rng.gen::<f64>() < self.reversal_probability {
            self.direction = -self.direction;
        }
        orbit(view, self.direction)
    }
}
