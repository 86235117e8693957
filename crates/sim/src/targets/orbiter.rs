use super::{orbit, Steering, TargetPattern, TargetView};

/// Circles the gunner in one direction forever.
pub struct Orbiter {
    direction: f64,
}

impl Orbiter {
    pub fn new(direction: f64) -> Self {
        Self {
            direction: if direction < 0.0 { -1.0 } else { 1.0 },
        }
    }
}

impl TargetPattern for Orbiter {
    fn name(&self) -> &str {
        "orbiter"
    }

    fn steer(&mut self, view: &TargetView) -> Steering {
        orbit(view, self.direction)
    }
}
