use super::{orbit, Steering, TargetPattern, TargetView};

/// Circles the gunner, reversing every `period` ticks.
pub struct Oscillator {
    period: u32,
}

impl Oscillator {
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
        }
    }

    pub fn direction_at(&self, tick: u32) -> f64 {
        if (tick / self.period) % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

impl TargetPattern for Oscillator {
    fn name(&self) -> &str {
        "oscillator"
    }

    fn steer(&mut self, view: &TargetView) -> Steering {
        orbit(view, self.direction_at(view.tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverses_each_period() {
        let osc = Oscillator::new(10);
        assert_eq!(osc.direction_at(0), 1.0);
        assert_eq!(osc.direction_at(9), 1.0);
        assert_eq!(osc.direction_at(10), -1.0);
        assert_eq!(osc.direction_at(20), 1.0);
        assert_eq!(Oscillator::new(0).direction_at(1), -1.0);
    }
}
