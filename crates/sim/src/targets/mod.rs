pub mod orbiter;
pub mod oscillator;
pub mod wanderer;

pub use orbiter::Orbiter;
pub use oscillator::Oscillator;
pub use wanderer::Wanderer;

use glam::DVec2;
use guessfire_shared::*;

/// Names accepted by [`resolve_target`].
pub const TARGET_NAMES: &[&str] = &["sitter", "orbiter", "oscillator", "wanderer"];

/// Preferred distance kept from the gunner while circling.
pub const ORBIT_DISTANCE: f64 = 250.0;
pub const DEFAULT_OSCILLATION_PERIOD: u32 = 40;
pub const DEFAULT_REVERSAL_PROBABILITY: f64 = 0.03;

/// What a target sees of the range each tick.
#[derive(Debug, Clone, Copy)]
pub struct TargetView {
    pub position: DVec2,
    pub heading: f64,
    pub velocity: f64,
    pub gunner: DVec2,
    pub tick: u32,
}

/// Body commands for the coming tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    /// Relative body turn, clockwise positive.
    pub turn: f64,
    /// Distance to move along the heading; negative backs up.
    pub ahead: f64,
}

pub trait TargetPattern: Send {
    fn name(&self) -> &str;
    fn steer(&mut self, view: &TargetView) -> Steering;
}

/// Stands still.
pub struct Sitter;

impl TargetPattern for Sitter {
    fn name(&self) -> &str {
        "sitter"
    }

    fn steer(&mut self, _view: &TargetView) -> Steering {
        Steering::default()
    }
}

/// Steering that circles the gunner, moving forward for `direction > 0`
/// and backward otherwise, easing toward [`ORBIT_DISTANCE`].
pub fn orbit(view: &TargetView, direction: f64) -> Steering {
    let to_gunner = view.gunner - view.position;
    let bearing = to_gunner.x.atan2(to_gunner.y);
    let distance = to_gunner.length();

    // Bend the perpendicular toward the gunner when too far, away when too close.
    let correction = ((distance - ORBIT_DISTANCE) / ORBIT_DISTANCE).clamp(-0.5, 0.5);
    let desired_heading = bearing + std::f64::consts::FRAC_PI_2 - direction * correction;

    Steering {
        turn: normal_relative_angle(desired_heading - view.heading),
        ahead: direction * 100.0,
    }
}

pub fn resolve_target(name: &str, seed: u64) -> Option<Box<dyn TargetPattern>> {
    match name {
        "sitter" => Some(Box::new(Sitter)),
        "orbiter" => Some(Box::new(Orbiter::new(1.0))),
        "oscillator" => Some(Box::new(Oscillator::new(DEFAULT_OSCILLATION_PERIOD))),
        "wanderer" => Some(Box::new(Wanderer::new(DEFAULT_REVERSAL_PROBABILITY, seed))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(position: DVec2, heading: f64) -> TargetView {
        TargetView {
            position,
            heading,
            velocity: 0.0,
            gunner: DVec2::new(0.0, 0.0),
            tick: 0,
        }
    }

    #[test]
    fn test_resolve_known_targets() {
        for name in TARGET_NAMES {
            let target = resolve_target(name, 0).unwrap();
            assert_eq!(target.name(), *name);
        }
        assert!(resolve_target("tank", 0).is_none());
    }

    #[test]
    fn test_orbit_moves_perpendicular_at_preferred_distance() {
        // Gunner due south; perpendicular heading is west (-PI/2).
        let steering = orbit(&view(DVec2::new(0.0, ORBIT_DISTANCE), 0.0), 1.0);
        assert!((steering.turn + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!(steering.ahead > 0.0);
    }

    #[test]
    fn test_orbit_closes_in_when_far() {
        let heading = -std::f64::consts::FRAC_PI_2;
        let forward = orbit(&view(DVec2::new(0.0, 2.0 * ORBIT_DISTANCE), heading), 1.0);
        // Turning left (counter-clockwise) from west points toward the gunner.
        assert!(forward.turn < 0.0);
        let backward = orbit(&view(DVec2::new(0.0, 2.0 * ORBIT_DISTANCE), heading), -1.0);
        assert!(backward.turn > 0.0);
        assert!(backward.ahead < 0.0);
    }

    #[test]
    fn test_sitter_does_nothing() {
        let mut sitter = Sitter;
        assert_eq!(sitter.steer(&view(DVec2::new(5.0, 5.0), 1.0)), Steering::default());
    }
}
