use guessfire_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::host::Host;

/// Distance covered while braking from `velocity` to a stop, stepping down
/// by [`DECELERATION`] each tick.
pub fn brake_distance(velocity: f64) -> f64 {
    let mut v = velocity;
    let mut total = 0.0;
    while v.abs() >= 1e-4 {
        total += v;
        let next = (v - DECELERATION).abs();
        if next > 0.0 && next < DECELERATION {
            break;
        }
        v = next;
    }
    total
}

/// Bounces between walls and jinks when the opponent fires.
#[derive(Debug, Clone)]
pub struct Mover {
    direction: f64,
    rng: Pcg64,
}

impl Mover {
    pub fn new(seed: u64) -> Self {
        Self {
            direction: 1.0,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// `1.0` for forward, `-1.0` for reverse.
    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn move_to_wall_and_back(&mut self, host: &mut dyn Host) {
        if !self.try_move_ahead(host, self.direction) {
            self.try_move_ahead(host, -self.direction);
            self.direction = -self.direction;
        }
    }

    /// Request a step in `direction` unless braking from the current speed
    /// would already carry us into a wall.
    fn try_move_ahead(&self, host: &mut dyn Host, direction: f64) -> bool {
        let me = host.snapshot();
        let max_x = me.battlefield_width - ROBOT_HALF_SIZE;
        let max_y = me.battlefield_height - ROBOT_HALF_SIZE;

        let reach = brake_distance(me.velocity.abs()) * direction + direction;
        let x = (me.x + me.heading.sin() * reach).round();
        let y = (me.y + me.heading.cos() * reach).round();

        if x >= max_x || x <= ROBOT_HALF_SIZE || y >= max_y || y <= ROBOT_HALF_SIZE {
            return false;
        }

        host.ahead(direction * MOVE_STEP);
        true
    }

    pub fn random_dodge(&mut self, host: &mut dyn Host) {
        let mut turn = self.rng.gen_range(-DODGE_MAX_TURN_DEG..DODGE_MAX_TURN_DEG);
        if turn.abs() < DODGE_MIN_TURN_DEG {
            turn *= DODGE_SMALL_TURN_BOOST;
        }
        host.turn_body(turn.to_radians());

        if self.rng.gen::<f64>() < DODGE_REVERSE_PROBABILITY {
            self.direction = -self.direction;
        }
    }
}
