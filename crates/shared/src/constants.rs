// Robot kinematics
pub const MAX_VELOCITY: f64 = 8.0;
pub const ACCELERATION: f64 = 1.0;
pub const DECELERATION: f64 = 2.0;
pub const MAX_TURN_RATE_DEG: f64 = 10.0;
pub const TURN_RATE_VELOCITY_PENALTY_DEG: f64 = 0.75;
pub const ROBOT_SIZE: f64 = 36.0;
pub const ROBOT_HALF_SIZE: f64 = ROBOT_SIZE / 2.0;
pub const START_ENERGY: f64 = 100.0;

// Gun
pub const MAX_GUN_TURN_RATE_DEG: f64 = 20.0;
pub const MAX_RADAR_TURN_RATE_DEG: f64 = 45.0;
pub const GUN_COOLING_RATE: f64 = 0.1;
pub const INITIAL_GUN_HEAT: f64 = 3.0;
pub const MIN_BULLET_POWER: f64 = 0.1;
pub const MAX_BULLET_POWER: f64 = 3.0;

// Battlefield
pub const BATTLEFIELD_WIDTH: f64 = 800.0;
pub const BATTLEFIELD_HEIGHT: f64 = 600.0;
pub const DEFAULT_MAX_TICKS: u32 = 4000;

// Segmentation
pub const FAR_DISTANCE: f64 = 150.0;
pub const FAST_VELOCITY: f64 = MAX_VELOCITY / 2.0;

// Shot correlation: power and heading must both agree within this
pub const SHOT_MATCH_EPSILON: f64 = 1e-4;

// Learner defaults
pub const DEFAULT_ACTIONS: usize = 9;
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MIN_TEMPERATURE: f64 = 0.005;
pub const DEFAULT_TEMPERATURE_STEP: f64 = DEFAULT_INITIAL_TEMPERATURE / 20.0;
pub const DEFAULT_ROUND_TEMPERATURE_BOOST: f64 = DEFAULT_TEMPERATURE_STEP * 5.0;
// Additive scoring: reward and penalty per resolved shot
pub const DEFAULT_HIT_REWARD: f64 = 1.0;
pub const DEFAULT_MISS_PENALTY: f64 = 0.5;

// Gunner
pub const BASE_FIRE_POWER: f64 = 1.0;
pub const MAX_BASE_FIRE_POWER: f64 = 1.6;
pub const FIRE_POWER_STEP: f64 = 0.05;
pub const FIRE_POWER_SPREAD: f64 = 0.3;
pub const MIN_ENERGY_TO_FIRE: f64 = 20.0;
pub const CLOSE_RANGE_RADIUS: f64 = 75.0;
pub const AIM_PREPARE_TICKS: u32 = 1;
pub const GUN_SETTLED_EPSILON: f64 = 0.01;
pub const SCANLESS_TICKS_BEFORE_SPIN: u32 = 3;

// Movement
pub const MOVE_STEP: f64 = 30.0;
pub const DODGE_MAX_TURN_DEG: f64 = 17.0;
pub const DODGE_MIN_TURN_DEG: f64 = 5.0;
pub const DODGE_SMALL_TURN_BOOST: f64 = 2.5;
pub const DODGE_REVERSE_PROBABILITY: f64 = 0.1;

/// Bullet speed in units per tick for the given power.
pub fn bullet_speed(power: f64) -> f64 {
    20.0 - 3.0 * power
}

/// Heat added to the gun when firing at `power`.
pub fn gun_heat(power: f64) -> f64 {
    1.0 + power / 5.0
}

/// Energy removed from a robot hit by a bullet of `power`.
pub fn bullet_damage(power: f64) -> f64 {
    let mut damage = 4.0 * power;
    if power > 1.0 {
        damage += 2.0 * (power - 1.0);
    }
    damage
}

/// Energy a shooter regains when its bullet hits.
pub fn bullet_hit_bonus(power: f64) -> f64 {
    3.0 * power
}

/// Largest angle off head-on that a target moving at [`MAX_VELOCITY`]
/// could still reach before a bullet of `firepower` arrives.
pub fn max_escape_angle(firepower: f64) -> f64 {
    (MAX_VELOCITY / bullet_speed(firepower)).asin()
}

/// Normalize angle to [-PI, PI).
pub fn normal_relative_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let a = (angle + PI).rem_euclid(TAU) - PI;
    if a.is_nan() {
        0.0
    } else {
        a
    }
}

/// Normalize angle to [0, 2PI).
pub fn normal_absolute_angle(angle: f64) -> f64 {
    angle.rem_euclid(std::f64::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_bullet_speed_range() {
        assert!((bullet_speed(MIN_BULLET_POWER) - 19.7).abs() < 1e-9);
        assert!((bullet_speed(MAX_BULLET_POWER) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_escape_angle_grows_with_power() {
        let low = max_escape_angle(MIN_BULLET_POWER);
        let high = max_escape_angle(MAX_BULLET_POWER);
        assert!(high > low);
        assert!((high - (8.0f64 / 11.0).asin()).abs() < 1e-12);
    }

    #[test]
    fn test_bullet_damage() {
        assert!((bullet_damage(1.0) - 4.0).abs() < 1e-12);
        assert!((bullet_damage(3.0) - 16.0).abs() < 1e-12);
        assert!((bullet_damage(0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_relative_angle() {
        assert!(normal_relative_angle(0.0).abs() < 1e-12);
        assert!((normal_relative_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((normal_relative_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        let a = normal_relative_angle(7.0);
        assert!((-PI..PI).contains(&a));
    }

    #[test]
    fn test_normal_absolute_angle() {
        assert!((normal_absolute_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-12);
        assert!((normal_absolute_angle(5.0 * PI) - PI).abs() < 1e-9);
    }
}
