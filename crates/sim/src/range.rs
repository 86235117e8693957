use glam::DVec2;
use guessfire_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::gunner::Gunner;
use crate::host::Host;
use crate::learner::{ConfigError, Learner, LearnerConfig};
use crate::report::RoundReport;
use crate::targets::{resolve_target, TargetPattern, TargetView, TARGET_NAMES};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RangeError {
    #[error("unknown target '{0}', expected one of: {names}", names = TARGET_NAMES.join(", "))]
    UnknownTarget(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One robot on the range. Implements [`Host`] so the gunner can drive it.
#[derive(Debug, Clone)]
pub struct RobotBody {
    pub position: DVec2,
    pub heading: f64,
    pub velocity: f64,
    pub gun_heading: f64,
    pub gun_heat: f64,
    pub radar_heading: f64,
    pub energy: f64,
    gun_target: Option<f64>,
    radar_target: Option<f64>,
    turn_remaining: f64,
    distance_remaining: f64,
    fired: Vec<(f64, f64)>,
    field: DVec2,
    time: u64,
}

impl RobotBody {
    pub fn new(start: [f64; 3], field: DVec2) -> Self {
        let [x, y, heading] = start;
        Self {
            position: DVec2::new(x, y),
            heading: normal_absolute_angle(heading),
            velocity: 0.0,
            gun_heading: normal_absolute_angle(heading),
            gun_heat: INITIAL_GUN_HEAT,
            radar_heading: normal_absolute_angle(heading),
            energy: START_ENERGY,
            gun_target: None,
            radar_target: None,
            turn_remaining: 0.0,
            distance_remaining: 0.0,
            fired: Vec::new(),
            field,
            time: 0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.energy <= 0.0
    }

    fn gun_turn_remaining(&self) -> f64 {
        self.gun_target
            .map_or(0.0, |target| normal_relative_angle(target - self.gun_heading))
    }

    /// Bullets requested this tick as `(power, heading)`.
    fn take_fired(&mut self) -> Vec<(f64, f64)> {
        std::mem::take(&mut self.fired)
    }

    fn steer(&mut self, turn: f64, ahead: f64) {
        self.turn_remaining = turn;
        self.distance_remaining = ahead;
    }

    /// Advance one tick: turn, cool, accelerate, move, stay inside the field.
    fn advance(&mut self) {
        let max_turn = (MAX_TURN_RATE_DEG - TURN_RATE_VELOCITY_PENALTY_DEG * self.velocity.abs())
            .to_radians();
        let turn = self.turn_remaining.clamp(-max_turn, max_turn);
        self.heading = normal_absolute_angle(self.heading + turn);
        self.turn_remaining -= turn;

        if let Some(target) = self.gun_target {
            let delta = normal_relative_angle(target - self.gun_heading);
            let max_gun = MAX_GUN_TURN_RATE_DEG.to_radians();
            self.gun_heading = normal_absolute_angle(self.gun_heading + delta.clamp(-max_gun, max_gun));
            if delta.abs() <= max_gun {
                self.gun_target = None;
            }
        }
        if let Some(target) = self.radar_target {
            let delta = normal_relative_angle(target - self.radar_heading);
            let max_radar = MAX_RADAR_TURN_RATE_DEG.to_radians();
            self.radar_heading =
                normal_absolute_angle(self.radar_heading + delta.clamp(-max_radar, max_radar));
            if delta.abs() <= max_radar {
                self.radar_target = None;
            }
        }

        self.gun_heat = (self.gun_heat - GUN_COOLING_RATE).max(0.0);

        self.velocity = next_velocity(self.velocity, self.distance_remaining);
        self.distance_remaining -= self.velocity;
        if self.distance_remaining.abs() < 1e-9 {
            self.distance_remaining = 0.0;
        }

        let forward = DVec2::new(self.heading.sin(), self.heading.cos());
        let moved = self.position + forward * self.velocity;
        let min = DVec2::splat(ROBOT_HALF_SIZE);
        let max = self.field - min;
        self.position = moved.clamp(min, max);
        if self.position != moved {
            self.velocity = 0.0;
            self.distance_remaining = 0.0;
        }

        self.time += 1;
    }
}

/// Velocity after one tick of heading for the end of `distance`: speed up
/// by [`ACCELERATION`], slow down by [`DECELERATION`], and start braking
/// early enough to stop on the spot.
pub fn next_velocity(velocity: f64, distance: f64) -> f64 {
    let goal = if distance.abs() <= crate::movement::brake_distance(velocity.abs()) {
        0.0
    } else {
        distance.signum() * MAX_VELOCITY
    };
    let delta = goal - velocity;
    let rate = if velocity == 0.0 || velocity.signum() == delta.signum() {
        ACCELERATION
    } else {
        DECELERATION
    };
    velocity + delta.clamp(-rate, rate)
}

impl Host for RobotBody {
    fn snapshot(&self) -> RobotSnapshot {
        RobotSnapshot {
            x: self.position.x,
            y: self.position.y,
            heading: self.heading,
            velocity: self.velocity,
            gun_heading: self.gun_heading,
            gun_heat: self.gun_heat,
            gun_turn_remaining: self.gun_turn_remaining(),
            radar_heading: self.radar_heading,
            energy: self.energy,
            battlefield_width: self.field.x,
            battlefield_height: self.field.y,
            time: self.time,
        }
    }

    fn turn_gun_to(&mut self, bearing: f64) {
        self.gun_target = Some(normal_absolute_angle(bearing));
    }

    fn turn_radar_to(&mut self, bearing: f64) {
        self.radar_target = Some(normal_absolute_angle(bearing));
    }

    fn fire(&mut self, power: f64) -> bool {
        let power = power.clamp(MIN_BULLET_POWER, MAX_BULLET_POWER);
        if self.gun_heat > 0.0 || self.energy < power {
            return false;
        }
        self.gun_heat = gun_heat(power);
        self.energy -= power;
        self.fired.push((power, self.gun_heading));
        true
    }

    fn turn_body(&mut self, radians: f64) {
        self.turn_remaining = radians;
    }

    fn ahead(&mut self, distance: f64) {
        self.distance_remaining = distance;
    }
}

#[derive(Debug, Clone, Copy)]
struct Bullet {
    position: DVec2,
    power: f64,
    heading: f64,
}

impl Bullet {
    fn event(&self) -> BulletEvent {
        BulletEvent {
            power: self.power,
            heading: self.heading,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BulletOutcome {
    Hit(BulletEvent),
    Missed(BulletEvent),
}

/// Gunner versus one target pattern.
pub struct Arena {
    pub gunner: RobotBody,
    pub target: RobotBody,
    bullets: Vec<Bullet>,
    events: Vec<BulletOutcome>,
    pub tick: u32,
    pub result: RoundResult,
}

impl Arena {
    pub fn new(config: &RangeConfig) -> Self {
        let field = DVec2::new(config.battlefield_width, config.battlefield_height);
        Self {
            gunner: RobotBody::new(config.gunner_start, field),
            target: RobotBody::new(config.target_start, field),
            bullets: Vec::new(),
            events: Vec::new(),
            tick: 0,
            result: RoundResult {
                reason: RoundEndReason::Timeout,
                final_tick: 0,
                shots_fired: 0,
                hits: 0,
                misses: 0,
                target_energy: START_ENERGY,
            },
        }
    }

    pub fn scan(&self) -> ScanEvent {
        let offset = self.target.position - self.gunner.position;
        let absolute = offset.x.atan2(offset.y);
        ScanEvent {
            distance: offset.length(),
            bearing: normal_relative_angle(absolute - self.gunner.heading),
            heading: self.target.heading,
            velocity: self.target.velocity,
            energy: self.target.energy,
        }
    }

    fn target_view(&self) -> TargetView {
        TargetView {
            position: self.target.position,
            heading: self.target.heading,
            velocity: self.target.velocity,
            gunner: self.gunner.position,
            tick: self.tick,
        }
    }

    /// Move bullets, resolving hits on the target and bullets leaving the field.
    fn step_bullets(&mut self) {
        let field = self.gunner.field;
        let target = &mut self.target;
        let events = &mut self.events;
        let result = &mut self.result;
        let gunner = &mut self.gunner;

        self.bullets.retain_mut(|bullet| {
            let forward = DVec2::new(bullet.heading.sin(), bullet.heading.cos());
            bullet.position += forward * bullet_speed(bullet.power);

            let gap = (bullet.position - target.position).abs();
            if !target.is_disabled() && gap.x <= ROBOT_HALF_SIZE && gap.y <= ROBOT_HALF_SIZE {
                target.energy -= bullet_damage(bullet.power);
                gunner.energy += bullet_hit_bonus(bullet.power);
                result.hits += 1;
                events.push(BulletOutcome::Hit(bullet.event()));
                return false;
            }

            let p = bullet.position;
            if p.x < 0.0 || p.y < 0.0 || p.x > field.x || p.y > field.y {
                result.misses += 1;
                events.push(BulletOutcome::Missed(bullet.event()));
                return false;
            }
            true
        });
    }

    /// One tick in event order: bullet events, scan, gunner, target, physics.
    /// Hand bullet outcomes from the previous step to the gunner.
    pub fn deliver_events(&mut self, gunner: &mut Gunner, learner: &mut Learner) {
        for outcome in std::mem::take(&mut self.events) {
            match outcome {
                BulletOutcome::Hit(event) => {
                    gunner.on_bullet_hit(learner, &event);
                }
                BulletOutcome::Missed(event) => {
                    gunner.on_bullet_missed(learner, &event);
                }
            }
        }
    }

    pub fn step(&mut self, gunner: &mut Gunner, learner: &mut Learner, target: &mut dyn TargetPattern) {
        self.deliver_events(gunner, learner);

        let scan = self.scan();
        gunner.on_scan(&mut self.gunner, learner, &scan);
        gunner.on_tick(&mut self.gunner);

        for (power, heading) in self.gunner.take_fired() {
            self.bullets.push(Bullet {
                position: self.gunner.position,
                power,
                heading,
            });
            self.result.shots_fired += 1;
        }

        if !self.target.is_disabled() {
            let steering = target.steer(&self.target_view());
            self.target.steer(steering.turn, steering.ahead);
        } else {
            self.target.steer(0.0, 0.0);
        }

        self.gunner.advance();
        self.target.advance();
        self.step_bullets();
        self.tick += 1;
    }

    pub fn is_over(&self, max_ticks: u32) -> bool {
        self.target.is_disabled() || self.tick >= max_ticks
    }
}

/// Result of one round together with the gunner's diagnostics.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub result: RoundResult,
    pub report: RoundReport,
}

/// Play one round. The learner keeps whatever it learns.
pub fn run_round(
    config: &RangeConfig,
    learner: &mut Learner,
    target: &mut dyn TargetPattern,
    round: u32,
) -> RoundRecord {
    let mut arena = Arena::new(config);
    let mut gunner = Gunner::new(config.gunner.clone(), round_seed(config.seed, round));

    while !arena.is_over(config.max_ticks) {
        arena.step(&mut gunner, learner, target);
    }
    // the final step can still resolve bullets, including the disabling hit
    arena.deliver_events(&mut gunner, learner);

    let mut result = arena.result.clone();
    result.final_tick = arena.tick;
    result.target_energy = arena.target.energy.max(0.0);
    result.reason = if arena.target.is_disabled() {
        RoundEndReason::TargetDisabled
    } else {
        RoundEndReason::Timeout
    };

    let report = gunner.on_round_ended(learner, round);
    RoundRecord { result, report }
}

fn round_seed(seed: u64, round: u32) -> u64 {
    let mut rng = Pcg64::seed_from_u64(seed ^ ((round as u64) << 32));
    rng.gen()
}

/// A completed session and the learner it trained.
#[derive(Debug, Clone)]
pub struct Session {
    pub target: String,
    pub rounds: Vec<RoundRecord>,
    pub learner: Learner,
}

impl Session {
    pub fn reports(&self) -> Vec<RoundReport> {
        self.rounds.iter().map(|r| r.report.clone()).collect()
    }
}

/// Play `rounds` rounds against the named target with one learner.
pub fn run_session(
    config: &RangeConfig,
    learner_config: LearnerConfig,
    rounds: u32,
    target_name: &str,
) -> Result<Session, RangeError> {
    let mut target = resolve_target(target_name, config.seed)
        .ok_or_else(|| RangeError::UnknownTarget(target_name.to_string()))?;
    let mut learner = Learner::new(learner_config, config.seed)?;

    let mut records = Vec::with_capacity(rounds as usize);
    for round in 0..rounds {
        learner.begin_round();
        records.push(run_round(config, &mut learner, target.as_mut(), round));
    }

    Ok(Session {
        target: target_name.to_string(),
        rounds: records,
        learner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::Sitter;

    fn field() -> DVec2 {
        DVec2::new(BATTLEFIELD_WIDTH, BATTLEFIELD_HEIGHT)
    }

    #[test]
    fn test_next_velocity() {
        assert_eq!(next_velocity(0.0, 100.0), 1.0);
        assert_eq!(next_velocity(8.0, 100.0), 8.0);
        assert_eq!(next_velocity(8.0, -100.0), 6.0);
        assert_eq!(next_velocity(-3.0, -100.0), -4.0);
        assert_eq!(next_velocity(0.0, 0.0), 0.0);
        // within braking distance: slow down
        assert_eq!(next_velocity(8.0, 15.0), 6.0);
    }

    #[test]
    fn test_body_moves_along_heading() {
        let mut body = RobotBody::new([400.0, 300.0, std::f64::consts::FRAC_PI_2], field());
        body.ahead(100.0);
        for _ in 0..3 {
            body.advance();
        }
        // 1 + 2 + 3 east
        assert!((body.position.x - 406.0).abs() < 1e-9);
        assert!((body.position.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_body_stops_at_wall() {
        let mut body = RobotBody::new([400.0, 575.0, 0.0], field());
        body.ahead(100.0);
        for _ in 0..20 {
            body.advance();
        }
        assert_eq!(body.position.y, BATTLEFIELD_HEIGHT - ROBOT_HALF_SIZE);
        assert_eq!(body.velocity, 0.0);
    }

    #[test]
    fn test_gun_turn_rate_and_remaining() {
        let mut body = RobotBody::new([400.0, 300.0, 0.0], field());
        body.turn_gun_to(1.0);
        assert!((body.snapshot().gun_turn_remaining - 1.0).abs() < 1e-12);
        body.advance();
        assert!((body.gun_heading - MAX_GUN_TURN_RATE_DEG.to_radians()).abs() < 1e-12);
        body.advance();
        body.advance();
        assert!((body.gun_heading - 1.0).abs() < 1e-12);
        assert_eq!(body.snapshot().gun_turn_remaining, 0.0);
    }

    #[test]
    fn test_fire_needs_cool_gun() {
        let mut body = RobotBody::new([400.0, 300.0, 0.0], field());
        assert!(!body.fire(1.0));
        body.gun_heat = 0.0;
        assert!(body.fire(1.0));
        assert!((body.gun_heat - 1.2).abs() < 1e-12);
        assert_eq!(body.energy, START_ENERGY - 1.0);
        assert!(!body.fire(1.0));
        assert_eq!(body.take_fired(), vec![(1.0, 0.0)]);
    }

    #[test]
    fn test_scan_geometry() {
        let arena = Arena::new(&RangeConfig::default());
        let scan = arena.scan();
        assert!((scan.distance - 350.0).abs() < 1e-9);
        assert!((scan.bearing - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(scan.energy, START_ENERGY);
    }

    #[test]
    fn test_bullet_hit_and_miss_events() {
        let mut arena = Arena::new(&RangeConfig::default());
        let east = std::f64::consts::FRAC_PI_2;
        arena.bullets.push(Bullet {
            position: arena.gunner.position,
            power: 1.0,
            heading: east,
        });
        arena.bullets.push(Bullet {
            position: arena.gunner.position,
            power: 2.0,
            heading: 0.0,
        });
        for _ in 0..30 {
            arena.step_bullets();
        }
        assert_eq!(arena.result.hits, 1);
        assert_eq!(arena.result.misses, 1);
        assert_eq!(arena.target.energy, START_ENERGY - bullet_damage(1.0));
        assert_eq!(arena.events.len(), 2);
    }

    #[test]
    fn test_round_ends_by_timeout() {
        let config = RangeConfig {
            max_ticks: 50,
            ..Default::default()
        };
        let mut learner = Learner::new(LearnerConfig::default(), 0).unwrap();
        let record = run_round(&config, &mut learner, &mut Sitter, 0);
        assert_eq!(record.result.final_tick, 50);
        assert_eq!(record.result.reason, RoundEndReason::Timeout);
    }

    #[test]
    fn test_disabling_hit_reaches_learner() {
        for seed in 0..4 {
            let config = RangeConfig {
                seed,
                ..Default::default()
            };
            let session = run_session(&config, LearnerConfig::default(), 1, "sitter").unwrap();
            let record = &session.rounds[0];
            assert_eq!(record.result.reason, RoundEndReason::TargetDisabled, "seed {seed}");
            assert_eq!(record.report.hits, record.result.hits, "seed {seed}");
        }
    }

    #[test]
    fn test_deliver_events_drains_queue() {
        let mut arena = Arena::new(&RangeConfig::default());
        arena.bullets.push(Bullet {
            position: arena.gunner.position,
            power: 1.0,
            heading: std::f64::consts::FRAC_PI_2,
        });
        for _ in 0..30 {
            arena.step_bullets();
        }
        assert_eq!(arena.events.len(), 1);

        let mut gunner = Gunner::new(GunnerConfig::default(), 0);
        let mut learner = Learner::new(LearnerConfig::default(), 0).unwrap();
        arena.deliver_events(&mut gunner, &mut learner);
        assert!(arena.events.is_empty());
        // never logged, so nothing resolves
        assert_eq!(gunner.accuracy().resolved, 0);
    }

    #[test]
    fn test_unknown_target() {
        let err = run_session(&RangeConfig::default(), LearnerConfig::default(), 1, "tank")
            .unwrap_err();
        assert_eq!(err, RangeError::UnknownTarget("tank".into()));
        assert!(err.to_string().contains("sitter"));
    }

    #[test]
    fn test_invalid_learner_config() {
        let config = LearnerConfig {
            actions: 0,
            ..Default::default()
        };
        let err = run_session(&RangeConfig::default(), config, 1, "sitter").unwrap_err();
        assert!(matches!(err, RangeError::Config(ConfigError::NoActions)));
    }
}
