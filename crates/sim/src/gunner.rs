use glam::DVec2;
use guessfire_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::aim::{AimController, AimObservation};
use crate::feedback::{Correlation, FeedbackCorrelator};
use crate::host::Host;
use crate::learner::Learner;
use crate::movement::Mover;
use crate::report::{Accuracy, RoundReport};

/// Last known opponent state.
#[derive(Debug, Clone, Default)]
pub struct EnemyTracker {
    pub seen: bool,
    pub last_energy: f64,
    pub last_distance: f64,
    pub last_position: DVec2,
    pub recorded_time: u64,
    /// The last scan showed an energy drop consistent with firing.
    pub fired: bool,
}

impl EnemyTracker {
    pub fn observe(&mut self, scan: &ScanEvent, me: &RobotSnapshot) {
        let drop = (self.last_energy - scan.energy).abs();
        self.fired = self.seen && (MIN_BULLET_POWER..=MAX_BULLET_POWER).contains(&drop);

        let bearing = normal_absolute_angle(me.heading + scan.bearing);
        self.last_position =
            DVec2::new(me.x, me.y) + DVec2::new(bearing.sin(), bearing.cos()) * scan.distance;
        self.recorded_time = me.time;
        self.last_distance = scan.distance;
        self.last_energy = scan.energy;
        self.seen = true;
    }
}

/// Base firepower that creeps up with every hit, plus the per-shot draw.
#[derive(Debug, Clone)]
pub struct FirePowerSchedule {
    base: f64,
    cap: f64,
    step: f64,
    spread: f64,
    close_range_radius: f64,
}

impl FirePowerSchedule {
    pub fn new(config: &GunnerConfig) -> Self {
        Self {
            base: config.base_fire_power.max(MIN_BULLET_POWER),
            cap: config.max_base_fire_power.min(MAX_BULLET_POWER),
            step: config.fire_power_step,
            spread: config.fire_power_spread,
            close_range_radius: config.close_range_radius,
        }
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    /// Full power up close; otherwise a random power just above the base,
    /// which also keeps in-flight shots distinguishable.
    pub fn choose(&self, distance: f64, rng: &mut impl Rng) -> f64 {
        if distance < self.close_range_radius {
            return MAX_BULLET_POWER;
        }
        let power = if self.spread > 0.0 {
            rng.gen_range(self.base..self.base + self.spread)
        } else {
            self.base
        };
        power.clamp(MIN_BULLET_POWER, MAX_BULLET_POWER)
    }

    pub fn on_hit(&mut self) {
        if self.base > self.cap {
            return;
        }
        self.base += self.step;
    }
}

/// Per-round fire control: decides shots on scans, fires once the gun has
/// settled, and feeds bullet outcomes back to the learner.
#[derive(Debug, Clone)]
pub struct Gunner {
    config: GunnerConfig,
    aim: AimController,
    feedback: FeedbackCorrelator,
    enemy: EnemyTracker,
    fire_power: FirePowerSchedule,
    mover: Mover,
    accuracy: Accuracy,
    desired_gun_bearing: Option<f64>,
    scanless_ticks: u32,
    shots_fired: u32,
    rng: Pcg64,
}

impl Gunner {
    pub fn new(config: GunnerConfig, seed: u64) -> Self {
        let mut seeder = Pcg64::seed_from_u64(seed);
        Self {
            aim: AimController::new(&config.aim, seeder.gen()),
            feedback: FeedbackCorrelator::new(config.aim.match_epsilon),
            enemy: EnemyTracker::default(),
            fire_power: FirePowerSchedule::new(&config),
            mover: Mover::new(seeder.gen()),
            accuracy: Accuracy::default(),
            desired_gun_bearing: None,
            scanless_ticks: 0,
            shots_fired: 0,
            rng: Pcg64::seed_from_u64(seeder.gen()),
            config,
        }
    }

    pub fn accuracy(&self) -> &Accuracy {
        &self.accuracy
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    pub fn in_flight(&self) -> usize {
        self.feedback.log().len()
    }

    pub fn enemy(&self) -> &EnemyTracker {
        &self.enemy
    }

    pub fn base_fire_power(&self) -> f64 {
        self.fire_power.base()
    }

    pub fn is_aiming(&self) -> bool {
        self.aim.is_aiming()
    }

    fn gun_ready(&self, me: &RobotSnapshot) -> bool {
        me.gun_heat <= GUN_COOLING_RATE * self.config.aim_prepare_ticks as f64
    }

    fn fire_allowed(&self, me: &RobotSnapshot) -> bool {
        me.energy > self.config.min_energy_to_fire
            || self.enemy.last_distance < self.config.close_range_radius
    }

    /// Fire only once the gun has stopped turning and is cool.
    fn check_fire(&self, host: &mut dyn Host, power: f64) -> bool {
        let me = host.snapshot();
        if me.gun_turn_remaining.abs() < GUN_SETTLED_EPSILON && me.gun_heat <= 0.0 {
            return host.fire(power);
        }
        false
    }

    fn servo_gun(&mut self, host: &mut dyn Host) {
        let Some(bearing) = self.desired_gun_bearing else {
            return;
        };
        if host.snapshot().gun_turn_remaining.abs() < GUN_SETTLED_EPSILON {
            self.desired_gun_bearing = None;
            return;
        }
        host.turn_gun_to(bearing);
    }

    pub fn on_tick(&mut self, host: &mut dyn Host) {
        self.scanless_ticks += 1;

        self.servo_gun(host);

        if self.enemy.fired {
            self.mover.random_dodge(host);
        }
        self.mover.move_to_wall_and_back(host);

        if let Some(shot) = self.aim.pending().copied() {
            if self.check_fire(host, shot.power) {
                self.desired_gun_bearing = None;
                let heading = host.snapshot().gun_heading;
                if let Some(record) = self.aim.confirm_fired(heading) {
                    self.feedback.record(record);
                    self.shots_fired += 1;
                }
            }
        }

        // Finish off a disabled opponent. These shots are not tracked.
        if self.enemy.seen && self.enemy.last_energy <= 0.0 {
            self.check_fire(host, MIN_BULLET_POWER);
        }

        if self.scanless_ticks > SCANLESS_TICKS_BEFORE_SPIN {
            let radar = host.snapshot().radar_heading;
            host.turn_radar_to(radar + std::f64::consts::PI);
        }
    }

    pub fn on_scan(&mut self, host: &mut dyn Host, learner: &mut Learner, scan: &ScanEvent) {
        let me = host.snapshot();
        self.enemy.observe(scan, &me);
        self.scanless_ticks = 0;

        // Decide a tick early so the gun has time to turn before it cools.
        if self.gun_ready(&me)
            && !self.aim.is_aiming()
            && scan.energy > 0.0
            && self.fire_allowed(&me)
        {
            let power = self.fire_power.choose(self.enemy.last_distance, &mut self.rng);
            let decision = self.aim.decide(
                learner,
                AimObservation::from(scan),
                power,
                max_escape_angle(power),
            );
            let bearing = me.heading + scan.bearing + decision.angle_offset;
            self.desired_gun_bearing = Some(bearing);
            host.turn_gun_to(bearing);
        }

        if !self.aim.is_aiming() {
            host.turn_gun_to(me.heading + scan.bearing);
        }

        // Overshoot so the radar sweeps across the target every tick.
        let radar_turn = normal_relative_angle(me.heading + scan.bearing - me.radar_heading);
        host.turn_radar_to(me.radar_heading + 2.0 * radar_turn);
    }

    pub fn on_bullet_hit(&mut self, learner: &mut Learner, event: &BulletEvent) -> Option<Correlation> {
        let correlation = self.feedback.on_hit(learner, event)?;
        self.accuracy.record(ShotOutcome::Hit);
        self.fire_power.on_hit();
        Some(correlation)
    }

    pub fn on_bullet_missed(
        &mut self,
        learner: &mut Learner,
        event: &BulletEvent,
    ) -> Option<Correlation> {
        let correlation = self.feedback.on_miss(learner, event)?;
        self.accuracy.record(ShotOutcome::Miss);
        Some(correlation)
    }

    pub fn on_round_ended(&self, learner: &Learner, round: u32) -> RoundReport {
        let report = RoundReport::new(round, self, learner);
        tracing::info!(
            round,
            accuracy = report.accuracy,
            hits = report.hits,
            resolved = report.resolved,
            temperature = report.temperature,
            "round ended"
        );
        report
    }
}
