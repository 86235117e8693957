use serde::{Deserialize, Serialize};

/// How the policy turns averaged scores into a draw over actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Probability proportional to the raw score.
    SumOfProbabilities,
    /// Probability proportional to `exp(score / temperature)`.
    Boltzmann,
}

/// How hit/miss feedback is folded into the score table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoringScheme {
    /// Each cell holds the empirical hit rate of its action.
    Ratio,
    /// Discount every score, then add `hit_reward` or subtract `miss_penalty`.
    Additive { hit_reward: f64, miss_penalty: f64 },
}

impl ScoringScheme {
    /// Additive scoring with the default reward and penalty.
    pub fn additive() -> Self {
        ScoringScheme::Additive {
            hit_reward: crate::DEFAULT_HIT_REWARD,
            miss_penalty: crate::DEFAULT_MISS_PENALTY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AimConfig {
    /// Ignore the policy and fire anywhere inside the escape range.
    pub fire_randomly: bool,
    pub far_distance: f64,
    pub fast_velocity: f64,
    pub match_epsilon: f64,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            fire_randomly: false,
            far_distance: crate::FAR_DISTANCE,
            fast_velocity: crate::FAST_VELOCITY,
            match_epsilon: crate::SHOT_MATCH_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GunnerConfig {
    pub aim: AimConfig,
    pub base_fire_power: f64,
    pub max_base_fire_power: f64,
    pub fire_power_step: f64,
    pub fire_power_spread: f64,
    pub min_energy_to_fire: f64,
    pub close_range_radius: f64,
    pub aim_prepare_ticks: u32,
}

impl Default for GunnerConfig {
    fn default() -> Self {
        Self {
            aim: AimConfig::default(),
            base_fire_power: crate::BASE_FIRE_POWER,
            max_base_fire_power: crate::MAX_BASE_FIRE_POWER,
            fire_power_step: crate::FIRE_POWER_STEP,
            fire_power_spread: crate::FIRE_POWER_SPREAD,
            min_energy_to_fire: crate::MIN_ENERGY_TO_FIRE,
            close_range_radius: crate::CLOSE_RANGE_RADIUS,
            aim_prepare_ticks: crate::AIM_PREPARE_TICKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    pub seed: u64,
    pub max_ticks: u32,
    pub battlefield_width: f64,
    pub battlefield_height: f64,
    /// Gunner start as `[x, y, heading]`.
    pub gunner_start: [f64; 3],
    /// Target start as `[x, y, heading]`.
    pub target_start: [f64; 3],
    pub gunner: GunnerConfig,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: crate::DEFAULT_MAX_TICKS,
            battlefield_width: crate::BATTLEFIELD_WIDTH,
            battlefield_height: crate::BATTLEFIELD_HEIGHT,
            gunner_start: [200.0, 300.0, 0.0],
            target_start: [550.0, 300.0, 0.0],
            gunner: GunnerConfig::default(),
        }
    }
}

/// Observation of the opponent delivered by the host's radar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanEvent {
    pub distance: f64,
    /// Bearing relative to our body heading.
    pub bearing: f64,
    pub heading: f64,
    pub velocity: f64,
    pub energy: f64,
}

/// A bullet that landed or left the field, identified by what it was fired with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BulletEvent {
    pub power: f64,
    pub heading: f64,
}

/// Own state as read from the host each tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub velocity: f64,
    pub gun_heading: f64,
    pub gun_heat: f64,
    pub gun_turn_remaining: f64,
    pub radar_heading: f64,
    pub energy: f64,
    pub battlefield_width: f64,
    pub battlefield_height: f64,
    pub time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEndReason {
    TargetDisabled,
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub reason: RoundEndReason,
    pub final_tick: u32,
    pub shots_fired: u32,
    pub hits: u32,
    pub misses: u32,
    pub target_energy: f64,
}

impl RoundResult {
    /// Hits over bullets that landed or left the field.
    pub fn hit_rate(&self) -> f64 {
        let resolved = self.hits + self.misses;
        if resolved == 0 {
            return 1.0;
        }
        self.hits as f64 / resolved as f64
    }
}
