use guessfire_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::learner::Learner;
use crate::segment::{SegmentClassifier, SegmentSet};

/// Linearly rescale `value` from `[min, max]` to `[new_min, new_max]`.
pub fn map_to_new_scale(value: f64, min: f64, max: f64, new_min: f64, new_max: f64) -> f64 {
    (new_max - new_min) * (value - min) / (max - min) + new_min
}

/// The `[lo, hi)` slice of `[-max_escape_angle, max_escape_angle]` covered by
/// `action` when the range is split into `actions` equal buckets.
pub fn bucket_bounds(action: usize, actions: usize, max_escape_angle: f64) -> (f64, f64) {
    let n = actions as f64;
    let lo = map_to_new_scale(action as f64, 0.0, n, -max_escape_angle, max_escape_angle);
    let hi = map_to_new_scale(action as f64 + 1.0, 0.0, n, -max_escape_angle, max_escape_angle);
    (lo, hi)
}

/// Where `offset` sits within the escape range, in [-1, 1].
pub fn guess_factor(offset: f64, max_escape_angle: f64) -> f64 {
    if max_escape_angle == 0.0 {
        return 0.0;
    }
    (offset / max_escape_angle).clamp(-1.0, 1.0)
}

/// Recover an action index from a guess factor by scaling [-1, 1] onto
/// [0, actions - 1] and rounding.
pub fn action_for_guess_factor(guess_factor: f64, actions: usize) -> usize {
    if actions <= 1 {
        return 0;
    }
    let last = (actions - 1) as f64;
    let scaled = map_to_new_scale(guess_factor, -1.0, 1.0, 0.0, last).round();
    scaled.clamp(0.0, last) as usize
}

/// What the aim controller sees of the opponent at decision time.
#[derive(Debug, Clone, Copy)]
pub struct AimObservation {
    pub distance: f64,
    pub velocity: f64,
}

impl From<&ScanEvent> for AimObservation {
    fn from(scan: &ScanEvent) -> Self {
        Self {
            distance: scan.distance,
            velocity: scan.velocity,
        }
    }
}

/// A decided shot whose gun has not settled yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingShot {
    pub power: f64,
    pub guess_factor: f64,
    pub segments: SegmentSet,
}

impl PendingShot {
    /// Fix the heading the bullet actually left with.
    pub fn bind(self, heading: f64) -> ShotRecord {
        ShotRecord {
            power: self.power,
            heading,
            guess_factor: self.guess_factor,
            segments: self.segments,
        }
    }
}

/// A fired shot. Immutable; identified only by its power and heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    pub power: f64,
    pub heading: f64,
    pub guess_factor: f64,
    pub segments: SegmentSet,
}

#[derive(Debug, Clone, Copy)]
pub struct AimDecision {
    /// Offset from head-on to turn the gun by.
    pub angle_offset: f64,
    /// `None` when the controller fired at random, bypassing the policy.
    pub action: Option<usize>,
    pub shot: PendingShot,
}

/// Turns an observation into a gun offset by asking the learner for a
/// bucket of the escape range and drawing an angle inside it.
#[derive(Debug, Clone)]
pub struct AimController {
    classifier: SegmentClassifier,
    fire_randomly: bool,
    rng: Pcg64,
    pending: Option<PendingShot>,
}

impl AimController {
    pub fn new(config: &AimConfig, seed: u64) -> Self {
        Self {
            classifier: SegmentClassifier::from_config(config),
            fire_randomly: config.fire_randomly,
            rng: Pcg64::seed_from_u64(seed),
            pending: None,
        }
    }

    pub fn classifier(&self) -> &SegmentClassifier {
        &self.classifier
    }

    pub fn pending(&self) -> Option<&PendingShot> {
        self.pending.as_ref()
    }

    pub fn is_aiming(&self) -> bool {
        self.pending.is_some()
    }

    pub fn decide(
        &mut self,
        learner: &mut Learner,
        observation: AimObservation,
        firepower: f64,
        max_escape_angle: f64,
    ) -> AimDecision {
        let segments = self
            .classifier
            .classify(observation.distance, observation.velocity);

        let (action, lo, hi) = if self.fire_randomly {
            (None, -max_escape_angle, max_escape_angle)
        } else {
            let action = learner.select(segments);
            let (lo, hi) = bucket_bounds(action, learner.actions(), max_escape_angle);
            (Some(action), lo, hi)
        };

        let angle_offset = if hi > lo { self.rng.gen_range(lo..hi) } else { lo };
        let shot = PendingShot {
            power: firepower,
            guess_factor: guess_factor(angle_offset, max_escape_angle),
            segments,
        };
        self.pending = Some(shot);

        tracing::trace!(
            ?action,
            %segments,
            angle_offset,
            guess_factor = shot.guess_factor,
            firepower,
            "aim decided"
        );

        AimDecision {
            angle_offset,
            action,
            shot,
        }
    }

    /// The gun fired: bind the pending shot to the heading it left with.
    pub fn confirm_fired(&mut self, heading: f64) -> Option<ShotRecord> {
        self.pending.take().map(|shot| shot.bind(heading))
    }

    pub fn abandon(&mut self) {
        self.pending = None;
    }
}
