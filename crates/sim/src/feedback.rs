use guessfire_shared::*;

use crate::aim::{action_for_guess_factor, ShotRecord};
use crate::learner::Learner;
use crate::segment::SegmentSet;

/// Shots in flight, waiting for their hit or miss event.
#[derive(Debug, Clone, Default)]
pub struct ShotLog {
    shots: Vec<ShotRecord>,
}

impl ShotLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shot: ShotRecord) {
        self.shots.push(shot);
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShotRecord> {
        self.shots.iter()
    }

    pub fn clear(&mut self) {
        self.shots.clear();
    }

    /// Remove and return the oldest shot whose power and heading both lie
    /// within `epsilon` of the event's.
    ///
    /// Two shots fired with the same power and heading are
    /// indistinguishable; the oldest one wins.
    pub fn take_matching(&mut self, event: &BulletEvent, epsilon: f64) -> Option<ShotRecord> {
        let idx = self.shots.iter().position(|shot| {
            (shot.power - event.power).abs() < epsilon
                && (shot.heading - event.heading).abs() < epsilon
        })?;
        Some(self.shots.remove(idx))
    }
}

/// A feedback event matched back to the shot that caused it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub action: usize,
    pub segments: SegmentSet,
    pub outcome: ShotOutcome,
    pub shot: ShotRecord,
}

/// Routes hit/miss events to the learner by way of the shot log.
#[derive(Debug, Clone)]
pub struct FeedbackCorrelator {
    log: ShotLog,
    epsilon: f64,
}

impl FeedbackCorrelator {
    pub fn new(epsilon: f64) -> Self {
        Self {
            log: ShotLog::new(),
            epsilon,
        }
    }

    pub fn log(&self) -> &ShotLog {
        &self.log
    }

    pub fn record(&mut self, shot: ShotRecord) {
        self.log.push(shot);
    }

    pub fn on_hit(&mut self, learner: &mut Learner, event: &BulletEvent) -> Option<Correlation> {
        self.correlate(learner, event, ShotOutcome::Hit)
    }

    pub fn on_miss(&mut self, learner: &mut Learner, event: &BulletEvent) -> Option<Correlation> {
        self.correlate(learner, event, ShotOutcome::Miss)
    }

    /// Unmatched events are normal (untracked shots, late delivery) and
    /// leave the learner untouched.
    pub fn correlate(
        &mut self,
        learner: &mut Learner,
        event: &BulletEvent,
        outcome: ShotOutcome,
    ) -> Option<Correlation> {
        let Some(shot) = self.log.take_matching(event, self.epsilon) else {
            tracing::debug!(
                power = event.power,
                heading = event.heading,
                ?outcome,
                "no in-flight shot matches event"
            );
            return None;
        };

        let action = action_for_guess_factor(shot.guess_factor, learner.actions());
        learner.learn(shot.segments, action, outcome);

        tracing::debug!(
            action,
            segments = %shot.segments,
            ?outcome,
            in_flight = self.log.len(),
            "shot feedback applied"
        );

        Some(Correlation {
            action,
            segments: shot.segments,
            outcome,
            shot,
        })
    }
}

impl Default for FeedbackCorrelator {
    fn default() -> Self {
        Self::new(SHOT_MATCH_EPSILON)
    }
}
