use std::fmt;

use guessfire_shared::*;
use serde::{Deserialize, Serialize};

use crate::gunner::Gunner;
use crate::learner::{score_precision, Learner};
use crate::score_table::{render_rows, ScoreRow};

/// Hits over shots whose outcome came back and matched the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accuracy {
    pub resolved: u32,
    pub hits: u32,
}

impl Accuracy {
    pub fn record(&mut self, outcome: ShotOutcome) {
        self.resolved += 1;
        if outcome == ShotOutcome::Hit {
            self.hits += 1;
        }
    }

    /// 1.0 before anything has resolved.
    pub fn value(&self) -> f64 {
        if self.resolved == 0 {
            return 1.0;
        }
        self.hits as f64 / self.resolved as f64
    }
}

/// End-of-round diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub shots_fired: u32,
    pub resolved: u32,
    pub hits: u32,
    pub accuracy: f64,
    pub temperature: f64,
    pub base_fire_power: f64,
    pub selection: SelectionMode,
    pub scores: Vec<ScoreRow>,
}

impl RoundReport {
    pub fn new(round: u32, gunner: &Gunner, learner: &Learner) -> Self {
        let accuracy = gunner.accuracy();
        Self {
            round,
            shots_fired: gunner.shots_fired(),
            resolved: accuracy.resolved,
            hits: accuracy.hits,
            accuracy: accuracy.value(),
            temperature: learner.temperature(),
            base_fire_power: gunner.base_fire_power(),
            selection: learner.config().selection,
            scores: learner.table().rows().to_vec(),
        }
    }

    /// Decimals used when printing scores.
    pub fn precision(&self) -> usize {
        score_precision(self.selection)
    }
}

impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Round {}: accuracy {:.3} ({}/{}), temperature {:.4}",
            self.round, self.accuracy, self.hits, self.resolved, self.temperature
        )?;
        f.write_str(&render_rows(&self.scores, self.precision()))
    }
}

/// Aggregate over the rounds of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub rounds: u32,
    pub resolved: u32,
    pub hits: u32,
    /// Pooled hits over pooled resolved shots.
    pub accuracy: f64,
    pub first_round_accuracy: f64,
    pub last_round_accuracy: f64,
    pub final_temperature: f64,
}

pub fn summarize(reports: &[RoundReport]) -> SessionSummary {
    let mut total = Accuracy::default();
    for report in reports {
        total.resolved += report.resolved;
        total.hits += report.hits;
    }
    SessionSummary {
        rounds: reports.len() as u32,
        resolved: total.resolved,
        hits: total.hits,
        accuracy: total.value(),
        first_round_accuracy: reports.first().map_or(1.0, |r| r.accuracy),
        last_round_accuracy: reports.last().map_or(1.0, |r| r.accuracy),
        final_temperature: reports.last().map_or(0.0, |r| r.temperature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learner::LearnerConfig;

    #[test]
    fn test_accuracy_defaults_to_one() {
        let mut accuracy = Accuracy::default();
        assert_eq!(accuracy.value(), 1.0);
        accuracy.record(ShotOutcome::Miss);
        accuracy.record(ShotOutcome::Hit);
        accuracy.record(ShotOutcome::Miss);
        accuracy.record(ShotOutcome::Miss);
        assert_eq!(accuracy.value(), 0.25);
    }

    #[test]
    fn test_report_snapshots_table() {
        let learner = Learner::new(LearnerConfig::default(), 1).unwrap();
        let gunner = Gunner::new(GunnerConfig::default(), 1);
        let report = RoundReport::new(0, &gunner, &learner);
        assert_eq!(report.scores.len(), 5);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.temperature, DEFAULT_INITIAL_TEMPERATURE);

        let text = report.to_string();
        assert!(text.contains("Segment baseline:"));
        assert!(text.contains("1.00 | 1.00"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"scores\""));
    }

    #[test]
    fn test_report_renders_the_same_after_json() {
        let gunner = Gunner::new(GunnerConfig::default(), 1);
        for selection in [SelectionMode::Boltzmann, SelectionMode::SumOfProbabilities] {
            let config = LearnerConfig {
                selection,
                ..Default::default()
            };
            let learner = Learner::new(config, 1).unwrap();
            let report = RoundReport::new(0, &gunner, &learner);
            let json = serde_json::to_string(&report).unwrap();
            let back: RoundReport = serde_json::from_str(&json).unwrap();
            assert_eq!(back.selection, selection);
            assert_eq!(back.to_string(), report.to_string());
        }

        let learner = Learner::new(LearnerConfig::default(), 1).unwrap();
        let json = serde_json::to_string(&RoundReport::new(0, &gunner, &learner)).unwrap();
        let back: RoundReport = serde_json::from_str(&json).unwrap();
        assert!(back.to_string().contains("1.00 | 1.00"));
    }

    #[test]
    fn test_summarize_pools_rounds() {
        let learner = Learner::new(LearnerConfig::default(), 1).unwrap();
        let gunner = Gunner::new(GunnerConfig::default(), 1);
        let mut a = RoundReport::new(0, &gunner, &learner);
        a.resolved = 4;
        a.hits = 1;
        a.accuracy = 0.25;
        let mut b = a.clone();
        b.round = 1;
        b.resolved = 6;
        b.hits = 4;
        b.accuracy = 4.0 / 6.0;

        let summary = summarize(&[a, b]);
        assert_eq!(summary.rounds, 2);
        assert_eq!(summary.accuracy, 0.5);
        assert_eq!(summary.first_round_accuracy, 0.25);

        let empty = summarize(&[]);
        assert_eq!(empty.accuracy, 1.0);
    }
}
