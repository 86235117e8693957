use std::fmt;

use guessfire_shared::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score_table::ScoreTable;
use crate::segment::{Segment, SegmentSet};
use crate::selector::{PolicySelector, Temperature};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("action count must be at least 1")]
    NoActions,
    #[error("discount factor must lie in (0, 1], got {0}")]
    DiscountOutOfRange(f64),
    #[error("invalid temperature settings: {0}")]
    Temperature(String),
    #[error("segment universe must be non-empty and include the baseline tag")]
    Segments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerConfig {
    pub actions: usize,
    pub min_score: f64,
    pub discount_factor: f64,
    pub selection: SelectionMode,
    pub initial_temperature: f64,
    pub min_temperature: f64,
    pub temperature_step: f64,
    /// Added to the temperature at the start of every round after the first,
    /// since the opponent may have changed how it dodges.
    pub round_temperature_boost: f64,
    pub initial_score: f64,
    pub initial_favorable: u64,
    pub scoring: ScoringScheme,
    pub segments: SegmentSet,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            actions: DEFAULT_ACTIONS,
            min_score: 0.0,
            // Exploration is driven by the temperature, so scores never decay.
            discount_factor: 1.0,
            selection: SelectionMode::Boltzmann,
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            min_temperature: DEFAULT_MIN_TEMPERATURE,
            temperature_step: DEFAULT_TEMPERATURE_STEP,
            round_temperature_boost: DEFAULT_ROUND_TEMPERATURE_BOOST,
            initial_score: 1.0,
            initial_favorable: 1,
            scoring: ScoringScheme::Ratio,
            segments: SegmentSet::ALL,
        }
    }
}

impl LearnerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actions == 0 {
            return Err(ConfigError::NoActions);
        }
        if !(self.discount_factor > 0.0 && self.discount_factor <= 1.0) {
            return Err(ConfigError::DiscountOutOfRange(self.discount_factor));
        }
        let temps = [
            ("initial_temperature", self.initial_temperature),
            ("min_temperature", self.min_temperature),
            ("temperature_step", self.temperature_step),
            ("round_temperature_boost", self.round_temperature_boost),
        ];
        for (name, value) in temps {
            if !(value >= 0.0) {
                return Err(ConfigError::Temperature(format!("{name} = {value}")));
            }
        }
        if self.min_temperature > self.initial_temperature {
            return Err(ConfigError::Temperature(format!(
                "min_temperature {} exceeds initial_temperature {}",
                self.min_temperature, self.initial_temperature
            )));
        }
        if self.segments.is_empty() || !self.segments.contains(Segment::Baseline) {
            return Err(ConfigError::Segments);
        }
        Ok(())
    }
}

/// Implied number of total actions for a cell holding the ratio
/// `favorable / total`. A zero ratio means nothing was recorded yet.
pub fn total_actions(favorable: u64, ratio: f64) -> u64 {
    if ratio == 0.0 {
        return 0;
    }
    (favorable as f64 / ratio).round() as u64
}

/// Learning state shared by every round of a session: the score table, the
/// policy selector and its temperature. Owned by the caller and lent to the
/// gunner, so it outlives any single round.
#[derive(Debug, Clone)]
pub struct Learner {
    config: LearnerConfig,
    table: ScoreTable,
    selector: PolicySelector,
    seed: u64,
    rounds_started: u32,
}

impl Learner {
    pub fn new(config: LearnerConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = Self::seeded_table(&config);
        let selector = Self::fresh_selector(&config, seed);
        Ok(Self {
            config,
            table,
            selector,
            seed,
            rounds_started: 0,
        })
    }

    fn seeded_table(config: &LearnerConfig) -> ScoreTable {
        let mut table = ScoreTable::new(config.segments, config.actions, config.min_score);
        // Start positive so that misses pull scores down.
        table.fill_scores(config.initial_score);
        table.reset_favorable_counts(config.initial_favorable);
        table
    }

    fn fresh_selector(config: &LearnerConfig, seed: u64) -> PolicySelector {
        let temperature = Temperature::new(
            config.initial_temperature,
            config.min_temperature,
            config.temperature_step,
        );
        PolicySelector::new(config.selection, temperature, seed)
    }

    /// Forget everything learned and start over from the configured state.
    pub fn reset(&mut self) {
        self.table = Self::seeded_table(&self.config);
        self.selector = Self::fresh_selector(&self.config, self.seed);
        self.rounds_started = 0;
    }

    /// Called before each round. Later rounds re-open exploration a little.
    pub fn begin_round(&mut self) {
        if self.rounds_started > 0 {
            self.selector
                .temperature_mut()
                .raise(self.config.round_temperature_boost);
            tracing::debug!(
                temperature = self.temperature(),
                round = self.rounds_started,
                "raised temperature for new round"
            );
        }
        self.rounds_started += 1;
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn table(&self) -> &ScoreTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ScoreTable {
        &mut self.table
    }

    pub fn actions(&self) -> usize {
        self.table.actions()
    }

    pub fn temperature(&self) -> f64 {
        self.selector.temperature().value()
    }

    pub fn rounds_started(&self) -> u32 {
        self.rounds_started
    }

    pub fn select(&mut self, segments: SegmentSet) -> usize {
        let scores = self.table.average_scores(segments);
        self.selector.select(&scores)
    }

    pub fn select_with_draw(&mut self, segments: SegmentSet, draw: f64) -> usize {
        let scores = self.table.average_scores(segments);
        self.selector.select_with_draw(&scores, draw)
    }

    pub fn decrease_temperature(&mut self) {
        self.selector.decrease_temperature();
        tracing::debug!(temperature = self.temperature(), "temperature decreased");
    }

    /// Count one more favorable action at `action` in every matching row.
    pub fn increase_ratio(&mut self, segments: SegmentSet, action: usize) {
        for cell in self.table.cells_mut(segments, action) {
            let total = total_actions(*cell.favorable, *cell.score) + 1;
            *cell.favorable += 1;
            *cell.score = *cell.favorable as f64 / total as f64;
        }
    }

    /// Count one more unfavorable action at `action` in every matching row.
    pub fn decrease_ratio(&mut self, segments: SegmentSet, action: usize) {
        for cell in self.table.cells_mut(segments, action) {
            let total = total_actions(*cell.favorable, *cell.score) + 1;
            *cell.score = *cell.favorable as f64 / total as f64;
        }
    }

    /// Discount every score, then add `amount` at `action` in matching rows.
    pub fn increase_score(&mut self, segments: SegmentSet, action: usize, amount: f64) {
        self.table.apply_discount(self.config.discount_factor, None);
        self.table.adjust_score(segments, action, amount);
    }

    /// Discount every score, then overwrite `action` in matching rows.
    pub fn update_score(&mut self, segments: SegmentSet, action: usize, value: f64) {
        self.table.apply_discount(self.config.discount_factor, None);
        self.table.set_score(segments, action, value);
    }

    /// Fold one resolved shot into the table using the configured scheme.
    /// A hit also cools the temperature.
    pub fn learn(&mut self, segments: SegmentSet, action: usize, outcome: ShotOutcome) {
        match (self.config.scoring, outcome) {
            (ScoringScheme::Ratio, ShotOutcome::Hit) => self.increase_ratio(segments, action),
            (ScoringScheme::Ratio, ShotOutcome::Miss) => self.decrease_ratio(segments, action),
            (ScoringScheme::Additive { hit_reward, .. }, ShotOutcome::Hit) => {
                self.increase_score(segments, action, hit_reward)
            }
            (ScoringScheme::Additive { miss_penalty, .. }, ShotOutcome::Miss) => {
                self.increase_score(segments, action, -miss_penalty)
            }
        }
        if outcome == ShotOutcome::Hit {
            self.decrease_temperature();
        }
    }
}

/// Score decimals for printing: raw weights read as integers.
pub fn score_precision(selection: SelectionMode) -> usize {
    match selection {
        SelectionMode::Boltzmann => 2,
        SelectionMode::SumOfProbabilities => 0,
    }
}

impl fmt::Display for Learner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.table.render(score_precision(self.config.selection)))
    }
}
