
use serde::{Deserialize, Serialize};

use crate::segment::{Segment, SegmentSet};

/// Scores for one simple segment, one per action, with the index-aligned
/// favorable-action counters used when scores are hit rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub segment: Segment,
    pub scores: Vec<f64>,
    pub favorable: Vec<u64>,
}

/// Mutable view of one (segment, action) cell.
pub struct Cell<'a> {
    pub segment: Segment,
    pub score: &'a mut f64,
    pub favorable: &'a mut u64,
}

/// Per-segment action scores. Compound segment sets never get a row of
/// their own: a query touches the row of every simple tag it contains.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    rows: Vec<ScoreRow>,
    actions: usize,
    min_score: f64,
}

impl ScoreTable {
    /// One zeroed row per simple tag in `universe`.
    pub fn new(universe: SegmentSet, actions: usize, min_score: f64) -> Self {
        let rows = universe
            .iter()
            .map(|segment| ScoreRow {
                segment,
                scores: vec![0.0; actions],
                favorable: vec![0; actions],
            })
            .collect();
        Self {
            rows,
            actions,
            min_score,
        }
    }

    pub fn actions(&self) -> usize {
        self.actions
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn row(&self, segment: Segment) -> Option<&ScoreRow> {
        self.rows.iter().find(|r| r.segment == segment)
    }

    pub fn segments(&self) -> SegmentSet {
        self.rows
            .iter()
            .fold(SegmentSet::EMPTY, |set, r| set.with(r.segment))
    }

    fn matching(&self, set: SegmentSet) -> impl Iterator<Item = &ScoreRow> {
        self.rows.iter().filter(move |r| set.contains(r.segment))
    }

    fn matching_mut(&mut self, set: SegmentSet) -> impl Iterator<Item = &mut ScoreRow> {
        self.rows.iter_mut().filter(move |r| set.contains(r.segment))
    }

    /// The score row of every recognized tag in `set`.
    pub fn scores_for(&self, set: SegmentSet) -> Vec<&[f64]> {
        self.matching(set).map(|r| r.scores.as_slice()).collect()
    }

    /// Element-wise mean of [`Self::scores_for`]; all zeros when nothing matches.
    pub fn average_scores(&self, set: SegmentSet) -> Vec<f64> {
        let mut sum = vec![0.0; self.actions];
        let mut count = 0usize;
        for row in self.matching(set) {
            for (acc, score) in sum.iter_mut().zip(&row.scores) {
                *acc += score;
            }
            count += 1;
        }
        if count > 0 {
            for acc in &mut sum {
                *acc /= count as f64;
            }
        }
        sum
    }

    /// Multiply every score by `factor`, in all rows or only in the rows
    /// matching `filter`.
    pub fn apply_discount(&mut self, factor: f64, filter: Option<SegmentSet>) {
        let set = filter.unwrap_or(SegmentSet::ALL);
        for row in self.matching_mut(set) {
            for score in &mut row.scores {
                *score *= factor;
            }
        }
    }

    pub fn adjust_score(&mut self, set: SegmentSet, action: usize, delta: f64) {
        let floor = self.min_score;
        for row in self.matching_mut(set) {
            if let Some(score) = row.scores.get_mut(action) {
                *score = (*score + delta).max(floor);
            }
        }
    }

    pub fn set_score(&mut self, set: SegmentSet, action: usize, value: f64) {
        let floor = self.min_score;
        for row in self.matching_mut(set) {
            if let Some(score) = row.scores.get_mut(action) {
                *score = value.max(floor);
            }
        }
    }

    /// Overwrite every score in every row.
    pub fn fill_scores(&mut self, value: f64) {
        let value = value.max(self.min_score);
        for row in &mut self.rows {
            row.scores.fill(value);
        }
    }

    /// Add `amount` to every score in every row.
    pub fn add_to_all(&mut self, amount: f64) {
        let floor = self.min_score;
        for row in &mut self.rows {
            for score in &mut row.scores {
                *score = (*score + amount).max(floor);
            }
        }
    }

    pub fn reset_favorable_counts(&mut self, value: u64) {
        for row in &mut self.rows {
            row.favorable.fill(value);
        }
    }

    /// The cell for `action` in every row matching `set`.
    pub fn cells_mut(&mut self, set: SegmentSet, action: usize) -> impl Iterator<Item = Cell<'_>> {
        self.matching_mut(set).filter_map(move |row| {
            let segment = row.segment;
            let score = row.scores.get_mut(action)?;
            let favorable = row.favorable.get_mut(action)?;
            Some(Cell {
                segment,
                score,
                favorable,
            })
        })
    }

    /// Per-segment listing with scores rounded to `precision` decimals.
    pub fn render(&self, precision: usize) -> String {
        render_rows(&self.rows, precision)
    }
}

pub fn render_rows(rows: &[ScoreRow], precision: usize) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!("Segment {}:\n", row.segment));
        let cells: Vec<String> = row
            .scores
            .iter()
            .map(|s| format!("{:.*}", precision, s))
            .collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_rows(a: [f64; 3], b: [f64; 3]) -> ScoreTable {
        let mut table = ScoreTable::new(
            SegmentSet::of(&[Segment::DistanceClose, Segment::VelocityFast]),
            3,
            0.0,
        );
        for (i, (x, y)) in a.iter().zip(&b).enumerate() {
            table.set_score(Segment::DistanceClose.into(), i, *x);
            table.set_score(Segment::VelocityFast.into(), i, *y);
        }
        table
    }

    #[test]
    fn test_one_row_per_simple_tag() {
        let table = ScoreTable::new(SegmentSet::ALL, 9, 0.0);
        assert_eq!(table.rows().len(), 5);
        for segment in Segment::ALL {
            let row = table.row(segment).unwrap();
            assert_eq!(row.scores.len(), 9);
            assert_eq!(row.favorable.len(), 9);
        }
    }

    #[test]
    fn test_scores_for_compound_set_returns_each_row() {
        let table = ScoreTable::new(SegmentSet::ALL, 4, 0.0);
        let set = SegmentSet::of(&[Segment::Baseline, Segment::DistanceFar, Segment::VelocitySlow]);
        assert_eq!(table.scores_for(set).len(), 3);
    }

    #[test]
    fn test_unregistered_tags_are_ignored() {
        let table = ScoreTable::new(Segment::Baseline.into(), 4, 0.0);
        assert!(table.scores_for(Segment::DistanceFar.into()).is_empty());
        assert_eq!(table.average_scores(Segment::DistanceFar.into()), vec![0.0; 4]);
    }

    #[test]
    fn test_average_scores() {
        let table = table_with_rows([1.0, 2.0, 3.0], [3.0, 2.0, 1.0]);
        let set = SegmentSet::of(&[Segment::DistanceClose, Segment::VelocityFast]);
        assert_eq!(table.average_scores(set), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_apply_discount_scales_every_element() {
        let mut table = table_with_rows([1.0, 2.0, 3.0], [3.0, 2.0, 1.0]);
        let before = table.rows().to_vec();
        table.apply_discount(0.9, None);
        for (old, new) in before.iter().zip(table.rows()) {
            for (o, n) in old.scores.iter().zip(&new.scores) {
                assert!((n - 0.9 * o).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_apply_discount_with_filter() {
        let mut table = table_with_rows([1.0, 2.0, 3.0], [3.0, 2.0, 1.0]);
        table.apply_discount(0.5, Some(Segment::DistanceClose.into()));
        assert_eq!(table.row(Segment::DistanceClose).unwrap().scores, vec![0.5, 1.0, 1.5]);
        assert_eq!(table.row(Segment::VelocityFast).unwrap().scores, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_set_score_clamps_to_floor() {
        let mut table = ScoreTable::new(SegmentSet::ALL, 3, 0.0);
        table.set_score(SegmentSet::ALL, 1, -50.0);
        for row in table.rows() {
            assert_eq!(row.scores[1], 0.0);
        }
    }

    #[test]
    fn test_adjust_score_clamps_to_floor() {
        let mut table = ScoreTable::new(SegmentSet::ALL, 3, 0.25);
        table.adjust_score(Segment::Baseline.into(), 0, 1.0);
        assert_eq!(table.row(Segment::Baseline).unwrap().scores[0], 1.0);
        table.adjust_score(Segment::Baseline.into(), 0, -10.0);
        assert_eq!(table.row(Segment::Baseline).unwrap().scores[0], 0.25);
        // untouched rows keep their value
        assert_eq!(table.row(Segment::DistanceFar).unwrap().scores[0], 0.0);
    }

    #[test]
    fn test_rows_are_independent() {
        let mut table = ScoreTable::new(SegmentSet::ALL, 2, 0.0);
        table.adjust_score(Segment::DistanceFar.into(), 1, 3.0);
        assert_eq!(table.row(Segment::DistanceFar).unwrap().scores[1], 3.0);
        assert_eq!(table.row(Segment::DistanceClose).unwrap().scores[1], 0.0);
    }

    #[test]
    fn test_out_of_range_action_is_ignored() {
        let mut table = ScoreTable::new(SegmentSet::ALL, 2, 0.0);
        table.adjust_score(SegmentSet::ALL, 5, 1.0);
        assert_eq!(table.average_scores(SegmentSet::ALL), vec![0.0, 0.0]);
        assert_eq!(table.cells_mut(SegmentSet::ALL, 5).count(), 0);
    }

    #[test]
    fn test_reset_favorable_counts() {
        let mut table = ScoreTable::new(SegmentSet::ALL, 3, 0.0);
        table.reset_favorable_counts(1);
        assert!(table.rows().iter().all(|r| r.favorable == vec![1, 1, 1]));
    }

    #[test]
    fn test_render_lists_each_segment() {
        let mut table = ScoreTable::new(SegmentSet::of(&[Segment::Baseline]), 2, 0.0);
        table.fill_scores(1.0);
        assert_eq!(table.render(2), "Segment baseline:\n1.00 | 1.00\n");
        assert_eq!(table.render(0), "Segment baseline:\n1 | 1\n");
    }
}
