use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use guessfire_shared::*;
use serde::{Deserialize, Serialize};

/// A single categorical tag. Every observation carries `Baseline` plus one
/// tag from each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Baseline,
    DistanceClose,
    DistanceFar,
    VelocityFast,
    VelocitySlow,
}

impl Segment {
    pub const ALL: [Segment; 5] = [
        Segment::Baseline,
        Segment::DistanceClose,
        Segment::DistanceFar,
        Segment::VelocityFast,
        Segment::VelocitySlow,
    ];

    pub const fn bit(self) -> u8 {
        match self {
            Segment::Baseline => 1,
            Segment::DistanceClose => 2,
            Segment::DistanceFar => 4,
            Segment::VelocityFast => 8,
            Segment::VelocitySlow => 16,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Segment::Baseline => "baseline",
            Segment::DistanceClose => "distance_close",
            Segment::DistanceFar => "distance_far",
            Segment::VelocityFast => "velocity_fast",
            Segment::VelocitySlow => "velocity_slow",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compound set of tags, stored as a bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SegmentSet(u8);

impl SegmentSet {
    pub const EMPTY: SegmentSet = SegmentSet(0);
    pub const ALL: SegmentSet = SegmentSet(0b1_1111);

    pub fn of(segments: &[Segment]) -> Self {
        segments.iter().fold(Self::EMPTY, |set, &s| set | s)
    }

    pub fn with(self, segment: Segment) -> Self {
        SegmentSet(self.0 | segment.bit())
    }

    pub fn contains(self, segment: Segment) -> bool {
        self.0 & segment.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.iter().count()
    }

    /// Expand into the simple tags this set is made of.
    pub fn iter(self) -> impl Iterator<Item = Segment> {
        Segment::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl From<Segment> for SegmentSet {
    fn from(segment: Segment) -> Self {
        SegmentSet(segment.bit())
    }
}

impl BitOr<Segment> for SegmentSet {
    type Output = SegmentSet;

    fn bitor(self, rhs: Segment) -> SegmentSet {
        self.with(rhs)
    }
}

impl BitOr for SegmentSet {
    type Output = SegmentSet;

    fn bitor(self, rhs: SegmentSet) -> SegmentSet {
        SegmentSet(self.0 | rhs.0)
    }
}

impl BitOrAssign<Segment> for SegmentSet {
    fn bitor_assign(&mut self, rhs: Segment) {
        self.0 |= rhs.bit();
    }
}

impl fmt::Display for SegmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Segment::name).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// One observation axis: the tag used at or below the threshold and the
/// one used above it.
struct Axis {
    low: Segment,
    high: Segment,
}

const DISTANCE_AXIS: Axis = Axis {
    low: Segment::DistanceClose,
    high: Segment::DistanceFar,
};

const VELOCITY_AXIS: Axis = Axis {
    low: Segment::VelocitySlow,
    high: Segment::VelocityFast,
};

impl Axis {
    fn pick(&self, value: f64, threshold: f64) -> Segment {
        if value.abs() > threshold {
            self.high
        } else {
            self.low
        }
    }
}

/// Maps a continuous observation of the opponent to its active segments.
#[derive(Debug, Clone, Copy)]
pub struct SegmentClassifier {
    pub far_distance: f64,
    pub fast_velocity: f64,
}

impl SegmentClassifier {
    pub fn new(far_distance: f64, fast_velocity: f64) -> Self {
        Self {
            far_distance,
            fast_velocity,
        }
    }

    pub fn from_config(config: &AimConfig) -> Self {
        Self::new(config.far_distance, config.fast_velocity)
    }

    pub fn classify(&self, distance: f64, velocity: f64) -> SegmentSet {
        SegmentSet::from(Segment::Baseline)
            | DISTANCE_AXIS.pick(distance, self.far_distance)
            | VELOCITY_AXIS.pick(velocity, self.fast_velocity)
    }
}

impl Default for SegmentClassifier {
    fn default() -> Self {
        Self::new(FAR_DISTANCE, FAST_VELOCITY)
    }
}
