pub mod segment;
pub mod score_table;
pub mod selector;
pub mod learner;
pub mod aim;
pub mod feedback;
pub mod host;
pub mod movement;
pub mod gunner;
pub mod targets;
pub mod range;
pub mod report;

pub use aim::{AimController, AimDecision, PendingShot, ShotRecord};
pub use feedback::{Correlation, FeedbackCorrelator, ShotLog};
pub use gunner::Gunner;
pub use host::Host;
pub use learner::{ConfigError, Learner, LearnerConfig};
pub use range::{run_round, run_session, RangeError, RoundRecord, Session};
pub use report::{summarize, RoundReport, SessionSummary};
pub use score_table::{ScoreRow, ScoreTable};
pub use segment::{Segment, SegmentClassifier, SegmentSet};
pub use selector::PolicySelector;
pub use targets::{resolve_target, TargetPattern, TARGET_NAMES};
