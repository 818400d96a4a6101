//! Feature derivation
//!
//! Raw match logs -> per-team records -> league-wide running features ->
//! fixtures paired with their opponent's features.

pub mod aggregate;
pub mod normalize;
pub mod opponent;

pub use aggregate::{aggregate, AggregatedMatch};
pub use normalize::{normalize_team, NormalizeConfig, TeamMatch};
pub use opponent::{join_opponents, FixtureRow, OpponentFeatures, OpponentIndex};
