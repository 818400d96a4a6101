//! Opponent feature join
//!
//! Attaches to every fixture the opponent's own pre-match features from the
//! same date. Fixtures whose opponent has no row on that date are dropped.

use super::aggregate::AggregatedMatch;
use chrono::NaiveDate;
use std::collections::HashMap;

/// An opponent's features as of a match date
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentFeatures {
    pub total_goals_for: Option<u32>,
    pub total_goals_against: Option<u32>,
    pub points_per_game: Option<f64>,
    pub cum_points: Option<u32>,
    pub league_position: Option<u32>,
    pub points_last3: Option<u32>,
    pub avg_goals_for: Option<f64>,
    pub avg_goals_against: Option<f64>,
    pub points_last_game: Option<u32>,
    pub goal_diff_last_game: Option<i32>,
}

impl From<&AggregatedMatch> for OpponentFeatures {
    fn from(row: &AggregatedMatch) -> Self {
        OpponentFeatures {
            total_goals_for: row.total_goals_for,
            total_goals_against: row.total_goals_against,
            points_per_game: row.record.points_per_game,
            cum_points: row.record.cum_points,
            league_position: row.league_position,
            points_last3: row.points_last3,
            avg_goals_for: row.avg_goals_for,
            avg_goals_against: row.avg_goals_against,
            points_last_game: row.points_last_game,
            goal_diff_last_game: row.goal_diff_last_game,
        }
    }
}

/// One team's view of a fixture with both sides' features
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRow {
    pub team: AggregatedMatch,
    pub opponent: OpponentFeatures,
}

/// Every team's features keyed by (date, team)
#[derive(Debug, Default)]
pub struct OpponentIndex {
    by_date_team: HashMap<(NaiveDate, String), OpponentFeatures>,
}

impl OpponentIndex {
    /// Index all rows; if a team has two rows on one date the first is kept
    pub fn build(rows: &[AggregatedMatch]) -> Self {
        let mut by_date_team = HashMap::with_capacity(rows.len());
        for row in rows {
            let key = (row.record.date, row.record.team.clone());
            if by_date_team.contains_key(&key) {
                log::warn!(
                    "{} has more than one match on {}; keeping the first",
                    row.record.team,
                    row.record.date
                );
                continue;
            }
            by_date_team.insert(key, OpponentFeatures::from(row));
        }
        OpponentIndex { by_date_team }
    }

    pub fn get(&self, date: NaiveDate, team: &str) -> Option<&OpponentFeatures> {
        self.by_date_team.get(&(date, team.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_date_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date_team.is_empty()
    }
}

/// Inner-join each row with its opponent's features on (date, opponent).
///
/// Input order is preserved. Rows with no matching opponent entry are
/// dropped rather than filled with missing values.
pub fn join_opponents(rows: Vec<AggregatedMatch>) -> Vec<FixtureRow> {
    let index = OpponentIndex::build(&rows);
    let total = rows.len();

    let joined: Vec<FixtureRow> = rows
        .into_iter()
        .filter_map(|row| {
            let opponent = index.get(row.record.date, &row.record.opponent)?.clone();
            Some(FixtureRow {
                team: row,
                opponent,
            })
        })
        .collect();

    let dropped = total - joined.len();
    if dropped > 0 {
        log::debug!(
            "Dropped {} of {} rows with no opponent entry on the same date",
            dropped,
            total
        );
    }
    joined
}
