//! Cross-team aggregation
//!
//! League position per round, and per-team running goal totals, averages,
//! recent form and last-game values. Every "form" figure looks strictly
//! backwards so a row never sees its own outcome.

use super::normalize::TeamMatch;
use regex::Regex;
use std::cmp::{Ordering, Reverse};
use std::sync::OnceLock;

/// Matches in the trailing form window
pub const FORM_WINDOW: usize = 3;

/// A team match enriched with league-wide and per-team running features
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMatch {
    pub record: TeamMatch,
    /// Numeric round parsed from the round label
    pub round: Option<u32>,
    /// Rank of cumulative points within the round (1 = top)
    pub league_position: Option<u32>,
    pub total_goals_for: Option<u32>,
    pub total_goals_against: Option<u32>,
    /// Points over the previous three matches, excluding this one
    pub points_last3: Option<u32>,
    pub avg_goals_for: Option<f64>,
    pub avg_goals_against: Option<f64>,
    pub points_last_game: Option<u32>,
    pub goal_diff_last_game: Option<i32>,
}

impl AggregatedMatch {
    fn new(record: TeamMatch) -> Self {
        let round = extract_round(&record.round_label);
        AggregatedMatch {
            record,
            round,
            league_position: None,
            total_goals_for: None,
            total_goals_against: None,
            points_last3: None,
            avg_goals_for: None,
            avg_goals_against: None,
            points_last_game: None,
            goal_diff_last_game: None,
        }
    }
}

/// First run of digits in a round label ("Matchweek 12" -> 12)
pub fn extract_round(label: &str) -> Option<u32> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"\d+").unwrap());
    re.find(label)?.as_str().parse().ok()
}

/// Run both aggregation passes over all teams' normalized matches.
///
/// The result is ordered by date, then round.
pub fn aggregate(records: Vec<TeamMatch>) -> Vec<AggregatedMatch> {
    let mut rows: Vec<AggregatedMatch> = records.into_iter().map(AggregatedMatch::new).collect();

    assign_league_positions(&mut rows);
    assign_team_form(&mut rows);

    rows.sort_by(|a, b| {
        a.record
            .date
            .cmp(&b.record.date)
            .then_with(|| cmp_missing_last(a.round, b.round))
    });
    rows
}

/// Ascending order with missing values after present ones
fn cmp_missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rank teams by cumulative points within each round.
///
/// Ties keep first-seen order; ranks are dense with no gaps. Rows without a
/// round or without cumulative points are left unranked.
fn assign_league_positions(rows: &mut [AggregatedMatch]) {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    // Stable sort, so equal points keep their original relative order
    order.sort_by(|&i, &j| {
        let (a, b) = (&rows[i], &rows[j]);
        cmp_missing_last(a.round, b.round).then_with(|| {
            cmp_missing_last(
                a.record.cum_points.map(Reverse),
                b.record.cum_points.map(Reverse),
            )
        })
    });

    let mut current_round = None;
    let mut rank = 0u32;
    for idx in order {
        let row = &mut rows[idx];
        let Some(round) = row.round else { continue };
        if current_round != Some(round) {
            current_round = Some(round);
            rank = 0;
        }
        if row.record.cum_points.is_some() {
            rank += 1;
            row.league_position = Some(rank);
        }
    }
}

/// Per-team running features in date order
fn assign_team_form(rows: &mut [AggregatedMatch]) {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&i, &j| {
        let (a, b) = (&rows[i].record, &rows[j].record);
        a.team.cmp(&b.team).then(a.date.cmp(&b.date))
    });

    let mut start = 0;
    while start < order.len() {
        let team = rows[order[start]].record.team.clone();
        let end = order[start..]
            .iter()
            .position(|&i| rows[i].record.team != team)
            .map_or(order.len(), |n| start + n);
        apply_team_form(rows, &order[start..end]);
        start = end;
    }
}

/// Fill running features for one team's rows, given in date order
fn apply_team_form(rows: &mut [AggregatedMatch], team_rows: &[usize]) {
    let goals_for: Vec<Option<u32>> = team_rows
        .iter()
        .map(|&i| rows[i].record.goals_for)
        .collect();
    let goals_against: Vec<Option<u32>> = team_rows
        .iter()
        .map(|&i| rows[i].record.goals_against)
        .collect();
    let points: Vec<Option<u32>> = team_rows.iter().map(|&i| rows[i].record.points).collect();
    let goal_diff: Vec<Option<i32>> = team_rows
        .iter()
        .map(|&i| rows[i].record.goal_diff)
        .collect();

    let total_for = running_sum(&goals_for);
    let total_against = running_sum(&goals_against);
    let form = trailing_sum_excluding_current(&points, FORM_WINDOW);

    for (k, &idx) in team_rows.iter().enumerate() {
        let played = (k + 1) as f64;
        let row = &mut rows[idx];
        row.total_goals_for = total_for[k];
        row.total_goals_against = total_against[k];
        row.avg_goals_for = total_for[k].map(|t| t as f64 / played);
        row.avg_goals_against = total_against[k].map(|t| t as f64 / played);
        row.points_last3 = form[k];
        row.points_last_game = if k == 0 { Some(0) } else { points[k - 1] };
        row.goal_diff_last_game = if k == 0 { Some(0) } else { goal_diff[k - 1] };
    }
}

/// Running sum; once a value is missing (or the total overflows) every later
/// total is missing too
pub fn running_sum(values: &[Option<u32>]) -> Vec<Option<u32>> {
    let mut total = Some(0u32);
    values
        .iter()
        .map(|v| {
            total = match (total, v) {
                (Some(t), Some(v)) => t.checked_add(*v),
                _ => None,
            };
            total
        })
        .collect()
}

/// Sum of up to `window` values strictly before each position.
///
/// The first position sums nothing and yields 0; a missing value inside the
/// window, or an overflowing sum, makes that sum missing.
pub fn trailing_sum_excluding_current(values: &[Option<u32>], window: usize) -> Vec<Option<u32>> {
    (0..values.len())
        .map(|k| {
            values[k.saturating_sub(window)..k]
                .iter()
                .try_fold(0u32, |acc, v| acc.checked_add((*v)?))
        })
        .collect()
}
