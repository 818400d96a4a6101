//! Per-team normalization of raw match logs
//!
//! Turns one team's scraped table into typed match records with per-match
//! points and goal difference plus the team's running points figures.

use crate::data::RawTable;
use crate::{Config, FootballError, MatchResult, Result, UnknownResultPolicy};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One team's perspective of one played match
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMatch {
    pub date: NaiveDate,
    /// Free-text round label, e.g. "Matchweek 12"
    pub round_label: String,
    pub competition: String,
    pub is_home: bool,
    pub opponent: String,
    /// `None` only when the result code was unrecognized and tolerated
    pub result: Option<MatchResult>,
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
    pub points: Option<u32>,
    pub goal_diff: Option<i32>,
    /// Running sum of points over this team's matches so far
    pub cum_points: Option<u32>,
    pub points_per_game: Option<f64>,
    pub team: String,
}

/// Settings for [`normalize_team`]
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    /// Only rows whose competition equals this exactly are kept
    pub competition: String,
    /// Number of metadata columns at the end of the raw schema to discard
    pub trailing_columns: usize,
    pub unknown_result: UnknownResultPolicy,
    /// Opponent label -> canonical team name
    pub aliases: BTreeMap<String, String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig {
            competition: "La Liga".to_string(),
            trailing_columns: 3,
            unknown_result: UnknownResultPolicy::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl From<&Config> for NormalizeConfig {
    fn from(config: &Config) -> Self {
        NormalizeConfig {
            competition: config.pipeline.competition.clone(),
            trailing_columns: config.pipeline.trailing_columns,
            unknown_result: config.pipeline.unknown_result,
            aliases: config.aliases.clone(),
        }
    }
}

/// Column positions the normalizer reads
struct Columns {
    date: usize,
    comp: usize,
    round: usize,
    venue: usize,
    result: usize,
    goals_for: usize,
    goals_against: usize,
    opponent: usize,
}

impl Columns {
    fn locate(raw: &RawTable) -> Result<Self> {
        let find = |name: &str| {
            raw.column(name).ok_or_else(|| {
                FootballError::Parse(format!(
                    "Match log is missing column {:?} (have {:?})",
                    name, raw.headers
                ))
            })
        };
        Ok(Columns {
            date: find("Date")?,
            comp: find("Comp")?,
            round: find("Round")?,
            venue: find("Venue")?,
            result: find("Result")?,
            goals_for: find("GF")?,
            goals_against: find("GA")?,
            opponent: find("Opponent")?,
        })
    }
}

/// Normalize one team's raw match log.
///
/// Output is in source order, restricted to the target competition and to
/// matches that have a result.
pub fn normalize_team(
    raw: &RawTable,
    team: &str,
    config: &NormalizeConfig,
) -> Result<Vec<TeamMatch>> {
    let raw = raw.clone().without_trailing_columns(config.trailing_columns);
    let cols = Columns::locate(&raw)?;

    let mut out = Vec::new();
    let mut cum_points = Some(0u32);

    for row in &raw.rows {
        let cell = move |idx: usize| row.get(idx).and_then(|c| c.as_deref());

        if cell(cols.comp) != Some(config.competition.as_str()) {
            continue;
        }
        let Some(result_code) = cell(cols.result) else {
            // Not played yet
            continue;
        };

        let date_text = cell(cols.date).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_text.trim(), "%Y-%m-%d").map_err(|_| {
            FootballError::DataIntegrity(format!("{}: unparseable date {:?}", team, date_text))
        })?;

        let result = MatchResult::from_code(result_code);
        if result.is_none() {
            match config.unknown_result {
                UnknownResultPolicy::Reject => {
                    return Err(FootballError::DataIntegrity(format!(
                        "{}: unknown result code {:?} on {}",
                        team, result_code, date
                    )));
                }
                UnknownResultPolicy::Missing => {
                    log::warn!(
                        "{}: unknown result code {:?} on {}, points left missing",
                        team,
                        result_code,
                        date
                    );
                }
            }
        }

        let is_home = parse_venue(cell(cols.venue)).map_err(|v| {
            FootballError::DataIntegrity(format!("{}: unknown venue {:?} on {}", team, v, date))
        })?;

        let goals_for = parse_goals(cell(cols.goals_for));
        let goals_against = parse_goals(cell(cols.goals_against));
        let points = result.map(|r| r.points());
        let goal_diff = match (goals_for, goals_against) {
            (Some(f), Some(a)) => i32::try_from(i64::from(f) - i64::from(a)).ok(),
            _ => None,
        };

        cum_points = match (cum_points, points) {
            (Some(total), Some(p)) => total.checked_add(p),
            _ => None,
        };
        let match_number = out.len() + 1;
        let points_per_game = cum_points.map(|total| total as f64 / match_number as f64);

        let opponent = cell(cols.opponent).unwrap_or("").trim();
        let opponent = config
            .aliases
            .get(opponent)
            .map(String::as_str)
            .unwrap_or(opponent)
            .to_string();

        out.push(TeamMatch {
            date,
            round_label: cell(cols.round).unwrap_or("").to_string(),
            competition: config.competition.clone(),
            is_home,
            opponent,
            result,
            goals_for,
            goals_against,
            points,
            goal_diff,
            cum_points,
            points_per_game,
            team: team.to_string(),
        });
    }

    Ok(out)
}

/// "Home" -> true, "Away" -> false; anything else is returned as the error
fn parse_venue(text: Option<&str>) -> std::result::Result<bool, String> {
    match text.map(str::trim) {
        Some("Home") => Ok(true),
        Some("Away") => Ok(false),
        other => Err(other.unwrap_or("").to_string()),
    }
}

/// Lenient goal count: integers or integral floats, anything else is missing
fn parse_goals(text: Option<&str>) -> Option<u32> {
    let text = text?.trim();
    if let Ok(n) = text.parse::<u32>() {
        return Some(n);
    }
    let f = text.parse::<f64>().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}
