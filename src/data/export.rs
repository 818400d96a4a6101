//! CSV snapshot of the fixtures table

use crate::features::FixtureRow;
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One flat output line; missing values become empty cells
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Round")]
    round: Option<u32>,
    #[serde(rename = "Comp")]
    competition: &'a str,
    #[serde(rename = "Venue")]
    venue: u8,
    #[serde(rename = "Opponent")]
    opponent: &'a str,
    #[serde(rename = "Result")]
    result: Option<&'static str>,
    #[serde(rename = "GF")]
    goals_for: Option<u32>,
    #[serde(rename = "GA")]
    goals_against: Option<u32>,
    points: Option<u32>,
    #[serde(rename = "GD")]
    goal_diff: Option<i32>,
    cum_points: Option<u32>,
    #[serde(rename = "PpG")]
    points_per_game: Option<f64>,
    #[serde(rename = "Team")]
    team: &'a str,
    #[serde(rename = "League Position")]
    league_position: Option<u32>,
    #[serde(rename = "Total_GF")]
    total_goals_for: Option<u32>,
    #[serde(rename = "Total_GA")]
    total_goals_against: Option<u32>,
    #[serde(rename = "pointsLast3")]
    points_last3: Option<u32>,
    #[serde(rename = "avgGF")]
    avg_goals_for: Option<f64>,
    #[serde(rename = "avgGA")]
    avg_goals_against: Option<f64>,
    #[serde(rename = "pointsLastGame")]
    points_last_game: Option<u32>,
    #[serde(rename = "GDlastGame")]
    goal_diff_last_game: Option<i32>,
    #[serde(rename = "Opponent_TotalGF")]
    opp_total_goals_for: Option<u32>,
    #[serde(rename = "Opponent_TotalGA")]
    opp_total_goals_against: Option<u32>,
    #[serde(rename = "Opponent_PpG")]
    opp_points_per_game: Option<f64>,
    #[serde(rename = "Opponent_cum_points")]
    opp_cum_points: Option<u32>,
    #[serde(rename = "Opponent_League Position")]
    opp_league_position: Option<u32>,
    #[serde(rename = "Opponent_pointsLast3")]
    opp_points_last3: Option<u32>,
    #[serde(rename = "Opponent_avgGF")]
    opp_avg_goals_for: Option<f64>,
    #[serde(rename = "Opponent_avgGA")]
    opp_avg_goals_against: Option<f64>,
    #[serde(rename = "Opponent_pointsLastGame")]
    opp_points_last_game: Option<u32>,
    #[serde(rename = "Opponent_GDlastGame")]
    opp_goal_diff_last_game: Option<i32>,
}

impl<'a> From<&'a FixtureRow> for CsvRow<'a> {
    fn from(row: &'a FixtureRow) -> Self {
        let t = &row.team;
        let r = &t.record;
        let o = &row.opponent;
        CsvRow {
            date: r.date,
            round: t.round,
            competition: &r.competition,
            venue: u8::from(r.is_home),
            opponent: &r.opponent,
            result: r.result.map(|res| res.code()),
            goals_for: r.goals_for,
            goals_against: r.goals_against,
            points: r.points,
            goal_diff: r.goal_diff,
            cum_points: r.cum_points,
            points_per_game: r.points_per_game,
            team: &r.team,
            league_position: t.league_position,
            total_goals_for: t.total_goals_for,
            total_goals_against: t.total_goals_against,
            points_last3: t.points_last3,
            avg_goals_for: t.avg_goals_for,
            avg_goals_against: t.avg_goals_against,
            points_last_game: t.points_last_game,
            goal_diff_last_game: t.goal_diff_last_game,
            opp_total_goals_for: o.total_goals_for,
            opp_total_goals_against: o.total_goals_against,
            opp_points_per_game: o.points_per_game,
            opp_cum_points: o.cum_points,
            opp_league_position: o.league_position,
            opp_points_last3: o.points_last3,
            opp_avg_goals_for: o.avg_goals_for,
            opp_avg_goals_against: o.avg_goals_against,
            opp_points_last_game: o.points_last_game,
            opp_goal_diff_last_game: o.goal_diff_last_game,
        }
    }
}

/// Write fixtures as CSV with a header row
pub fn write_fixtures<W: Write>(writer: W, rows: &[FixtureRow]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(CsvRow::from(row))?;
    }
    out.flush()?;
    Ok(())
}

/// Write the fixtures snapshot to `path`, replacing any previous file
pub fn write_fixtures_csv<P: AsRef<Path>>(path: P, rows: &[FixtureRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_fixtures(std::io::BufWriter::new(file), rows)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
