//! End-to-end run: collect every team, derive features, join opponents
//!
//! Teams are fetched one at a time. A team that still fails after retries,
//! or whose log does not normalize, is logged and left out; the run only
//! fails when no team at all was collected.

use crate::data::scrapers::{fetch_with_retry, MatchLogSource, RetryPolicy};
use crate::features::{
    aggregate, join_opponents, normalize_team, FixtureRow, NormalizeConfig, TeamMatch,
};
use crate::{FootballError, Result, TeamSource};

/// Outcome of the per-team collection loop
#[derive(Debug, Default)]
pub struct CollectionReport {
    /// Normalized matches of every team that succeeded, in team order
    pub records: Vec<TeamMatch>,
    pub collected: Vec<String>,
    /// Team name and the error that made it drop out
    pub failures: Vec<(String, FootballError)>,
}

impl CollectionReport {
    pub fn teams_attempted(&self) -> usize {
        self.collected.len() + self.failures.len()
    }
}

/// Fetch and normalize each team in turn, skipping teams that fail
pub fn collect_teams(
    source: &dyn MatchLogSource,
    teams: &[TeamSource],
    policy: &RetryPolicy,
    config: &NormalizeConfig,
) -> CollectionReport {
    let mut report = CollectionReport::default();

    for team in teams {
        log::info!("Fetching data for {}...", team.name);
        let outcome = fetch_with_retry(source, &team.url, policy)
            .and_then(|raw| normalize_team(&raw, &team.name, config));

        match outcome {
            Ok(matches) => {
                log::info!("  {} matches for {}", matches.len(), team.name);
                report.records.extend(matches);
                report.collected.push(team.name.clone());
            }
            Err(e) => {
                log::error!("Failed to collect data for {}: {}", team.name, e);
                report.failures.push((team.name.clone(), e));
            }
        }
    }

    report
}

/// Aggregate and join the collected matches into the fixtures table.
///
/// Fails with [`FootballError::NoData`] when no team contributed a match.
pub fn build_fixtures(report: &CollectionReport) -> Result<Vec<FixtureRow>> {
    if report.records.is_empty() {
        return Err(FootballError::NoData);
    }
    let rows = aggregate(report.records.clone());
    Ok(join_opponents(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawTable;
    use std::collections::HashMap;
    use std::time::Duration;

    const HEADERS: &[&str] = &[
        "Date", "Comp", "Round", "Venue", "Result", "GF", "GA", "Opponent", "Match Report",
        "Notes", "Referee",
    ];

    /// Serves canned tables; unknown URLs answer with HTTP 404
    struct FakeSource {
        pages: HashMap<String, RawTable>,
    }

    impl MatchLogSource for FakeSource {
        fn fetch(&self, url: &str) -> Result<RawTable> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FootballError::Http {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn page(rows: &[&[&str]]) -> RawTable {
        RawTable::from_strings(HEADERS, rows)
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            backoff: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
        }
    }

    fn source() -> FakeSource {
        let mut pages = HashMap::new();
        pages.insert(
            "a".to_string(),
            page(&[
                &["2023-08-13", "La Liga", "Matchweek 1", "Home", "W", "2", "1", "B", "", "", ""],
                &["2023-08-20", "La Liga", "Matchweek 2", "Away", "D", "0", "0", "C", "", "", ""],
                &["2024-05-26", "La Liga", "Matchweek 38", "Home", "", "", "", "B", "", "", ""],
            ]),
        );
        pages.insert(
            "b".to_string(),
            page(&[
                &["2023-08-13", "La Liga", "Matchweek 1", "Away", "L", "1", "2", "A", "", "", ""],
                &["2023-08-20", "La Liga", "Matchweek 2", "Home", "W", "3", "0", "D", "", "", ""],
            ]),
        );
        pages.insert(
            "bad".to_string(),
            page(&[&[
                "2023-08-13", "La Liga", "Matchweek 1", "Neutral", "W", "1", "0", "X", "", "", "",
            ]]),
        );
        FakeSource { pages }
    }

    #[test]
    fn test_failing_teams_are_skipped() {
        let teams = vec![
            TeamSource::new("a", "A"),
            TeamSource::new("missing", "M"),
            TeamSource::new("bad", "Bad"),
            TeamSource::new("b", "B"),
        ];
        let report = collect_teams(&source(), &teams, &no_wait(), &NormalizeConfig::default());

        assert_eq!(report.collected, vec!["A", "B"]);
        assert_eq!(report.teams_attempted(), 4);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0].1, FootballError::Http { status: 404, .. }));
        assert!(matches!(report.failures[1].1, FootballError::DataIntegrity(_)));
        assert_eq!(report.records.len(), 4);
    }

    #[test]
    fn test_build_joins_only_known_opponents() {
        let teams = vec![TeamSource::new("a", "A"), TeamSource::new("b", "B")];
        let report = collect_teams(&source(), &teams, &no_wait(), &NormalizeConfig::default());
        let fixtures = build_fixtures(&report).unwrap();

        // Only the A-B meeting on matchweek 1 has both sides
        assert_eq!(fixtures.len(), 2);
        let a = fixtures.iter().find(|f| f.team.record.team == "A").unwrap();
        let b = fixtures.iter().find(|f| f.team.record.team == "B").unwrap();
        assert_eq!(a.opponent.cum_points, Some(0));
        assert_eq!(b.opponent.cum_points, Some(3));
        assert_eq!(a.team.league_position, Some(1));
        assert_eq!(a.opponent.league_position, Some(2));
    }

    #[test]
    fn test_no_teams_collected_is_an_error() {
        let teams = vec![TeamSource::new("missing", "M")];
        let report = collect_teams(&source(), &teams, &no_wait(), &NormalizeConfig::default());
        assert!(matches!(build_fixtures(&report), Err(FootballError::NoData)));
    }
}
