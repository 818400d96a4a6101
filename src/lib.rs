//! Football match-log feature pipeline
//!
//! Scrapes per-team match logs, derives point-in-time form features and joins
//! every fixture with its opponent's features as of the same date.

pub mod data;
pub mod features;
pub mod pipeline;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a match from one team's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}

impl MatchResult {
    /// Parse a result code as it appears in match logs ("W", "D", "L")
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "W" => Some(MatchResult::Win),
            "D" => Some(MatchResult::Draw),
            "L" => Some(MatchResult::Loss),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchResult::Win => "W",
            MatchResult::Draw => "D",
            MatchResult::Loss => "L",
        }
    }

    /// League points awarded for this result
    pub fn points(&self) -> u32 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Draw => 1,
            MatchResult::Loss => 0,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A team and the page its match log is scraped from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSource {
    pub url: String,
    pub name: String,
}

impl TeamSource {
    pub fn new(url: &str, name: &str) -> Self {
        TeamSource {
            url: url.to_string(),
            name: name.to_string(),
        }
    }
}

/// What to do with a result code that is not W, D or L
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownResultPolicy {
    /// Keep the row with missing points; cumulative figures for the rest of
    /// the team's season become missing as well
    #[default]
    Missing,
    /// Fail the team with a data integrity error
    Reject,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootballError {
    #[error("Rate limited (HTTP 429) fetching {url}")]
    RateLimited { url: String },

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Offline and no cached page for {url} (expected {path})")]
    NotCached { url: String, path: String },

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("No team data collected; nothing to aggregate")]
    NoData,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FootballError {
    /// Whether a fetch that failed with this error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FootballError::RateLimited { .. }
                | FootballError::Http { .. }
                | FootballError::Request(_)
                | FootballError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FootballError>;

/// Application configuration loaded from football.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scrape: ScrapeConfig,
    pub retry: RetryConfig,
    pub pipeline: PipelineConfig,
    pub data: DataConfig,
    pub teams: Vec<TeamSource>,
    /// Opponent label -> team name as used in `teams`
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub table_id: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_secs: u64,
    pub rate_limit_cooldown_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub competition: String,
    pub trailing_columns: usize,
    pub unknown_result: UnknownResultPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub output_path: String,
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scrape: ScrapeConfig {
                table_id: "matchlogs_for".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3"
                    .to_string(),
                timeout_secs: 30,
                delay_min_secs: 15.0,
                delay_max_secs: 20.0,
                cache_dir: None,
                offline: false,
            },
            retry: RetryConfig {
                max_attempts: 3,
                backoff_secs: 10,
                rate_limit_cooldown_secs: 300,
            },
            pipeline: PipelineConfig {
                competition: "La Liga".to_string(),
                trailing_columns: 3,
                unknown_result: UnknownResultPolicy::default(),
            },
            data: DataConfig {
                output_path: "data/Laliga_Fixtures.csv".to_string(),
            },
            teams: default_teams(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootballError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| FootballError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootballError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.teams.is_empty() {
            return Err(FootballError::Config("No teams configured".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(FootballError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        let (lo, hi) = (self.scrape.delay_min_secs, self.scrape.delay_max_secs);
        if !(lo >= 0.0 && hi >= lo) {
            return Err(FootballError::Config(format!(
                "Invalid delay range {}..{} seconds",
                lo, hi
            )));
        }
        Ok(())
    }
}

/// The 2023-24 La Liga clubs and their FBref squad pages
fn default_teams() -> Vec<TeamSource> {
    [
        ("206d90db/Barcelona-Stats", "Barcelona"),
        ("98e8af82/Rayo-Vallecano-Stats", "Rayo Vallecano"),
        ("2aa12281/Mallorca-Stats", "Mallorca"),
        ("7848bd64/Getafe-Stats", "Getafe"),
        ("ad2be733/Sevilla-Stats", "Sevilla"),
        ("ee7c297c/Cadiz-Stats", "Cádiz"),
        ("53a2f082/Real-Madrid-Stats", "Real Madrid"),
        ("db3b9613/Atletico-Madrid-Stats", "Atlético Madrid"),
        ("e31d1cd9/Real-Sociedad-Stats", "Real Sociedad"),
        ("9024a00a/Girona-Stats", "Girona"),
        ("2b390eca/Athletic-Club-Stats", "Athletic Club"),
        ("fc536746/Real-Betis-Stats", "Betis"),
        ("dcc91a7b/Valencia-Stats", "Valencia"),
        ("2a8183b3/Villarreal-Stats", "Villarreal"),
        ("0049d422/Las-Palmas-Stats", "Las Palmas"),
        ("03c57e2b/Osasuna-Stats", "Osasuna"),
        ("8d6fd021/Alaves-Stats", "Alavés"),
        ("f25da7fb/Celta-Vigo-Stats", "Celta Vigo"),
        ("a0435291/Granada-Stats", "Granada"),
        ("78ecf4bb/Almeria-Stats", "Almería"),
    ]
    .iter()
    .map(|(path, name)| TeamSource::new(&format!("https://fbref.com/en/squads/{}", path), name))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_codes() {
        assert_eq!(MatchResult::from_code("W"), Some(MatchResult::Win));
        assert_eq!(MatchResult::from_code(" D "), Some(MatchResult::Draw));
        assert_eq!(MatchResult::from_code("L"), Some(MatchResult::Loss));
        assert_eq!(MatchResult::from_code("X"), None);
        assert_eq!(MatchResult::Win.points(), 3);
        assert_eq!(MatchResult::Draw.points(), 1);
        assert_eq!(MatchResult::Loss.points(), 0);
    }

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.teams.len(), 20);
        assert_eq!(parsed.pipeline.competition, "La Liga");
        assert_eq!(parsed.pipeline.unknown_result, UnknownResultPolicy::Missing);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.teams.clear();
        assert!(matches!(config.validate(), Err(FootballError::Config(_))));

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scrape.delay_min_secs = 5.0;
        config.scrape.delay_max_secs = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FootballError::RateLimited { url: "u".into() }.is_retryable());
        assert!(FootballError::Http { status: 500, url: "u".into() }.is_retryable());
        assert!(FootballError::Parse("missing".into()).is_retryable());
        assert!(!FootballError::DataIntegrity("venue".into()).is_retryable());
        assert!(!FootballError::NoData.is_retryable());
        let not_cached = FootballError::NotCached {
            url: "u".into(),
            path: "cache/u.html".into(),
        };
        assert!(!not_cached.is_retryable());
    }
}
