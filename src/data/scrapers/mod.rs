//! Web scrapers for team match logs

pub mod fbref;

use crate::data::RawTable;
use crate::{FootballError, Result, RetryConfig};
use std::time::Duration;

/// Trait for anything that can produce a team's raw match log
pub trait MatchLogSource {
    /// Fetch the match-log table behind `url`
    fn fetch(&self, url: &str) -> Result<RawTable>;
}

/// Bounded retry with a short fixed backoff, and a long cooldown after rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
            rate_limit_cooldown: Duration::from_secs(300),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            backoff: config.backoff(),
            rate_limit_cooldown: config.rate_limit_cooldown(),
        }
    }
}

impl RetryPolicy {
    /// Run `operation` until it succeeds, sleeping on the current thread between attempts
    pub fn run<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.run_with_sleep(operation, std::thread::sleep)
    }

    /// Like [`RetryPolicy::run`] with a caller-supplied sleep
    pub fn run_with_sleep<T, F, S>(&self, mut operation: F, mut sleep: S) -> Result<T>
    where
        F: FnMut() -> Result<T>,
        S: FnMut(Duration),
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match operation() {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    log::warn!("Attempt {} of {} failed: {}", attempt + 1, attempts, e);
                    let delay = match e {
                        FootballError::RateLimited { .. } => self.rate_limit_cooldown,
                        _ => self.backoff,
                    };
                    last_error = Some(e);
                    if attempt + 1 < attempts {
                        log::info!("Retrying in {}s", delay.as_secs());
                        sleep(delay);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FootballError::Parse("no fetch attempt made".into())))
    }
}

/// Fetch a match log from `source`, retrying under `policy`
pub fn fetch_with_retry(
    source: &dyn MatchLogSource,
    url: &str,
    policy: &RetryPolicy,
) -> Result<RawTable> {
    policy.run(|| source.fetch(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
            rate_limit_cooldown: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_rate_limit_then_success_waits_cooldown() {
        let calls = RefCell::new(0);
        let mut slept = Vec::new();

        let table = policy()
            .run_with_sleep(
                || {
                    *calls.borrow_mut() += 1;
                    if *calls.borrow() == 1 {
                        Err(FootballError::RateLimited { url: "u".into() })
                    } else {
                        Ok(RawTable::from_strings(&["Date"], &[&["2023-08-13"]]))
                    }
                },
                |d| slept.push(d),
            )
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(*calls.borrow(), 2);
        assert_eq!(slept, vec![Duration::from_secs(300)]);
    }

    #[test]
    fn test_exhausted_retries_return_last_error() {
        let mut calls = 0;
        let mut slept = Vec::new();

        let err = policy()
            .run_with_sleep(
                || -> Result<()> {
                    calls += 1;
                    Err(FootballError::Http {
                        status: 500 + calls,
                        url: "u".into(),
                    })
                },
                |d| slept.push(d),
            )
            .unwrap_err();

        assert_eq!(calls, 3);
        // No sleep after the final attempt
        assert_eq!(slept, vec![Duration::from_secs(10); 2]);
        assert!(matches!(err, FootballError::Http { status: 503, .. }));
    }

    #[test]
    fn test_integrity_errors_are_not_retried() {
        let mut calls = 0;
        let err = policy()
            .run_with_sleep(
                || -> Result<()> {
                    calls += 1;
                    Err(FootballError::DataIntegrity("venue".into()))
                },
                |_| panic!("should not sleep"),
            )
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, FootballError::DataIntegrity(_)));
    }

    #[test]
    fn test_fetch_with_retry_uses_source() {
        struct Fixed;
        impl MatchLogSource for Fixed {
            fn fetch(&self, url: &str) -> Result<RawTable> {
                Ok(RawTable::from_strings(&["Url"], &[&[url]]))
            }
        }

        let table = fetch_with_retry(&Fixed, "https://example.org", &policy()).unwrap();
        assert_eq!(table.rows[0][0].as_deref(), Some("https://example.org"));
    }
}
