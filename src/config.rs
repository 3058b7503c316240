use anyhow::{bail, Context};
use std::str::FromStr;

/// Tunable constants of the review scheduler.
///
/// Passed by reference into every calculation so tests can exercise
/// boundary values without touching globals.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub min_ease: f64,
    pub max_ease: f64,
    pub initial_ease: f64,
    pub min_interval_days: f64,
    pub max_interval_days: f64,
    pub initial_interval_days: f64,
    /// Consecutive failures at which the harsher penalty and the
    /// remediation explanation kick in
    pub failure_threshold: i32,
    /// Maximum number of items returned by a single queue read
    pub daily_cap: usize,
    /// Fixed delay before a failed item is shown again
    pub relearn_delay_hours: i64,
    pub again_ease_penalty: f64,
    pub aggressive_ease_penalty: f64,
    pub again_interval_factor: f64,
    pub aggressive_interval_factor: f64,
    pub hard_ease_penalty: f64,
    pub hard_interval_factor: f64,
    pub good_ease_bonus: f64,
    /// Scores below this are treated as `again`
    pub hard_score_threshold: f64,
    /// Scores at or above this are treated as `good`
    pub good_score_threshold: f64,
    /// Priority given to items derived from detected learner errors
    pub error_priority: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_ease: 1.3,
            max_ease: 3.0,
            initial_ease: 2.5,
            min_interval_days: 0.5,
            max_interval_days: 365.0,
            initial_interval_days: 1.0,
            failure_threshold: 2,
            daily_cap: 50,
            relearn_delay_hours: 6,
            again_ease_penalty: 0.2,
            aggressive_ease_penalty: 0.3,
            again_interval_factor: 0.5,
            aggressive_interval_factor: 0.3,
            hard_ease_penalty: 0.1,
            hard_interval_factor: 1.2,
            good_ease_bonus: 0.05,
            hard_score_threshold: 60.0,
            good_score_threshold: 80.0,
            error_priority: 10,
        }
    }
}

/// Longest relearn delay accepted from the environment
const MAX_RELEARN_DELAY_HOURS: i64 = 24 * 365;

impl SchedulerConfig {
    /// Rejects values that would break the scheduling invariants
    pub fn check(&self) -> anyhow::Result<()> {
        if self.failure_threshold < 1 {
            bail!("Failure threshold must be at least 1, got {}", self.failure_threshold);
        }
        if self.daily_cap < 1 {
            bail!("Daily cap must be at least 1, got {}", self.daily_cap);
        }
        if !(1..=MAX_RELEARN_DELAY_HOURS).contains(&self.relearn_delay_hours) {
            bail!(
                "Relearn delay must be between 1 and {} hours, got {}",
                MAX_RELEARN_DELAY_HOURS,
                self.relearn_delay_hours
            );
        }
        if !(self.min_ease <= self.initial_ease && self.initial_ease <= self.max_ease) {
            bail!(
                "Initial ease {} is outside [{}, {}]",
                self.initial_ease,
                self.min_ease,
                self.max_ease
            );
        }
        if !(self.min_interval_days <= self.initial_interval_days
            && self.initial_interval_days <= self.max_interval_days)
        {
            bail!(
                "Initial interval {} is outside [{}, {}]",
                self.initial_interval_days,
                self.min_interval_days,
                self.max_interval_days
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub session_expiry_days: i64,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Reads configuration from the environment, loading `.env` first.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut scheduler = SchedulerConfig::default();
        if let Some(cap) = env_parse("REVIEW_DAILY_CAP")? {
            scheduler.daily_cap = cap;
        }
        if let Some(threshold) = env_parse("REVIEW_FAILURE_THRESHOLD")? {
            scheduler.failure_threshold = threshold;
        }
        if let Some(hours) = env_parse("REVIEW_RELEARN_DELAY_HOURS")? {
            scheduler.relearn_delay_hours = hours;
        }
        scheduler.check().context("Invalid scheduler configuration")?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "review.db".into()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".into()),
            session_expiry_days: env_parse("SESSION_EXPIRY_DAYS")?.unwrap_or(1),
            scheduler,
        })
    }
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = SchedulerConfig::default();
        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.daily_cap, 50);
        assert_eq!(config.relearn_delay_hours, 6);
        assert!((config.min_ease - 1.3).abs() < 1e-9);
        assert!((config.max_interval_days - 365.0).abs() < 1e-9);
    }

    #[test]
    fn defaults_pass_check() {
        assert!(SchedulerConfig::default().check().is_ok());
    }

    #[test]
    fn out_of_range_overrides_are_rejected() {
        let rejected = [
            SchedulerConfig {
                failure_threshold: 0,
                ..SchedulerConfig::default()
            },
            SchedulerConfig {
                daily_cap: 0,
                ..SchedulerConfig::default()
            },
            SchedulerConfig {
                relearn_delay_hours: 0,
                ..SchedulerConfig::default()
            },
            SchedulerConfig {
                relearn_delay_hours: i64::MAX,
                ..SchedulerConfig::default()
            },
            SchedulerConfig {
                initial_ease: 5.0,
                ..SchedulerConfig::default()
            },
        ];

        for config in rejected {
            assert!(config.check().is_err(), "{:?}", config);
        }

        let longest = SchedulerConfig {
            relearn_delay_hours: MAX_RELEARN_DELAY_HOURS,
            ..SchedulerConfig::default()
        };
        assert!(longest.check().is_ok());
    }

    #[test]
    fn unset_variable_parses_to_none() {
        let value: Option<i32> = env_parse("REVIEW_SCHEDULER_TEST_UNSET_VARIABLE").unwrap();
        assert!(value.is_none());
    }
}
