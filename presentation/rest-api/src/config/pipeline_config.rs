use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use business::application::identification::pipeline::DEFAULT_ATTEMPT_TIMEOUT;
use business::domain::identification::retry::RetryPolicy;
use imaging::preprocessor::PreprocessorConfig;

/// Retry, timeout and preprocessing settings for the identification pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub attempt_timeout: Duration,
    pub preprocessor: PreprocessorConfig,
}

impl PipelineConfig {
    /// Load pipeline configuration from environment variables
    ///
    /// Environment variables (all optional):
    /// - IDENTIFY_MAX_ATTEMPTS (default: 3)
    /// - IDENTIFY_BASE_DELAY_MS (default: 1000)
    /// - IDENTIFY_RATE_LIMIT_DELAY_MS (default: 5000)
    /// - IDENTIFY_BACKOFF_MULTIPLIER (default: 2.0)
    /// - IDENTIFY_MAX_DELAY_MS (default: 30000)
    /// - IDENTIFY_JITTER_MS (default: 250, 0 disables jitter)
    /// - IDENTIFY_ATTEMPT_TIMEOUT_SECS (default: 30)
    /// - IMAGE_MAX_DIMENSION (default: 1000)
    /// - IMAGE_JPEG_QUALITY (default: 85)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = RetryPolicy::default();
        let preprocessor_defaults = PreprocessorConfig::default();

        let max_attempts: u32 = parse_or(&lookup, "IDENTIFY_MAX_ATTEMPTS", defaults.max_attempts)?;
        anyhow::ensure!(max_attempts >= 1, "IDENTIFY_MAX_ATTEMPTS must be at least 1");

        let multiplier: f64 =
            parse_or(&lookup, "IDENTIFY_BACKOFF_MULTIPLIER", defaults.multiplier)?;
        anyhow::ensure!(
            multiplier.is_finite() && multiplier >= 1.0,
            "IDENTIFY_BACKOFF_MULTIPLIER must be a finite number >= 1.0"
        );

        let jitter_ms: u64 = parse_or(
            &lookup,
            "IDENTIFY_JITTER_MS",
            defaults.jitter.map_or(0, |j| j.as_millis() as u64),
        )?;

        let jpeg_quality: u8 =
            parse_or(&lookup, "IMAGE_JPEG_QUALITY", preprocessor_defaults.jpeg_quality)?;
        anyhow::ensure!(
            (1..=100).contains(&jpeg_quality),
            "IMAGE_JPEG_QUALITY must be between 1 and 100"
        );

        let retry = RetryPolicy {
            max_attempts,
            base_delay: millis_or(&lookup, "IDENTIFY_BASE_DELAY_MS", defaults.base_delay)?,
            rate_limited_base_delay: millis_or(
                &lookup,
                "IDENTIFY_RATE_LIMIT_DELAY_MS",
                defaults.rate_limited_base_delay,
            )?,
            multiplier,
            max_delay: millis_or(&lookup, "IDENTIFY_MAX_DELAY_MS", defaults.max_delay)?,
            jitter: (jitter_ms > 0).then(|| Duration::from_millis(jitter_ms)),
            ..defaults
        };

        let attempt_timeout = Duration::from_secs(parse_or(
            &lookup,
            "IDENTIFY_ATTEMPT_TIMEOUT_SECS",
            DEFAULT_ATTEMPT_TIMEOUT.as_secs(),
        )?);

        let preprocessor = PreprocessorConfig {
            max_dimension: parse_or(
                &lookup,
                "IMAGE_MAX_DIMENSION",
                preprocessor_defaults.max_dimension,
            )?,
            jpeg_quality,
        };

        Ok(Self {
            retry,
            attempt_timeout,
            preprocessor,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn millis_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    parse_or(lookup, key, default.as_millis() as u64).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<PipelineConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn should_use_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(config.retry.rate_limited_base_delay, Duration::from_secs(5));
        assert_eq!(config.retry.max_delay, Duration::from_secs(30));
        assert_eq!(config.retry.jitter, Some(Duration::from_millis(250)));
        assert_eq!(config.attempt_timeout, Duration::from_secs(30));
        assert_eq!(config.preprocessor, PreprocessorConfig::default());
    }

    #[test]
    fn should_read_overrides() {
        let config = config_from(&[
            ("IDENTIFY_MAX_ATTEMPTS", "5"),
            ("IDENTIFY_BASE_DELAY_MS", "200"),
            ("IDENTIFY_BACKOFF_MULTIPLIER", "1.5"),
            ("IDENTIFY_ATTEMPT_TIMEOUT_SECS", "10"),
            ("IMAGE_MAX_DIMENSION", "640"),
        ])
        .unwrap();

        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(200));
        assert_eq!(config.retry.multiplier, 1.5);
        assert_eq!(config.attempt_timeout, Duration::from_secs(10));
        assert_eq!(config.preprocessor.max_dimension, 640);
    }

    #[test]
    fn should_disable_jitter_when_set_to_zero() {
        let config = config_from(&[("IDENTIFY_JITTER_MS", "0")]).unwrap();

        assert_eq!(config.retry.jitter, None);
    }

    #[test]
    fn should_fail_when_value_is_not_a_number() {
        let error = config_from(&[("IDENTIFY_MAX_ATTEMPTS", "three")]).unwrap_err();

        assert!(error.to_string().contains("IDENTIFY_MAX_ATTEMPTS"));
    }

    #[test]
    fn should_fail_when_max_attempts_is_zero() {
        assert!(config_from(&[("IDENTIFY_MAX_ATTEMPTS", "0")]).is_err());
    }

    #[test]
    fn should_fail_when_jpeg_quality_out_of_range() {
        assert!(config_from(&[("IMAGE_JPEG_QUALITY", "0")]).is_err());
    }
}
