//! Duration parsing utilities for human-readable durations like "500ms", "2s", "10m".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

/// Parse a duration string like "500ms", "2s", "10m", "1h".
///
/// Supported units:
/// - `h` - hours
/// - `m` - minutes
/// - `s` - seconds
/// - `ms` - milliseconds
///
/// The input is case-insensitive and whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use chainfolio::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
/// assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let (num, millis_per_unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 60 * 60 * 1000)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60 * 1000)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1000)
    } else {
        anyhow::bail!("Duration must end with h, m, s, or ms");
    };

    let num: u64 = num
        .trim()
        .parse()
        .with_context(|| "Invalid number in duration")?;

    let millis = num
        .checked_mul(millis_per_unit)
        .context("Duration is too large")?;

    Ok(Duration::from_millis(millis))
}

/// Serde deserializer accepting either a duration string or a number of seconds.
pub fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => parse_duration(&text).map_err(de::Error::custom),
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn trims_and_ignores_case() {
        assert_eq!(parse_duration("  2S ").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("100MS").unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("abcs").is_err());
        assert!(parse_duration("1d").is_err());
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
    }

    #[test]
    fn deserializes_strings_and_seconds() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "deserialize_duration")]
            value: Duration,
        }

        let text: Wrapper = serde_json::from_str(r#"{"value": "750ms"}"#).unwrap();
        assert_eq!(text.value, Duration::from_millis(750));

        let secs: Wrapper = serde_json::from_str(r#"{"value": 4}"#).unwrap();
        assert_eq!(secs.value, Duration::from_secs(4));
    }
}
