//! Configuration loader — merges env vars, .env file, and a TOML file.

use common::config::AppConfig;
use common::Error;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn non_empty(raw: &str, env_name: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Config(format!("{env_name} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.http.user_agent.trim().is_empty() {
        issues.push("http.user_agent must not be empty".into());
    }
    if config.http.timeout_secs == 0 {
        issues.push("http.timeout_secs must be > 0".into());
    }

    if config.retry.max_attempts == 0 {
        issues.push("retry.max_attempts must be > 0".into());
    }

    if config.cache.max_entries == 0 {
        issues.push("cache.max_entries must be > 0".into());
    }
    if config.cache.max_age_secs == 0 {
        issues.push("cache.max_age_secs must be > 0".into());
    }

    for (name, endpoint) in [
        ("overpass.endpoint", &config.overpass.endpoint),
        ("nominatim.endpoint", &config.nominatim.endpoint),
    ] {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            issues.push(format!("{name} must be an http(s) URL"));
        }
    }

    if !(config.overpass.bbox_pad_deg > 0.0 && config.overpass.bbox_pad_deg <= 1.0) {
        issues.push("overpass.bbox_pad_deg must be in (0,1]".into());
    }
    if config.overpass.query_timeout_secs == 0 {
        issues.push("overpass.query_timeout_secs must be > 0".into());
    }

    if config.nominatim.search_limit == 0 || config.nominatim.street_limit == 0 {
        issues.push("nominatim.search_limit and nominatim.street_limit must be > 0".into());
    }
    if !(config.nominatim.street_viewbox_pad_deg > 0.0
        && config.nominatim.street_viewbox_pad_deg <= 1.0)
    {
        issues.push("nominatim.street_viewbox_pad_deg must be in (0,1]".into());
    }
    if config.nominatim.requests_per_second == 0 {
        issues.push("nominatim.requests_per_second must be > 0".into());
    }
    if config
        .nominatim
        .country_codes
        .iter()
        .any(|c| c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_alphabetic()))
    {
        issues.push("nominatim.country_codes must be two-letter codes".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply `LOCINTEL_*` overrides read through `lookup`.
fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), Error> {
    if let Some(raw) = lookup("LOCINTEL_USER_AGENT") {
        config.http.user_agent = non_empty(&raw, "LOCINTEL_USER_AGENT")?;
    }
    if let Some(raw) = lookup("LOCINTEL_HTTP_TIMEOUT_SECS") {
        config.http.timeout_secs = parse_positive_u64(&raw, "LOCINTEL_HTTP_TIMEOUT_SECS")?;
    }
    if let Some(raw) = lookup("LOCINTEL_OVERPASS_URL") {
        config.overpass.endpoint = non_empty(&raw, "LOCINTEL_OVERPASS_URL")?;
    }
    if let Some(raw) = lookup("LOCINTEL_NOMINATIM_URL") {
        config.nominatim.endpoint = non_empty(&raw, "LOCINTEL_NOMINATIM_URL")?;
    }
    if let Some(raw) = lookup("LOCINTEL_RETRY_MAX_ATTEMPTS") {
        let parsed = parse_positive_u64(&raw, "LOCINTEL_RETRY_MAX_ATTEMPTS")?;
        config.retry.max_attempts = u32::try_from(parsed)
            .map_err(|_| Error::Config("LOCINTEL_RETRY_MAX_ATTEMPTS is too large".into()))?;
    }
    if let Some(raw) = lookup("LOCINTEL_RETRY_BASE_DELAY_MS") {
        config.retry.base_delay_ms = parse_positive_u64(&raw, "LOCINTEL_RETRY_BASE_DELAY_MS")?;
    }
    if let Some(raw) = lookup("LOCINTEL_CACHE_MAX_ENTRIES") {
        let parsed = parse_positive_u64(&raw, "LOCINTEL_CACHE_MAX_ENTRIES")?;
        config.cache.max_entries = usize::try_from(parsed)
            .map_err(|_| Error::Config("LOCINTEL_CACHE_MAX_ENTRIES is too large".into()))?;
    }
    if let Some(raw) = lookup("LOCINTEL_CACHE_MAX_AGE_SECS") {
        config.cache.max_age_secs = parse_positive_u64(&raw, "LOCINTEL_CACHE_MAX_AGE_SECS")?;
    }
    if let Some(raw) = lookup("LOCINTEL_COUNTRY_CODES") {
        config.nominatim.country_codes = raw
            .split(',')
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
    }
    Ok(())
}

/// Load configuration from `.env`, an optional TOML file and the environment.
///
/// An explicit `path` must exist; otherwise `config.toml` is read when present.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults, replaced by the TOML file if there is one.
    let mut config = AppConfig::default();

    let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if path.is_some() || config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
        tracing::debug!("Loaded config from {}", config_path.display());
    }

    // 3. Override with environment variables (highest priority).
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        validate_config(&AppConfig::default()).expect("defaults should validate");
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("LOCINTEL_OVERPASS_URL", " http://localhost:8080/api/interpreter "),
                ("LOCINTEL_CACHE_MAX_ENTRIES", "250"),
                ("LOCINTEL_RETRY_MAX_ATTEMPTS", "5"),
                ("LOCINTEL_COUNTRY_CODES", "IN, np"),
            ]),
        )
        .expect("overrides should apply");

        assert_eq!(cfg.overpass.endpoint, "http://localhost:8080/api/interpreter");
        assert_eq!(cfg.cache.max_entries, 250);
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.nominatim.country_codes, vec!["in", "np"]);
        validate_config(&cfg).expect("overridden config should validate");
    }

    #[test]
    fn test_env_override_rejects_zero() {
        let mut cfg = AppConfig::default();
        let err = apply_env_overrides(&mut cfg, env(&[("LOCINTEL_CACHE_MAX_AGE_SECS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("LOCINTEL_CACHE_MAX_AGE_SECS"));
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let mut cfg = AppConfig::default();
        cfg.cache.max_entries = 0;
        cfg.overpass.endpoint = "ftp://example.org".into();
        cfg.nominatim.country_codes = vec!["ind".into()];

        let message = validate_config(&cfg).unwrap_err().to_string();
        assert!(message.contains("cache.max_entries"));
        assert!(message.contains("overpass.endpoint"));
        assert!(message.contains("country_codes"));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/location-intel.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
