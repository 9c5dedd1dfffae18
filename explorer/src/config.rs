use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org/route/v1";
pub const DEFAULT_USER_AGENT: &str = "M-Explore-App";
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 2_000.0;
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 5.0;
pub const DEFAULT_NARRATION_INTERVAL: Duration = Duration::from_millis(2_500);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_NARRATION_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub bind: SocketAddr,
    pub overpass_url: String,
    pub nominatim_url: String,
    pub osrm_url: String,
    pub user_agent: String,
    pub search_radius_m: f64,
    pub default_max_distance_km: f64,
    pub narration_interval: Duration,
    pub http_timeout: Duration,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_radius_m: DEFAULT_SEARCH_RADIUS_M,
            default_max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            narration_interval: DEFAULT_NARRATION_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ExplorerConfig {
    /// Reads the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: setting(&lookup, "EXPLORER_BIND", defaults.bind, parsed),
            overpass_url: lookup("OVERPASS_URL").unwrap_or(defaults.overpass_url),
            nominatim_url: lookup("NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            osrm_url: lookup("OSRM_URL").unwrap_or(defaults.osrm_url),
            user_agent: lookup("EXPLORER_USER_AGENT").unwrap_or(defaults.user_agent),
            search_radius_m: setting(
                &lookup,
                "SEARCH_RADIUS_M",
                defaults.search_radius_m,
                parse_radius,
            ),
            default_max_distance_km: setting(
                &lookup,
                "DEFAULT_MAX_DISTANCE_KM",
                defaults.default_max_distance_km,
                parse_max_distance,
            ),
            narration_interval: setting(
                &lookup,
                "NARRATION_INTERVAL_MS",
                defaults.narration_interval,
                parse_interval_ms,
            ),
            http_timeout: setting(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                defaults.http_timeout,
                parse_timeout_secs,
            ),
        }
    }
}

/// A search radius in metres: finite and above zero.
pub fn parse_radius(raw: &str) -> Result<f64, String> {
    let radius: f64 = parsed(raw)?;
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(format!("radius must be a positive number of metres, got {raw}"))
    }
}

/// A distance cap in kilometres: finite and not negative.
pub fn parse_max_distance(raw: &str) -> Result<f64, String> {
    let km: f64 = parsed(raw)?;
    if km.is_finite() && km >= 0.0 {
        Ok(km)
    } else {
        Err(format!("max distance must be a non-negative number of km, got {raw}"))
    }
}

fn parse_interval_ms(raw: &str) -> Result<Duration, String> {
    let interval = Duration::from_millis(parsed(raw)?);
    if interval.is_zero() || interval > MAX_NARRATION_INTERVAL {
        return Err(format!(
            "interval must be between 1 and {} ms",
            MAX_NARRATION_INTERVAL.as_millis()
        ));
    }
    Ok(interval)
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, String> {
    match parsed::<u64>(raw)? {
        0 => Err("timeout must be at least one second".to_string()),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parsed<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|err: T::Err| err.to_string())
}

/// Reads `key`, keeping `default` when it is unset or rejected by `parse`.
fn setting<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Result<T, String>,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => parse(raw.trim()).unwrap_or_else(|reason| {
            tracing::warn!("ignoring {key}={raw:?}: {reason}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ExplorerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.search_radius_m, 2000.0);
        assert_eq!(config.narration_interval, Duration::from_millis(2500));
        assert_eq!(config.user_agent, "M-Explore-App");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ExplorerConfig::from_lookup(lookup(&[
            ("EXPLORER_BIND", "127.0.0.1:9000"),
            ("OSRM_URL", "http://localhost:5001/route/v1"),
            ("NARRATION_INTERVAL_MS", "100"),
            ("DEFAULT_MAX_DISTANCE_KM", "2.5"),
        ]));
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.osrm_url, "http://localhost:5001/route/v1");
        assert_eq!(config.narration_interval, Duration::from_millis(100));
        assert_eq!(config.default_max_distance_km, 2.5);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = ExplorerConfig::from_lookup(lookup(&[
            ("SEARCH_RADIUS_M", "far"),
            ("HTTP_TIMEOUT_SECS", "-1"),
        ]));
        assert_eq!(config.search_radius_m, DEFAULT_SEARCH_RADIUS_M);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
    }

    #[test]
    fn out_of_range_numbers_fall_back() {
        let config = ExplorerConfig::from_lookup(lookup(&[
            ("DEFAULT_MAX_DISTANCE_KM", "NaN"),
            ("SEARCH_RADIUS_M", "-500"),
            ("NARRATION_INTERVAL_MS", "18446744073709551615"),
            ("HTTP_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config.default_max_distance_km, DEFAULT_MAX_DISTANCE_KM);
        assert_eq!(config.search_radius_m, DEFAULT_SEARCH_RADIUS_M);
        assert_eq!(config.narration_interval, DEFAULT_NARRATION_INTERVAL);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);

        let config = ExplorerConfig::from_lookup(lookup(&[
            ("DEFAULT_MAX_DISTANCE_KM", "inf"),
            ("SEARCH_RADIUS_M", "0"),
            ("NARRATION_INTERVAL_MS", "0"),
        ]));
        assert_eq!(config.default_max_distance_km, DEFAULT_MAX_DISTANCE_KM);
        assert_eq!(config.search_radius_m, DEFAULT_SEARCH_RADIUS_M);
        assert_eq!(config.narration_interval, DEFAULT_NARRATION_INTERVAL);
    }

    #[test]
    fn zero_max_distance_is_allowed() {
        let config = ExplorerConfig::from_lookup(lookup(&[("DEFAULT_MAX_DISTANCE_KM", "0")]));
        assert_eq!(config.default_max_distance_km, 0.0);
    }

    #[test]
    fn radius_parser_rejects_non_finite_and_negative() {
        assert_eq!(parse_radius("750"), Ok(750.0));
        assert!(parse_radius("NaN").is_err());
        assert!(parse_radius("-inf").is_err());
        assert!(parse_radius("-1").is_err());
        assert!(parse_radius("wide").is_err());
        assert_eq!(parse_max_distance("2.5"), Ok(2.5));
        assert!(parse_max_distance("-0.1").is_err());
    }
}
