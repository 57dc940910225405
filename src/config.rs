use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::api::google_maps::GOOGLE_MAPS_BASE_URL;
use crate::error::ConfigError;
use crate::flows::view_orchestrator::ViewDelays;
use crate::models::landing_models::Coordinate;

#[derive(Debug, Clone)]
pub struct LandingConfig {
    pub google_maps_api_key: String,
    pub google_maps_base_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub survey_table: String,
    pub port: u16,
    pub frontend_url: String,
    pub static_dir: String,
    pub view_delays: ViewDelays,
    pub default_center: Coordinate,
    pub session_idle_ttl: Duration,
    pub submit_timeout: Duration,
    pub sentry_dsn: Option<String>,
}

impl LandingConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = url_var(&lookup, "SUPABASE_URL", None)?;
        let google_maps_base_url =
            url_var(&lookup, "GOOGLE_MAPS_BASE_URL", Some(GOOGLE_MAPS_BASE_URL))?;
        let frontend_url = url_var(&lookup, "FRONTEND_URL", Some("http://localhost:8080"))?;

        Ok(Self {
            google_maps_api_key: required(&lookup, "GOOGLE_MAPS_API_KEY")?,
            google_maps_base_url,
            supabase_url,
            supabase_anon_key: required(&lookup, "SUPABASE_ANON_KEY")?,
            survey_table: lookup("SURVEY_TABLE").unwrap_or_else(|| "survey_responses".to_string()),
            port: parsed(&lookup, "PORT", 3000)?,
            frontend_url,
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
            view_delays: ViewDelays {
                splash: Duration::from_millis(parsed(&lookup, "SPLASH_DELAY_MS", 3000)?),
                thank_you: Duration::from_millis(parsed(&lookup, "THANK_YOU_DELAY_MS", 4000)?),
            },
            // New Delhi
            default_center: Coordinate::new(
                parsed(&lookup, "DEFAULT_CENTER_LAT", 28.6139)?,
                parsed(&lookup, "DEFAULT_CENTER_LNG", 77.2090)?,
            ),
            session_idle_ttl: Duration::from_secs(parsed(&lookup, "SESSION_IDLE_TTL_SECS", 1800)?),
            submit_timeout: Duration::from_secs(parsed(&lookup, "SUBMIT_TIMEOUT_SECS", 15)?),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.trim().is_empty()),
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw.clone() }),
        None => Ok(default),
    }
}

fn url_var<F>(lookup: &F, name: &'static str, default: Option<&str>) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match (lookup(name), default) {
        (Some(value), _) => value,
        (None, Some(default)) => default.to_string(),
        (None, None) => return Err(ConfigError::Missing(name)),
    };
    Url::parse(&raw).map_err(|_| ConfigError::Invalid {
        name,
        value: raw.clone(),
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}
