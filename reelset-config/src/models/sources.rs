use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub plex: FilePlexConfig,
    #[serde(default)]
    pub tmdb: FileTmdbConfig,
    #[serde(default)]
    pub posters: FilePosterConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilePlexConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_rate_limit_headers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient_retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilePosterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub plex_url: Option<String>,
    pub plex_token: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_require_rate_limit_headers: Option<bool>,
    pub local_poster_filename: Option<String>,
    pub custom_poster_filename: Option<String>,
    pub poster_limit: Option<usize>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: non_empty_var("REELSET_CONFIG").map(PathBuf::from),
            plex_url: non_empty_var("PLEX_URL"),
            plex_token: non_empty_var("PLEX_TOKEN"),
            tmdb_api_key: non_empty_var("TMDB_API_KEY"),
            tmdb_require_rate_limit_headers: parse_bool_var(
                "TMDB_REQUIRE_RATE_LIMIT_HEADERS",
            ),
            local_poster_filename: non_empty_var(
                "REELSET_LOCAL_POSTER_FILENAME",
            ),
            custom_poster_filename: non_empty_var(
                "REELSET_CUSTOM_POSTER_FILENAME",
            ),
            poster_limit: non_empty_var("REELSET_POSTER_LIMIT")
                .and_then(|s| s.parse().ok()),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool_var(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|raw| {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    })
}
