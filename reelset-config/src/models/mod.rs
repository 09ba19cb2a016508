pub mod sources;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reelset_core::providers::TmdbSettings;
use reelset_core::resolve::PosterSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub plex: PlexConfig,
    pub tmdb: TmdbConfig,
    pub posters: PosterConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn tmdb_settings(&self) -> TmdbSettings {
        TmdbSettings {
            require_rate_limit_headers: self.tmdb.require_rate_limit_headers,
            transient_retry_delay: self.tmdb.transient_retry_delay,
            ..TmdbSettings::new(self.tmdb.api_key.clone())
        }
    }

    pub fn poster_settings(&self) -> PosterSettings {
        PosterSettings {
            custom_basename: self.posters.custom_filename.clone(),
            local_basename: self.posters.local_filename.clone(),
            limit: self.posters.limit,
        }
    }
}

#[derive(Clone)]
pub struct PlexConfig {
    pub url: String,
    pub token: String,
}

impl fmt::Debug for PlexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub require_rate_limit_headers: bool,
    pub transient_retry_delay: Duration,
}

impl fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_key", &"<redacted>")
            .field(
                "require_rate_limit_headers",
                &self.require_rate_limit_headers,
            )
            .field("transient_retry_delay", &self.transient_retry_delay)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterConfig {
    pub local_filename: String,
    pub custom_filename: String,
    pub limit: usize,
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
