use once_cell::sync::Lazy;
use std::{fs, path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

use reelset_core::providers::tmdb::DEFAULT_TRANSIENT_RETRY_DELAY;
use reelset_core::resolve::poster::{
    DEFAULT_CUSTOM_POSTER_BASENAME, DEFAULT_LOCAL_POSTER_BASENAME,
};
use reelset_core::scoring::DEFAULT_POSTER_LIMIT;

use crate::models::{
    Config, ConfigMetadata, PlexConfig, PosterConfig, TmdbConfig,
    sources::{EnvConfig, FileConfig},
};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("reelset.toml"),
        PathBuf::from("config/reelset.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        debug!(env_file_loaded, "environment file processed");

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            config_path,
            env_file_loaded,
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        } else {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            warn!(
                path = %path.display(),
                source = ?provenance,
                "configuration file not found; using environment only"
            );
            return Ok((None, None));
        }
        debug!(
            path = %path.display(),
            source = ?provenance,
            "reading configuration file"
        );

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Merges file and environment values; environment wins.
fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No reelset.toml detected; falling back to environment variables",
            "Create reelset.toml or pass --config to point at one",
        );
    }

    let FileConfig {
        plex: file_plex,
        tmdb: file_tmdb,
        posters: file_posters,
    } = file_config.unwrap_or_default();

    let plex = PlexConfig {
        url: env
            .plex_url
            .or(file_plex.url)
            .ok_or(ConfigLoadError::MissingValue {
                field: "plex.url",
                env: "PLEX_URL",
            })?,
        token: env.plex_token.or(file_plex.token).ok_or(
            ConfigLoadError::MissingValue {
                field: "plex.token",
                env: "PLEX_TOKEN",
            },
        )?,
    };

    let tmdb = TmdbConfig {
        api_key: env.tmdb_api_key.or(file_tmdb.api_key).ok_or(
            ConfigLoadError::MissingValue {
                field: "tmdb.api_key",
                env: "TMDB_API_KEY",
            },
        )?,
        require_rate_limit_headers: env
            .tmdb_require_rate_limit_headers
            .or(file_tmdb.require_rate_limit_headers)
            .unwrap_or(true),
        transient_retry_delay: file_tmdb
            .transient_retry_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TRANSIENT_RETRY_DELAY),
    };

    let posters = PosterConfig {
        local_filename: env
            .local_poster_filename
            .or(file_posters.local_filename)
            .unwrap_or_else(|| DEFAULT_LOCAL_POSTER_BASENAME.to_string()),
        custom_filename: env
            .custom_poster_filename
            .or(file_posters.custom_filename)
            .unwrap_or_else(|| DEFAULT_CUSTOM_POSTER_BASENAME.to_string()),
        limit: env
            .poster_limit
            .or(file_posters.limit)
            .unwrap_or(DEFAULT_POSTER_LIMIT),
    };

    let config = Config {
        plex,
        tmdb,
        posters,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };

    let guard_warnings = validation::apply_guard_rails(&config)?;
    warnings.extend(guard_warnings);

    Ok((config, warnings))
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{field} is not configured (set it in reelset.toml or {env})")]
    MissingValue {
        field: &'static str,
        env: &'static str,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
