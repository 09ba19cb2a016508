use std::net::IpAddr;

use thiserror::Error;
use url::Url;

use crate::models::Config;

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },
    #[error("invalid Plex URL `{url}`: {reason}")]
    InvalidPlexUrl { url: String, reason: String },
    #[error("poster limit must be at least 1")]
    InvalidPosterLimit,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.plex.token.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyValue { field: "PLEX_TOKEN" });
    }
    if config.tmdb.api_key.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyValue {
            field: "TMDB_API_KEY",
        });
    }
    if config.posters.limit == 0 {
        return Err(ConfigGuardRailError::InvalidPosterLimit);
    }

    let plex_url = validate_plex_url(&config.plex.url)?;
    if plex_url.scheme() == "http" && !is_loopback(&plex_url) {
        warnings.push_with_hint(
            format!(
                "Plex URL {} uses plain HTTP; the access token is sent unencrypted",
                config.plex.url
            ),
            "Use the https:// address of the server when it is not on this machine",
        );
    }

    for (field, basename) in [
        ("custom_filename", &config.posters.custom_filename),
        ("local_filename", &config.posters.local_filename),
    ] {
        if basename.trim().is_empty() {
            return Err(ConfigGuardRailError::EmptyValue { field });
        }
        let lowered = basename.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
            warnings.push_with_hint(
                format!("poster {field} `{basename}` already carries an image extension"),
                "Give the name without extension; .jpg and .png are tried automatically",
            );
        }
    }

    if config.posters.custom_filename == config.posters.local_filename {
        warnings.push(
            "custom and local poster filenames are identical; custom posters cannot be told apart",
        );
    }

    Ok(warnings)
}

fn validate_plex_url(raw: &str) -> Result<Url, ConfigGuardRailError> {
    let url = Url::parse(raw.trim()).map_err(|err| {
        ConfigGuardRailError::InvalidPlexUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        }
    })?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        "http" | "https" => Err(ConfigGuardRailError::InvalidPlexUrl {
            url: raw.to_string(),
            reason: "missing host".into(),
        }),
        other => Err(ConfigGuardRailError::InvalidPlexUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{ConfigMetadata, PlexConfig, PosterConfig, TmdbConfig};

    fn config(url: &str) -> Config {
        Config {
            plex: PlexConfig {
                url: url.to_string(),
                token: "plex-token".into(),
            },
            tmdb: TmdbConfig {
                api_key: "tmdb-key".into(),
                require_rate_limit_headers: true,
                transient_retry_delay: Duration::from_secs(1),
            },
            posters: PosterConfig {
                local_filename: "movieset-poster".into(),
                custom_filename: "movieset-poster-custom".into(),
                limit: 5,
            },
            metadata: ConfigMetadata::default(),
        }
    }

    #[test]
    fn loopback_http_is_quiet() {
        for url in [
            "http://127.0.0.1:32400",
            "http://localhost:32400",
            "http://[::1]:32400",
            "https://plex.example.com",
        ] {
            let warnings = apply_guard_rails(&config(url)).expect("valid");
            assert!(warnings.is_empty(), "{url} should not warn");
        }
    }

    #[test]
    fn remote_http_warns() {
        let warnings =
            apply_guard_rails(&config("http://192.168.1.20:32400")).expect("valid");
        assert_eq!(warnings.items.len(), 1);
        assert!(warnings.items[0].hint.is_some());
    }

    #[test]
    fn rejects_non_http_urls() {
        for url in ["ftp://plex.local", "not a url", "plex.local:32400"] {
            let err = apply_guard_rails(&config(url)).expect_err(url);
            assert!(matches!(err, ConfigGuardRailError::InvalidPlexUrl { .. }));
        }
    }

    #[test]
    fn rejects_empty_secrets_and_zero_limit() {
        let mut cfg = config("http://127.0.0.1:32400");
        cfg.tmdb.api_key = "  ".into();
        assert!(matches!(
            apply_guard_rails(&cfg),
            Err(ConfigGuardRailError::EmptyValue { field: "TMDB_API_KEY" })
        ));

        let mut cfg = config("http://127.0.0.1:32400");
        cfg.posters.limit = 0;
        assert!(matches!(
            apply_guard_rails(&cfg),
            Err(ConfigGuardRailError::InvalidPosterLimit)
        ));
    }

    #[test]
    fn poster_filename_mistakes_warn() {
        let mut cfg = config("http://127.0.0.1:32400");
        cfg.posters.local_filename = "poster.jpg".into();
        cfg.posters.custom_filename = "poster.jpg".into();
        let warnings = apply_guard_rails(&cfg).expect("valid");
        assert_eq!(warnings.items.len(), 3);
    }
}
