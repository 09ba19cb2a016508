use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ProviderError;
use super::rate_limit::{RateLimitGate, RateLimitWindow};
use crate::model::{
    FALLBACK_LANGUAGE, ProviderCollection, ProviderCollectionLink,
    ProviderImage, ProviderMovie,
};
use crate::ports::MetadataProvider;

pub const TMDB_V3_BASE: &str = "https://api.themoviedb.org/3";
const ORIGINAL_IMAGE_SIZE: &str = "original";

/// Retries granted to a request whose response lacked quota headers.
pub const MAX_TRANSIENT_RETRIES: u32 = 1;
pub const DEFAULT_TRANSIENT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct TmdbSettings {
    pub api_key: String,
    pub api_base: String,
    /// Treat a response without `X-RateLimit-*` headers as a transient fault.
    pub require_rate_limit_headers: bool,
    pub transient_retry_delay: Duration,
}

impl TmdbSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: TMDB_V3_BASE.to_string(),
            require_rate_limit_headers: true,
            transient_retry_delay: DEFAULT_TRANSIENT_RETRY_DELAY,
        }
    }
}

impl fmt::Debug for TmdbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbSettings")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field(
                "require_rate_limit_headers",
                &self.require_rate_limit_headers,
            )
            .field("transient_retry_delay", &self.transient_retry_delay)
            .finish()
    }
}

/// TMDB v3 client with a shared rate-limit gate.
pub struct TmdbProvider {
    http: reqwest::Client,
    settings: TmdbSettings,
    gate: RateLimitGate,
    image_base: Mutex<Option<String>>,
}

impl fmt::Debug for TmdbProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbProvider")
            .field("settings", &self.settings)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct LanguageQuery<'a> {
    language: &'a str,
}

#[derive(Debug, Serialize)]
struct ImagesQuery<'a> {
    language: &'a str,
    include_image_language: String,
}

#[derive(Debug, Deserialize)]
struct MovieDetailsBody {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    belongs_to_collection: Option<CollectionLinkBody>,
}

#[derive(Debug, Deserialize)]
struct CollectionLinkBody {
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionDetailsBody {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionImagesBody {
    #[serde(default)]
    posters: Vec<ImageBody>,
}

#[derive(Debug, Deserialize)]
struct ImageBody {
    file_path: String,
    #[serde(default)]
    iso_639_1: Option<String>,
    #[serde(default)]
    vote_average: f64,
}

#[derive(Debug, Deserialize)]
struct ConfigurationBody {
    images: ImageConfigurationBody,
}

#[derive(Debug, Deserialize)]
struct ImageConfigurationBody {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    secure_base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbErrorBody {
    #[serde(default)]
    status_message: Option<String>,
}

impl TmdbProvider {
    pub fn new(settings: TmdbSettings) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            settings,
            gate: RateLimitGate::new(),
            image_base: Mutex::new(None),
        })
    }

    /// Issues a GET and decodes the body.
    ///
    /// Returns `Ok(None)` for 404s and for transient faults that outlast
    /// the single retry.
    async fn get_tmdb_json<Q, T>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Option<T>, ProviderError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!(
            "{}/{}",
            self.settings.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut attempt = 0;

        loop {
            self.gate.wait().await;

            let response = self
                .http
                .get(&url)
                .query(&[("api_key", self.settings.api_key.as_str())])
                .query(query)
                .send()
                .await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                return Err(ProviderError::InvalidApiKey);
            }

            let transient = match RateLimitWindow::from_headers(
                response.headers(),
            ) {
                Some(window) => {
                    self.gate.observe(&window);
                    status == StatusCode::TOO_MANY_REQUESTS
                }
                None => {
                    self.settings.require_rate_limit_headers
                        || status == StatusCode::TOO_MANY_REQUESTS
                }
            };

            if transient {
                if attempt < MAX_TRANSIENT_RETRIES {
                    attempt += 1;
                    warn!(
                        %url,
                        %status,
                        delay_ms = self.settings.transient_retry_delay.as_millis() as u64,
                        "metadata provider response without rate-limit data; retrying"
                    );
                    tokio::time::sleep(self.settings.transient_retry_delay)
                        .await;
                    continue;
                }
                warn!(%url, %status, "metadata provider still faulty after retry; no data");
                return Ok(None);
            }

            if status.is_success() {
                return response.json::<T>().await.map(Some).map_err(|err| {
                    if err.is_decode() {
                        ProviderError::ParseError(err.to_string())
                    } else {
                        ProviderError::from(err)
                    }
                });
            }

            if status == StatusCode::NOT_FOUND {
                debug!(%url, "metadata provider has no record");
                return Ok(None);
            }

            let message = response
                .json::<TmdbErrorBody>()
                .await
                .ok()
                .and_then(|body| body.status_message)
                .unwrap_or_else(|| {
                    format!("TMDB request failed with status {}", status)
                });
            return Err(ProviderError::ApiError(message));
        }
    }
}

fn image_languages(language: &str) -> String {
    if language == FALLBACK_LANGUAGE {
        format!("{FALLBACK_LANGUAGE},null")
    } else {
        format!("{language},{FALLBACK_LANGUAGE},null")
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn movie(
        &self,
        movie_id: &str,
        language: &str,
    ) -> Result<Option<ProviderMovie>, ProviderError> {
        let body: Option<MovieDetailsBody> = self
            .get_tmdb_json(&format!("movie/{movie_id}"), &LanguageQuery {
                language,
            })
            .await?;

        Ok(body.map(|movie| ProviderMovie {
            id: movie.id,
            title: movie.title,
            belongs_to_collection: movie.belongs_to_collection.map(|link| {
                ProviderCollectionLink {
                    id: link.id,
                    name: link.name,
                }
            }),
        }))
    }

    async fn collection(
        &self,
        collection_id: u64,
        language: &str,
    ) -> Result<Option<ProviderCollection>, ProviderError> {
        let body: Option<CollectionDetailsBody> = self
            .get_tmdb_json(
                &format!("collection/{collection_id}"),
                &LanguageQuery { language },
            )
            .await?;

        Ok(body.map(|collection| ProviderCollection {
            id: collection.id,
            name: collection.name,
            overview: collection.overview,
        }))
    }

    async fn collection_posters(
        &self,
        collection_id: u64,
        language: &str,
    ) -> Result<Vec<ProviderImage>, ProviderError> {
        let query = ImagesQuery {
            language,
            include_image_language: image_languages(language),
        };
        let body: Option<CollectionImagesBody> = self
            .get_tmdb_json(&format!("collection/{collection_id}/images"), &query)
            .await?;

        Ok(body
            .map(|images| images.posters)
            .unwrap_or_default()
            .into_iter()
            .map(|image| ProviderImage {
                file_path: image.file_path,
                iso_639_1: image.iso_639_1,
                vote_average: image.vote_average,
            })
            .collect())
    }

    async fn image_base_url(&self) -> Result<Option<String>, ProviderError> {
        if let Some(cached) =
            self.image_base.lock().ok().and_then(|guard| guard.clone())
        {
            return Ok(Some(cached));
        }

        let body: Option<ConfigurationBody> = self
            .get_tmdb_json("configuration", &[] as &[(&str, &str)])
            .await?;
        let Some(base) = body.and_then(|config| {
            config.images.secure_base_url.or(config.images.base_url)
        }) else {
            return Ok(None);
        };

        let resolved =
            format!("{}/{ORIGINAL_IMAGE_SIZE}", base.trim_end_matches('/'));
        if let Ok(mut guard) = self.image_base.lock() {
            *guard = Some(resolved.clone());
        }
        Ok(Some(resolved))
    }
}
