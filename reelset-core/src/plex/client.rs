use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::wire::{
    CollectionBody, DirectoryContainer, Envelope, MetadataContainer,
    MovieBody, PosterBody,
};
use crate::error::MediaServerError;
use crate::model::{
    Collection, LibrarySection, Movie, RatingKey, UploadedImage,
};
use crate::ports::MediaServer;

const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";
/// Plex metadata type for collections.
const COLLECTION_TYPE: &str = "18";
const POSTER_ELEMENT: &str = "poster";
const POSTERS_ELEMENT: &str = "posters";

/// Plex Media Server HTTP client.
pub struct PlexClient {
    http: reqwest::Client,
    base: Url,
}

impl fmt::Debug for PlexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl PlexClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, MediaServerError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut token_value = HeaderValue::from_str(token).map_err(|_| {
            MediaServerError::Decode(
                "Plex token contains invalid header characters".into(),
            )
        })?;
        token_value.set_sensitive(true);
        headers.insert(PLEX_TOKEN_HEADER, token_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()?;

        // A trailing slash keeps `Url::join` from dropping a path prefix.
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, MediaServerError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn metadata_endpoint(
        &self,
        collection: &RatingKey,
        element: &str,
    ) -> Result<Url, MediaServerError> {
        self.endpoint(&format!("library/metadata/{collection}/{element}"))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<reqwest::Response, MediaServerError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MediaServerError::Status {
                status,
                url: url.path().to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<T, MediaServerError> {
        debug!(path = url.path(), "plex GET");
        let response = self.send(self.http.get(url.clone()), &url).await?;
        let envelope: Envelope<T> = response.json().await.map_err(|err| {
            MediaServerError::Decode(format!("{}: {err}", url.path()))
        })?;
        Ok(envelope.media_container)
    }

    async fn mutate(
        &self,
        method: Method,
        url: Url,
    ) -> Result<(), MediaServerError> {
        debug!(%method, path = url.path(), "plex mutation");
        self.send(self.http.request(method, url.clone()), &url)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl MediaServer for PlexClient {
    async fn sections(&self) -> Result<Vec<LibrarySection>, MediaServerError> {
        let container: DirectoryContainer =
            self.get_json(self.endpoint("library/sections")?).await?;
        container
            .directories
            .into_iter()
            .map(|body| body.into_section())
            .collect()
    }

    async fn collections(
        &self,
        section: &LibrarySection,
    ) -> Result<Vec<Collection>, MediaServerError> {
        let mut url =
            self.endpoint(&format!("library/sections/{}/all", section.id))?;
        url.query_pairs_mut().append_pair("type", COLLECTION_TYPE);
        let container: MetadataContainer<CollectionBody> =
            self.get_json(url).await?;

        Ok(container
            .metadata
            .into_iter()
            .map(|body| body.into_collection(section.id))
            .collect())
    }

    async fn collection_movies(
        &self,
        collection: &RatingKey,
    ) -> Result<Vec<Movie>, MediaServerError> {
        let url = self
            .endpoint(&format!("library/collections/{collection}/children"))?;
        let container: MetadataContainer<MovieBody> = self.get_json(url).await?;
        Ok(container.metadata.into_iter().map(Movie::from).collect())
    }

    async fn posters(
        &self,
        collection: &RatingKey,
    ) -> Result<Vec<UploadedImage>, MediaServerError> {
        let url = self.metadata_endpoint(collection, POSTERS_ELEMENT)?;
        let container: MetadataContainer<PosterBody> =
            self.get_json(url).await?;
        Ok(container
            .metadata
            .into_iter()
            .map(UploadedImage::from)
            .collect())
    }

    async fn select_poster(
        &self,
        collection: &RatingKey,
        key: &str,
    ) -> Result<(), MediaServerError> {
        let mut url = self.metadata_endpoint(collection, POSTER_ELEMENT)?;
        url.query_pairs_mut().append_pair("url", key);
        self.mutate(Method::PUT, url).await
    }

    async fn upload_poster_file(
        &self,
        collection: &RatingKey,
        path: &Path,
    ) -> Result<(), MediaServerError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| {
            MediaServerError::LocalFile {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut url = self.metadata_endpoint(collection, POSTERS_ELEMENT)?;
        url.query_pairs_mut().append_pair("includeExternalMedia", "1");
        debug!(path = url.path(), bytes = bytes.len(), "plex poster upload");
        self.send(self.http.post(url.clone()).body(bytes), &url)
            .await
            .map(|_| ())
    }

    async fn upload_poster_url(
        &self,
        collection: &RatingKey,
        image_url: &str,
    ) -> Result<(), MediaServerError> {
        let mut url = self.metadata_endpoint(collection, POSTERS_ELEMENT)?;
        url.query_pairs_mut().append_pair("url", image_url);
        self.mutate(Method::POST, url).await
    }

    async fn update_summary(
        &self,
        collection: &Collection,
        summary: &str,
    ) -> Result<(), MediaServerError> {
        let mut url = self.endpoint(&format!(
            "library/sections/{}/all",
            collection.section_id
        ))?;
        // Percent-encode the summary rather than form-encode it ('+' for
        // spaces would be stored literally).
        url.set_query(Some(&format!(
            "type={COLLECTION_TYPE}&id={}&summary.value={}",
            urlencoding::encode(collection.id.as_str()),
            urlencoding::encode(summary)
        )));
        self.mutate(Method::PUT, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let client =
            PlexClient::new("https://example.com/plex", "token").expect("client");
        let url = client
            .metadata_endpoint(&RatingKey::from("42"), POSTERS_ELEMENT)
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://example.com/plex/library/metadata/42/posters"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = PlexClient::new("not a url", "token")
            .expect_err("invalid base must fail");
        assert!(matches!(err, MediaServerError::InvalidUrl(_)));
    }

    #[test]
    fn debug_output_omits_token() {
        let client =
            PlexClient::new("http://127.0.0.1:32400", "hunter2").expect("client");
        assert!(!format!("{client:?}").contains("hunter2"));
    }
}
