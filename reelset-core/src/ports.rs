//! Seams between the resolvers and the two remote services.

use std::path::Path;

use async_trait::async_trait;

use crate::error::MediaServerError;
use crate::model::{
    Collection, LibrarySection, Movie, ProviderCollection, ProviderImage,
    ProviderMovie, RatingKey, UploadedImage,
};
use crate::providers::ProviderError;

/// Media server operations needed to read and mutate collection artwork.
#[async_trait]
pub trait MediaServer: Send + Sync {
    async fn sections(&self) -> Result<Vec<LibrarySection>, MediaServerError>;

    /// Collection headers of a section. `movies` is left empty; members
    /// come from [`MediaServer::collection_movies`].
    async fn collections(
        &self,
        section: &LibrarySection,
    ) -> Result<Vec<Collection>, MediaServerError>;

    /// Member movies of a collection, with their part paths.
    async fn collection_movies(
        &self,
        collection: &RatingKey,
    ) -> Result<Vec<Movie>, MediaServerError>;

    /// Current poster candidates attached to a collection.
    async fn posters(
        &self,
        collection: &RatingKey,
    ) -> Result<Vec<UploadedImage>, MediaServerError>;

    async fn select_poster(
        &self,
        collection: &RatingKey,
        key: &str,
    ) -> Result<(), MediaServerError>;

    async fn upload_poster_file(
        &self,
        collection: &RatingKey,
        path: &Path,
    ) -> Result<(), MediaServerError>;

    async fn upload_poster_url(
        &self,
        collection: &RatingKey,
        url: &str,
    ) -> Result<(), MediaServerError>;

    async fn update_summary(
        &self,
        collection: &Collection,
        summary: &str,
    ) -> Result<(), MediaServerError>;
}

/// Metadata database lookups.
///
/// `Ok(None)` means the provider had no data for the request, including a
/// transient fault that persisted through the retry. Callers treat it as
/// "not found" rather than an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn movie(
        &self,
        movie_id: &str,
        language: &str,
    ) -> Result<Option<ProviderMovie>, ProviderError>;

    async fn collection(
        &self,
        collection_id: u64,
        language: &str,
    ) -> Result<Option<ProviderCollection>, ProviderError>;

    async fn collection_posters(
        &self,
        collection_id: u64,
        language: &str,
    ) -> Result<Vec<ProviderImage>, ProviderError>;

    /// Image base URL for the "original" size variant.
    async fn image_base_url(&self) -> Result<Option<String>, ProviderError>;
}
