//! Poster resolution for one collection.
//!
//! The steps run in a fixed order and stop at the first that settles the
//! poster:
//!
//! 1. a custom or local poster file beside any member movie;
//! 2. non-default artwork already attached to the collection;
//! 3. ranked artwork from the metadata provider, when the collection only
//!    has the server's generated default.
//!
//! Every step is idempotent. Re-running after a successful resolution
//! selects or keeps what is already there and never uploads twice.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::collection_ref::resolve_collection_ref;
use crate::error::{Result, SyncError};
use crate::fingerprint::fingerprint;
use crate::model::{
    Collection, LocalPoster, LocalPosterKind, PosterCandidate, RemoteImage,
    UploadedImage,
};
use crate::options::RunOptions;
use crate::ports::{MediaServer, MetadataProvider};
use crate::scoring::{DEFAULT_POSTER_LIMIT, score_and_rank};

pub const DEFAULT_LOCAL_POSTER_BASENAME: &str = "movieset-poster";
pub const DEFAULT_CUSTOM_POSTER_BASENAME: &str = "movieset-poster-custom";

/// Accepted poster file extensions, in lookup order.
pub const POSTER_EXTENSIONS: [&str; 2] = ["jpg", "png"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterSettings {
    pub custom_basename: String,
    pub local_basename: String,
    /// Maximum number of provider images uploaded per collection.
    pub limit: usize,
}

impl Default for PosterSettings {
    fn default() -> Self {
        Self {
            custom_basename: DEFAULT_CUSTOM_POSTER_BASENAME.to_string(),
            local_basename: DEFAULT_LOCAL_POSTER_BASENAME.to_string(),
            limit: DEFAULT_POSTER_LIMIT,
        }
    }
}

impl PosterSettings {
    fn basename(&self, kind: LocalPosterKind) -> &str {
        match kind {
            LocalPosterKind::Custom => &self.custom_basename,
            LocalPosterKind::Local => &self.local_basename,
        }
    }
}

/// How a collection's poster ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum PosterOutcome {
    /// The wanted poster was already selected.
    Kept(PosterCandidate),
    /// An image already on the server was selected.
    Selected(PosterCandidate),
    /// New artwork was uploaded; the first entry is the one selected.
    Uploaded(Vec<PosterCandidate>),
    /// The provider collection has no usable poster images.
    NoRemoteArtwork,
    /// No member movie maps to a provider collection.
    NoCollectionMatch,
    /// Several candidates exist but none is usable; nothing was changed.
    Unresolved,
}

impl PosterOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, PosterOutcome::Selected(_) | PosterOutcome::Uploaded(_))
    }
}

pub struct PosterResolver<'a> {
    media: &'a dyn MediaServer,
    metadata: &'a dyn MetadataProvider,
    settings: &'a PosterSettings,
    options: &'a RunOptions,
}

impl std::fmt::Debug for PosterResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosterResolver")
            .field("settings", self.settings)
            .field("options", self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> PosterResolver<'a> {
    pub fn new(
        media: &'a dyn MediaServer,
        metadata: &'a dyn MetadataProvider,
        settings: &'a PosterSettings,
        options: &'a RunOptions,
    ) -> Self {
        Self {
            media,
            metadata,
            settings,
            options,
        }
    }

    pub async fn resolve(
        &self,
        collection: &Collection,
        fallback_language: &str,
    ) -> Result<PosterOutcome> {
        if let Some((path, kind)) = self.find_local_poster(collection) {
            return self.apply_local_poster(collection, path, kind).await;
        }

        let posters = self.media.posters(&collection.id).await?;

        if let Some(active) = posters
            .iter()
            .find(|poster| poster.selected && !poster.is_default())
        {
            debug!(
                collection = %collection.title,
                key = %active.key,
                "poster already resolved"
            );
            return Ok(PosterOutcome::Kept(PosterCandidate::UploadedImage(
                active.clone(),
            )));
        }

        if let Some(candidate) = posters.iter().find(|poster| !poster.is_default())
        {
            self.select(collection, &candidate.key).await?;
            return Ok(PosterOutcome::Selected(PosterCandidate::UploadedImage(
                UploadedImage {
                    key: candidate.key.clone(),
                    selected: true,
                },
            )));
        }

        if posters.len() > 1 {
            warn!(
                collection = %collection.title,
                candidates = posters.len(),
                "only generated posters present; leaving as is"
            );
            return Ok(PosterOutcome::Unresolved);
        }

        self.fetch_remote(collection, fallback_language).await
    }

    /// First custom poster beside any member movie, else the first local one.
    ///
    /// Within a kind, member movies and their media parts are walked in
    /// server order and `.jpg` is preferred over `.png`.
    pub fn find_local_poster(
        &self,
        collection: &Collection,
    ) -> Option<(PathBuf, LocalPosterKind)> {
        LocalPosterKind::PRIORITY.into_iter().find_map(|kind| {
            let basename = self.settings.basename(kind);
            collection
                .movies
                .iter()
                .flat_map(|movie| movie.parts.iter())
                .filter_map(|part| part.parent())
                .find_map(|dir| sibling_poster(dir, basename))
                .map(|path| (path, kind))
        })
    }

    async fn apply_local_poster(
        &self,
        collection: &Collection,
        path: PathBuf,
        kind: LocalPosterKind,
    ) -> Result<PosterOutcome> {
        let hash = fingerprint(&path).map_err(|source| {
            SyncError::Fingerprint {
                path: path.clone(),
                source,
            }
        })?;
        let upload_key = hash.upload_key();
        let poster = PosterCandidate::LocalFile(LocalPoster {
            path: path.clone(),
            kind,
            hash,
        });

        let existing = self.media.posters(&collection.id).await?;
        match existing.iter().find(|image| image.key == upload_key) {
            Some(image) if image.selected => {
                debug!(
                    collection = %collection.title,
                    %kind,
                    "local poster already selected"
                );
                Ok(PosterOutcome::Kept(poster))
            }
            Some(_) => {
                self.select(collection, &upload_key).await?;
                Ok(PosterOutcome::Selected(poster))
            }
            None => {
                if self.options.dry_run {
                    info!(
                        dry_run = true,
                        collection = %collection.title,
                        path = %path.display(),
                        %kind,
                        "would upload local poster"
                    );
                } else {
                    info!(
                        collection = %collection.title,
                        path = %path.display(),
                        %kind,
                        "uploading local poster"
                    );
                    self.media
                        .upload_poster_file(&collection.id, &path)
                        .await?;
                }
                self.select(collection, &upload_key).await?;
                Ok(PosterOutcome::Uploaded(vec![poster]))
            }
        }
    }

    async fn fetch_remote(
        &self,
        collection: &Collection,
        fallback_language: &str,
    ) -> Result<PosterOutcome> {
        let Some(reference) = resolve_collection_ref(
            self.metadata,
            collection,
            fallback_language,
        )
        .await?
        else {
            return Ok(PosterOutcome::NoCollectionMatch);
        };

        let images = self
            .metadata
            .collection_posters(reference.id, &reference.language)
            .await?;
        if images.is_empty() {
            return Ok(PosterOutcome::NoRemoteArtwork);
        }

        let Some(base_url) = self.metadata.image_base_url().await? else {
            warn!(
                collection = %collection.title,
                "metadata provider returned no image base URL"
            );
            return Ok(PosterOutcome::NoRemoteArtwork);
        };

        let ranked = score_and_rank(
            &images,
            &reference.language,
            &base_url,
            self.settings.limit,
        );
        if ranked.is_empty() {
            return Ok(PosterOutcome::NoRemoteArtwork);
        }

        if self.options.dry_run {
            for image in &ranked {
                info!(
                    dry_run = true,
                    collection = %collection.title,
                    url = %image.url,
                    score = image.score,
                    "would upload remote poster"
                );
            }
            info!(
                dry_run = true,
                collection = %collection.title,
                url = %ranked[0].url,
                "would select poster"
            );
            return Ok(PosterOutcome::Uploaded(
                ranked.into_iter().map(PosterCandidate::RemoteImage).collect(),
            ));
        }

        self.upload_ranked(collection, ranked).await
    }

    /// Uploads in rank order, then re-selects the first upload so the best
    /// image wins over the most recent one.
    async fn upload_ranked(
        &self,
        collection: &Collection,
        ranked: Vec<RemoteImage>,
    ) -> Result<PosterOutcome> {
        let mut uploaded = Vec::with_capacity(ranked.len());
        let mut first_key: Option<String> = None;

        for image in ranked {
            if let Err(err) =
                self.media.upload_poster_url(&collection.id, &image.url).await
            {
                warn!(
                    collection = %collection.title,
                    url = %image.url,
                    error = %err,
                    "poster upload failed; trying next image"
                );
                continue;
            }
            info!(
                collection = %collection.title,
                url = %image.url,
                score = image.score,
                "uploaded remote poster"
            );

            if uploaded.is_empty() {
                first_key = self.newest_poster_key(collection).await?;
            }
            uploaded.push(PosterCandidate::RemoteImage(image));
        }

        if uploaded.is_empty() {
            return Err(SyncError::UploadFailed {
                collection: collection.title.clone(),
            });
        }

        match first_key {
            Some(key) => self.select(collection, &key).await?,
            None => warn!(
                collection = %collection.title,
                "could not identify the first uploaded poster to select"
            ),
        }
        Ok(PosterOutcome::Uploaded(uploaded))
    }

    /// Key of the poster the server selected after an upload.
    async fn newest_poster_key(
        &self,
        collection: &Collection,
    ) -> Result<Option<String>> {
        let posters = self.media.posters(&collection.id).await?;
        let key = posters
            .iter()
            .find(|poster| poster.selected && !poster.is_default())
            .or_else(|| posters.iter().find(|poster| !poster.is_default()))
            .map(|poster| poster.key.clone());
        Ok(key)
    }

    async fn select(&self, collection: &Collection, key: &str) -> Result<()> {
        if self.options.dry_run {
            info!(
                dry_run = true,
                collection = %collection.title,
                key,
                "would select poster"
            );
            return Ok(());
        }
        info!(collection = %collection.title, key, "selecting poster");
        self.media.select_poster(&collection.id, key).await?;
        Ok(())
    }
}

fn sibling_poster(dir: &Path, basename: &str) -> Option<PathBuf> {
    POSTER_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{basename}.{ext}")))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpg_wins_over_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("poster.png"), b"png").expect("png");
        assert_eq!(
            sibling_poster(dir.path(), "poster"),
            Some(dir.path().join("poster.png"))
        );

        std::fs::write(dir.path().join("poster.jpg"), b"jpg").expect("jpg");
        assert_eq!(
            sibling_poster(dir.path(), "poster"),
            Some(dir.path().join("poster.jpg"))
        );
    }

    #[test]
    fn directories_named_like_posters_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("poster.jpg")).expect("dir");
        assert_eq!(sibling_poster(dir.path(), "poster"), None);
    }

    #[test]
    fn only_uploads_and_selections_count_as_changes() {
        let image = PosterCandidate::UploadedImage(UploadedImage {
            key: "upload://posters/aa".into(),
            selected: true,
        });
        assert!(!PosterOutcome::Kept(image.clone()).is_change());
        assert!(PosterOutcome::Selected(image.clone()).is_change());
        assert!(PosterOutcome::Uploaded(vec![image]).is_change());
        assert!(!PosterOutcome::NoCollectionMatch.is_change());
    }
}
