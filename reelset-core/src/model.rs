//! Read-only snapshots of media server and metadata provider records.
//!
//! Everything here is fetched fresh per run. The tool never persists these
//! values; mutations are issued as requests against the media server.

use std::fmt;
use std::path::PathBuf;

/// Sort-title suffix that opts a collection out of every sync area.
pub const SKIP_MARKER: &str = "***";

/// Poster key the media server uses for artwork it synthesizes itself.
pub const DEFAULT_POSTER_KEY: &str = "default://";

/// Key prefix the media server assigns to uploaded poster files.
pub const UPLOAD_KEY_PREFIX: &str = "upload://posters/";

/// Language used when neither the item nor its library declares one.
pub const FALLBACK_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub u32);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque media server identifier (Plex `ratingKey`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RatingKey(pub String);

impl RatingKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RatingKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySection {
    pub id: SectionId,
    pub title: String,
    pub kind: String,
    pub language: Option<String>,
}

impl LibrarySection {
    pub fn is_movie_library(&self) -> bool {
        self.kind == "movie"
    }

    /// Language used for items that do not carry their own `lang=` hint.
    ///
    /// Plex reports locales such as `en-US` or the pseudo-language `xn`
    /// for "no language"; only a leading two-letter code is accepted.
    pub fn metadata_language(&self) -> &str {
        self.language
            .as_deref()
            .map(|lang| lang.split(['-', '_']).next().unwrap_or(lang))
            .filter(|lang| {
                lang.len() == 2
                    && *lang != "xn"
                    && lang.chars().all(|c| c.is_ascii_lowercase())
            })
            .unwrap_or(FALLBACK_LANGUAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: RatingKey,
    pub title: String,
    /// External agent identifier, e.g. `com.plexapp.agents.imdb://tt0120737?lang=en`.
    pub agent_guid: String,
    /// Media part file paths in server order.
    pub parts: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: RatingKey,
    pub title: String,
    pub sort_title: Option<String>,
    pub section_id: SectionId,
    pub summary: String,
    pub movies: Vec<Movie>,
}

impl Collection {
    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }

    pub fn has_skip_marker(&self) -> bool {
        self.sort_title
            .as_deref()
            .is_some_and(|sort| sort.ends_with(SKIP_MARKER))
    }
}

/// SHA-1 digest of a file's bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_digest(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Key the media server assigns when these bytes are uploaded as a poster.
    pub fn upload_key(&self) -> String {
        format!("{UPLOAD_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalPosterKind {
    Custom,
    Local,
}

impl LocalPosterKind {
    /// Lookup order: custom artwork beats the plain local poster.
    pub const PRIORITY: [LocalPosterKind; 2] =
        [LocalPosterKind::Custom, LocalPosterKind::Local];

    pub fn label(self) -> &'static str {
        match self {
            LocalPosterKind::Custom => "custom",
            LocalPosterKind::Local => "local",
        }
    }
}

impl fmt::Display for LocalPosterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPoster {
    pub path: PathBuf,
    pub kind: LocalPosterKind,
    pub hash: ContentHash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteImage {
    pub url: String,
    pub language: Option<String>,
    pub score: f64,
}

/// Artwork already attached to a collection on the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub key: String,
    pub selected: bool,
}

impl UploadedImage {
    pub fn is_default(&self) -> bool {
        self.key == DEFAULT_POSTER_KEY
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PosterCandidate {
    LocalFile(LocalPoster),
    RemoteImage(RemoteImage),
    UploadedImage(UploadedImage),
}

impl fmt::Display for PosterCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PosterCandidate::LocalFile(poster) => {
                write!(f, "{} poster {}", poster.kind, poster.path.display())
            }
            PosterCandidate::RemoteImage(image) => f.write_str(&image.url),
            PosterCandidate::UploadedImage(image) => f.write_str(&image.key),
        }
    }
}

/// Metadata provider collection matched to a local collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataCollectionRef {
    pub id: u64,
    pub language: String,
}

/// Image record as listed by the metadata provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderImage {
    pub file_path: String,
    pub iso_639_1: Option<String>,
    pub vote_average: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCollectionLink {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMovie {
    pub id: u64,
    pub title: Option<String>,
    pub belongs_to_collection: Option<ProviderCollectionLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCollection {
    pub id: u64,
    pub name: Option<String>,
    pub overview: Option<String>,
}
