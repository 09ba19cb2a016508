//! JSON shapes returned by the Plex HTTP API (`Accept: application/json`).

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::MediaServerError;
use crate::model::{
    Collection, LibrarySection, Movie, RatingKey, SectionId, UploadedImage,
};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DirectoryContainer {
    #[serde(rename = "Directory", default)]
    pub directories: Vec<SectionBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SectionBody {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl SectionBody {
    pub fn into_section(self) -> Result<LibrarySection, MediaServerError> {
        let id = self.key.parse().map_err(|_| {
            MediaServerError::Decode(format!(
                "library section key '{}' is not numeric",
                self.key
            ))
        })?;
        Ok(LibrarySection {
            id: SectionId(id),
            title: self.title,
            kind: self.kind,
            language: self.language,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataContainer<T> {
    #[serde(rename = "Metadata", default = "Vec::new")]
    pub metadata: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionBody {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,
    pub title: String,
    #[serde(rename = "titleSort", default)]
    pub title_sort: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl CollectionBody {
    pub fn into_collection(self, section_id: SectionId) -> Collection {
        Collection {
            id: RatingKey(self.rating_key),
            title: self.title,
            sort_title: self.title_sort,
            section_id,
            summary: self.summary.unwrap_or_default(),
            movies: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MovieBody {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub guid: String,
    #[serde(rename = "Media", default)]
    pub media: Vec<MediaBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaBody {
    #[serde(rename = "Part", default)]
    pub parts: Vec<PartBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartBody {
    #[serde(default)]
    pub file: Option<String>,
}

impl From<MovieBody> for Movie {
    fn from(body: MovieBody) -> Self {
        let parts = body
            .media
            .into_iter()
            .flat_map(|media| media.parts)
            .filter_map(|part| part.file.map(PathBuf::from))
            .collect();

        Movie {
            id: RatingKey(body.rating_key),
            title: body.title,
            agent_guid: body.guid,
            parts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PosterBody {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,
    #[serde(default)]
    pub selected: bool,
}

impl From<PosterBody> for UploadedImage {
    fn from(body: PosterBody) -> Self {
        UploadedImage {
            key: body.rating_key,
            selected: body.selected,
        }
    }
}
