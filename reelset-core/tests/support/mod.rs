//! In-memory media server and metadata provider used by the resolver tests.
#![allow(dead_code)]

pub mod stub;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use reelset_core::error::MediaServerError;
use reelset_core::fingerprint::fingerprint;
use reelset_core::model::{
    Collection, DEFAULT_POSTER_KEY, LibrarySection, Movie, ProviderCollection,
    ProviderCollectionLink, ProviderImage, ProviderMovie, RatingKey,
    SectionId, UploadedImage,
};
use reelset_core::ports::{MediaServer, MetadataProvider};
use reelset_core::providers::ProviderError;

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";

pub fn movie_section(id: u32, title: &str) -> LibrarySection {
    LibrarySection {
        id: SectionId(id),
        title: title.to_string(),
        kind: "movie".to_string(),
        language: Some("en".to_string()),
    }
}

pub fn movie(id: &str, guid: &str, part: impl Into<PathBuf>) -> Movie {
    Movie {
        id: RatingKey::from(id),
        title: format!("Movie {id}"),
        agent_guid: guid.to_string(),
        parts: vec![part.into()],
    }
}

pub fn collection(id: &str, title: &str, movies: Vec<Movie>) -> Collection {
    Collection {
        id: RatingKey::from(id),
        title: title.to_string(),
        sort_title: None,
        section_id: SectionId(1),
        summary: String::new(),
        movies,
    }
}

pub fn default_poster(selected: bool) -> UploadedImage {
    UploadedImage {
        key: DEFAULT_POSTER_KEY.to_string(),
        selected,
    }
}

pub fn uploaded(key: &str, selected: bool) -> UploadedImage {
    UploadedImage {
        key: key.to_string(),
        selected,
    }
}

/// Mutations the fake server received, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Select { collection: String, key: String },
    UploadFile { collection: String, path: PathBuf },
    UploadUrl { collection: String, url: String },
    Summary { collection: String, summary: String },
}

#[derive(Debug, Default)]
struct ServerState {
    sections: Vec<LibrarySection>,
    collections: HashMap<SectionId, Vec<Collection>>,
    posters: HashMap<String, Vec<UploadedImage>>,
    failing_urls: HashSet<String>,
    failing_sections: HashSet<SectionId>,
    failing_members: HashSet<String>,
    mutations: Vec<Mutation>,
}

/// Behaves like Plex for the calls the resolvers make: collections are listed
/// without members, uploads become the selected poster and file uploads are
/// keyed by their content hash.
#[derive(Debug, Default)]
pub struct FakeMediaServer {
    state: Mutex<ServerState>,
}

impl FakeMediaServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&self, section: LibrarySection) {
        self.state.lock().expect("state lock").sections.push(section);
    }

    pub fn add_collection(&self, collection: Collection) {
        let mut state = self.state.lock().expect("state lock");
        state
            .collections
            .entry(collection.section_id)
            .or_default()
            .push(collection);
    }

    pub fn set_posters(&self, collection: &str, posters: Vec<UploadedImage>) {
        self.state
            .lock()
            .expect("state lock")
            .posters
            .insert(collection.to_string(), posters);
    }

    pub fn posters_of(&self, collection: &str) -> Vec<UploadedImage> {
        self.state
            .lock()
            .expect("state lock")
            .posters
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_upload_of(&self, url: &str) {
        self.state
            .lock()
            .expect("state lock")
            .failing_urls
            .insert(url.to_string());
    }

    pub fn fail_collections_of(&self, section: SectionId) {
        self.state
            .lock()
            .expect("state lock")
            .failing_sections
            .insert(section);
    }

    pub fn fail_members_of(&self, collection: &str) {
        self.state
            .lock()
            .expect("state lock")
            .failing_members
            .insert(collection.to_string());
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().expect("state lock").mutations.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.mutations()
            .iter()
            .filter(|m| {
                matches!(m, Mutation::UploadFile { .. } | Mutation::UploadUrl { .. })
            })
            .count()
    }

    pub fn selected_key(&self, collection: &str) -> Option<String> {
        self.posters_of(collection)
            .into_iter()
            .find(|poster| poster.selected)
            .map(|poster| poster.key)
    }

    fn attach_selected(state: &mut ServerState, collection: &str, key: String) {
        let posters = state
            .posters
            .entry(collection.to_string())
            .or_insert_with(|| vec![default_poster(true)]);
        for poster in posters.iter_mut() {
            poster.selected = false;
        }
        match posters.iter_mut().find(|poster| poster.key == key) {
            Some(existing) => existing.selected = true,
            None => posters.push(UploadedImage {
                key,
                selected: true,
            }),
        }
    }
}

#[async_trait]
impl MediaServer for FakeMediaServer {
    async fn sections(&self) -> Result<Vec<LibrarySection>, MediaServerError> {
        Ok(self.state.lock().expect("state lock").sections.clone())
    }

    async fn collections(
        &self,
        section: &LibrarySection,
    ) -> Result<Vec<Collection>, MediaServerError> {
        let state = self.state.lock().expect("state lock");
        if state.failing_sections.contains(&section.id) {
            return Err(MediaServerError::Decode("section unavailable".into()));
        }
        Ok(state
            .collections
            .get(&section.id)
            .map(|list| {
                list.iter()
                    .map(|stored| Collection {
                        movies: Vec::new(),
                        ..stored.clone()
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn collection_movies(
        &self,
        collection: &RatingKey,
    ) -> Result<Vec<Movie>, MediaServerError> {
        let state = self.state.lock().expect("state lock");
        if state.failing_members.contains(collection.as_str()) {
            return Err(MediaServerError::Decode(format!(
                "members of {collection} unavailable"
            )));
        }
        Ok(state
            .collections
            .values()
            .flatten()
            .find(|stored| &stored.id == collection)
            .map(|stored| stored.movies.clone())
            .unwrap_or_default())
    }

    async fn posters(
        &self,
        collection: &RatingKey,
    ) -> Result<Vec<UploadedImage>, MediaServerError> {
        Ok(self.posters_of(collection.as_str()))
    }

    async fn select_poster(
        &self,
        collection: &RatingKey,
        key: &str,
    ) -> Result<(), MediaServerError> {
        let mut state = self.state.lock().expect("state lock");
        state.mutations.push(Mutation::Select {
            collection: collection.to_string(),
            key: key.to_string(),
        });
        Self::attach_selected(&mut state, collection.as_str(), key.to_string());
        Ok(())
    }

    async fn upload_poster_file(
        &self,
        collection: &RatingKey,
        path: &Path,
    ) -> Result<(), MediaServerError> {
        let hash =
            fingerprint(path).map_err(|source| MediaServerError::LocalFile {
                path: path.to_path_buf(),
                source,
            })?;
        let mut state = self.state.lock().expect("state lock");
        state.mutations.push(Mutation::UploadFile {
            collection: collection.to_string(),
            path: path.to_path_buf(),
        });
        Self::attach_selected(&mut state, collection.as_str(), hash.upload_key());
        Ok(())
    }

    async fn upload_poster_url(
        &self,
        collection: &RatingKey,
        url: &str,
    ) -> Result<(), MediaServerError> {
        let mut state = self.state.lock().expect("state lock");
        if state.failing_urls.contains(url) {
            return Err(MediaServerError::Decode(format!("cannot fetch {url}")));
        }
        state.mutations.push(Mutation::UploadUrl {
            collection: collection.to_string(),
            url: url.to_string(),
        });
        Self::attach_selected(&mut state, collection.as_str(), format!("remote:{url}"));
        Ok(())
    }

    async fn update_summary(
        &self,
        collection: &Collection,
        summary: &str,
    ) -> Result<(), MediaServerError> {
        let mut state = self.state.lock().expect("state lock");
        state.mutations.push(Mutation::Summary {
            collection: collection.id.to_string(),
            summary: summary.to_string(),
        });
        if let Some(stored) = state
            .collections
            .get_mut(&collection.section_id)
            .and_then(|list| list.iter_mut().find(|c| c.id == collection.id))
        {
            stored.summary = summary.to_string();
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ProviderState {
    movies: HashMap<String, ProviderMovie>,
    failing_movies: HashSet<String>,
    collections: HashMap<u64, ProviderCollection>,
    images: HashMap<u64, Vec<ProviderImage>>,
    requested_languages: Vec<String>,
}

/// Metadata provider backed by maps; counts every call it receives.
#[derive(Debug)]
pub struct FakeMetadataProvider {
    state: Mutex<ProviderState>,
    image_base: Option<String>,
    calls: AtomicUsize,
}

impl Default for FakeMetadataProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(ProviderState::default()),
            image_base: Some(IMAGE_BASE.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_image_base() -> Self {
        Self {
            image_base: None,
            ..Self::default()
        }
    }

    pub fn add_movie(&self, movie_id: &str, collection_id: Option<u64>) {
        self.state.lock().expect("state lock").movies.insert(
            movie_id.to_string(),
            ProviderMovie {
                id: 1,
                title: None,
                belongs_to_collection: collection_id.map(|id| {
                    ProviderCollectionLink { id, name: None }
                }),
            },
        );
    }

    pub fn fail_movie(&self, movie_id: &str) {
        self.state
            .lock()
            .expect("state lock")
            .failing_movies
            .insert(movie_id.to_string());
    }

    pub fn add_collection(&self, id: u64, name: &str, overview: Option<&str>) {
        self.state.lock().expect("state lock").collections.insert(
            id,
            ProviderCollection {
                id,
                name: Some(name.to_string()),
                overview: overview.map(str::to_string),
            },
        );
    }

    pub fn add_images(&self, collection_id: u64, images: Vec<ProviderImage>) {
        self.state
            .lock()
            .expect("state lock")
            .images
            .insert(collection_id, images);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_languages(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("state lock")
            .requested_languages
            .clone()
    }

    fn record(&self, language: Option<&str>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(language) = language {
            self.state
                .lock()
                .expect("state lock")
                .requested_languages
                .push(language.to_string());
        }
    }
}

pub fn image(path: &str, language: Option<&str>, votes: f64) -> ProviderImage {
    ProviderImage {
        file_path: path.to_string(),
        iso_639_1: language.map(str::to_string),
        vote_average: votes,
    }
}

#[async_trait]
impl MetadataProvider for FakeMetadataProvider {
    async fn movie(
        &self,
        movie_id: &str,
        language: &str,
    ) -> Result<Option<ProviderMovie>, ProviderError> {
        self.record(Some(language));
        let state = self.state.lock().expect("state lock");
        if state.failing_movies.contains(movie_id) {
            return Err(ProviderError::ApiError("boom".into()));
        }
        Ok(state.movies.get(movie_id).cloned())
    }

    async fn collection(
        &self,
        collection_id: u64,
        language: &str,
    ) -> Result<Option<ProviderCollection>, ProviderError> {
        self.record(Some(language));
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .collections
            .get(&collection_id)
            .cloned())
    }

    async fn collection_posters(
        &self,
        collection_id: u64,
        language: &str,
    ) -> Result<Vec<ProviderImage>, ProviderError> {
        self.record(Some(language));
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .images
            .get(&collection_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn image_base_url(&self) -> Result<Option<String>, ProviderError> {
        self.record(None);
        Ok(self.image_base.clone())
    }
}
