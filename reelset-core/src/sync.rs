//! Run orchestration: walks movie sections and their collections in order.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::MediaServerError;
use crate::model::{Collection, LibrarySection};
use crate::options::{RunOptions, SyncArea};
use crate::ports::{MediaServer, MetadataProvider};
use crate::resolve::{
    PosterOutcome, PosterResolver, PosterSettings, SummaryOutcome,
    SummaryResolver,
};

/// Totals printed at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub sections: usize,
    pub collections: usize,
    pub skipped: usize,
    pub failed: usize,
    pub posters_changed: usize,
    pub summaries_changed: usize,
    pub unmatched: usize,
}

pub struct CollectionSync {
    media: Arc<dyn MediaServer>,
    metadata: Arc<dyn MetadataProvider>,
    posters: PosterSettings,
    options: RunOptions,
}

impl std::fmt::Debug for CollectionSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSync")
            .field("posters", &self.posters)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CollectionSync {
    pub fn new(
        media: Arc<dyn MediaServer>,
        metadata: Arc<dyn MetadataProvider>,
        posters: PosterSettings,
        options: RunOptions,
    ) -> Self {
        Self {
            media,
            metadata,
            posters,
            options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub async fn list_movie_sections(
        &self,
    ) -> Result<Vec<LibrarySection>, MediaServerError> {
        let sections = self.media.sections().await?;
        Ok(sections
            .into_iter()
            .filter(LibrarySection::is_movie_library)
            .collect())
    }

    /// Processes every in-scope collection.
    ///
    /// Only failing to enumerate sections aborts the run. Failures inside a
    /// section or collection are logged, counted, and the run moves on.
    pub async fn run(&self) -> Result<SyncReport, MediaServerError> {
        let mut report = SyncReport::default();

        for section in self.list_movie_sections().await? {
            if !self.options.includes_section(&section) {
                info!(
                    section = %section.title,
                    section_id = %section.id,
                    "library not in scope; skipping"
                );
                continue;
            }
            report.sections += 1;

            let collections = match self.media.collections(&section).await {
                Ok(collections) => collections,
                Err(err) => {
                    error!(
                        section = %section.title,
                        error = %err,
                        "failed to list collections"
                    );
                    report.failed += 1;
                    continue;
                }
            };

            info!(
                section = %section.title,
                collections = collections.len(),
                "processing library"
            );
            let total = collections.len();
            for (index, collection) in collections.into_iter().enumerate() {
                info!(
                    "[{}/{}] {}",
                    index + 1,
                    total,
                    collection.title
                );
                self.sync_collection(&section, collection, &mut report)
                    .await;
            }
        }

        info!(
            sections = report.sections,
            collections = report.collections,
            skipped = report.skipped,
            failed = report.failed,
            posters_changed = report.posters_changed,
            summaries_changed = report.summaries_changed,
            dry_run = self.options.dry_run,
            "run finished"
        );
        Ok(report)
    }

    async fn sync_collection(
        &self,
        section: &LibrarySection,
        mut collection: Collection,
        report: &mut SyncReport,
    ) {
        if collection.has_skip_marker() {
            info!(collection = %collection.title, "skip marker set; skipping");
            report.skipped += 1;
            return;
        }
        report.collections += 1;

        collection.movies =
            match self.media.collection_movies(&collection.id).await {
                Ok(movies) => movies,
                Err(err) => {
                    error!(
                        collection = %collection.title,
                        error = %err,
                        "failed to list collection members"
                    );
                    report.failed += 1;
                    return;
                }
            };
        let collection = &collection;

        let language = section.metadata_language();
        let mut failed = false;

        if self.options.includes_area(SyncArea::Posters) {
            let resolver = PosterResolver::new(
                self.media.as_ref(),
                self.metadata.as_ref(),
                &self.posters,
                &self.options,
            );
            match resolver.resolve(collection, language).await {
                Ok(outcome) => {
                    log_poster_outcome(collection, &outcome);
                    if outcome.is_change() {
                        report.posters_changed += 1;
                    }
                    if outcome == PosterOutcome::NoCollectionMatch {
                        report.unmatched += 1;
                    }
                }
                Err(err) => {
                    error!(
                        collection = %collection.title,
                        error = %err,
                        "poster resolution failed"
                    );
                    failed = true;
                }
            }
        }

        if self.options.includes_area(SyncArea::Summaries) {
            let resolver = SummaryResolver::new(
                self.media.as_ref(),
                self.metadata.as_ref(),
                &self.options,
            );
            match resolver.resolve(collection, language).await {
                Ok(outcome) => {
                    log_summary_outcome(collection, &outcome);
                    if outcome.is_change() {
                        report.summaries_changed += 1;
                    }
                    if outcome == SummaryOutcome::NoCollectionMatch {
                        report.unmatched += 1;
                    }
                }
                Err(err) => {
                    error!(
                        collection = %collection.title,
                        error = %err,
                        "summary resolution failed"
                    );
                    failed = true;
                }
            }
        }

        if failed {
            report.failed += 1;
        }
    }
}

fn log_poster_outcome(collection: &Collection, outcome: &PosterOutcome) {
    match outcome {
        PosterOutcome::Kept(candidate) => {
            info!(collection = %collection.title, poster = %candidate, "poster unchanged");
        }
        PosterOutcome::Selected(candidate) => {
            info!(collection = %collection.title, poster = %candidate, "poster selected");
        }
        PosterOutcome::Uploaded(candidates) => {
            info!(
                collection = %collection.title,
                uploaded = candidates.len(),
                "poster uploaded"
            );
        }
        PosterOutcome::NoRemoteArtwork => {
            warn!(collection = %collection.title, "no poster artwork available");
        }
        PosterOutcome::NoCollectionMatch => {
            warn!(
                collection = %collection.title,
                "no metadata collection matched; posters skipped"
            );
        }
        PosterOutcome::Unresolved => {}
    }
}

fn log_summary_outcome(collection: &Collection, outcome: &SummaryOutcome) {
    match outcome {
        SummaryOutcome::Present | SummaryOutcome::Updated { .. } => {}
        SummaryOutcome::NoCollectionMatch => {
            warn!(
                collection = %collection.title,
                "no metadata collection matched; summary skipped"
            );
        }
        SummaryOutcome::Unavailable => {
            warn!(collection = %collection.title, "no summary available");
        }
    }
}
