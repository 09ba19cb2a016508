use tracing::{debug, info, warn};

use super::collection_ref::resolve_collection_ref;
use crate::error::Result;
use crate::model::Collection;
use crate::options::RunOptions;
use crate::ports::{MediaServer, MetadataProvider};

const COLLECTION_SUFFIX: &str = " collection";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The collection already has a summary and overwriting was not forced.
    Present,
    NoCollectionMatch,
    /// The provider collection carries no overview text.
    Unavailable,
    Updated { summary: String },
}

impl SummaryOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, SummaryOutcome::Updated { .. })
    }
}

/// Fills a collection's summary from the provider's collection overview.
pub struct SummaryResolver<'a> {
    media: &'a dyn MediaServer,
    metadata: &'a dyn MetadataProvider,
    options: &'a RunOptions,
}

impl std::fmt::Debug for SummaryResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryResolver")
            .field("options", self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> SummaryResolver<'a> {
    pub fn new(
        media: &'a dyn MediaServer,
        metadata: &'a dyn MetadataProvider,
        options: &'a RunOptions,
    ) -> Self {
        Self {
            media,
            metadata,
            options,
        }
    }

    pub async fn resolve(
        &self,
        collection: &Collection,
        fallback_language: &str,
    ) -> Result<SummaryOutcome> {
        if collection.has_summary() && !self.options.force {
            debug!(collection = %collection.title, "summary already present");
            return Ok(SummaryOutcome::Present);
        }

        let Some(reference) = resolve_collection_ref(
            self.metadata,
            collection,
            fallback_language,
        )
        .await?
        else {
            return Ok(SummaryOutcome::NoCollectionMatch);
        };

        let details = self
            .metadata
            .collection(reference.id, &reference.language)
            .await?;
        let Some(details) = details else {
            return Ok(SummaryOutcome::Unavailable);
        };

        if let Some(name) = details.name.as_deref()
            && !titles_match(&collection.title, name)
        {
            warn!(
                collection = %collection.title,
                provider_title = name,
                "collection title differs from metadata provider"
            );
        }

        let summary = match details.overview.as_deref().map(str::trim) {
            Some(overview) if !overview.is_empty() => overview.to_string(),
            _ => return Ok(SummaryOutcome::Unavailable),
        };

        if self.options.dry_run {
            info!(
                dry_run = true,
                collection = %collection.title,
                summary = %summary,
                "would update summary"
            );
        } else {
            self.media.update_summary(collection, &summary).await?;
            info!(collection = %collection.title, "summary updated");
        }

        Ok(SummaryOutcome::Updated { summary })
    }
}

/// Compares titles ignoring case and a trailing " Collection".
fn titles_match(local: &str, remote: &str) -> bool {
    normalize_title(local) == normalize_title(remote)
}

fn normalize_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    match lowered.strip_suffix(COLLECTION_SUFFIX) {
        Some(stripped) => stripped.trim_end().to_string(),
        None => lowered,
    }
}
