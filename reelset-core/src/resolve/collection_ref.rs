use tracing::{debug, trace};

use crate::agent::AgentGuid;
use crate::model::{Collection, MetadataCollectionRef};
use crate::ports::MetadataProvider;
use crate::providers::ProviderError;

/// Finds the metadata provider collection a local collection corresponds to.
///
/// Member movies are tried in server order and the first one whose provider
/// record names a parent collection wins. `Ok(None)` means no member movie
/// led to a collection; provider failures are returned as errors.
pub async fn resolve_collection_ref(
    provider: &dyn MetadataProvider,
    collection: &Collection,
    fallback_language: &str,
) -> Result<Option<MetadataCollectionRef>, ProviderError> {
    for movie in &collection.movies {
        let guid = AgentGuid::parse(&movie.agent_guid);
        let Some(movie_id) = guid.movie_id() else {
            trace!(
                movie = %movie.title,
                guid = %movie.agent_guid,
                "unsupported agent; skipping member"
            );
            continue;
        };
        let language = guid.language_or(fallback_language);

        let details = provider.movie(movie_id, language).await?;

        match details.and_then(|details| details.belongs_to_collection) {
            Some(link) => {
                debug!(
                    collection = %collection.title,
                    movie = %movie.title,
                    provider_collection = link.id,
                    language,
                    "matched metadata collection"
                );
                return Ok(Some(MetadataCollectionRef {
                    id: link.id,
                    language: language.to_string(),
                }));
            }
            None => {
                trace!(movie = %movie.title, "member has no parent collection");
            }
        }
    }

    Ok(None)
}
