//! Ranking of provider poster images by language preference and votes.

use crate::model::{FALLBACK_LANGUAGE, ProviderImage, RemoteImage};

/// Number of ranked posters uploaded for one collection by default.
pub const DEFAULT_POSTER_LIMIT: usize = 5;

/// Scores every image against the preferred language.
///
/// Images tagged with a language other than English or the preferred one
/// drop to a score of 0; untagged images keep their vote average. Images
/// in the preferred language get a +1 boost. Input order is preserved.
pub fn score_images(
    images: &[ProviderImage],
    preferred_language: &str,
) -> Vec<(ProviderImage, f64)> {
    images
        .iter()
        .map(|image| {
            let mut score = image.vote_average;
            match image.iso_639_1.as_deref() {
                Some(lang) if lang == preferred_language => score += 1.0,
                Some(lang) if lang != FALLBACK_LANGUAGE => score = 0.0,
                _ => {}
            }
            (image.clone(), score)
        })
        .collect()
}

/// Ranks images and returns at most `limit` absolute poster URLs, best first.
///
/// `base_url` is the provider's image base including the size segment,
/// e.g. `https://image.tmdb.org/t/p/original`. Equal scores keep the
/// provider's order.
pub fn score_and_rank(
    images: &[ProviderImage],
    preferred_language: &str,
    base_url: &str,
    limit: usize,
) -> Vec<RemoteImage> {
    let mut scored = score_images(images, preferred_language);
    // `sort_by` is stable, ties stay in provider order
    scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    let base = base_url.trim_end_matches('/');
    scored
        .into_iter()
        .take(limit)
        .map(|(image, score)| RemoteImage {
            url: join_image_url(base, &image.file_path),
            language: image.iso_639_1,
            score,
        })
        .collect()
}

fn join_image_url(base: &str, file_path: &str) -> String {
    if file_path.starts_with('/') {
        format!("{base}{file_path}")
    } else {
        format!("{base}/{file_path}")
    }
}
