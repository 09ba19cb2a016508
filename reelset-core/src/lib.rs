//! # Reelset Core
//!
//! Keeps Plex movie collections dressed: picks collection posters and fills
//! collection summaries from TMDB.
//!
//! ## Overview
//!
//! - **Posters**: custom or local poster files beside member movies win;
//!   otherwise artwork already attached to the collection is reused; only a
//!   collection left with the server's generated default is sent to the
//!   metadata provider for ranked artwork.
//! - **Summaries**: empty summaries (or all of them, when forced) are filled
//!   from the provider's collection overview.
//! - **Dry runs**: every mutating call can be replaced by a log line.
//!
//! ## Architecture
//!
//! - [`ports`]: the [`MediaServer`] and [`MetadataProvider`] seams
//! - [`plex`]: Plex HTTP adapter
//! - [`providers`]: TMDB adapter and its rate-limit gate
//! - [`resolve`]: per-collection poster and summary resolvers
//! - [`sync`]: run orchestration over sections and collections
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use reelset_core::{
//!     CollectionSync, PlexClient, PosterSettings, RunOptions, TmdbProvider,
//!     TmdbSettings,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let plex = PlexClient::new("http://127.0.0.1:32400", "plex-token")?;
//! let tmdb = TmdbProvider::new(TmdbSettings::new("tmdb-key"))?;
//! let sync = CollectionSync::new(
//!     Arc::new(plex),
//!     Arc::new(tmdb),
//!     PosterSettings::default(),
//!     RunOptions {
//!         dry_run: true,
//!         ..RunOptions::default()
//!     },
//! );
//! let report = sync.run().await?;
//! println!("{} posters changed", report.posters_changed);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod options;
pub mod plex;
pub mod ports;
pub mod providers;
pub mod resolve;
pub mod scoring;
pub mod sync;

pub use error::{MediaServerError, Result, SyncError};
pub use options::{LibraryScope, RunOptions, SyncArea};
pub use plex::PlexClient;
pub use ports::{MediaServer, MetadataProvider};
pub use providers::{ProviderError, TmdbProvider, TmdbSettings};
pub use resolve::{PosterOutcome, PosterSettings, SummaryOutcome};
pub use sync::{CollectionSync, SyncReport};
