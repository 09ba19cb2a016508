//! Configuration loading for reelset.
//!
//! A `reelset.toml` file, an optional `.env` file and the process
//! environment are composed into one immutable [`Config`]. Environment values
//! win over the file. Guard rails reject configurations that cannot work and
//! collect warnings for ones that probably do not do what was intended.

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{Config, ConfigMetadata, PlexConfig, PosterConfig, TmdbConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
