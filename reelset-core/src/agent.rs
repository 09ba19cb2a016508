//! Parsing of Plex agent identifiers into metadata provider movie IDs.

use once_cell::sync::Lazy;
use regex::Regex;

const IMDB_AGENT_PREFIX: &str = "com.plexapp.agents.imdb://";
const TMDB_AGENT_PREFIX: &str = "com.plexapp.agents.themoviedb://";

static IMDB_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"tt[0-9]\w+").expect("imdb id regex should compile")
});
static TMDB_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]\w+").expect("tmdb id regex should compile")
});
static LANGUAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"lang=([a-z]{2})").expect("language regex should compile")
});

/// Provider that originated a movie, with its provider-native ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentProvider {
    Imdb(String),
    TmdbNative(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentGuid {
    pub provider: AgentProvider,
    pub language: Option<String>,
}

impl AgentGuid {
    pub fn parse(guid: &str) -> Self {
        let provider = Self::parse_provider(guid)
            .unwrap_or(AgentProvider::Unknown);

        let language = LANGUAGE_PATTERN
            .captures(guid)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        Self { provider, language }
    }

    fn parse_provider(guid: &str) -> Option<AgentProvider> {
        if let Some(rest) = guid.strip_prefix(IMDB_AGENT_PREFIX) {
            let id = IMDB_ID_PATTERN.find(rest)?;
            return Some(AgentProvider::Imdb(id.as_str().to_string()));
        }
        if let Some(rest) = guid.strip_prefix(TMDB_AGENT_PREFIX) {
            let id = TMDB_ID_PATTERN.find(rest)?;
            return Some(AgentProvider::TmdbNative(id.as_str().to_string()));
        }
        None
    }

    /// ID accepted by the provider's movie endpoint (TMDB resolves IMDB IDs too).
    pub fn movie_id(&self) -> Option<&str> {
        match &self.provider {
            AgentProvider::Imdb(id) | AgentProvider::TmdbNative(id) => {
                Some(id.as_str())
            }
            AgentProvider::Unknown => None,
        }
    }

    pub fn language_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.language.as_deref().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_imdb_agent_with_language() {
        let guid =
            AgentGuid::parse("com.plexapp.agents.imdb://tt0120737?lang=de");
        assert_eq!(guid.provider, AgentProvider::Imdb("tt0120737".into()));
        assert_eq!(guid.language.as_deref(), Some("de"));
        assert_eq!(guid.movie_id(), Some("tt0120737"));
    }

    #[test]
    fn parses_tmdb_agent_without_language() {
        let guid = AgentGuid::parse("com.plexapp.agents.themoviedb://120");
        assert_eq!(guid.provider, AgentProvider::TmdbNative("120".into()));
        assert_eq!(guid.language, None);
        assert_eq!(guid.language_or("en"), "en");
    }

    #[test]
    fn tmdb_agent_id_stops_at_query() {
        let guid =
            AgentGuid::parse("com.plexapp.agents.themoviedb://8587?lang=fr");
        assert_eq!(guid.movie_id(), Some("8587"));
        assert_eq!(guid.language_or("en"), "fr");
    }

    #[test]
    fn other_agents_are_unknown() {
        for raw in [
            "plex://movie/5d776825880197001ec967c6",
            "local://1234",
            "com.plexapp.agents.none://42",
            "",
        ] {
            let guid = AgentGuid::parse(raw);
            assert_eq!(guid.provider, AgentProvider::Unknown, "{raw}");
            assert_eq!(guid.movie_id(), None);
        }
    }

    #[test]
    fn imdb_agent_without_valid_id_is_unknown() {
        let guid = AgentGuid::parse("com.plexapp.agents.imdb://nm12?lang=en");
        assert_eq!(guid.provider, AgentProvider::Unknown);
        assert_eq!(guid.language.as_deref(), Some("en"));
    }
}
