//! Immutable per-run options handed to every resolver.

use std::fmt;
use std::str::FromStr;

use crate::model::LibrarySection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncArea {
    Posters,
    Summaries,
}

impl SyncArea {
    pub const ALL: [SyncArea; 2] = [SyncArea::Posters, SyncArea::Summaries];

    pub fn as_str(self) -> &'static str {
        match self {
            SyncArea::Posters => "posters",
            SyncArea::Summaries => "summaries",
        }
    }
}

impl fmt::Display for SyncArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Library section selector: a numeric section ID or a section title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryScope {
    Id(u32),
    Title(String),
}

impl LibraryScope {
    /// Titles compare case-insensitively.
    pub fn matches(&self, section: &LibrarySection) -> bool {
        match self {
            LibraryScope::Id(id) => section.id.0 == *id,
            LibraryScope::Title(title) => {
                section.title.trim().eq_ignore_ascii_case(title.trim())
            }
        }
    }
}

impl FromStr for LibraryScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("library scope must not be empty".to_string());
        }
        Ok(match trimmed.parse::<u32>() {
            Ok(id) => LibraryScope::Id(id),
            Err(_) => LibraryScope::Title(trimmed.to_string()),
        })
    }
}

impl fmt::Display for LibraryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryScope::Id(id) => write!(f, "{id}"),
            LibraryScope::Title(title) => f.write_str(title),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Log mutating calls instead of issuing them.
    pub dry_run: bool,
    /// Re-resolve summaries that are already present.
    pub force: bool,
    /// Sections to process; empty means every movie section.
    pub library_scope: Vec<LibraryScope>,
    /// Areas to sync; empty means all of them.
    pub areas: Vec<SyncArea>,
}

impl RunOptions {
    pub fn includes_area(&self, area: SyncArea) -> bool {
        self.areas.is_empty() || self.areas.contains(&area)
    }

    pub fn includes_section(&self, section: &LibrarySection) -> bool {
        self.library_scope.is_empty()
            || self.library_scope.iter().any(|scope| scope.matches(section))
    }
}
