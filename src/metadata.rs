//! Tag values derived from a canonical filename.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::{Checkpoint, FormatInconsistency};
use crate::grammar::{self, ARTIST_LIST_SEPARATOR, FILLER, TARGET_EXTENSION};
use crate::rules::RulesError;
use crate::separators::split_divider;

/// Delimiter between artists inside the artist tag.
pub const TAG_ARTIST_DELIMITER: &str = "; ";

/// Artist and title values to write into a file's tag container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub artist: String,
    pub title: String,
    /// Same value as `artist`, for players that read the multi-artist field.
    pub artists: String,
}

/// Artists whose on-disk underscore is kept in the artist tag.
/// Membership is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct ArtistExceptionSet {
    names: FxHashSet<String>,
}

impl ArtistExceptionSet {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, RulesError> {
        let mut set = FxHashSet::default();
        for name in names {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(RulesError::EmptyEntry {
                    table: "artist_exceptions",
                });
            }
            if !grammar::is_artist_token(name) {
                return Err(RulesError::InvalidException(name.to_string()));
            }
            set.insert(name.to_string());
        }
        Ok(Self { names: set })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

fn unfill(s: &str) -> String {
    s.replace(FILLER, " ")
}

/// Builds the tag record for a canonical filename.
pub fn synthesize(
    canonical: &str,
    exceptions: &ArtistExceptionSet,
) -> Result<TagRecord, FormatInconsistency> {
    grammar::check_canonical(canonical, Checkpoint::Final)?;

    let stem = canonical
        .strip_suffix(TARGET_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .ok_or_else(|| FormatInconsistency::new(canonical, Checkpoint::Final))?;
    let (artist_segment, title_segment) = split_divider(stem)?;

    let mut seen = FxHashSet::default();
    let artists: Vec<String> = artist_segment
        .split(ARTIST_LIST_SEPARATOR)
        .filter(|token| seen.insert(*token))
        .map(|token| {
            if exceptions.contains(token) {
                token.to_string()
            } else {
                unfill(token)
            }
        })
        .collect();

    let artist = artists.join(TAG_ARTIST_DELIMITER);
    Ok(TagRecord {
        artists: artist.clone(),
        artist,
        title: unfill(title_segment),
    })
}
