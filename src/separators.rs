//! Separator normalization: canonical artist/title divider and a flat,
//! `", "`-separated artist list.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Checkpoint, FormatInconsistency};
use crate::grammar::{ARTIST_LIST_SEPARATOR, DIVIDER, FILLER};
use crate::rules::RulesError;

/// Filler or whitespace on either side of a comma.
static COMMA_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]*,[\s_]*").unwrap());

/// Raw inter-artist tokens (`_x_`, `_feat._`, ...), matched exactly as listed.
#[derive(Debug, Clone)]
pub struct ArtistSeparatorSet {
    tokens: Vec<String>,
    matcher: Option<Regex>,
}

impl ArtistSeparatorSet {
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Result<Self, RulesError> {
        let mut sorted: Vec<String> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                return Err(RulesError::EmptyEntry {
                    table: "artist_separators",
                });
            }
            sorted.push(token.to_string());
        }
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        sorted.dedup();

        let matcher = if sorted.is_empty() {
            None
        } else {
            let alternation = sorted
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&alternation).map_err(|source| {
                RulesError::Pattern {
                    table: "artist_separators",
                    source,
                }
            })?;
            Some(regex)
        };

        Ok(Self {
            tokens: sorted,
            matcher,
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Rewrites every separator token in an artist segment to `", "`.
    pub fn rewrite(&self, artist_segment: &str) -> String {
        match &self.matcher {
            Some(matcher) => matcher
                .replace_all(artist_segment, ARTIST_LIST_SEPARATOR)
                .into_owned(),
            None => artist_segment.to_string(),
        }
    }
}

/// Splits on the one and only canonical divider.
pub fn split_divider(filename: &str) -> Result<(&str, &str), FormatInconsistency> {
    match filename.split_once(DIVIDER) {
        Some((artists, title)) if !title.contains(DIVIDER) => Ok((artists, title)),
        _ => Err(FormatInconsistency::new(filename, Checkpoint::Divider)),
    }
}

/// Canonicalizes the divider and the inter-artist separators. Title text is
/// never touched by separator rewriting.
pub fn normalize(filename: &str, separators: &ArtistSeparatorSet) -> Result<String, FormatInconsistency> {
    let filled = filename.replace(' ', &FILLER.to_string());
    let filled = COMMA_RUN.replace_all(&filled, ARTIST_LIST_SEPARATOR);

    let (artists, title) = split_divider(&filled)?;
    let artists = separators.rewrite(artists);

    Ok(format!("{artists}{DIVIDER}{title}"))
}
