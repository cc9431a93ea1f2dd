//! Ad stripping: removes promotional substrings and the separator debris
//! they leave behind.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{Checkpoint, FormatInconsistency};
use crate::grammar;
use crate::rules::RulesError;

/// Separator run left dangling before the extension.
static TRAILING_DEBRIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[ _-]+\.mp3$").unwrap());

/// Blacklisted substrings, matched literally and case-insensitively.
///
/// All entries compile into one alternation, longest first, that also eats
/// the filler around a run of adjacent ads. A space inside an entry matches
/// either a space or filler. Removal repeats until nothing matches, so the
/// result does not depend on the order entries were listed in and stripping
/// a stripped name changes nothing.
#[derive(Debug, Clone)]
pub struct BlacklistPatternSet {
    entries: Vec<String>,
    matcher: Option<Regex>,
}

impl BlacklistPatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, RulesError> {
        let mut entries: Vec<String> = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if pattern.trim().is_empty() {
                return Err(RulesError::EmptyEntry { table: "blacklist" });
            }
            entries.push(pattern.to_string());
        }
        entries.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        entries.dedup();

        let matcher = if entries.is_empty() {
            None
        } else {
            let alternation = entries
                .iter()
                .map(|e| regex::escape(e).replace(' ', "[ _]"))
                .collect::<Vec<_>>()
                .join("|");
            let source = format!(r"(?i)([ _]*)(?:{alternation})(?:[ _]*(?:{alternation}))*([ _]*)");
            let regex = Regex::new(&source).map_err(|source| RulesError::Pattern {
                table: "blacklist",
                source,
            })?;
            Some(regex)
        };

        Ok(Self { entries, matcher })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in match-priority order (longest first).
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Removes every blacklisted occurrence, keeping one filler character
    /// where the removed run touched filler on either side. Each pass
    /// shortens the string, so the loop ends.
    fn remove_all(&self, filename: &str) -> String {
        let Some(matcher) = &self.matcher else {
            return filename.to_string();
        };
        let mut current = filename.to_string();
        loop {
            let next = Self::remove_pass(matcher, &current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn remove_pass(matcher: &Regex, filename: &str) -> String {
        matcher
            .replace_all(filename, |caps: &Captures| {
                let before = caps.get(1).map_or("", |m| m.as_str());
                let after = caps.get(2).map_or("", |m| m.as_str());
                before
                    .chars()
                    .next()
                    .or_else(|| after.chars().next())
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Strips ads from a raw filename.
///
/// The input must already be structurally formattable; otherwise nothing is
/// stripped and the name is rejected.
pub fn strip(filename: &str, patterns: &BlacklistPatternSet) -> Result<String, FormatInconsistency> {
    grammar::check_pre_canonical(filename, Checkpoint::RawInput)?;

    let removed = patterns.remove_all(filename);
    let trimmed = removed.trim();
    Ok(TRAILING_DEBRIS.replace(trimmed, ".mp3").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleTables, BUILTIN_RULES};

    fn builtin() -> &'static BlacklistPatternSet {
        &BUILTIN_RULES.blacklist
    }

    #[test]
    fn test_strip_site_tag_between_filler() {
        assert_eq!(
            strip("Artist_(ru.soundmax.me)_-_Track_Title.mp3", builtin()).unwrap(),
            "Artist_-_Track_Title.mp3"
        );
    }

    #[test]
    fn test_strip_is_case_insensitive() {
        assert_eq!(
            strip("Artist - Song (OFFICIAL VIDEO).mp3", builtin()).unwrap(),
            "Artist - Song.mp3"
        );
        assert_eq!(
            strip("Artist (axemusic.RU) - Song.mp3", builtin()).unwrap(),
            "Artist - Song.mp3"
        );
    }

    #[test]
    fn test_strip_adjacent_ads() {
        assert_eq!(
            strip("Artist_(musmore.com)_(Byfet.com)_-_Song.mp3", builtin()).unwrap(),
            "Artist_-_Song.mp3"
        );
    }

    #[test]
    fn test_strip_leading_ad_is_trimmed() {
        assert_eq!(
            strip("[Official Audio] Artist - Song.mp3", builtin()).unwrap(),
            "Artist - Song.mp3"
        );
    }

    #[test]
    fn test_trailing_debris_removed() {
        assert_eq!(strip("Artist - Song_-_ .mp3", builtin()).unwrap(), "Artist - Song.mp3");
        assert_eq!(strip("Artist - Song -.mp3", builtin()).unwrap(), "Artist - Song.mp3");
        assert_eq!(strip("Artist_-_Song__.mp3", builtin()).unwrap(), "Artist_-_Song.mp3");
    }

    #[test]
    fn test_ad_after_second_divider_leaves_no_divider() {
        assert_eq!(
            strip("Artist - Song - (Official Video).mp3", builtin()).unwrap(),
            "Artist - Song.mp3"
        );
        assert_eq!(
            strip("Artist_-_Song_-_(ru.soundmax.me).mp3", builtin()).unwrap(),
            "Artist_-_Song.mp3"
        );
    }

    #[test]
    fn test_removal_that_forms_new_ad_is_repeated() {
        assert_eq!(
            strip("A - T ((Byfet.com)Byfet.com).mp3", builtin()).unwrap(),
            "A - T.mp3"
        );
    }

    #[test]
    fn test_entry_spaces_match_filler() {
        assert_eq!(
            strip("Artist_-_Song_(Official_Video).mp3", builtin()).unwrap(),
            "Artist_-_Song.mp3"
        );
        assert_eq!(
            strip("Artist_-_Song_[Official_Music_Video].mp3", builtin()).unwrap(),
            "Artist_-_Song.mp3"
        );
    }

    #[test]
    fn test_strip_without_ads_is_identity() {
        assert_eq!(strip("A_-_B.mp3", builtin()).unwrap(), "A_-_B.mp3");
    }

    #[test]
    fn test_strip_rejects_unformattable_input() {
        let err = strip("no divider (Official Video).mp3", builtin()).unwrap_err();
        assert_eq!(err.checkpoint, Checkpoint::RawInput);
    }

    #[test]
    fn test_longest_entry_wins() {
        let set = BlacklistPatternSet::new(&["(Official Video)", "(Official Video) HD"]).unwrap();
        assert_eq!(set.entries()[0], "(Official Video) HD");
        assert_eq!(strip("A - B (Official Video) HD.mp3", &set).unwrap(), "A - B.mp3");
    }

    #[test]
    fn test_order_independent() {
        let tables = RuleTables::builtin();
        let forward = BlacklistPatternSet::new(&tables.blacklist).unwrap();
        let mut reversed_entries = tables.blacklist.clone();
        reversed_entries.reverse();
        let reversed = BlacklistPatternSet::new(&reversed_entries).unwrap();
        let mut rotated_entries = tables.blacklist.clone();
        rotated_entries.rotate_left(5);
        let rotated = BlacklistPatternSet::new(&rotated_entries).unwrap();

        let inputs = [
            "Artist (Official Music Video) - Song (Music Video).mp3",
            "Artist_(remix-x.ru)_-_Song_[Official Video].mp3",
            "Artist - Song (Official Audio) [Official Audio].mp3",
        ];
        for input in inputs {
            let expected = strip(input, &forward).unwrap();
            assert_eq!(strip(input, &reversed).unwrap(), expected);
            assert_eq!(strip(input, &rotated).unwrap(), expected);
        }
    }

    #[test]
    fn test_empty_set_only_trims() {
        let empty = BlacklistPatternSet::new::<&str>(&[]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(strip(" A - B .mp3", &empty).unwrap(), "A - B.mp3");
    }
}
