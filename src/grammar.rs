//! Filename grammar: pure predicates deciding whether a filename can be
//! formatted (pre-canonical form) or already is formatted (canonical form).
//!
//! Canonical form: `Artist[, Artist]*_-_Title.mp3`. The transitional `" - "`
//! divider is also accepted, so a single-word artist with a spaced divider
//! passes the strict check too.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Checkpoint, FormatInconsistency};

/// Extension every formatted file carries.
pub const TARGET_EXTENSION: &str = "mp3";

/// Canonical artist/title divider.
pub const DIVIDER: &str = "_-_";

/// Divider accepted on raw input, rewritten to [`DIVIDER`].
pub const SPACED_DIVIDER: &str = " - ";

/// Canonical separator between artists in the filename.
pub const ARTIST_LIST_SEPARATOR: &str = ", ";

/// Filler standing in for a space on disk.
pub const FILLER: char = '_';

/// Characters allowed in an artist token (any alphabet, digits, a few symbols).
const ARTIST_CHARS: &str = r"\p{L}\p{Nd}()\-_.!$'";

/// Matches a filename that is safe to attempt: at least one divider, no
/// filesystem-unsafe characters, target extension.
static PRE_CANONICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[^\\/:*?"<>|]+(?:_-_| - )[^\\/:*?"<>|]+\.mp3$"#).unwrap()
});

/// Matches the canonical form (modulo the single-divider rule).
static CANONICAL: Lazy<Regex> = Lazy::new(|| {
    let artist = format!("[{ARTIST_CHARS}]+");
    Regex::new(&format!(
        r"^{artist}(?:, {artist})*(?:_-_| - )[{ARTIST_CHARS} ,]+\.mp3$"
    ))
    .unwrap()
});

/// Matches one artist token as it may appear between `", "` separators.
static ARTIST_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^[{ARTIST_CHARS}]+$")).unwrap());

/// Number of artist/title dividers (either form) in `filename`.
fn divider_count(filename: &str) -> usize {
    filename.matches(DIVIDER).count() + filename.matches(SPACED_DIVIDER).count()
}

/// True when `filename` is in canonical form: artist list, exactly one divider,
/// title, `.mp3`. Total: returns `false` for the empty string.
pub fn is_valid(filename: &str) -> bool {
    CANONICAL.is_match(filename) && divider_count(filename) == 1
}

/// True when `filename` is structurally formattable: a divider, no forbidden
/// characters, target extension. Extra dividers are allowed here since ad
/// removal may still drop them; the single-divider rule is checked after it.
pub fn is_pre_canonical(filename: &str) -> bool {
    PRE_CANONICAL.is_match(filename)
}

/// True when `token` is a valid single artist in a canonical filename.
pub fn is_artist_token(token: &str) -> bool {
    ARTIST_TOKEN.is_match(token)
}

/// Checkpoint form of [`is_valid`].
pub fn check_canonical(filename: &str, checkpoint: Checkpoint) -> Result<(), FormatInconsistency> {
    if is_valid(filename) {
        Ok(())
    } else {
        Err(FormatInconsistency::new(filename, checkpoint))
    }
}

/// Checkpoint form of [`is_pre_canonical`].
pub fn check_pre_canonical(
    filename: &str,
    checkpoint: Checkpoint,
) -> Result<(), FormatInconsistency> {
    if is_pre_canonical(filename) {
        Ok(())
    } else {
        Err(FormatInconsistency::new(filename, checkpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_accepts_formatted_names() {
        assert!(is_valid("Artist_-_Track_Title.mp3"));
        assert!(is_valid("$werve, Amøn_-_My_Song.mp3"));
        assert!(is_valid("my!lane, VALI$BEATS_-_Song_(Remix).mp3"));
        assert!(is_valid("Кино_-_Группа_крови.mp3"));
        assert!(is_valid("Artist_-_Title, Part 2.mp3"));
        assert!(is_valid("WESTLIBERTY'S_-_x.mp3"));
    }

    #[test]
    fn test_canonical_accepts_spaced_divider() {
        assert!(is_valid("Artist - Title.mp3"));
    }

    #[test]
    fn test_canonical_rejects_structure_errors() {
        assert!(!is_valid(""));
        assert!(!is_valid("Artist_Title.mp3"));
        assert!(!is_valid("A_-_B_-_C.mp3"));
        assert!(!is_valid("A_-_B - C.mp3"));
        assert!(!is_valid("Artist_-_Title.flac"));
        assert!(!is_valid("Artist_-_Title.MP3"));
        assert!(!is_valid("A,B_-_Title.mp3"));
        assert!(!is_valid("Two Words_-_Title.mp3"));
    }

    #[test]
    fn test_forbidden_characters_never_allowed() {
        for c in ['\\', '/', ':', '*', '?', '"', '<', '>', '|'] {
            let name = format!("Bad{c}Name_-_Title.mp3");
            assert!(!is_valid(&name), "canonical accepted {name}");
            assert!(!is_pre_canonical(&name), "pre-canonical accepted {name}");
        }
    }

    #[test]
    fn test_pre_canonical_is_permissive_on_content() {
        assert!(is_pre_canonical("Artist (ru.soundmax.me) - Track Title.mp3"));
        assert!(is_pre_canonical("A & B_-_Song [Official Video].mp3"));
        assert!(!is_pre_canonical("No divider here.mp3"));
        assert!(!is_pre_canonical("Artist - Title.wav"));
        assert!(is_pre_canonical("Artist - Song - (Official Video).mp3"));
        assert!(!is_pre_canonical(""));
    }

    #[test]
    fn test_artist_token() {
        assert!(is_artist_token("509_$ICARIO"));
        assert!(is_artist_token("Øneheart"));
        assert!(!is_artist_token("509 $ICARIO"));
        assert!(!is_artist_token("A, B"));
        assert!(!is_artist_token(""));
    }

    #[test]
    fn test_check_reports_checkpoint() {
        let err = check_canonical("bad", Checkpoint::PreAlias).unwrap_err();
        assert_eq!(err.checkpoint, Checkpoint::PreAlias);
        assert_eq!(err.filename, "bad");
        assert!(check_pre_canonical("A - B.mp3", Checkpoint::RawInput).is_ok());
    }
}
