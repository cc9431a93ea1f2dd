//! Rule tables: ad blacklist, artist separators, alias corrections and
//! artist exceptions.
//!
//! [`RuleTables`] is the plain, serde-loadable form. [`RuleSet`] is the
//! validated, compiled form shared read-only by every pipeline run.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::alias::AliasTable;
use crate::metadata::ArtistExceptionSet;
use crate::separators::ArtistSeparatorSet;
use crate::strip::BlacklistPatternSet;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("cannot read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty entry in {table}")]
    EmptyEntry { table: &'static str },

    #[error("alias '{key}' maps to '{value}', which is not a valid artist name")]
    InvalidAlias { key: String, value: String },

    #[error("artist exception '{0}' is not a valid artist name")]
    InvalidException(String),

    #[error("cannot compile {table}: {source}")]
    Pattern {
        table: &'static str,
        #[source]
        source: regex::Error,
    },
}

// ============================================================================
// BUILT-IN TABLES
// ============================================================================

/// Promotional substrings injected by download sites and video rips.
const BUILTIN_BLACKLIST: &[&str] = &[
    "(ru.soundmax.me)",
    "(AxeMusic.ru)",
    "(musmore.com)",
    "(remix-x.ru)",
    "(MP3Ball.ru)",
    "(Byfet.com)",
    "(EEMUSIC.ru)",
    "(Music Video)",
    "(Official Music Video)",
    "(Official Video)",
    "(Official Audio)",
    "[Official Music Video]",
    "[Official Video]",
    "[Music Video]",
    "[Official Audio]",
];

/// Raw inter-artist separators, matched case-sensitively in the artist segment.
const BUILTIN_ARTIST_SEPARATORS: &[&str] = &[
    "_x_", "_X_", "_&_", "_and_", "_feat._", "_feat_", "_ft._", "_ft_",
];

/// Lowercase misspelling → canonical spelling.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("lxst_cxntury", "LXST_CXNTURY"),
    ("vali_beats", "VALI$BEATS"),
    ("valisbeats", "VALI$BEATS"),
    ("my_lane", "my!lane"),
    ("antxres", "AntXres"),
    ("ya_h", "Ya$h"),
    ("am_n", "Amøn"),
    ("amon", "Amøn"),
    ("amøn", "Amøn"),
    ("voj", "VØJ"),
    ("v_j", "VØJ"),
    ("vj", "VØJ"),
    ("scxr_soul", "SCXR_SOUL"),
    ("swerve", "$werve"),
    ("werve", "$werve"),
    ("$werve", "$werve"),
    ("oldflop", "OLDFLOP"),
    ("igres", "iGRES"),
    ("finivoid", "FINIVOID"),
    ("oskalizator.", "oskalizator"),
    ("vvpskvd.", "vvpskvd"),
    ("westliberty's", "WESTLIBERTY'S"),
    ("westlibertys", "WESTLIBERTY'S"),
    ("westliberty s", "WESTLIBERTY'S"),
    ("altare", "Altare"),
    ("neheart", "Øneheart"),
    ("_neheart", "Øneheart"),
    ("oneheart", "Øneheart"),
    ("archez", "ARCHEZ"),
    ("509 icario", "509 $ICARIO"),
    ("509 sicario", "509 $ICARIO"),
    ("boneles_s", "boneles_s"),
    ("1odum_defect", "1ODUM_DEFECT"),
    ("7vvch", "7vvch"),
    ("ikiru", "IKIRU"),
    ("622wasamistake", "622WASAMISTAKE"),
    ("lxrdofdoom", "LxrdOfDoom"),
    ("dvrkhold", "DVRKHOLD"),
];

/// Artists whose on-disk underscore is part of the name.
const BUILTIN_ARTIST_EXCEPTIONS: &[&str] = &["boneles_s", "rex_incc"];

// ============================================================================
// SERIALIZABLE TABLES
// ============================================================================

/// Rule tables as written in a rules file. Omitted tables fall back to the
/// built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTables {
    pub blacklist: Vec<String>,
    pub artist_separators: Vec<String>,
    pub aliases: BTreeMap<String, String>,
    pub artist_exceptions: Vec<String>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTables {
    pub fn builtin() -> Self {
        Self {
            blacklist: BUILTIN_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            artist_separators: BUILTIN_ARTIST_SEPARATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            aliases: BUILTIN_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            artist_exceptions: BUILTIN_ARTIST_EXCEPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RulesError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, RulesError> {
        let json = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, RulesError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// COMPILED RULE SET
// ============================================================================

/// Validated, compiled rule tables. Immutable once built.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub blacklist: BlacklistPatternSet,
    pub separators: ArtistSeparatorSet,
    pub aliases: AliasTable,
    pub exceptions: ArtistExceptionSet,
}

impl RuleSet {
    pub fn compile(tables: &RuleTables) -> Result<Self, RulesError> {
        Ok(Self {
            blacklist: BlacklistPatternSet::new(&tables.blacklist)?,
            separators: ArtistSeparatorSet::new(&tables.artist_separators)?,
            aliases: AliasTable::new(&tables.aliases)?,
            exceptions: ArtistExceptionSet::new(&tables.artist_exceptions)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, RulesError> {
        Self::compile(&RuleTables::from_path(path)?)
    }
}

/// Built-in rules, compiled on first use.
pub static BUILTIN_RULES: Lazy<RuleSet> =
    Lazy::new(|| RuleSet::compile(&RuleTables::builtin()).unwrap());
