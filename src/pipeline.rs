//! The formatting pipeline: raw basename → canonical basename → tag values.
//!
//! Every stage is a pure `&str -> Result<String, FormatInconsistency>`
//! function; nothing here touches the filesystem. The caller renames the file
//! and writes the tags (see `commit`).

use log::debug;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Checkpoint, FormatError, FormatInconsistency};
use crate::grammar::{self, DIVIDER};
use crate::metadata::{self, TagRecord};
use crate::rules::{RuleSet, BUILTIN_RULES};
use crate::separators::{self, split_divider};
use crate::strip;

/// Everything needed to commit one file: where it goes and what tags it gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub tags: TagRecord,
}

impl Plan {
    /// True when the destination differs from the source.
    pub fn is_rename(&self) -> bool {
        self.source != self.destination
    }
}

/// Runs the pipeline against one rule set. Cheap to share across threads.
#[derive(Debug, Clone, Copy)]
pub struct Formatter<'r> {
    rules: &'r RuleSet,
}

impl Default for Formatter<'static> {
    fn default() -> Self {
        Self::new(&BUILTIN_RULES)
    }
}

impl<'r> Formatter<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'r RuleSet {
        self.rules
    }

    /// Canonical basename for a raw basename.
    pub fn format_filename(&self, raw: &str) -> Result<String, FormatInconsistency> {
        let working: String = raw.nfc().collect();
        grammar::check_pre_canonical(&working, Checkpoint::RawInput)?;

        let working = strip::strip(&working, &self.rules.blacklist)?;
        debug!("stripped: {}", working);

        let working = separators::normalize(&working, &self.rules.separators)?;
        grammar::check_canonical(&working, Checkpoint::PreAlias)?;
        debug!("separators normalized: {}", working);

        let (artists, title) = split_divider(&working)?;
        let canonical = format!("{}{DIVIDER}{title}", self.rules.aliases.resolve(artists));
        grammar::check_canonical(&canonical, Checkpoint::Final)?;
        debug!("canonical: {}", canonical);

        Ok(canonical)
    }

    /// Tag values for a canonical basename.
    pub fn tags_for(&self, canonical: &str) -> Result<TagRecord, FormatInconsistency> {
        metadata::synthesize(canonical, &self.rules.exceptions)
    }

    /// Path the file at `input` should be renamed to (same directory).
    pub fn format(&self, input: &Path) -> Result<PathBuf, FormatError> {
        let canonical = self.format_basename(input)?;
        Ok(parent_of(input)?.join(canonical))
    }

    /// Full plan for `input`. With `target_dir`, the file is moved there
    /// instead of staying in its own directory.
    pub fn plan(&self, input: &Path, target_dir: Option<&Path>) -> Result<Plan, FormatError> {
        let canonical = self.format_basename(input)?;
        let tags = self
            .tags_for(&canonical)
            .map_err(|source| FormatError::Inconsistent {
                path: input.to_path_buf(),
                source,
            })?;
        let directory = match target_dir {
            Some(dir) => dir.to_path_buf(),
            None => parent_of(input)?,
        };
        Ok(Plan {
            source: input.to_path_buf(),
            destination: directory.join(canonical),
            tags,
        })
    }

    fn format_basename(&self, input: &Path) -> Result<String, FormatError> {
        let name = input.file_name().ok_or_else(|| FormatError::Unknown {
            path: input.to_path_buf(),
            message: "path has no file name".to_string(),
        })?;
        let name = name.to_str().ok_or_else(|| FormatError::Inconsistent {
            path: input.to_path_buf(),
            source: FormatInconsistency::new(name.to_string_lossy(), Checkpoint::RawInput),
        })?;
        self.format_filename(name)
            .map_err(|source| FormatError::Inconsistent {
                path: input.to_path_buf(),
                source,
            })
    }
}

fn parent_of(input: &Path) -> Result<PathBuf, FormatError> {
    input
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| FormatError::Unknown {
            path: input.to_path_buf(),
            message: "path has no parent directory".to_string(),
        })
}
