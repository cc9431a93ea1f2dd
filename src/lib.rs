//! MP3 filename normalization library - shared modules for all binaries.

pub mod alias;
pub mod batch;
pub mod commit;
pub mod error;
pub mod grammar;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod rules;
pub mod separators;
pub mod strip;
pub mod tags;
