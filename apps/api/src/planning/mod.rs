// Batch planning engine
// Implements: repetition-minimizing sampling, derangements, topic assignment,
// style flags, prompt composition, and the per-batch orchestration on top.
// Everything below `planner` is synchronous and takes the batch RNG explicitly.

pub mod composer;
pub mod derangement;
pub mod handlers;
pub mod instructions;
pub mod language;
pub mod planner;
pub mod presentation;
pub mod prompts;
pub mod sampler;
pub mod style_flags;
pub mod topics;

use thiserror::Error;

pub use language::Language;

/// Errors that abort planning of a whole batch.
///
/// There is no partial-batch recovery: any of these stops the batch before a
/// single prompt is handed to the text generator.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Unsupported language '{0}' (supported: de, en)")]
    UnsupportedLanguage(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("No presenters given")]
    NoPresenters,

    #[error("Cannot sample {requested} item(s) from an empty population")]
    EmptyPopulation { requested: usize },

    #[error("Topic group/block {index} has {found} topic(s), need at least {required}")]
    InsufficientTopics {
        index: usize,
        found: usize,
        required: usize,
    },

    #[error("Got {groups} topic group(s) for {presenters} presenter(s)")]
    GroupCountMismatch { groups: usize, presenters: usize },

    #[error("Derangement needs at least two elements, got {len}")]
    TooFewElements { len: usize },

    #[error("Invalid chunk size {block_size} for a sequence of length {len}")]
    InvalidChunkSize { len: usize, block_size: usize },

    #[error(
        "Derangement of length {len} (block size {block_size}) failed after {retries} attempts"
    )]
    DerangementExhausted {
        len: usize,
        block_size: usize,
        retries: u32,
    },

    #[error("Style flag '{flag}' has no text for language '{language}'")]
    MissingFlagLanguage {
        flag: &'static str,
        language: Language,
    },
}

impl PlanError {
    /// True for errors caused by the caller's input or setup, as opposed to an
    /// exhausted retry budget.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, PlanError::DerangementExhausted { .. })
    }
}
