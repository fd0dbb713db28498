//! Constrained JSON decoding built on [`conform_core`]'s grammar engine:
//! context tracking, mask-hint generation, key detection, streaming
//! extraction, abortable supervision, structural validation, the snap-key
//! salvage matcher, and the `generate`/`stream` orchestrator.
//!
//! This crate owns every component that knows about a *schema* and a
//! *generation in progress*; [`conform_core`] itself has no notion of
//! either.

#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod mask;
pub mod orchestrator;
pub mod processor;
pub mod snap;
pub mod supervisor;
pub mod testing;
pub mod validator;

pub use config::{DecodeConfig, ErrorPosture};
pub use context::ContextTracker;
pub use error::GenerationError;
pub use extractor::{JsonExtractor, RunPolicy};
pub use mask::{MaskHint, MaskMode};
pub use orchestrator::{generate, snap_keys, stream, GenerateResult, ModelAdapter, RequestParams, ResponseFormat};
pub use processor::{DetectedKey, KeyDetectionProcessor};
pub use snap::snap_key;
pub use supervisor::{CancelToken, SampledToken};
pub use validator::{validate, ValidationError};
