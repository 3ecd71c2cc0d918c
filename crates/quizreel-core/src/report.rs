//! Progress and failure reporting.
//!
//! The pipeline never prints. Callers construct a [`Reporter`] and pass it
//! in; the CLI renders spinners, tests record events.

use std::path::Path;

use crate::{
    error::QuizreelError,
    types::{Clip, RecordId},
};

pub trait Reporter: Send + Sync {
    fn input_started(&self, _input: &Path, _records: usize) {}

    /// The whole input was unusable and skipped.
    fn input_skipped(&self, _input: &Path, _error: &QuizreelError) {}

    /// A single row was unusable and skipped.
    fn record_rejected(&self, _input: &Path, _row: usize, _error: &QuizreelError) {}

    fn record_started(&self, _id: &RecordId) {}

    fn record_progress(&self, _id: &RecordId, _message: &str) {}

    fn record_finished(&self, _id: &RecordId, _clip: &Clip) {}

    fn record_failed(&self, _id: &RecordId, _error: &QuizreelError) {}

    fn final_written(&self, _input: &Path, _output: &Path, _clips: usize) {}

    fn final_failed(&self, _input: &Path, _error: &QuizreelError) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}
