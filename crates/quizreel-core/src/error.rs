use std::path::PathBuf;
use thiserror::Error;

use crate::{font::FontError, types::RecordId};

#[derive(Error, Debug)]
pub enum QuizreelError {
    #[error("Invalid input {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("Speech synthesis failed for \"{text}\": {reason}")]
    SynthesisFailed { text: String, reason: String },

    #[error("Unsupported language code \"{language}\"")]
    UnsupportedLanguage { language: String },

    #[error("Encoding failed for {output}: {reason}")]
    EncodingFailed { output: PathBuf, reason: String },

    #[error("Invalid encode settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Frame rendering failed for {output}: {reason}")]
    RenderFailed { output: PathBuf, reason: String },

    #[error("Temporary storage unavailable: {0}")]
    TempStorage(std::io::Error),

    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("Record {id} failed: {source}")]
    Record {
        id: RecordId,
        #[source]
        source: Box<QuizreelError>,
    },

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TTS request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

/// Failure class used to decide how far an error propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input; the input (or row) is skipped.
    Input,
    /// Speech service failure; aborts the current record.
    Synthesis,
    /// Video encoder failure; aborts the current record.
    Encoding,
    /// Frame rasterization failure; aborts the current record.
    Render,
    /// Temporary storage or font unavailable; aborts the run.
    Resource,
}

impl QuizreelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuizreelError::InvalidInput { .. }
            | QuizreelError::InvalidRecord { .. }
            | QuizreelError::CsvError(_) => ErrorKind::Input,
            QuizreelError::SynthesisFailed { .. }
            | QuizreelError::UnsupportedLanguage { .. }
            | QuizreelError::ApiError(_) => ErrorKind::Synthesis,
            QuizreelError::EncodingFailed { .. }
            | QuizreelError::InvalidSettings { .. }
            | QuizreelError::JsonError(_) => ErrorKind::Encoding,
            QuizreelError::RenderFailed { .. } | QuizreelError::ImageError(_) => {
                ErrorKind::Render
            }
            QuizreelError::TempStorage(_)
            | QuizreelError::OutputDir { .. }
            | QuizreelError::TaskFailed(_)
            | QuizreelError::Font(_) => ErrorKind::Resource,
            QuizreelError::IoError(_) => ErrorKind::Encoding,
            QuizreelError::Record { source, .. } => source.kind(),
        }
    }

    /// Attach the originating record to a per-record failure.
    pub fn for_record(self, id: &RecordId) -> Self {
        match self {
            QuizreelError::Record { .. } => self,
            other => QuizreelError::Record {
                id: id.clone(),
                source: Box::new(other),
            },
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Resource
    }
}

pub type Result<T> = std::result::Result<T, QuizreelError>;
