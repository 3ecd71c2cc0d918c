use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuizreelError, Result};

/// Identifies one input row: the source file stem plus its 1-based data row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub source: String,
    pub row: usize,
}

impl RecordId {
    pub fn new(source: impl Into<String>, row: usize) -> Self {
        Self {
            source: source.into(),
            row,
        }
    }

    /// Stem used for the per-record output file, e.g. `capitals_002`.
    pub fn file_stem(&self) -> String {
        format!("{}_{:03}", self.source, self.row)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub letter: char,
    pub text: String,
}

/// One quiz row. Absent optional fields are `None`/missing, never empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub question: String,
    pub options: Vec<ChoiceOption>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
}

/// Which record field a piece of text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRole {
    Question,
    Option(char),
    Answer,
    Explanation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub role: FieldRole,
    pub text: String,
}

impl Field {
    /// Text as drawn on screen and spoken.
    pub fn display_text(&self) -> String {
        match self.role {
            FieldRole::Option(letter) => format!("{}. {}", letter, self.text),
            FieldRole::Answer => format!("Answer: {}", self.text),
            FieldRole::Question | FieldRole::Explanation => self.text.clone(),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Record {
    pub fn new(
        id: RecordId,
        question: impl Into<String>,
        options: [Option<String>; 4],
        answer: Option<String>,
        explanation: Option<String>,
    ) -> Result<Self> {
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(QuizreelError::InvalidRecord {
                reason: format!("{id} has an empty question"),
            });
        }

        let options = options
            .into_iter()
            .zip(['A', 'B', 'C', 'D'])
            .filter_map(|(text, letter)| present(text).map(|text| ChoiceOption { letter, text }))
            .collect();

        Ok(Self {
            id,
            question,
            options,
            answer: present(answer),
            explanation: present(explanation),
        })
    }

    /// Present fields in narration order: question, options A..D, answer, explanation.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field {
            role: FieldRole::Question,
            text: self.question.clone(),
        }];
        fields.extend(self.options.iter().map(|o| Field {
            role: FieldRole::Option(o.letter),
            text: o.text.clone(),
        }));
        if let Some(answer) = &self.answer {
            fields.push(Field {
                role: FieldRole::Answer,
                text: answer.clone(),
            });
        }
        if let Some(explanation) = &self.explanation {
            fields.push(Field {
                role: FieldRole::Explanation,
                text: explanation.clone(),
            });
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Question,
    Options,
    Answer,
    Explanation,
    /// Everything at once (single-frame mode).
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub role: FieldRole,
    pub text: String,
}

/// Cumulative on-screen content at one point of the narration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealStage {
    pub kind: StageKind,
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationUnit {
    pub role: FieldRole,
    pub text: String,
    /// Index into the plan's stages.
    pub stage: usize,
}

/// One timed audio+frame pairing on the clip timeline (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub role: FieldRole,
    pub stage: StageKind,
    pub start: f64,
    pub duration: f64,
    pub fade_in: f64,
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Result of assembling one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub id: RecordId,
    pub path: PathBuf,
    pub duration: f64,
    pub segments: Vec<Segment>,
}
