//! Quizreel Core Library
//!
//! Turns quiz rows from CSV files into narrated videos: each row's fields are
//! revealed stage by stage on a rendered frame while a speech service reads
//! them aloud, and the per-row clips are joined into one final video.

pub mod assembler;
pub mod config;
pub mod error;
pub mod font;
pub mod format;
pub mod media;
pub mod pipeline;
pub mod plan;
pub mod render;
pub mod report;
pub mod source;
pub mod timeline;
pub mod tts;
pub mod types;

// Re-export commonly used items at crate root
pub use assembler::Assembler;
pub use config::{AssemblyConfig, AudioConfig, Rgb, VideoConfig};
pub use error::{ErrorKind, QuizreelError, Result};
pub use font::{FontError, FontStrategy, LoadedFont};
pub use format::{format_clip_timeline, format_duration, format_timestamp};
pub use media::{EncodeSettings, FfmpegEncoder, SegmentInput, VideoEncoder};
pub use pipeline::{InputOutcome, RunOptions, RunSummary, process_input, run};
pub use plan::{NarrationPlan, RevealMode, plan};
pub use render::{FrameRenderer, TextFrameRenderer};
pub use report::{NullReporter, Reporter};
pub use source::{LoadedInput, discover_inputs, load_records, load_records_as, unique_source_names};
pub use timeline::{Timeline, TimelineConfig, TimelineEntry, compute_timeline};
pub use tts::{GoogleTts, SpeechSynthesizer, TtsProvider};
pub use types::{Clip, Record, RecordId, Segment};
