use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tempfile::TempDir;
use tokio::fs;

use crate::{
    config::AssemblyConfig,
    error::{QuizreelError, Result},
    format::role_label,
    media::{SegmentInput, VideoEncoder},
    plan::plan,
    render::FrameRenderer,
    report::Reporter,
    timeline::compute_timeline,
    tts::SpeechSynthesizer,
    types::{Clip, Record, Segment},
};

/// Turns one record into one narrated clip.
///
/// Units run strictly in order: synthesize, measure, and make sure the unit's
/// frame exists before moving to the next unit. All intermediate files live
/// in a per-call temporary directory that is removed on every exit path.
pub struct Assembler {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    renderer: Arc<dyn FrameRenderer>,
    encoder: Arc<dyn VideoEncoder>,
    config: AssemblyConfig,
    work_dir: Option<PathBuf>,
}

impl Assembler {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        renderer: Arc<dyn FrameRenderer>,
        encoder: Arc<dyn VideoEncoder>,
        config: AssemblyConfig,
    ) -> Self {
        Self {
            synthesizer,
            renderer,
            encoder,
            config,
            work_dir: None,
        }
    }

    /// Place temporary directories under `dir` instead of the system temp dir.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn encoder(&self) -> &Arc<dyn VideoEncoder> {
        &self.encoder
    }

    fn scratch_dir(&self, record: &Record) -> Result<TempDir> {
        let prefix = format!("quizreel-{}-", record.id.file_stem());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        match &self.work_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(QuizreelError::TempStorage)
    }

    /// Assemble `record` and write the finished clip to `out_path`.
    pub async fn assemble(
        &self,
        record: &Record,
        out_path: &Path,
        reporter: &dyn Reporter,
    ) -> Result<Clip> {
        self.assemble_inner(record, out_path, reporter)
            .await
            .map_err(|e| e.for_record(&record.id))
    }

    async fn assemble_inner(
        &self,
        record: &Record,
        out_path: &Path,
        reporter: &dyn Reporter,
    ) -> Result<Clip> {
        let scratch = self.scratch_dir(record)?;
        let plan = plan(record, self.config.mode);

        let mut stage_frames: Vec<Option<PathBuf>> = vec![None; plan.stages.len()];
        let mut inputs: Vec<SegmentInput> = Vec::with_capacity(plan.units.len());
        let mut audio_lens = Vec::with_capacity(plan.units.len());

        for (i, unit) in plan.units.iter().enumerate() {
            reporter.record_progress(
                &record.id,
                &format!(
                    "narrating {} ({}/{})",
                    role_label(unit.role),
                    i + 1,
                    plan.units.len()
                ),
            );

            let audio = scratch.path().join(format!("audio_{i:02}.mp3"));
            self.synthesizer
                .synthesize(&unit.text, &self.config.audio.language, &audio)
                .await?;
            let audio_len = self.encoder.probe_duration(&audio).await?;

            let image = match &stage_frames[unit.stage] {
                Some(path) => path.clone(),
                None => {
                    let path = scratch.path().join(format!("frame_{:02}.png", unit.stage));
                    self.renderer.render(&plan.stages[unit.stage], &path)?;
                    stage_frames[unit.stage] = Some(path.clone());
                    path
                }
            };

            audio_lens.push(audio_len);
            inputs.push(SegmentInput {
                image,
                audio,
                start: 0.0,
                duration: 0.0,
                fade_in: 0.0,
            });
        }

        let timeline = compute_timeline(&audio_lens, &self.config.timeline);
        let mut segments = Vec::with_capacity(inputs.len());
        for ((input, entry), unit) in inputs.iter_mut().zip(&timeline.entries).zip(&plan.units) {
            input.start = entry.start;
            input.duration = entry.duration;
            input.fade_in = entry.fade_in;
            segments.push(Segment {
                role: unit.role,
                stage: plan.stages[unit.stage].kind,
                start: entry.start,
                duration: entry.duration,
                fade_in: entry.fade_in,
            });
        }

        reporter.record_progress(&record.id, "encoding");
        let partial = scratch.path().join("clip.mp4");
        self.encoder
            .encode(&inputs, timeline.total, &partial)
            .await?;

        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&partial, out_path).await?;

        Ok(Clip {
            id: record.id.clone(),
            path: out_path.to_path_buf(),
            duration: timeline.total,
            segments,
        })
    }
}
