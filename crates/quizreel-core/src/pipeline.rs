use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{fs, sync::Semaphore, task::JoinSet};

use crate::{
    assembler::Assembler,
    error::{ErrorKind, QuizreelError, Result},
    report::Reporter,
    source::{load_records_as, unique_source_names},
    types::{Clip, RecordId},
};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    /// Records assembled at the same time within one input.
    pub jobs: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            jobs: 1,
        }
    }
}

/// Where the clip for `id` is written.
pub fn record_output_path(output_dir: &Path, id: &RecordId) -> PathBuf {
    output_dir.join(format!("{}.mp4", id.file_stem()))
}

/// Where the concatenated video for the input named `source` is written.
pub fn final_output_path(output_dir: &Path, source: &str) -> PathBuf {
    output_dir.join(format!("{source}_final_video.mp4"))
}

/// Result of processing one input file.
#[derive(Debug)]
pub struct InputOutcome {
    pub input: PathBuf,
    /// Name used for this input's outputs, unique within the run.
    pub source: String,
    /// Successful clips in row order.
    pub clips: Vec<Clip>,
    pub failures: Vec<(RecordId, QuizreelError)>,
    pub rejected_rows: usize,
    pub final_video: Option<PathBuf>,
    pub final_error: Option<QuizreelError>,
}

impl InputOutcome {
    pub fn produced_any(&self) -> bool {
        !self.clips.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub inputs: Vec<InputOutcome>,
    pub skipped: Vec<(PathBuf, QuizreelError)>,
}

impl RunSummary {
    pub fn produced_any(&self) -> bool {
        self.inputs.iter().any(InputOutcome::produced_any)
    }

    pub fn clip_count(&self) -> usize {
        self.inputs.iter().map(|i| i.clips.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.inputs.iter().map(|i| i.failures.len()).sum()
    }

    pub fn final_videos(&self) -> impl Iterator<Item = &Path> {
        self.inputs.iter().filter_map(|i| i.final_video.as_deref())
    }
}

/// Assemble every record of `input`, then concatenate the successes.
///
/// Outputs are named after `source`, which must be unique within the run.
///
/// Records run as independent tasks, at most `opts.jobs` at once. A record
/// failure is reported and the rest continue; a resource failure aborts the
/// remaining tasks and is returned.
pub async fn process_input(
    assembler: &Arc<Assembler>,
    input: &Path,
    source: &str,
    opts: &RunOptions,
    reporter: &Arc<dyn Reporter>,
) -> Result<InputOutcome> {
    let loaded = load_records_as(input, source)?;
    reporter.input_started(input, loaded.records.len());
    for (row, err) in &loaded.rejected {
        reporter.record_rejected(input, *row, err);
    }

    fs::create_dir_all(&opts.output_dir)
        .await
        .map_err(|source| QuizreelError::OutputDir {
            path: opts.output_dir.clone(),
            source,
        })?;

    let total = loaded.records.len();
    let semaphore = Arc::new(Semaphore::new(opts.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, record) in loaded.records.into_iter().enumerate() {
        let assembler = Arc::clone(assembler);
        let reporter = Arc::clone(reporter);
        let semaphore = Arc::clone(&semaphore);
        let out = record_output_path(&opts.output_dir, &record.id);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            reporter.record_started(&record.id);
            let result = assembler.assemble(&record, &out, reporter.as_ref()).await;
            (index, record.id, result)
        });
    }

    let mut slots: Vec<Option<(RecordId, Result<Clip>)>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, id, result) = joined?;
        let result = match result {
            Ok(clip) => {
                reporter.record_finished(&id, &clip);
                Ok(clip)
            }
            Err(e) if e.is_fatal() => {
                tasks.abort_all();
                return Err(e);
            }
            Err(e) => {
                reporter.record_failed(&id, &e);
                Err(e)
            }
        };
        slots[index] = Some((id, result));
    }

    let mut clips = Vec::new();
    let mut failures = Vec::new();
    for (id, result) in slots.into_iter().flatten() {
        match result {
            Ok(clip) => clips.push(clip),
            Err(e) => failures.push((id, e)),
        }
    }

    let mut final_video = None;
    let mut final_error = None;
    if !clips.is_empty() {
        let target = final_output_path(&opts.output_dir, source);
        let paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
        match assembler.encoder().concat(&paths, &target).await {
            Ok(()) => {
                reporter.final_written(input, &target, clips.len());
                final_video = Some(target);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                reporter.final_failed(input, &e);
                final_error = Some(e);
            }
        }
    }

    Ok(InputOutcome {
        input: input.to_path_buf(),
        source: source.to_string(),
        clips,
        failures,
        rejected_rows: loaded.rejected.len(),
        final_video,
        final_error,
    })
}

/// Process every input in order. Unusable inputs are skipped; resource
/// failures end the run. Inputs sharing a file stem get distinct output names.
pub async fn run(
    assembler: Arc<Assembler>,
    inputs: &[PathBuf],
    opts: &RunOptions,
    reporter: Arc<dyn Reporter>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    let names = unique_source_names(inputs);

    for (input, source) in inputs.iter().zip(&names) {
        match process_input(&assembler, input, source, opts, &reporter).await {
            Ok(outcome) => summary.inputs.push(outcome),
            Err(e) if e.kind() == ErrorKind::Input => {
                reporter.input_skipped(input, &e);
                summary.skipped.push((input.clone(), e));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}
