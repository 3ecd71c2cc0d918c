use std::{
    collections::HashMap,
    path::Path,
    sync::Mutex,
    time::{Duration, Instant},
};

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use quizreel_core::{
    Clip, QuizreelError, RecordId, Reporter, format_clip_timeline, format_duration,
};

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Terminal reporter: one spinner per record in flight.
pub struct ConsoleReporter {
    multi: MultiProgress,
    active: Mutex<HashMap<RecordId, (ProgressBar, Instant)>>,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(HashMap::new()),
            verbose,
        }
    }

    fn println(&self, line: String) {
        if self.multi.println(&line).is_err() {
            eprintln!("{line}");
        }
    }

    fn take(&self, id: &RecordId) -> Option<(ProgressBar, Instant)> {
        self.active.lock().ok()?.remove(id)
    }
}

impl Reporter for ConsoleReporter {
    fn input_started(&self, input: &Path, records: usize) {
        self.println(format!(
            "{} {} {}",
            style("▸").cyan().bold(),
            style(input.display()).bold(),
            style(format!("({records} records)")).dim()
        ));
    }

    fn input_skipped(&self, input: &Path, error: &QuizreelError) {
        self.println(format!(
            "{} Skipped {}: {}",
            style("✗").red().bold(),
            input.display(),
            error
        ));
    }

    fn record_rejected(&self, input: &Path, row: usize, error: &QuizreelError) {
        self.println(format!(
            "{} {} row {} skipped: {}",
            style("!").yellow().bold(),
            input.display(),
            row,
            error
        ));
    }

    fn record_started(&self, id: &RecordId) {
        let pb = self.multi.add(create_spinner(&format!("{id}: starting...")));
        if let Ok(mut active) = self.active.lock() {
            active.insert(id.clone(), (pb, Instant::now()));
        }
    }

    fn record_progress(&self, id: &RecordId, message: &str) {
        let Ok(active) = self.active.lock() else {
            return;
        };
        if let Some((pb, _)) = active.get(id) {
            pb.set_message(format!("{id}: {message}..."));
        }
    }

    fn record_finished(&self, id: &RecordId, clip: &Clip) {
        let line = format!(
            "{} {} → {} {}",
            style("✓").green().bold(),
            id,
            style(clip.path.display()).cyan(),
            style(format!("({:.1}s video)", clip.duration)).dim()
        );
        match self.take(id) {
            Some((pb, started)) => pb.finish_with_message(format!(
                "{line} {}",
                style(format_duration(started.elapsed())).dim()
            )),
            None => self.println(line),
        }
        if self.verbose {
            self.println(style(format_clip_timeline(clip)).dim().to_string());
        }
    }

    fn record_failed(&self, id: &RecordId, error: &QuizreelError) {
        let line = format!("{} {}", style("✗").red().bold(), error);
        match self.take(id) {
            Some((pb, _)) => pb.finish_with_message(line),
            None => self.println(line),
        }
    }

    fn final_written(&self, _input: &Path, output: &Path, clips: usize) {
        self.println(format!(
            "{} Final video: {} {}",
            style("✓").green().bold(),
            style(output.display()).cyan(),
            style(format!("({clips} clips)")).dim()
        ));
    }

    fn final_failed(&self, input: &Path, error: &QuizreelError) {
        self.println(format!(
            "{} Final video for {} failed: {}",
            style("✗").red().bold(),
            input.display(),
            error
        ));
    }
}
