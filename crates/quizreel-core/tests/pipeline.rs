//! End-to-end runs over CSV files with in-process collaborators.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use quizreel_core::{
    Assembler, AssemblyConfig, Clip, ErrorKind, FrameRenderer, QuizreelError, RecordId, Reporter,
    Result, RunOptions, SegmentInput, SpeechSynthesizer, VideoEncoder,
    types::{FieldRole, RevealStage},
};

struct FakeTts {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeTts {
    async fn synthesize(&self, text: &str, _language: &str, out_path: &Path) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if text.contains("UNSPEAKABLE") {
            return Err(QuizreelError::SynthesisFailed {
                text: text.to_string(),
                reason: "service rejected text".to_string(),
            });
        }
        tokio::fs::write(out_path, text).await?;
        Ok(())
    }
}

struct FakeRenderer;

impl FrameRenderer for FakeRenderer {
    fn render(&self, stage: &RevealStage, out_path: &Path) -> Result<()> {
        std::fs::write(out_path, format!("{:?}", stage.kind))?;
        Ok(())
    }
}

/// Writes plain-text "videos" so concatenation order can be checked.
struct FakeEncoder;

#[async_trait]
impl VideoEncoder for FakeEncoder {
    async fn probe_duration(&self, audio: &Path) -> Result<f64> {
        Ok(tokio::fs::read(audio).await?.len() as f64 * 0.05)
    }

    async fn encode(&self, segments: &[SegmentInput], total: f64, out: &Path) -> Result<()> {
        let mut body = format!("clip {total:.3}\n");
        for s in segments {
            body.push_str(&tokio::fs::read_to_string(&s.audio).await?);
            body.push('\n');
        }
        tokio::fs::write(out, body).await?;
        Ok(())
    }

    async fn concat(&self, clips: &[PathBuf], out: &Path) -> Result<()> {
        let mut body = String::new();
        for clip in clips {
            body.push_str(&tokio::fs::read_to_string(clip).await?);
        }
        tokio::fs::write(out, body).await?;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn input_started(&self, input: &Path, _records: usize) {
        let name = input.file_name().unwrap().to_string_lossy();
        self.push(format!("started {name}"));
    }

    fn input_skipped(&self, input: &Path, _error: &QuizreelError) {
        self.push(format!("skipped {}", input.display()));
    }

    fn record_rejected(&self, _input: &Path, row: usize, _error: &QuizreelError) {
        self.push(format!("rejected row {row}"));
    }

    fn record_finished(&self, id: &RecordId, _clip: &Clip) {
        self.push(format!("finished {id}"));
    }

    fn record_failed(&self, id: &RecordId, _error: &QuizreelError) {
        self.push(format!("failed {id}"));
    }

    fn final_written(&self, _input: &Path, output: &Path, clips: usize) {
        let name = output.file_name().unwrap().to_string_lossy();
        self.push(format!("final {name} ({clips})"));
    }
}

fn assembler(tts: Arc<FakeTts>) -> Arc<Assembler> {
    Arc::new(Assembler::new(
        tts,
        Arc::new(FakeRenderer),
        Arc::new(FakeEncoder),
        AssemblyConfig::default(),
    ))
}

fn fake_tts() -> Arc<FakeTts> {
    Arc::new(FakeTts {
        spoken: Mutex::new(Vec::new()),
    })
}

const HEADER: &str = "question,option_a,option_b,option_c,option_d,answer,additional_info\n";

#[tokio::test]
async fn two_rows_produce_two_clips_and_one_final_video() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("capitals.csv");
    std::fs::write(
        &csv,
        format!(
            "{HEADER}\
             Capital of France?,London,Paris,Berlin,Madrid,Paris,The Seine runs through it\n\
             Capital of Japan?,Tokyo,Osaka,Kyoto,Nagoya,Tokyo,\n"
        ),
    )?;
    let out = dir.path().join("out");
    let opts = RunOptions {
        output_dir: out.clone(),
        jobs: 2,
    };
    let tts = fake_tts();
    let reporter = Arc::new(RecordingReporter::default());

    let summary =
        quizreel_core::run(assembler(tts.clone()), &[csv], &opts, reporter.clone()).await?;

    assert!(summary.produced_any());
    assert_eq!(summary.clip_count(), 2);
    assert!(out.join("capitals_001.mp4").exists());
    assert!(out.join("capitals_002.mp4").exists());

    let outcome = &summary.inputs[0];
    assert_eq!(
        outcome.final_video.as_deref(),
        Some(out.join("capitals_final_video.mp4").as_path())
    );

    // Row order is preserved regardless of which task finished first.
    let final_body = std::fs::read_to_string(out.join("capitals_final_video.mp4"))?;
    let france = final_body.find("Capital of France?").unwrap();
    let japan = final_body.find("Capital of Japan?").unwrap();
    assert!(france < japan);

    // The second row has no explanation, so it gets one segment fewer.
    assert_eq!(outcome.clips[0].segments.len(), 7);
    assert_eq!(outcome.clips[1].segments.len(), 6);
    assert!(
        outcome.clips[1]
            .segments
            .iter()
            .all(|s| s.role != FieldRole::Explanation)
    );
    let spoken = tts.spoken.lock().unwrap().clone();
    assert_eq!(spoken.len(), 13);
    assert!(spoken.contains(&"The Seine runs through it".to_string()));

    assert!(reporter.events().contains(&"final capitals_final_video.mp4 (2)".to_string()));
    Ok(())
}

#[tokio::test]
async fn failed_record_is_reported_and_others_continue() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("mixed.csv");
    std::fs::write(
        &csv,
        format!(
            "{HEADER}\
             UNSPEAKABLE question?,a,b,,,a,\n\
             ,orphan,row,,,x,\n\
             Fine question?,yes,no,,,yes,\n"
        ),
    )?;
    let out = dir.path().join("out");
    let opts = RunOptions {
        output_dir: out.clone(),
        jobs: 1,
    };
    let reporter = Arc::new(RecordingReporter::default());

    let summary = quizreel_core::run(assembler(fake_tts()), &[csv], &opts, reporter.clone()).await?;

    let outcome = &summary.inputs[0];
    assert_eq!(outcome.clips.len(), 1);
    assert_eq!(outcome.clips[0].id, RecordId::new("mixed", 3));
    assert_eq!(outcome.rejected_rows, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, RecordId::new("mixed", 1));
    assert_eq!(outcome.failures[0].1.kind(), ErrorKind::Synthesis);
    assert!(!out.join("mixed_001.mp4").exists());
    assert!(out.join("mixed_final_video.mp4").exists());

    let events = reporter.events();
    assert!(events.contains(&"failed mixed#1".to_string()));
    assert!(events.contains(&"rejected row 2".to_string()));
    Ok(())
}

#[tokio::test]
async fn missing_input_is_skipped_without_failing_the_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let good = dir.path().join("good.csv");
    std::fs::write(&good, "question,answer\nIs water wet?,Yes\n")?;
    let missing = dir.path().join("missing.csv");
    let opts = RunOptions {
        output_dir: dir.path().join("out"),
        jobs: 1,
    };
    let reporter = Arc::new(RecordingReporter::default());

    let summary = quizreel_core::run(
        assembler(fake_tts()),
        &[missing.clone(), good],
        &opts,
        reporter.clone(),
    )
    .await?;

    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, missing);
    assert_eq!(summary.skipped[0].1.kind(), ErrorKind::Input);
    assert!(summary.produced_any());
    assert!(reporter.events()[0].starts_with("skipped"));
    Ok(())
}

#[tokio::test]
async fn no_final_video_when_every_record_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("broken.csv");
    std::fs::write(&csv, "question\nUNSPEAKABLE one\nUNSPEAKABLE two\n")?;
    let out = dir.path().join("out");
    let opts = RunOptions {
        output_dir: out.clone(),
        jobs: 2,
    };

    let summary = quizreel_core::run(
        assembler(fake_tts()),
        &[csv],
        &opts,
        Arc::new(RecordingReporter::default()),
    )
    .await?;

    assert!(!summary.produced_any());
    assert_eq!(summary.failure_count(), 2);
    assert!(summary.inputs[0].final_video.is_none());
    assert!(!out.join("broken_final_video.mp4").exists());
    Ok(())
}

#[tokio::test]
async fn inputs_sharing_a_stem_keep_separate_outputs() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let first = dir.path().join("a").join("quiz.csv");
    let second = dir.path().join("b").join("quiz.csv");
    std::fs::create_dir_all(first.parent().unwrap())?;
    std::fs::create_dir_all(second.parent().unwrap())?;
    std::fs::write(&first, "question\nFirst file question?\n")?;
    std::fs::write(&second, "question\nSecond file question?\n")?;
    let out = dir.path().join("out");
    let opts = RunOptions {
        output_dir: out.clone(),
        jobs: 1,
    };

    let summary = quizreel_core::run(
        assembler(fake_tts()),
        &[first, second],
        &opts,
        Arc::new(RecordingReporter::default()),
    )
    .await?;

    let finals: Vec<&Path> = summary.final_videos().collect();
    assert_eq!(
        finals,
        vec![
            out.join("quiz_final_video.mp4").as_path(),
            out.join("quiz_2_final_video.mp4").as_path()
        ]
    );
    assert_eq!(summary.inputs[1].source, "quiz_2");
    assert_eq!(summary.inputs[1].clips[0].id, RecordId::new("quiz_2", 1));
    assert!(out.join("quiz_001.mp4").exists());
    assert!(out.join("quiz_2_001.mp4").exists());

    let first_final = std::fs::read_to_string(out.join("quiz_final_video.mp4"))?;
    assert!(first_final.contains("First file question?"));
    assert!(!first_final.contains("Second file question?"));
    let second_final = std::fs::read_to_string(out.join("quiz_2_final_video.mp4"))?;
    assert!(second_final.contains("Second file question?"));
    Ok(())
}

#[tokio::test]
async fn unavailable_scratch_storage_aborts_the_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    std::fs::write(&first, "question\nOne?\nTwo?\nThree?\n")?;
    std::fs::write(&second, "question\nFour?\n")?;
    let out = dir.path().join("out");
    let opts = RunOptions {
        output_dir: out.clone(),
        jobs: 1,
    };
    let tts = fake_tts();
    let assembler = Assembler::new(
        tts.clone(),
        Arc::new(FakeRenderer),
        Arc::new(FakeEncoder),
        AssemblyConfig::default(),
    )
    .with_work_dir(dir.path().join("no-such-dir"));
    let reporter = Arc::new(RecordingReporter::default());

    let err = quizreel_core::run(
        Arc::new(assembler),
        &[first, second],
        &opts,
        reporter.clone(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resource);
    assert!(err.is_fatal());
    assert!(tts.spoken.lock().unwrap().is_empty());
    assert_eq!(reporter.events(), vec!["started first.csv".to_string()]);
    assert_eq!(std::fs::read_dir(&out)?.count(), 0);
    Ok(())
}
