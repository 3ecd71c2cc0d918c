use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{fs, process::Command};

use crate::{
    config::{AudioConfig, Rgb, VideoConfig},
    error::{QuizreelError, Result},
};

/// One frame+audio pair placed on the output timeline (seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInput {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub start: f64,
    pub duration: f64,
    pub fade_in: f64,
}

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Length of an audio file in seconds.
    async fn probe_duration(&self, audio: &Path) -> Result<f64>;

    /// Layer `segments` into one video of `total` seconds at `out_path`.
    async fn encode(&self, segments: &[SegmentInput], total: f64, out_path: &Path) -> Result<()>;

    /// Join finished clips, in order, into `out_path`.
    async fn concat(&self, clips: &[PathBuf], out_path: &Path) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub background: Rgb,
    pub video_codec: String,
    pub preset: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub sample_rate: u32,
    pub channels: u32,
}

impl EncodeSettings {
    pub fn from_config(video: &VideoConfig, audio: &AudioConfig) -> Self {
        Self {
            width: video.width,
            height: video.height,
            fps: video.fps,
            background: video.background,
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            audio_codec: audio.codec.clone(),
            audio_bitrate: audio.bitrate.clone(),
            sample_rate: audio.sample_rate,
            channels: audio.channels,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(QuizreelError::InvalidSettings {
                reason: reason.to_string(),
            })
        };
        if self.width == 0 || self.height == 0 {
            return invalid("width/height must be non-zero");
        }
        if self.fps == 0 {
            return invalid("fps must be non-zero");
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // yuv420p needs even dimensions.
            return invalid("width/height must be even");
        }
        Ok(())
    }
}

fn secs(v: f64) -> String {
    format!("{:.3}", v.max(0.0))
}

/// The `-filter_complex` graph for `segments`.
///
/// Input 0 is the background colour source; segment `i` contributes its
/// looped image at input `1 + 2i` and its audio at `2 + 2i`. Frames are
/// overlaid in order, each fading in over its predecessor; audio is delayed
/// to each start and mixed without level normalisation.
pub fn build_filter_graph(segments: &[SegmentInput], total: f64) -> String {
    let mut parts = Vec::new();

    for (i, seg) in segments.iter().enumerate() {
        let img = 1 + 2 * i;
        let fade = if seg.fade_in > 0.0 {
            format!(",fade=t=in:st=0:d={}:alpha=1", secs(seg.fade_in))
        } else {
            String::new()
        };
        parts.push(format!(
            "[{img}:v]format=yuva420p{fade},setpts=PTS-STARTPTS+{}/TB[v{i}]",
            secs(seg.start)
        ));
    }

    let mut base = "[0:v]".to_string();
    for i in 0..segments.len() {
        parts.push(format!("{base}[v{i}]overlay=eof_action=pass[o{i}]"));
        base = format!("[o{i}]");
    }
    parts.push(format!("{base}format=yuv420p[vout]"));

    for (i, seg) in segments.iter().enumerate() {
        let aud = 2 + 2 * i;
        let delay_ms = (seg.start.max(0.0) * 1000.0).round() as u64;
        parts.push(format!("[{aud}:a]adelay=delays={delay_ms}:all=1[a{i}]"));
    }
    let mix_inputs: String = (0..segments.len()).map(|i| format!("[a{i}]")).collect();
    parts.push(format!(
        "{mix_inputs}amix=inputs={}:duration=longest:dropout_transition=0:normalize=0,\
         apad=whole_dur={}[aout]",
        segments.len(),
        secs(total)
    ));

    parts.join(";")
}

/// Full ffmpeg argument list for encoding `segments` into `out_path`.
pub fn build_encode_args(
    settings: &EncodeSettings,
    segments: &[SegmentInput],
    total: f64,
    out_path: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-loglevel", "error"].map(OsString::from).to_vec();

    args.extend(
        [
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!(
                "color=c={}:s={}x{}:r={}:d={}",
                settings.background.to_hex(),
                settings.width,
                settings.height,
                settings.fps,
                secs(total)
            ),
        ]
        .map(OsString::from),
    );

    for seg in segments {
        args.extend(
            [
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                settings.fps.to_string(),
                "-t".to_string(),
                secs(seg.duration),
                "-i".to_string(),
            ]
            .map(OsString::from),
        );
        args.push(seg.image.clone().into_os_string());
        args.push(OsString::from("-i"));
        args.push(seg.audio.clone().into_os_string());
    }

    args.extend(
        [
            "-filter_complex".to_string(),
            build_filter_graph(segments, total),
            "-map".to_string(),
            "[vout]".to_string(),
            "-map".to_string(),
            "[aout]".to_string(),
            "-c:v".to_string(),
            settings.video_codec.clone(),
            "-preset".to_string(),
            settings.preset.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            settings.fps.to_string(),
            "-c:a".to_string(),
            settings.audio_codec.clone(),
            "-b:a".to_string(),
            settings.audio_bitrate.clone(),
            "-ar".to_string(),
            settings.sample_rate.to_string(),
            "-ac".to_string(),
            settings.channels.to_string(),
            "-t".to_string(),
            secs(total),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]
        .map(OsString::from),
    );
    args.push(out_path.as_os_str().to_os_string());
    args
}

/// Concat demuxer list; single quotes in paths are escaped the way ffmpeg expects.
pub fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|p| {
            let escaped = p.to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Duration from `ffprobe -of json -show_entries format=duration` output.
pub fn parse_probe_duration(json: &str) -> Result<f64> {
    let probe: ProbeOutput = serde_json::from_str(json)?;
    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| QuizreelError::EncodingFailed {
            output: PathBuf::new(),
            reason: format!("ffprobe reported no usable duration: {}", json.trim()),
        })
}

pub async fn is_ffmpeg_on_path() -> bool {
    let ffmpeg = Command::new("ffmpeg").arg("-version").output().await;
    let ffprobe = Command::new("ffprobe").arg("-version").output().await;
    matches!((ffmpeg, ffprobe), (Ok(a), Ok(b)) if a.status.success() && b.status.success())
}

/// Encoder backed by the system `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegEncoder {
    settings: EncodeSettings,
}

impl FfmpegEncoder {
    pub fn new(settings: EncodeSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    async fn run_ffmpeg(args: &[OsString], out_path: &Path) -> Result<()> {
        let output = Command::new("ffmpeg")
            .args(args)
            .output()
            .await
            .map_err(|e| QuizreelError::EncodingFailed {
                output: out_path.to_path_buf(),
                reason: format!("failed to spawn ffmpeg (is it installed and on PATH?): {e}"),
            })?;

        if !output.status.success() {
            return Err(QuizreelError::EncodingFailed {
                output: out_path.to_path_buf(),
                reason: format!(
                    "ffmpeg exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn probe_duration(&self, audio: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("json")
            .arg(audio)
            .output()
            .await
            .map_err(|e| QuizreelError::EncodingFailed {
                output: audio.to_path_buf(),
                reason: format!("failed to spawn ffprobe: {e}"),
            })?;

        if !output.status.success() {
            return Err(QuizreelError::EncodingFailed {
                output: audio.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_duration(&String::from_utf8_lossy(&output.stdout)).map_err(|e| match e {
            QuizreelError::EncodingFailed { reason, .. } => QuizreelError::EncodingFailed {
                output: audio.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    async fn encode(&self, segments: &[SegmentInput], total: f64, out_path: &Path) -> Result<()> {
        if segments.is_empty() {
            return Err(QuizreelError::EncodingFailed {
                output: out_path.to_path_buf(),
                reason: "no segments to encode".to_string(),
            });
        }
        let args = build_encode_args(&self.settings, segments, total, out_path);
        Self::run_ffmpeg(&args, out_path).await
    }

    async fn concat(&self, clips: &[PathBuf], out_path: &Path) -> Result<()> {
        if clips.is_empty() {
            return Err(QuizreelError::EncodingFailed {
                output: out_path.to_path_buf(),
                reason: "no clips to concatenate".to_string(),
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix("quizreel-concat-")
            .tempdir()
            .map_err(QuizreelError::TempStorage)?;
        let list_path = scratch.path().join("clips.txt");

        let absolute: Vec<PathBuf> = clips
            .iter()
            .map(|c| std::path::absolute(c).unwrap_or_else(|_| c.clone()))
            .collect();
        fs::write(&list_path, concat_list(&absolute)).await?;

        let args: Vec<OsString> = [
            "-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i",
        ]
        .into_iter()
        .map(OsString::from)
        .chain([list_path.into_os_string()])
        .chain(["-c", "copy", "-movflags", "+faststart"].map(OsString::from))
        .chain([out_path.as_os_str().to_os_string()])
        .collect();

        Self::run_ffmpeg(&args, out_path).await
    }
}
