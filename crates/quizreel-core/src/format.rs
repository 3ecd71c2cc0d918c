use crate::types::{Clip, FieldRole};

/// Format seconds as MM:SS.s timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    let mins = tenths / 600;
    let secs = (tenths % 600) as f64 / 10.0;
    format!("{:02}:{:04.1}", mins, secs)
}

/// Format a wall-clock duration for progress output
pub fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs_f64();
    let tenths = (secs * 10.0).round() as u64;
    if tenths < 600 {
        format!("{:.1}s", tenths as f64 / 10.0)
    } else {
        let whole = secs.round() as u64;
        format!("{}m {}s", whole / 60, whole % 60)
    }
}

pub fn role_label(role: FieldRole) -> String {
    match role {
        FieldRole::Question => "question".to_string(),
        FieldRole::Option(letter) => format!("option {letter}"),
        FieldRole::Answer => "answer".to_string(),
        FieldRole::Explanation => "explanation".to_string(),
    }
}

/// Format a clip's segments with their timeline offsets
pub fn format_clip_timeline(clip: &Clip) -> String {
    clip.segments
        .iter()
        .map(|seg| {
            format!(
                "[{}–{}] {}",
                format_timestamp(seg.start),
                format_timestamp(seg.end()),
                role_label(seg.role)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use super::*;
    use crate::types::{RecordId, Segment, StageKind};

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00.0");
        assert_eq!(format_timestamp(61.3), "01:01.3");
        assert_eq!(format_timestamp(-3.0), "00:00.0");
        assert_eq!(format_timestamp(59.96), "01:00.0");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_millis(59_960)), "1m 0s");
        assert_eq!(format_duration(Duration::from_millis(59_940)), "59.9s");
    }

    #[test]
    fn clip_timeline_lists_segments_in_order() {
        let clip = Clip {
            id: RecordId::new("quiz", 1),
            path: PathBuf::from("quiz_001.mp4"),
            duration: 3.4,
            segments: vec![
                Segment {
                    role: FieldRole::Question,
                    stage: StageKind::Question,
                    start: 0.0,
                    duration: 2.2,
                    fade_in: 0.0,
                },
                Segment {
                    role: FieldRole::Option('B'),
                    stage: StageKind::Options,
                    start: 1.7,
                    duration: 1.7,
                    fade_in: 0.5,
                },
            ],
        };
        assert_eq!(
            format_clip_timeline(&clip),
            "[00:00.0–00:02.2] question\n[00:01.7–00:03.4] option B"
        );
    }
}
