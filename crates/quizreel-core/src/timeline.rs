//! Start offsets and durations for the narrated units of one clip.
//!
//! Each unit lasts its audio length plus a hold. Consecutive units overlap by
//! the transition time so the next frame can fade in over the previous one.
//! An overlap is dropped to zero at any boundary where it would eat into a
//! unit shorter than the transition, so start offsets always advance by at
//! least `floor`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Silence appended after each unit's audio, in seconds.
    pub hold: f64,
    /// Crossfade overlap between consecutive units, in seconds.
    pub transition: f64,
    /// Smallest allowed advance from one unit's start to the next.
    pub floor: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            hold: 0.2,
            transition: 0.5,
            floor: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEntry {
    pub start: f64,
    pub duration: f64,
    /// Overlap with the previous entry; also the fade-in length.
    pub fade_in: f64,
}

impl TimelineEntry {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub total: f64,
}

impl Timeline {
    pub fn total_overlap(&self) -> f64 {
        self.entries.iter().map(|e| e.fade_in).sum()
    }
}

pub fn compute_timeline(audio_durations: &[f64], cfg: &TimelineConfig) -> Timeline {
    let floor = cfg.floor.max(0.0);
    let transition = cfg.transition.max(0.0);
    let hold = cfg.hold.max(0.0);

    let audio: Vec<f64> = audio_durations
        .iter()
        .map(|&a| if a.is_finite() { a.max(0.0) } else { 0.0 })
        .collect();

    let mut entries: Vec<TimelineEntry> = Vec::with_capacity(audio.len());
    for (i, &audio_len) in audio.iter().enumerate() {
        let duration = (audio_len + hold).max(floor);

        let entry = match entries.last() {
            None => TimelineEntry {
                start: 0.0,
                duration,
                fade_in: 0.0,
            },
            Some(prev) => {
                let overlap = if audio_len < transition
                    || audio[i - 1] < transition
                    || prev.duration - transition < floor
                {
                    0.0
                } else {
                    transition
                };
                TimelineEntry {
                    start: prev.start + prev.duration - overlap,
                    duration,
                    fade_in: overlap,
                }
            }
        };
        entries.push(entry);
    }

    let total = entries.last().map(TimelineEntry::end).unwrap_or(0.0);
    Timeline { entries, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn empty_input_has_zero_total() {
        let t = compute_timeline(&[], &TimelineConfig::default());
        assert!(t.entries.is_empty());
        assert_eq!(t.total, 0.0);
    }

    #[test]
    fn single_unit_is_audio_plus_hold() {
        let t = compute_timeline(&[2.0], &TimelineConfig::default());
        assert_eq!(t.entries.len(), 1);
        assert_eq!(t.entries[0].start, 0.0);
        assert!((t.total - 2.2).abs() < EPS);
    }

    #[test]
    fn consecutive_units_overlap_by_transition() {
        let t = compute_timeline(&[2.0, 1.0, 3.0], &TimelineConfig::default());

        assert!((t.entries[1].start - 1.7).abs() < EPS);
        assert!((t.entries[2].start - 2.4).abs() < EPS);
        assert!((t.entries[1].fade_in - 0.5).abs() < EPS);
        assert!((t.total - 5.6).abs() < EPS);
    }

    #[test]
    fn short_audio_clamps_overlap_to_zero() {
        let t = compute_timeline(&[2.0, 0.3, 2.0], &TimelineConfig::default());

        // Both boundaries touching the 0.3 s unit lose their overlap.
        assert_eq!(t.entries[1].fade_in, 0.0);
        assert_eq!(t.entries[2].fade_in, 0.0);
        assert!((t.entries[1].start - 2.2).abs() < EPS);
        assert!((t.entries[2].start - 2.7).abs() < EPS);
    }

    #[test]
    fn total_is_sum_of_durations_minus_overlap() {
        let audio = [1.4, 0.1, 0.0, 2.5, 0.7, 3.3, 0.49];
        let cfg = TimelineConfig::default();
        let t = compute_timeline(&audio, &cfg);

        let sum: f64 = t.entries.iter().map(|e| e.duration).sum();
        assert!((t.total - (sum - t.total_overlap())).abs() < EPS);
        assert!(t.total >= 0.0);
    }

    #[test]
    fn starts_advance_by_at_least_floor() {
        let audio = [0.0, 0.0, 0.6, 0.5, 4.0, 0.01, 0.55];
        let cfg = TimelineConfig {
            hold: 0.0,
            transition: 0.5,
            floor: 0.05,
        };
        let t = compute_timeline(&audio, &cfg);

        for pair in t.entries.windows(2) {
            assert!(pair[1].start - pair[0].start >= cfg.floor - EPS);
        }
        for e in &t.entries {
            assert!(e.duration >= cfg.floor);
        }
    }

    #[test]
    fn non_finite_durations_are_treated_as_empty() {
        let t = compute_timeline(&[f64::NAN, 1.0], &TimelineConfig::default());
        assert!((t.entries[0].duration - 0.2).abs() < EPS);
        assert_eq!(t.entries[1].fade_in, 0.0);
    }
}
