//! Rule-based shot classifier.
//!
//! Classification is a pure function of the window: features are extracted,
//! then an ordered table of rules is scanned and the first match wins. Each
//! rule carries its own confidence blend; weights in every blend sum to 1.
//!
//! ## Rule order
//!
//! 1. **Smash** - fast, vertical, trend reversing, heart rate climbing
//! 2. **Clear** - fast vertical swing still accelerating
//! 3. **Drive** - fast horizontal swing with little wrist roll
//! 4. **Drop** - moderate, short, partly vertical swing
//! 5. **Backhand drive** - horizontal swing with strong negative pronation
//!
//! Anything else is `Unknown`, which never becomes an event.

use crate::config::ClassifierConfig;
use crate::features::{self, FeatureSet};
use crate::ids::{random_ids, SharedIds};
use crate::{SensorSample, ShotEvent, ShotType};

/// Clear swings typically last around this long
const CLEAR_REFERENCE_DURATION_MILLIS: f32 = 400.0;

/// A heart-rate jump of this many bpm maxes out the smash heart-rate score
const SMASH_REFERENCE_HR_DELTA: f32 = 5.0;

/// Why a window or sample produced no shot
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rejection {
    /// Window shorter than the configured minimum
    InsufficientData { samples: usize, required: usize },
    /// No rule matched (the `Unknown` shot type)
    NoMatch,
    /// A rule matched but scored below the cutoff
    LowConfidence { shot_type: ShotType, confidence: f32 },
    /// A valid shot arrived within the minimum gap of the previous one
    Debounced { shot_type: ShotType, since_last_millis: i64 },
}

struct Rule {
    shot_type: ShotType,
    matches: fn(&FeatureSet, &ClassifierConfig) -> bool,
    confidence: fn(&FeatureSet, &ClassifierConfig) -> f32,
}

const RULES: [Rule; 5] = [
    Rule {
        shot_type: ShotType::Smash,
        matches: smash_matches,
        confidence: smash_confidence,
    },
    Rule {
        shot_type: ShotType::Clear,
        matches: clear_matches,
        confidence: clear_confidence,
    },
    Rule {
        shot_type: ShotType::Drive,
        matches: drive_matches,
        confidence: drive_confidence,
    },
    Rule {
        shot_type: ShotType::Drop,
        matches: drop_matches,
        confidence: drop_confidence,
    },
    Rule {
        shot_type: ShotType::BackhandDrive,
        matches: backhand_drive_matches,
        confidence: backhand_drive_confidence,
    },
];

fn smash_matches(f: &FeatureSet, c: &ClassifierConfig) -> bool {
    f.peak_angular_velocity >= c.smash_threshold
        && f.vertical_ratio > 0.55
        && f.directional_trend < -0.15
        && f.heart_rate_delta_or_zero() >= 2.0
}

fn smash_confidence(f: &FeatureSet, c: &ClassifierConfig) -> f32 {
    let peak = peak_score(f.peak_angular_velocity, c.smash_threshold);
    let trend = unit(f.directional_trend.abs());
    let hr = unit(f.heart_rate_delta_or_zero() / SMASH_REFERENCE_HR_DELTA);
    0.5 * peak + 0.3 * trend + 0.2 * hr
}

fn clear_matches(f: &FeatureSet, c: &ClassifierConfig) -> bool {
    f.peak_angular_velocity >= c.clear_threshold
        && f.peak_angular_velocity <= c.smash_threshold + 1.0
        && f.vertical_ratio > 0.5
        && f.directional_trend > 0.1
}

fn clear_confidence(f: &FeatureSet, c: &ClassifierConfig) -> f32 {
    let peak = peak_score(f.peak_angular_velocity, c.clear_threshold);
    let duration = unit(f.swing_duration_millis as f32 / CLEAR_REFERENCE_DURATION_MILLIS);
    0.4 * peak + 0.3 * unit(f.vertical_ratio) + 0.3 * duration
}

fn drive_matches(f: &FeatureSet, c: &ClassifierConfig) -> bool {
    f.peak_angular_velocity >= c.drive_threshold
        && f.horizontal_ratio > 0.6
        && f.pronation_score.abs() < 0.35
}

fn drive_confidence(f: &FeatureSet, c: &ClassifierConfig) -> f32 {
    let peak = peak_score(f.peak_angular_velocity, c.drive_threshold);
    0.4 * peak + 0.4 * unit(f.horizontal_ratio) + 0.2 * unit(f.stability_score)
}

fn drop_matches(f: &FeatureSet, c: &ClassifierConfig) -> bool {
    f.peak_angular_velocity >= c.drop_threshold
        && f.peak_angular_velocity < c.clear_threshold
        && (160..=360).contains(&f.swing_duration_millis)
        && (0.35..=0.6).contains(&f.vertical_ratio)
        && f.pronation_score.abs() < 0.6
}

fn drop_confidence(f: &FeatureSet, c: &ClassifierConfig) -> f32 {
    let peak = peak_score(f.peak_angular_velocity, c.drop_threshold);
    0.3 * peak + 0.3 * unit(f.vertical_ratio) + 0.4 * unit(f.stability_score)
}

fn backhand_drive_matches(f: &FeatureSet, c: &ClassifierConfig) -> bool {
    f.peak_angular_velocity >= c.drop_threshold
        && f.horizontal_ratio > 0.6
        && f.pronation_score <= -0.4
}

fn backhand_drive_confidence(f: &FeatureSet, c: &ClassifierConfig) -> f32 {
    let peak = peak_score(f.peak_angular_velocity, c.drop_threshold);
    0.3 * peak + 0.5 * unit(f.pronation_score.abs()) + 0.2 * unit(f.horizontal_ratio)
}

/// How far the peak overshoots a threshold, relative to that threshold
fn peak_score(peak: f32, threshold: f32) -> f32 {
    if threshold <= 0.0 {
        return 0.0;
    }
    unit((peak - threshold) / threshold)
}

/// Clamp into [0, 1], mapping NaN to 0
fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Determine the shot type and its confidence for a feature set
///
/// Returns `ShotType::Unknown` with confidence 0 when nothing matches.
pub fn score(features: &FeatureSet, config: &ClassifierConfig) -> (ShotType, f32) {
    RULES
        .iter()
        .find(|rule| (rule.matches)(features, config))
        .map(|rule| (rule.shot_type, unit((rule.confidence)(features, config))))
        .unwrap_or((ShotType::Unknown, 0.0))
}

/// Stateless classifier over sample windows
#[derive(Clone, Debug)]
pub struct ShotClassifier {
    config: ClassifierConfig,
    ids: SharedIds,
}

impl Default for ShotClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl ShotClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_ids(config, random_ids())
    }

    /// Use a specific id source for emitted events
    pub fn with_ids(config: ClassifierConfig, ids: SharedIds) -> Self {
        Self { config, ids }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a window, discarding the reason when there is no shot
    pub fn classify(&self, window: &[SensorSample]) -> Option<ShotEvent> {
        self.evaluate(window).ok()
    }

    /// Classify a window, explaining why no shot was produced
    pub fn evaluate(&self, window: &[SensorSample]) -> Result<ShotEvent, Rejection> {
        let required = self.config.min_window_size;
        let last = match window.last() {
            Some(last) if window.len() >= required => last,
            _ => {
                return Err(Rejection::InsufficientData {
                    samples: window.len(),
                    required,
                })
            }
        };

        let features = features::extract(window);
        let (shot_type, confidence) = score(&features, &self.config);
        if shot_type == ShotType::Unknown {
            return Err(Rejection::NoMatch);
        }
        if confidence < self.config.min_confidence {
            return Err(Rejection::LowConfidence {
                shot_type,
                confidence,
            });
        }

        Ok(ShotEvent {
            id: self.ids.next_id(),
            shot_type,
            timestamp_millis: last.timestamp_millis,
            confidence,
            peak_angular_velocity: features.peak_angular_velocity,
            heart_rate_bpm: last.heart_rate_bpm,
            swing_duration_millis: features.swing_duration_millis,
            fatigue_estimate: 0.0,
        })
    }
}
