//! Core domain types for the racket swing tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Angular velocity vectors and raw sensor samples
//! - Shot classifications and detected shot events
//! - Heart-rate zones
//! - Live snapshots and finalized training sessions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Sensor Types
// ============================================================================

/// Angular velocity in rad/s along the device axes
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Share of the L1 norm carried by the z axis (0 for the zero vector)
    pub fn verticality(&self) -> f32 {
        let total = self.x.abs() + self.y.abs() + self.z.abs();
        if total == 0.0 {
            0.0
        } else {
            self.z.abs() / total
        }
    }

    /// Share of the L1 norm carried by the x and y axes (0 for the zero vector)
    pub fn horizontality(&self) -> f32 {
        let total = self.x.abs() + self.y.abs() + self.z.abs();
        if total == 0.0 {
            0.0
        } else {
            (self.x.abs() + self.y.abs()) / total
        }
    }

    /// Euclidean distance to another vector
    pub fn distance(&self, other: &Vector3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Combined gyroscope + heart-rate reading sampled from the watch
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SensorSample {
    pub timestamp_millis: i64,
    pub gyro: Vector3,
    /// Beats per minute, NaN when the heart-rate sensor had no reading
    #[serde(with = "nan_as_null")]
    pub heart_rate_bpm: f32,
    #[serde(default)]
    pub accuracy: i32,
}

impl SensorSample {
    pub fn new(timestamp_millis: i64, gyro: Vector3, heart_rate_bpm: f32) -> Self {
        Self {
            timestamp_millis,
            gyro,
            heart_rate_bpm,
            accuracy: 0,
        }
    }

    /// Whether the heart-rate reading may feed heart-rate statistics
    pub fn has_valid_heart_rate(&self) -> bool {
        is_valid_heart_rate(self.heart_rate_bpm)
    }
}

/// Finite and strictly positive
pub fn is_valid_heart_rate(bpm: f32) -> bool {
    bpm.is_finite() && bpm > 0.0
}

// ============================================================================
// Shot Types
// ============================================================================

/// Supported badminton shot classifications
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    Smash,
    Clear,
    Drop,
    Drive,
    BackhandDrive,
    /// Never carried by an emitted event
    Unknown,
}

/// A detected swing, immutable once accepted by the pipeline
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ShotEvent {
    pub id: Uuid,
    pub shot_type: ShotType,
    pub timestamp_millis: i64,
    pub confidence: f32,
    pub peak_angular_velocity: f32,
    #[serde(with = "nan_as_null")]
    pub heart_rate_bpm: f32,
    pub swing_duration_millis: i64,
    /// Populated by collaborators; the classifier always leaves it at 0
    #[serde(default)]
    pub fatigue_estimate: f32,
}

// ============================================================================
// Heart-Rate Zones
// ============================================================================

/// Heart-rate intensity bands relative to a configured maximum
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HeartRateZone {
    WarmUp,
    Endurance,
    Tempo,
    Threshold,
    #[serde(rename = "vo2_max")]
    VO2Max,
}

impl HeartRateZone {
    /// All zones from lowest to highest intensity
    pub const ALL: [HeartRateZone; 5] = [
        HeartRateZone::WarmUp,
        HeartRateZone::Endurance,
        HeartRateZone::Tempo,
        HeartRateZone::Threshold,
        HeartRateZone::VO2Max,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            HeartRateZone::WarmUp => 0,
            HeartRateZone::Endurance => 1,
            HeartRateZone::Tempo => 2,
            HeartRateZone::Threshold => 3,
            HeartRateZone::VO2Max => 4,
        }
    }
}

/// Map a heart-rate reading onto a training zone
///
/// NaN readings and non-positive maxima fall back to `WarmUp`.
pub fn zone_for(value_bpm: f32, max_bpm: f32) -> HeartRateZone {
    if value_bpm.is_nan() || max_bpm <= 0.0 {
        return HeartRateZone::WarmUp;
    }
    let ratio = value_bpm / max_bpm;
    if ratio < 0.6 {
        HeartRateZone::WarmUp
    } else if ratio < 0.7 {
        HeartRateZone::Endurance
    } else if ratio < 0.8 {
        HeartRateZone::Tempo
    } else if ratio < 0.9 {
        HeartRateZone::Threshold
    } else {
        HeartRateZone::VO2Max
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Aggregated statistics for a finished session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingSummary {
    pub total_shots: usize,
    pub shot_counts: BTreeMap<ShotType, u32>,
    pub duration_millis: i64,
    pub average_heart_rate: f32,
    pub max_heart_rate: f32,
    pub recovery_score: f32,
    pub fatigue_score: f32,
    pub effort_score: f32,
    pub heart_rate_zone_histogram: BTreeMap<HeartRateZone, u32>,
}

/// A finalized session, owning a copy of every accepted shot in arrival order
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingSession {
    pub id: Uuid,
    pub started_at_millis: i64,
    pub ended_at_millis: i64,
    pub summary: TrainingSummary,
    pub shots: Vec<ShotEvent>,
}

/// Live view of an in-progress session, recomputed on every read
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSessionSnapshot {
    pub started_at_millis: i64,
    pub duration_millis: i64,
    /// Heart rate of the most recent sample (NaN if it had none)
    pub current_heart_rate: f32,
    pub average_heart_rate: f32,
    pub max_heart_rate: f32,
    pub total_shots: usize,
    pub last_shot: Option<ShotEvent>,
    pub shot_counts: BTreeMap<ShotType, u32>,
    pub fatigue_score: f32,
    pub effort_score: f32,
    pub recovery_score: f32,
    pub dominant_zone: HeartRateZone,
    /// Most recent gyroscope reading (rad/s)
    pub last_gyro: Vector3,
}

// ============================================================================
// Serde helpers
// ============================================================================

/// JSON has no NaN; unavailable heart rates travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
    }
}
