//! Session aggregation of samples and shots.
//!
//! The aggregator keeps two views of heart rate:
//! - a rolling window (fixed capacity) that drives the live snapshot, and
//! - session-wide running totals that drive the final summary.
//!
//! Both are O(1) memory in session length. Fatigue, effort and recovery are
//! computed with the same formulas over whichever view is being reported.

use crate::config::SessionConfig;
use crate::ids::{random_ids, SharedIds};
use crate::window::HeartRateWindow;
use crate::{
    zone_for, HeartRateZone, SensorSample, ShotEvent, ShotType, TrainingSession,
    TrainingSessionSnapshot, TrainingSummary, Vector3,
};
use std::collections::BTreeMap;

/// Readings averaged at each end of a history to estimate recovery
const RECOVERY_SAMPLES: usize = 4;

/// A heart-rate drop of this many bpm is full recovery
const RECOVERY_FULL_DROP_BPM: f32 = 20.0;

/// Recovery reported before enough readings exist
const RECOVERY_NEUTRAL: f32 = 0.5;

/// Heart-rate figures the derived scores are computed from
#[derive(Clone, Copy, Debug, PartialEq)]
struct HeartRateStats {
    average: f32,
    max: f32,
    count: usize,
    opening_mean: Option<f32>,
    closing_mean: Option<f32>,
}

/// Derived training scores, each within [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedScores {
    pub fatigue: f32,
    pub recovery: f32,
    pub effort: f32,
}

/// Aggregates streaming samples and shot events into live and final summaries
#[derive(Clone, Debug)]
pub struct TrainingSessionAggregator {
    config: SessionConfig,
    ids: SharedIds,
    rolling: HeartRateWindow,
    closing: HeartRateWindow,
    opening: Vec<f32>,
    total_sum: f64,
    total_count: usize,
    total_max: Option<f32>,
    zone_counts: [u32; 5],
    shots: Vec<ShotEvent>,
    started_at: Option<i64>,
    last_sample: Option<SensorSample>,
}

impl Default for TrainingSessionAggregator {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl TrainingSessionAggregator {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_ids(config, random_ids())
    }

    /// Use a specific id source for finalized sessions
    pub fn with_ids(config: SessionConfig, ids: SharedIds) -> Self {
        let rolling = HeartRateWindow::new(config.heart_rate_history);
        Self {
            config,
            ids,
            rolling,
            closing: HeartRateWindow::new(RECOVERY_SAMPLES),
            opening: Vec::with_capacity(RECOVERY_SAMPLES),
            total_sum: 0.0,
            total_count: 0,
            total_max: None,
            zone_counts: [0; 5],
            shots: Vec::new(),
            started_at: None,
            last_sample: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Clear all state and start a new session at `start_millis`
    pub fn reset(&mut self, start_millis: i64) {
        self.rolling.clear();
        self.closing.clear();
        self.opening.clear();
        self.total_sum = 0.0;
        self.total_count = 0;
        self.total_max = None;
        self.zone_counts = [0; 5];
        self.shots.clear();
        self.started_at = Some(start_millis);
        self.last_sample = None;
    }

    /// Record a raw sample
    ///
    /// Samples without a finite, positive heart rate still update the last
    /// gyro reading but are left out of every heart-rate statistic.
    pub fn on_sample(&mut self, sample: &SensorSample) {
        if self.started_at.is_none() {
            self.started_at = Some(sample.timestamp_millis);
        }
        self.last_sample = Some(*sample);

        if !sample.has_valid_heart_rate() {
            return;
        }
        let bpm = sample.heart_rate_bpm;

        self.rolling.push(bpm);
        self.closing.push(bpm);
        if self.opening.len() < RECOVERY_SAMPLES {
            self.opening.push(bpm);
        }
        self.total_sum += bpm as f64;
        self.total_count += 1;
        self.total_max = Some(self.total_max.map_or(bpm, |m| m.max(bpm)));

        let zone = zone_for(bpm, self.config.max_heart_rate);
        self.zone_counts[zone.index()] += 1;
    }

    /// Record an accepted shot
    pub fn on_shot(&mut self, event: ShotEvent) {
        self.shots.push(event);
    }

    pub fn shots(&self) -> &[ShotEvent] {
        &self.shots
    }

    /// Live view over the rolling heart-rate window
    pub fn snapshot(&self, now_millis: i64) -> TrainingSessionSnapshot {
        let started_at = self.started_at.unwrap_or(now_millis);
        let stats = self.rolling_stats();
        let scores = self.derive(&stats);

        TrainingSessionSnapshot {
            started_at_millis: started_at,
            duration_millis: (now_millis - started_at).max(0),
            current_heart_rate: self
                .last_sample
                .map_or(f32::NAN, |s| s.heart_rate_bpm),
            average_heart_rate: stats.average,
            max_heart_rate: stats.max,
            total_shots: self.shots.len(),
            last_shot: self.shots.last().cloned(),
            shot_counts: self.shot_counts(),
            fatigue_score: scores.fatigue,
            effort_score: scores.effort,
            recovery_score: scores.recovery,
            dominant_zone: self.dominant_zone(stats.average),
            last_gyro: self.last_sample.map_or(Vector3::ZERO, |s| s.gyro),
        }
    }

    /// Freeze the session using its full recorded history
    ///
    /// Internal state is left untouched; call [`reset`](Self::reset) before
    /// reusing the aggregator.
    pub fn build_session(&self, now_millis: i64) -> TrainingSession {
        let started_at = self.started_at.unwrap_or(now_millis);
        let stats = self.session_stats();
        let scores = self.derive(&stats);

        let summary = TrainingSummary {
            total_shots: self.shots.len(),
            shot_counts: self.shot_counts(),
            duration_millis: (now_millis - started_at).max(0),
            average_heart_rate: stats.average,
            max_heart_rate: stats.max,
            recovery_score: scores.recovery,
            fatigue_score: scores.fatigue,
            effort_score: scores.effort,
            heart_rate_zone_histogram: self.zone_histogram(),
        };

        let session = TrainingSession {
            id: self.ids.next_id(),
            started_at_millis: started_at,
            ended_at_millis: now_millis,
            summary,
            shots: self.shots.clone(),
        };

        tracing::info!(
            "Built session {}: {} shots over {} ms",
            session.id,
            session.summary.total_shots,
            session.summary.duration_millis
        );
        session
    }

    /// Session-wide zone counts (zones never hit are omitted)
    pub fn zone_histogram(&self) -> BTreeMap<HeartRateZone, u32> {
        HeartRateZone::ALL
            .iter()
            .filter(|zone| self.zone_counts[zone.index()] > 0)
            .map(|zone| (*zone, self.zone_counts[zone.index()]))
            .collect()
    }

    /// Most populated zone; ties go to the higher-intensity zone
    ///
    /// With no heart-rate readings at all, falls back to the zone of
    /// `average_bpm`.
    pub fn dominant_zone(&self, average_bpm: f32) -> HeartRateZone {
        let mut best: Option<(HeartRateZone, u32)> = None;
        for zone in HeartRateZone::ALL {
            let count = self.zone_counts[zone.index()];
            if count > 0 && best.map_or(true, |(_, top)| count >= top) {
                best = Some((zone, count));
            }
        }
        best.map(|(zone, _)| zone)
            .unwrap_or_else(|| zone_for(average_bpm, self.config.max_heart_rate))
    }

    fn shot_counts(&self) -> BTreeMap<ShotType, u32> {
        let mut counts = BTreeMap::new();
        for shot in &self.shots {
            *counts.entry(shot.shot_type).or_insert(0) += 1;
        }
        counts
    }

    fn rolling_stats(&self) -> HeartRateStats {
        let baseline = self.config.baseline_heart_rate;
        HeartRateStats {
            average: self.rolling.mean().unwrap_or(baseline),
            max: self.rolling.max().unwrap_or(baseline),
            count: self.rolling.len(),
            opening_mean: self.rolling.head_mean(RECOVERY_SAMPLES),
            closing_mean: self.rolling.tail_mean(RECOVERY_SAMPLES),
        }
    }

    fn session_stats(&self) -> HeartRateStats {
        let baseline = self.config.baseline_heart_rate;
        let average = if self.total_count == 0 {
            baseline
        } else {
            (self.total_sum / self.total_count as f64) as f32
        };
        let opening_mean = if self.opening.is_empty() {
            None
        } else {
            Some(self.opening.iter().sum::<f32>() / self.opening.len() as f32)
        };
        HeartRateStats {
            average,
            max: self.total_max.unwrap_or(baseline),
            count: self.total_count,
            opening_mean,
            closing_mean: self.closing.mean(),
        }
    }

    fn derive(&self, stats: &HeartRateStats) -> DerivedScores {
        let load_ratio = self.reserve_ratio(stats.average);
        let peak_ratio = self.reserve_ratio(stats.max);
        let fatigue = (0.7 * load_ratio + 0.3 * peak_ratio).clamp(0.0, 1.0);

        let recovery = match (stats.opening_mean, stats.closing_mean) {
            (Some(opening), Some(closing)) if stats.count >= RECOVERY_SAMPLES => {
                ((opening - closing) / RECOVERY_FULL_DROP_BPM).clamp(0.0, 1.0)
            }
            _ => RECOVERY_NEUTRAL,
        };

        let effort = (0.6 * peak_ratio + 0.4 * fatigue).clamp(0.0, 1.0);

        DerivedScores {
            fatigue,
            recovery,
            effort,
        }
    }

    /// Position of `bpm` within the heart-rate reserve (baseline..max)
    fn reserve_ratio(&self, bpm: f32) -> f32 {
        let reserve = self.config.max_heart_rate - self.config.baseline_heart_rate;
        if !(reserve > 0.0) {
            return 0.0;
        }
        let ratio = (bpm - self.config.baseline_heart_rate) / reserve;
        if ratio.is_finite() {
            ratio
        } else {
            0.0
        }
    }

    /// Scores over the rolling window, as shown in the live snapshot
    pub fn live_scores(&self) -> DerivedScores {
        self.derive(&self.rolling_stats())
    }
}
