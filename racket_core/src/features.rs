//! Motion feature extraction over a window of sensor samples.
//!
//! A [`FeatureSet`] is computed fresh for every classification attempt and
//! never stored. Ratios with an empty denominator fall back to 0 so the
//! extractor is total over any time-ordered input, including an empty one.

use crate::SensorSample;

/// Added to Δz² before normalizing so a flat window yields a trend of ~0
const TREND_SOFTENING: f32 = 1e-3;

/// Derived motion features for one window
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FeatureSet {
    pub peak_angular_velocity: f32,
    pub average_angular_velocity: f32,
    /// Σ|z| over the summed absolute components
    pub vertical_ratio: f32,
    /// Σ(|x|+|y|) over the same denominator as `vertical_ratio`
    pub horizontal_ratio: f32,
    /// Mean of `x - y`; negative values lean towards backhand rotation
    pub pronation_score: f32,
    /// NaN when either endpoint lacks a heart-rate reading
    pub heart_rate_delta: f32,
    pub swing_duration_millis: i64,
    /// Near +1/-1 when z moves consistently, near 0 when it returns to start
    pub directional_trend: f32,
    /// 1 for a perfectly smooth window, 0 for a jerky one
    pub stability_score: f32,
}

impl FeatureSet {
    /// Heart-rate delta with NaN treated as no change
    pub fn heart_rate_delta_or_zero(&self) -> f32 {
        if self.heart_rate_delta.is_nan() {
            0.0
        } else {
            self.heart_rate_delta
        }
    }
}

/// Extract features from a time-ordered window
pub fn extract(samples: &[SensorSample]) -> FeatureSet {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return FeatureSet::default(),
    };

    let mut peak = 0.0f32;
    let mut magnitude_sum = 0.0f32;
    let mut vertical_sum = 0.0f32;
    let mut horizontal_sum = 0.0f32;
    let mut pronation_sum = 0.0f32;
    let mut z_sum = 0.0f32;
    let mut jitter_sum = 0.0f32;

    for (i, sample) in samples.iter().enumerate() {
        let gyro = &sample.gyro;
        let magnitude = gyro.magnitude();
        peak = peak.max(magnitude);
        magnitude_sum += magnitude;
        vertical_sum += gyro.z.abs();
        horizontal_sum += gyro.x.abs() + gyro.y.abs();
        pronation_sum += gyro.x - gyro.y;
        z_sum += gyro.z;
        if i > 0 {
            jitter_sum += gyro.distance(&samples[i - 1].gyro);
        }
    }

    let count = samples.len() as f32;
    let components = vertical_sum + horizontal_sum;
    let (vertical_ratio, horizontal_ratio) = if components > 0.0 {
        (vertical_sum / components, horizontal_sum / components)
    } else {
        (0.0, 0.0)
    };

    let stability_score = if samples.len() <= 1 {
        1.0
    } else {
        let mean_jitter = jitter_sum / (samples.len() - 1) as f32;
        1.0 - mean_jitter.clamp(0.0, 1.0)
    };

    FeatureSet {
        peak_angular_velocity: peak,
        average_angular_velocity: magnitude_sum / count,
        vertical_ratio,
        horizontal_ratio,
        pronation_score: pronation_sum / count,
        heart_rate_delta: last.heart_rate_bpm - first.heart_rate_bpm,
        swing_duration_millis: last.timestamp_millis - first.timestamp_millis,
        directional_trend: directional_trend(first.gyro.z, last.gyro.z, z_sum),
        stability_score,
    }
}

fn directional_trend(first_z: f32, last_z: f32, z_sum: f32) -> f32 {
    let delta = last_z - first_z;
    let normalized = delta / (delta * delta + TREND_SOFTENING).sqrt();
    // f32::signum(0.0) is 1.0, so a balanced window is handled explicitly
    let direction = if z_sum > 0.0 {
        1.0
    } else if z_sum < 0.0 {
        -1.0
    } else {
        0.0
    };
    normalized * direction
}
