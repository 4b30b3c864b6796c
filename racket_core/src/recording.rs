//! Recorded sensor streams.
//!
//! A recording is a CSV file with one sample per row:
//!
//! ```text
//! timestamp_millis,gyro_x,gyro_y,gyro_z,heart_rate_bpm,accuracy
//! 1000,0.3,0.5,-1.5,118,3
//! 1040,0.5,0.6,-4.0,,3
//! ```
//!
//! An empty heart rate means the sensor had no reading. Rows that fail to
//! parse or go back in time are skipped with a warning.

use crate::{Error, Result, SensorSample, Vector3};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// CSV row format for recorded samples
#[derive(Debug, Deserialize)]
struct SampleRow {
    timestamp_millis: i64,
    gyro_x: f32,
    gyro_y: f32,
    gyro_z: f32,
    #[serde(default)]
    heart_rate_bpm: Option<f32>,
    #[serde(default)]
    accuracy: Option<i32>,
}

impl TryFrom<SampleRow> for SensorSample {
    type Error = Error;

    fn try_from(row: SampleRow) -> Result<Self> {
        let gyro = Vector3::new(row.gyro_x, row.gyro_y, row.gyro_z);
        if !(gyro.x.is_finite() && gyro.y.is_finite() && gyro.z.is_finite()) {
            return Err(Error::Recording(format!(
                "non-finite gyro reading at {} ms",
                row.timestamp_millis
            )));
        }

        Ok(SensorSample {
            timestamp_millis: row.timestamp_millis,
            gyro,
            heart_rate_bpm: row.heart_rate_bpm.unwrap_or(f32::NAN),
            accuracy: row.accuracy.unwrap_or(0),
        })
    }
}

/// Load all usable samples from a recording file
pub fn read_samples(path: &Path) -> Result<Vec<SensorSample>> {
    let file = std::fs::File::open(path)?;
    let samples = parse_samples(file)?;
    tracing::info!("Loaded {} samples from {:?}", samples.len(), path);
    Ok(samples)
}

/// Parse samples from any CSV source
pub fn parse_samples<R: Read>(source: R) -> Result<Vec<SensorSample>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut samples: Vec<SensorSample> = Vec::new();
    for result in reader.deserialize::<SampleRow>() {
        let sample = match result.map_err(Error::from).and_then(SensorSample::try_from) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!("Skipping recording row: {}", e);
                continue;
            }
        };

        if let Some(previous) = samples.last() {
            if sample.timestamp_millis < previous.timestamp_millis {
                tracing::warn!(
                    "Skipping out-of-order sample at {} ms (previous {} ms)",
                    sample.timestamp_millis,
                    previous.timestamp_millis
                );
                continue;
            }
        }
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(Error::Recording("recording contains no usable samples".into()));
    }
    Ok(samples)
}
