//! Sliding-window detection pipeline.
//!
//! One physical swing produces many consecutive samples that would each
//! satisfy the classifier on their own. The pipeline therefore:
//! 1. keeps a trailing window bounded both in time and in sample count, and
//! 2. drops any shot that arrives within the minimum gap of the last one.

use crate::classifier::{Rejection, ShotClassifier};
use crate::config::PipelineConfig;
use crate::{SensorSample, ShotEvent};
use std::collections::VecDeque;

/// Feeds sensor samples through the classifier and debounces the results
#[derive(Clone, Debug)]
pub struct ShotDetectionPipeline {
    classifier: ShotClassifier,
    config: PipelineConfig,
    /// Preallocated to `max_window_samples` and never grown past it
    buffer: VecDeque<SensorSample>,
    last_emitted_at: Option<i64>,
}

impl ShotDetectionPipeline {
    pub fn new(classifier: ShotClassifier, config: PipelineConfig) -> Self {
        let capacity = config.max_window_samples.max(1);
        Self {
            classifier,
            config,
            buffer: VecDeque::with_capacity(capacity),
            last_emitted_at: None,
        }
    }

    /// Pipeline with default window settings
    pub fn with_classifier(classifier: ShotClassifier) -> Self {
        Self::new(classifier, PipelineConfig::default())
    }

    /// Forget buffered samples and the debounce marker
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_emitted_at = None;
    }

    /// Number of samples currently in the window
    pub fn window_len(&self) -> usize {
        self.buffer.len()
    }

    /// Push a sample and return a shot if one was accepted
    pub fn add_sample(&mut self, sample: SensorSample) -> Option<ShotEvent> {
        match self.process(sample) {
            Ok(event) => {
                tracing::debug!(
                    "Shot detected: {:?} at {} ms (confidence {:.2})",
                    event.shot_type,
                    event.timestamp_millis,
                    event.confidence
                );
                Some(event)
            }
            Err(rejection) => {
                tracing::trace!(
                    "No shot at {} ms: {:?}",
                    sample.timestamp_millis,
                    rejection
                );
                None
            }
        }
    }

    /// Push a sample and explain the outcome
    pub fn process(&mut self, sample: SensorSample) -> Result<ShotEvent, Rejection> {
        self.push(sample);

        let candidate = self.classifier.evaluate(self.buffer.make_contiguous())?;

        if let Some(last) = self.last_emitted_at {
            let since_last_millis = candidate.timestamp_millis - last;
            if since_last_millis < self.config.minimum_gap_millis {
                return Err(Rejection::Debounced {
                    shot_type: candidate.shot_type,
                    since_last_millis,
                });
            }
        }

        self.last_emitted_at = Some(candidate.timestamp_millis);
        Ok(candidate)
    }

    fn push(&mut self, sample: SensorSample) {
        let capacity = self.config.max_window_samples.max(1);
        while self.buffer.len() >= capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(sample);

        let window_start = sample.timestamp_millis - self.config.window_duration_millis;
        while self
            .buffer
            .front()
            .is_some_and(|oldest| oldest.timestamp_millis < window_start)
        {
            self.buffer.pop_front();
        }
    }
}
