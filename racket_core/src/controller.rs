//! Session lifecycle: start, stream samples, stop and optionally save.

use crate::aggregator::TrainingSessionAggregator;
use crate::classifier::ShotClassifier;
use crate::config::Config;
use crate::history::SessionRepository;
use crate::ids::{random_ids, SharedIds};
use crate::pipeline::ShotDetectionPipeline;
use crate::{Error, Result, SensorSample, ShotEvent, TrainingSession, TrainingSessionSnapshot};

/// Where the controller is in a session's life
#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Idle,
    Running,
    /// Holds the most recently stopped session
    Finished(TrainingSession),
}

/// Owns the detection pipeline and aggregator for one session at a time
#[derive(Debug)]
pub struct SessionController {
    pipeline: ShotDetectionPipeline,
    aggregator: TrainingSessionAggregator,
    min_persist_duration_millis: i64,
    state: SessionState,
}

impl SessionController {
    pub fn new(config: &Config) -> Self {
        Self::with_ids(config, random_ids())
    }

    /// Use a specific id source for shots and sessions
    pub fn with_ids(config: &Config, ids: SharedIds) -> Self {
        let classifier = ShotClassifier::with_ids(config.classifier.clone(), ids.clone());
        Self {
            pipeline: ShotDetectionPipeline::new(classifier, config.pipeline.clone()),
            aggregator: TrainingSessionAggregator::with_ids(config.session.clone(), ids),
            min_persist_duration_millis: config.session.min_persist_duration_millis,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Begin a session at `now_millis`; does nothing if one is running
    pub fn start(&mut self, now_millis: i64) {
        if self.is_running() {
            tracing::debug!("Session already running, ignoring start");
            return;
        }
        self.pipeline.reset();
        self.aggregator.reset(now_millis);
        self.state = SessionState::Running;
        tracing::info!("Session started at {} ms", now_millis);
    }

    /// Feed one sample, returning the shot it completed if any
    pub fn ingest(&mut self, sample: SensorSample) -> Result<Option<ShotEvent>> {
        if !self.is_running() {
            return Err(Error::Session("no session is running".into()));
        }

        self.aggregator.on_sample(&sample);
        let event = self.pipeline.add_sample(sample);
        if let Some(ref event) = event {
            self.aggregator.on_shot(event.clone());
        }
        Ok(event)
    }

    /// Live view of the running session
    pub fn snapshot(&self, now_millis: i64) -> Option<TrainingSessionSnapshot> {
        if self.is_running() {
            Some(self.aggregator.snapshot(now_millis))
        } else {
            None
        }
    }

    /// Finish the running session
    ///
    /// When `save` is set, the session is written to `repository` if it
    /// recorded a shot or lasted at least the minimum persist duration. A
    /// failed write leaves the session running so the caller can retry.
    pub fn stop(
        &mut self,
        now_millis: i64,
        save: bool,
        repository: &mut dyn SessionRepository,
    ) -> Result<TrainingSession> {
        if !self.is_running() {
            return Err(Error::Session("cannot stop: no session is running".into()));
        }

        let session = self.aggregator.build_session(now_millis);
        if save {
            if self.is_worth_keeping(&session) {
                repository.persist_session(&session)?;
            } else {
                tracing::info!(
                    "Not saving session {}: no shots in {} ms",
                    session.id,
                    session.summary.duration_millis
                );
            }
        }

        self.state = SessionState::Finished(session.clone());
        Ok(session)
    }

    /// Drop the running session without building a summary
    pub fn abort(&mut self) {
        if self.is_running() {
            tracing::info!("Session aborted");
        }
        self.pipeline.reset();
        self.state = SessionState::Idle;
    }

    pub fn is_worth_keeping(&self, session: &TrainingSession) -> bool {
        session.summary.total_shots > 0
            || session.summary.duration_millis >= self.min_persist_duration_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::{build_samples, SMASH};
    use crate::history::InMemoryRepository;
    use crate::ids::SequentialIds;
    use crate::{ShotType, Vector3};
    use std::sync::Arc;

    fn controller() -> SessionController {
        SessionController::with_ids(&Config::default(), Arc::new(SequentialIds::new()))
    }

    fn quiet_sample(timestamp: i64) -> SensorSample {
        SensorSample::new(timestamp, Vector3::new(0.05, 0.05, 0.05), 95.0)
    }

    #[test]
    fn test_full_session_is_saved() {
        crate::logging::init_test();
        let mut controller = controller();
        let mut repo = InMemoryRepository::default();
        controller.start(0);

        let shots: Vec<_> = build_samples(&SMASH, 118.0, 124.0, 1_000, 40)
            .into_iter()
            .filter_map(|s| controller.ingest(s).unwrap())
            .collect();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].shot_type, ShotType::Smash);

        let snapshot = controller.snapshot(2_000).unwrap();
        assert_eq!(snapshot.total_shots, 1);
        assert_eq!(snapshot.started_at_millis, 0);

        let session = controller.stop(2_000, true, &mut repo).unwrap();
        assert_eq!(session.summary.total_shots, 1);
        assert_eq!(session.summary.duration_millis, 2_000);
        assert_eq!(session.shots, shots);

        let history = repo.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, session.id);
        assert!(matches!(controller.state(), SessionState::Finished(s) if s.id == session.id));
        assert!(controller.snapshot(2_000).is_none());
    }

    #[test]
    fn test_short_shotless_session_not_saved() {
        let mut controller = controller();
        let mut repo = InMemoryRepository::default();
        controller.start(0);
        for t in (0..5_000).step_by(100) {
            assert!(controller.ingest(quiet_sample(t)).unwrap().is_none());
        }

        let session = controller.stop(5_000, true, &mut repo).unwrap();
        assert_eq!(session.summary.total_shots, 0);
        assert!(repo.history().unwrap().is_empty());
    }

    #[test]
    fn test_long_shotless_session_saved() {
        let mut controller = controller();
        let mut repo = InMemoryRepository::default();
        controller.start(0);
        controller.ingest(quiet_sample(0)).unwrap();

        controller.stop(90_000, true, &mut repo).unwrap();
        assert_eq!(repo.history().unwrap().len(), 1);
    }

    #[test]
    fn test_stop_without_save_skips_repository() {
        let mut controller = controller();
        let mut repo = InMemoryRepository::default();
        controller.start(0);
        for sample in build_samples(&SMASH, 118.0, 124.0, 0, 40) {
            controller.ingest(sample).unwrap();
        }

        let session = controller.stop(1_000, false, &mut repo).unwrap();
        assert_eq!(session.summary.total_shots, 1);
        assert!(repo.history().unwrap().is_empty());
    }

    #[test]
    fn test_ingest_and_stop_require_running_session() {
        let mut controller = controller();
        let mut repo = InMemoryRepository::default();

        assert!(matches!(
            controller.ingest(quiet_sample(0)),
            Err(Error::Session(_))
        ));
        assert!(matches!(
            controller.stop(0, true, &mut repo),
            Err(Error::Session(_))
        ));

        controller.start(0);
        controller.stop(10, false, &mut repo).unwrap();
        assert!(matches!(
            controller.ingest(quiet_sample(20)),
            Err(Error::Session(_))
        ));
    }

    #[test]
    fn test_start_while_running_keeps_session() {
        let mut controller = controller();
        controller.start(100);
        controller.ingest(quiet_sample(150)).unwrap();
        controller.start(900);

        let snapshot = controller.snapshot(1_000).unwrap();
        assert_eq!(snapshot.started_at_millis, 100);
        assert_eq!(snapshot.current_heart_rate, 95.0);
    }

    #[test]
    fn test_restart_after_stop_is_fresh() {
        let mut controller = controller();
        let mut repo = InMemoryRepository::default();
        controller.start(0);
        for sample in build_samples(&SMASH, 118.0, 124.0, 0, 40) {
            controller.ingest(sample).unwrap();
        }
        let first = controller.stop(1_000, true, &mut repo).unwrap();

        controller.start(5_000);
        let snapshot = controller.snapshot(5_000).unwrap();
        assert_eq!(snapshot.total_shots, 0);
        assert_eq!(snapshot.started_at_millis, 5_000);

        // Same swing again is not debounced against the previous session
        let again: Vec<_> = build_samples(&SMASH, 118.0, 124.0, 5_000, 40)
            .into_iter()
            .filter_map(|s| controller.ingest(s).unwrap())
            .collect();
        assert_eq!(again.len(), 1);

        let second = controller.stop(6_000, true, &mut repo).unwrap();
        assert_ne!(first.id, second.id);
        let history = repo.history().unwrap();
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let mut controller = controller();
        controller.start(0);
        controller.ingest(quiet_sample(0)).unwrap();
        controller.abort();

        assert_eq!(controller.state(), &SessionState::Idle);
        assert!(controller.snapshot(10).is_none());
    }
}
