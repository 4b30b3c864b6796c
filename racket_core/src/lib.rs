#![forbid(unsafe_code)]

//! Core detection and session logic for the racket swing tracker.
//!
//! This crate provides:
//! - Domain types (sensor samples, shot events, sessions, heart-rate zones)
//! - Window feature extraction and rule-based shot classification
//! - A debounced sliding-window detection pipeline
//! - Session aggregation with live snapshots and final summaries
//! - Session lifecycle control and persisted history
//! - Recorded sample replay from CSV

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod ids;
pub mod features;
pub mod classifier;
pub mod pipeline;
pub mod window;
pub mod aggregator;
pub mod controller;
pub mod history;
pub mod recording;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use classifier::{Rejection, ShotClassifier};
pub use pipeline::ShotDetectionPipeline;
pub use aggregator::TrainingSessionAggregator;
pub use controller::{SessionController, SessionState};
pub use history::{InMemoryRepository, JsonSessionStore, SessionRepository};
pub use recording::read_samples;
