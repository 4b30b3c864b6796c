//! Saved session history.
//!
//! Finished sessions are kept newest first and capped at a fixed count. The
//! file-backed store writes one JSON document atomically and reads it under a
//! shared lock; a corrupted file is treated as an empty history so a bad
//! write can never block recording new sessions.

use crate::{Error, Result, TrainingSession};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default number of sessions retained
pub const DEFAULT_MAX_SESSIONS: usize = 40;

/// Where finished sessions go
pub trait SessionRepository {
    /// All saved sessions, newest first
    fn history(&self) -> Result<Vec<TrainingSession>>;

    /// Save a session, replacing any earlier copy with the same id
    fn persist_session(&mut self, session: &TrainingSession) -> Result<()>;

    /// Remove every saved session
    fn clear(&mut self) -> Result<()>;
}

/// On-disk document shape
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionLog {
    #[serde(default)]
    pub sessions: Vec<TrainingSession>,
}

impl SessionLog {
    /// Put `session` first, dropping any older copy and anything past `max`
    pub fn insert(&mut self, session: &TrainingSession, max_sessions: usize) {
        self.sessions.retain(|s| s.id != session.id);
        self.sessions.insert(0, session.clone());
        self.sessions.truncate(max_sessions.max(1));
    }
}

/// Volatile repository, mostly for tests and dry runs
#[derive(Clone, Debug)]
pub struct InMemoryRepository {
    log: SessionLog,
    max_sessions: usize,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl InMemoryRepository {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            log: SessionLog::default(),
            max_sessions,
        }
    }
}

impl SessionRepository for InMemoryRepository {
    fn history(&self) -> Result<Vec<TrainingSession>> {
        Ok(self.log.sessions.clone())
    }

    fn persist_session(&mut self, session: &TrainingSession) -> Result<()> {
        self.log.insert(session, self.max_sessions);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.log.sessions.clear();
        Ok(())
    }
}

/// JSON file repository with file locking
#[derive(Clone, Debug)]
pub struct JsonSessionStore {
    path: PathBuf,
    max_sessions: usize,
}

impl JsonSessionStore {
    pub fn new(path: impl Into<PathBuf>, max_sessions: usize) -> Self {
        Self {
            path: path.into(),
            max_sessions,
        }
    }

    /// Standard location inside a data directory
    pub fn in_data_dir(data_dir: &Path, max_sessions: usize) -> Self {
        Self::new(data_dir.join("training_sessions.json"), max_sessions)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the log with a shared lock
    ///
    /// Returns an empty log if the file doesn't exist or can't be parsed.
    fn load(&self) -> Result<SessionLog> {
        if !self.path.exists() {
            return Ok(SessionLog::default());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<SessionLog>(&contents) {
            Ok(log) => {
                tracing::debug!(
                    "Loaded {} sessions from {:?}",
                    log.sessions.len(),
                    self.path
                );
                Ok(log)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse session history {:?}: {}. Starting empty.",
                    self.path,
                    e
                );
                Ok(SessionLog::default())
            }
        }
    }

    /// Atomically replace the log on disk
    ///
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original
    fn save(&self, log: &SessionLog) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => {
                return Err(Error::History(format!(
                    "history path {:?} has no parent directory",
                    self.path
                )))
            }
        };
        std::fs::create_dir_all(&parent)?;

        let temp = NamedTempFile::new_in(&parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, log)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} sessions to {:?}", log.sessions.len(), self.path);
        Ok(())
    }
}

impl SessionRepository for JsonSessionStore {
    fn history(&self) -> Result<Vec<TrainingSession>> {
        Ok(self.load()?.sessions)
    }

    fn persist_session(&mut self, session: &TrainingSession) -> Result<()> {
        let mut log = self.load()?;
        log.insert(session, self.max_sessions);
        self.save(&log)?;
        tracing::info!("Persisted session {}", session.id);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.save(&SessionLog::default())?;
        tracing::info!("Cleared session history at {:?}", self.path);
        Ok(())
    }
}
