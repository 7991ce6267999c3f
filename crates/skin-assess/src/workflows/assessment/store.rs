use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AnswerRecord, AssessmentResult};

/// Identifier for one user's pass through the funnel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keys the funnel pages share through the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    AssessmentData,
    QuestionnaireData,
    UploadedImage,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::AssessmentData => "assessmentData",
            StoreKey::QuestionnaireData => "questionnaireData",
            StoreKey::UploadedImage => "uploadedImage",
        }
    }
}

/// Session-scoped key-value storage so the handoff can be faked in tests.
pub trait SessionStore: Send + Sync {
    fn put(&self, session: &SessionId, key: StoreKey, value: String) -> Result<(), StoreError>;
    fn get(&self, session: &SessionId, key: StoreKey) -> Result<Option<String>, StoreError>;
    fn clear(&self, session: &SessionId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("stored {key} is not valid JSON: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not serialize {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

struct SessionSlot {
    values: HashMap<StoreKey, String>,
    touched_at: DateTime<Utc>,
}

/// In-process store whose sessions vanish after an idle window.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionSlot>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every session idle since before `now - idle_timeout`; returns how many were dropped.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|_, slot| now - slot.touched_at <= self.idle_timeout);
        before - guard.len()
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, session: &SessionId, key: StoreKey, value: String) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut guard = self.lock();
        let slot = guard.entry(session.clone()).or_insert_with(|| SessionSlot {
            values: HashMap::new(),
            touched_at: now,
        });
        slot.values.insert(key, value);
        slot.touched_at = now;
        Ok(())
    }

    fn get(&self, session: &SessionId, key: StoreKey) -> Result<Option<String>, StoreError> {
        let now = Utc::now();
        let mut guard = self.lock();
        match guard.get_mut(session) {
            None => return Ok(None),
            Some(slot) if now - slot.touched_at <= self.idle_timeout => {
                slot.touched_at = now;
                return Ok(slot.values.get(&key).cloned());
            }
            Some(_) => {}
        }
        guard.remove(session);
        Ok(None)
    }

    fn clear(&self, session: &SessionId) -> Result<(), StoreError> {
        self.lock().remove(session);
        Ok(())
    }
}

/// Typed reads and writes of the funnel handoff over any [`SessionStore`].
pub struct SessionHandoff<S> {
    store: Arc<S>,
}

impl<S> Clone for SessionHandoff<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SessionStore> SessionHandoff<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Write everything the result pages read, replacing whatever the session held before.
    pub fn publish(
        &self,
        session: &SessionId,
        image_ref: &str,
        answers: &AnswerRecord,
        result: &AssessmentResult,
    ) -> Result<(), StoreError> {
        let assessment = encode(StoreKey::AssessmentData, result)?;
        let questionnaire = encode(StoreKey::QuestionnaireData, answers)?;

        self.store
            .put(session, StoreKey::UploadedImage, image_ref.to_string())?;
        self.store
            .put(session, StoreKey::QuestionnaireData, questionnaire)?;
        self.store
            .put(session, StoreKey::AssessmentData, assessment)
    }

    pub fn assessment(&self, session: &SessionId) -> Result<Option<AssessmentResult>, StoreError> {
        self.read(session, StoreKey::AssessmentData)
    }

    pub fn answers(&self, session: &SessionId) -> Result<Option<AnswerRecord>, StoreError> {
        self.read(session, StoreKey::QuestionnaireData)
    }

    pub fn uploaded_image(&self, session: &SessionId) -> Result<Option<String>, StoreError> {
        self.store.get(session, StoreKey::UploadedImage)
    }

    /// Forget the session, as when the user starts over at the entry page.
    pub fn reset(&self, session: &SessionId) -> Result<(), StoreError> {
        self.store.clear(session)
    }

    fn read<T: serde::de::DeserializeOwned>(
        &self,
        session: &SessionId,
        key: StoreKey,
    ) -> Result<Option<T>, StoreError> {
        match self.store.get(session, key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: key.as_str(),
                    source,
                }),
        }
    }
}

fn encode<T: Serialize>(key: StoreKey, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.as_str(),
        source,
    })
}
