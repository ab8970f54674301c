use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use snowtrip_core::{Clock, DialogueContext, NewTrip, SystemClock, TripRecord};
use uuid::Uuid;

/// Downstream collaborator that persists confirmed trips.
pub trait TripRepository: Send + Sync {
    async fn create_trip(&self, trip: NewTrip) -> Result<TripRecord>;
    async fn list_trips(&self) -> Result<Vec<TripRecord>>;
    /// `Ok(false)` when no trip has that id.
    async fn delete_trip(&self, trip_id: &str) -> Result<bool>;
}

/// One conversation's context, kept between turns until `expires_at`.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    pub session_id: String,
    pub context: DialogueContext,
    pub expires_at: DateTime<Utc>,
}

pub trait SessionRepository: Send + Sync {
    /// Expired sessions read as missing even before they are purged.
    async fn load_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DialogueSession>>;
    async fn upsert_session(&self, session: DialogueSession) -> Result<()>;
    async fn remove_session(&self, session_id: &str) -> Result<bool>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, DialogueSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionRepository for MemorySessionStore {
    async fn load_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DialogueSession>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .filter(|session| session.expires_at > now)
            .cloned())
    }

    async fn upsert_session(&self, session: DialogueSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn remove_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.sessions.write().remove(session_id).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0_u64;
        self.sessions.write().retain(|_, session| {
            let keep = session.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }
}

#[derive(Clone)]
pub struct MemoryTripStore {
    trips: Arc<RwLock<HashMap<String, TripRecord>>>,
    clock: Arc<dyn Clock>,
    failure: Arc<RwLock<Option<String>>>,
}

impl Default for MemoryTripStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock::default()))
    }
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            trips: Arc::new(RwLock::new(HashMap::new())),
            clock,
            failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Makes every following `create_trip` fail with `message` until cleared
    /// with `None`. Used to exercise the creation-failure path.
    pub fn fail_creations(&self, message: Option<&str>) {
        *self.failure.write() = message.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        self.trips.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.read().is_empty()
    }
}

impl TripRepository for MemoryTripStore {
    async fn create_trip(&self, trip: NewTrip) -> Result<TripRecord> {
        let failure = self.failure.read().clone();
        if let Some(message) = failure {
            bail!(message);
        }
        let record = TripRecord::from_new(Uuid::new_v4().to_string(), trip, self.clock.now());
        self.trips
            .write()
            .insert(record.trip_id.clone(), record.clone());
        Ok(record)
    }

    async fn list_trips(&self) -> Result<Vec<TripRecord>> {
        let mut trips = self.trips.read().values().cloned().collect::<Vec<_>>();
        trips.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(trips)
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        Ok(self.trips.write().remove(trip_id).is_some())
    }
}
