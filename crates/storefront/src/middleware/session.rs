//! Session middleware configuration.
//!
//! Sessions live in process memory. A restart signs everyone out, which is
//! acceptable because the account data itself lives in Firebase.
//!
//! Every first page view writes a session (see the visit counter), so clients
//! that never send the cookie back leave a record behind on each request.
//! [`SessionCache`] evicts records once their expiry date passes and caps the
//! total number held.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry as SessionExpiry, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vs_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Most sessions held at once. Least-used sessions are dropped past this.
pub const MAX_SESSIONS: u64 = 100_000;

/// Expire each cache entry at its record's own expiry date.
struct RecordExpiry;

fn time_left(record: &Record) -> Duration {
    (record.expiry_date - OffsetDateTime::now_utc())
        .try_into()
        .unwrap_or(Duration::ZERO)
}

impl Expiry<Id, Record> for RecordExpiry {
    fn expire_after_create(
        &self,
        _id: &Id,
        record: &Record,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(time_left(record))
    }

    fn expire_after_update(
        &self,
        _id: &Id,
        record: &Record,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(time_left(record))
    }
}

/// In-memory session store that forgets expired sessions.
#[derive(Debug, Clone)]
pub struct SessionCache {
    cache: Cache<Id, Record>,
}

impl SessionCache {
    /// Create a store holding at most `max_sessions` records.
    #[must_use]
    pub fn new(max_sessions: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_sessions)
                .expire_after(RecordExpiry)
                .build(),
        }
    }
}

#[async_trait]
impl SessionStore for SessionCache {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.cache.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .cache
            .get(id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.cache.invalidate(id).await;
        Ok(())
    }
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<SessionCache> {
    SessionManagerLayer::new(SessionCache::new(MAX_SESSIONS))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(SessionExpiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use tower_sessions::cookie::time::Duration as TimeDuration;

    use super::*;

    fn record(expires_in: TimeDuration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let store = SessionCache::new(10);
        let mut saved = record(TimeDuration::minutes(5));
        store.create(&mut saved).await.unwrap();

        let loaded = store.load(&saved.id).await.unwrap();
        assert_eq!(loaded.map(|r| r.id), Some(saved.id));

        store.delete(&saved.id).await.unwrap();
        assert!(store.load(&saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_record_is_not_loaded() {
        let store = SessionCache::new(10);
        let mut stale = record(TimeDuration::seconds(-1));
        store.create(&mut stale).await.unwrap();
        assert!(store.load(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sessions_stop_accumulating_past_capacity() {
        let store = SessionCache::new(10);
        for _ in 0..50 {
            let mut fresh = record(TimeDuration::days(7));
            store.create(&mut fresh).await.unwrap();
        }
        store.cache.run_pending_tasks().await;
        assert!(store.cache.entry_count() <= 10);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_evicted() {
        let store = SessionCache::new(1_000);
        for _ in 0..50 {
            let mut short = record(TimeDuration::milliseconds(200));
            store.create(&mut short).await.unwrap();
        }
        store.cache.run_pending_tasks().await;
        assert_eq!(store.cache.entry_count(), 50);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        store.cache.run_pending_tasks().await;
        assert_eq!(store.cache.entry_count(), 0);
    }
}
