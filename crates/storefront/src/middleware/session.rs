//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. Sessions hold the
//! visitor's backend token, account, guest cart and pending toasts.
//! Records live in a moka cache that evicts each one when its expiry
//! date passes, so abandoned visitors do not accumulate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bazaar_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on live sessions held in memory.
const SESSION_CAPACITY: u64 = 100_000;

/// Time left until `record` expires, zero once it has passed.
fn time_to_live(record: &Record) -> Duration {
    let remaining = (record.expiry_date - OffsetDateTime::now_utc()).whole_seconds();
    Duration::from_secs(u64::try_from(remaining).unwrap_or(0))
}

/// Per-entry TTL taken from the record's own expiry date.
struct RecordExpiry;

impl moka::Expiry<Id, Record> for RecordExpiry {
    fn expire_after_create(&self, _id: &Id, record: &Record, _at: Instant) -> Option<Duration> {
        Some(time_to_live(record))
    }

    fn expire_after_update(
        &self,
        _id: &Id,
        record: &Record,
        _at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(time_to_live(record))
    }
}

/// Session store backed by a moka cache with per-record expiry.
#[derive(Debug, Clone)]
pub struct SessionCache {
    records: Cache<Id, Record>,
}

impl SessionCache {
    /// Create a store holding at most `capacity` sessions.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            records: Cache::builder()
                .max_capacity(capacity)
                .expire_after(RecordExpiry)
                .build(),
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(SESSION_CAPACITY)
    }
}

#[async_trait]
impl SessionStore for SessionCache {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .records
            .get(id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.records.invalidate(id).await;
        Ok(())
    }
}

/// Create the session layer with an in-memory store.
///
/// # Arguments
///
/// * `config` - Storefront configuration (for the cookie `Secure` flag)
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<SessionCache> {
    SessionManagerLayer::new(SessionCache::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
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
    use tower_sessions::cookie::time::Duration as TimeDuration;

    use super::*;

    fn record(expires_in: TimeDuration) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_live_session_round_trips() {
        let store = SessionCache::default();
        let mut live = record(TimeDuration::hours(1));
        store.create(&mut live).await.unwrap();

        let loaded = store.load(&live.id).await.unwrap();
        assert_eq!(loaded, Some(live.clone()));

        store.delete(&live.id).await.unwrap();
        assert_eq!(store.load(&live.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_evicted() {
        let store = SessionCache::default();
        let mut stale = record(TimeDuration::seconds(-5));
        store.create(&mut stale).await.unwrap();

        assert_eq!(store.load(&stale.id).await.unwrap(), None);
        store.records.run_pending_tasks().await;
        assert_eq!(store.records.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_saving_pushes_expiry_forward() {
        let store = SessionCache::default();
        let mut session = record(TimeDuration::seconds(-5));
        store.create(&mut session).await.unwrap();

        session.expiry_date = OffsetDateTime::now_utc() + TimeDuration::hours(1);
        store.save(&session).await.unwrap();
        store.records.run_pending_tasks().await;

        assert_eq!(store.load(&session.id).await.unwrap(), Some(session));
        assert_eq!(store.records.entry_count(), 1);
    }
}
