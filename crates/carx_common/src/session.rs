//! Session Store - per-conversation state with inactivity expiry
//!
//! v2.0.0: One authoritative store, injected into the adapters.
//!
//! ## Rules
//!
//! 1. **Lazy expiry**: every `get_or_create` sweeps sessions idle longer than
//!    the timeout (30 minutes by default). `sweep_expired` can also be called
//!    from a timer.
//! 2. **Bounded context**: the exchange log keeps the most recent N entries
//!    (10 by default), oldest dropped first.
//! 3. **Injected clock**: every time-dependent call has an `_at` variant.

use crate::config::SessionConfig;
use crate::language::Language;
use crate::profile::UserProfile;
use crate::query_analyzer::IntentCategory;
use crate::responder::ResponseKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One user message and how it was answered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub intent: IntentCategory,
    pub reply_kind: ResponseKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Most recent exchanges, oldest first
    pub context: VecDeque<Exchange>,
    pub profile: UserProfile,
    pub message_count: u64,
    pub last_query: Option<String>,
}

impl Session {
    fn new(id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            language: Language::En,
            created_at: now,
            last_active: now,
            context: VecDeque::new(),
            profile: UserProfile::new(id),
            message_count: 0,
            last_query: None,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_active > timeout
    }
}

/// Partial update applied by `SessionStore::update`
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub language: Option<Language>,
    pub last_query: Option<String>,
    pub profile: Option<UserProfile>,
}

pub struct SessionStore {
    sessions: HashMap<String, Session>,
    timeout: Duration,
    max_context: usize,
}

impl SessionStore {
    pub fn new(timeout: Duration, max_context: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            timeout,
            max_context,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            Duration::minutes(config.timeout_minutes),
            config.max_context,
        )
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_or_create(&mut self, id: &str) -> &mut Session {
        self.get_or_create_at(id, Utc::now())
    }

    pub fn get_or_create_at(&mut self, id: &str, now: DateTime<Utc>) -> &mut Session {
        self.sweep_expired(now);
        self.sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!("New session {}", id);
            Session::new(id, now)
        })
    }

    /// Remove idle sessions, returning how many were dropped
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let timeout = self.timeout;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now, timeout));
        let removed = before - self.sessions.len();
        if removed > 0 {
            tracing::info!("Expired {} idle session(s)", removed);
        }
        removed
    }

    /// Apply an update. Returns false if the session does not exist.
    pub fn update(&mut self, id: &str, update: SessionUpdate) -> bool {
        self.update_at(id, update, Utc::now())
    }

    pub fn update_at(&mut self, id: &str, update: SessionUpdate, now: DateTime<Utc>) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        if let Some(language) = update.language {
            session.language = language;
        }
        if let Some(query) = update.last_query {
            session.last_query = Some(query);
        }
        if let Some(profile) = update.profile {
            session.profile = profile;
        }
        session.last_active = now;
        true
    }

    /// Append to the context log, dropping the oldest entries beyond the cap
    pub fn record_exchange(&mut self, id: &str, exchange: Exchange) -> bool {
        let max_context = self.max_context;
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        session.last_active = exchange.timestamp;
        session.message_count += 1;
        session.context.push_back(exchange);
        while session.context.len() > max_context {
            session.context.pop_front();
        }
        true
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-06T19:18:22Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn exchange(n: usize, at: DateTime<Utc>) -> Exchange {
        Exchange {
            timestamp: at,
            query: format!("question {}", n),
            intent: IntentCategory::Information,
            reply_kind: ResponseKind::Normal,
        }
    }

    #[test]
    fn test_same_id_returns_same_session() {
        let mut store = SessionStore::default();
        store.get_or_create_at("alice", t0()).language = Language::Ar;
        let again = store.get_or_create_at("alice", t0() + Duration::minutes(5));
        assert_eq!(again.language, Language::Ar);
        assert_eq!(again.created_at, t0());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_idle_session_is_replaced() {
        let mut store = SessionStore::default();
        store.get_or_create_at("alice", t0()).language = Language::Ar;

        let later = t0() + Duration::minutes(31);
        let fresh = store.get_or_create_at("alice", later);
        assert_eq!(fresh.language, Language::En);
        assert_eq!(fresh.created_at, later);
    }

    #[test]
    fn test_exactly_thirty_minutes_is_kept() {
        let mut store = SessionStore::default();
        store.get_or_create_at("alice", t0());
        let session = store.get_or_create_at("alice", t0() + Duration::minutes(30));
        assert_eq!(session.created_at, t0());
    }

    #[test]
    fn test_sweep_removes_other_idle_sessions() {
        let mut store = SessionStore::default();
        store.get_or_create_at("alice", t0());
        store.get_or_create_at("bob", t0() + Duration::minutes(20));

        store.get_or_create_at("carol", t0() + Duration::minutes(45));
        assert!(store.get("alice").is_none());
        assert!(store.get("bob").is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_touches_session() {
        let mut store = SessionStore::default();
        store.get_or_create_at("alice", t0());
        let updated = store.update_at(
            "alice",
            SessionUpdate {
                language: Some(Language::Ar),
                last_query: Some("سؤال".to_string()),
                ..Default::default()
            },
            t0() + Duration::minutes(25),
        );
        assert!(updated);

        // Still alive 25 minutes after the update, 50 after creation
        let session = store.get_or_create_at("alice", t0() + Duration::minutes(50));
        assert_eq!(session.language, Language::Ar);
        assert_eq!(session.last_query.as_deref(), Some("سؤال"));

        assert!(!store.update_at("nobody", SessionUpdate::default(), t0()));
    }

    #[test]
    fn test_context_is_fifo_capped() {
        let mut store = SessionStore::default();
        store.get_or_create_at("alice", t0());
        for n in 0..13 {
            store.record_exchange("alice", exchange(n, t0() + Duration::seconds(n as i64)));
        }
        let session = store.get("alice").unwrap();
        assert_eq!(session.context.len(), 10);
        assert_eq!(session.context.front().unwrap().query, "question 3");
        assert_eq!(session.context.back().unwrap().query, "question 12");
        assert_eq!(session.message_count, 13);
    }
}
