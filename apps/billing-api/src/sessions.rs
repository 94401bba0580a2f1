//! Concurrent login tracking.
//!
//! Each successful login opens a session keyed by the token's `jti`. A user
//! holding as many live sessions as their role allows is refused until one
//! logs out or expires. The registry is in memory, so a restart forgets
//! every session.

use chrono::Utc;
use dashmap::DashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Session {
    id: String,
    expires_at: i64,
}

/// Live sessions per user id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Vec<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a session unless `user_id` already holds `limit` live ones.
    ///
    /// Check and insert happen under the same map entry lock, so two logins
    /// racing for the last slot cannot both win.
    ///
    /// ## Returns
    /// `Err(active)` with the number of live sessions when the limit is reached.
    pub fn try_open(&self, user_id: &str, session_id: &str, expires_at: i64, limit: usize) -> Result<(), usize> {
        let now = Utc::now().timestamp();
        let mut live = self.sessions.entry(user_id.to_string()).or_default();
        live.retain(|session| session.expires_at > now);

        if live.len() >= limit {
            return Err(live.len());
        }

        live.push(Session {
            id: session_id.to_string(),
            expires_at,
        });
        Ok(())
    }

    /// Ends one session. Returns `false` if it was not open.
    pub fn close(&self, user_id: &str, session_id: &str) -> bool {
        let closed = match self.sessions.get_mut(user_id) {
            Some(mut live) => {
                let before = live.len();
                live.retain(|session| session.id != session_id);
                live.len() < before
            }
            None => false,
        };

        self.sessions.remove_if(user_id, |_, live| live.is_empty());
        closed
    }

    /// Live sessions for `user_id`.
    pub fn active_count(&self, user_id: &str) -> usize {
        let now = Utc::now().timestamp();
        self.sessions
            .get(user_id)
            .map(|live| live.iter().filter(|session| session.expires_at > now).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn in_an_hour() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_limit_enforced_per_user() {
        let registry = SessionRegistry::new();
        assert!(registry.try_open("owner", "a", in_an_hour(), 1).is_ok());
        assert_eq!(registry.try_open("owner", "b", in_an_hour(), 1), Err(1));
        assert!(registry.try_open("cashier", "c", in_an_hour(), 1).is_ok());
        assert_eq!(registry.active_count("owner"), 1);
    }

    #[test]
    fn test_close_frees_a_slot() {
        let registry = SessionRegistry::new();
        registry.try_open("owner", "a", in_an_hour(), 1).unwrap();

        assert!(registry.close("owner", "a"));
        assert!(!registry.close("owner", "a"));
        assert_eq!(registry.active_count("owner"), 0);
        assert!(registry.try_open("owner", "b", in_an_hour(), 1).is_ok());
    }

    #[test]
    fn test_expired_sessions_do_not_count() {
        let registry = SessionRegistry::new();
        let past = Utc::now().timestamp() - 1;
        registry.try_open("owner", "stale", past, 1).unwrap();

        assert_eq!(registry.active_count("owner"), 0);
        assert!(registry.try_open("owner", "fresh", in_an_hour(), 1).is_ok());
    }

    #[test]
    fn test_racing_logins_share_the_limit() {
        let registry = Arc::new(SessionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry
                        .try_open("cashier", &format!("s{}", i), in_an_hour(), 5)
                        .is_ok()
                })
            })
            .collect();

        let opened = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(opened, 5);
        assert_eq!(registry.active_count("cashier"), 5);
    }
}
