//! Single-flight registry: at most one model exchange per session at a time.
//!
//! A second submission while one is outstanding would rebuild the prompt from
//! a stale turn history, so it is rejected with `SessionBusy` instead of
//! queued. Sessions are independent; the registry never blocks across ids.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InflightSessions {
    inner: Mutex<HashSet<Uuid>>,
}

impl InflightSessions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims the session for one exchange. Returns `None` if a claim is
    /// already held. The claim releases on drop, including on error paths.
    pub fn try_claim(self: &Arc<Self>, id: Uuid) -> Option<SessionClaim> {
        let mut held = self.inner.lock().expect("inflight lock poisoned");
        if held.insert(id) {
            Some(SessionClaim {
                registry: Arc::clone(self),
                id,
            })
        } else {
            None
        }
    }
}

pub struct SessionClaim {
    registry: Arc<InflightSessions>,
    id: Uuid,
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        let mut held = self
            .registry
            .inner
            .lock()
            .expect("inflight lock poisoned");
        held.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_for_same_session_is_rejected() {
        // Scenario D: concurrent submissions for one session.
        let registry = InflightSessions::new();
        let id = Uuid::new_v4();

        let first = registry.try_claim(id);
        assert!(first.is_some());
        assert!(registry.try_claim(id).is_none());

        drop(first);
        assert!(registry.try_claim(id).is_some());
    }

    #[test]
    fn test_claims_for_different_sessions_are_independent() {
        let registry = InflightSessions::new();
        let _a = registry.try_claim(Uuid::new_v4()).unwrap();
        assert!(registry.try_claim(Uuid::new_v4()).is_some());
    }

    #[test]
    fn test_claim_releases_even_when_dropped_mid_error_path() {
        let registry = InflightSessions::new();
        let id = Uuid::new_v4();
        {
            let _claim = registry.try_claim(id).unwrap();
            // simulated failure: claim dropped by unwinding scope
        }
        assert!(registry.try_claim(id).is_some());
    }
}
