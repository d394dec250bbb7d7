// std::sync::Mutex guards the map; locks are never held across await points.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};

use tiendy_core::UserId;

use crate::clock::Clock;

/// Inactivity after which a session is expired. Fixed policy, not config.
pub const SESSION_TTL_SECS: i64 = 15 * 60;
/// Inactivity at which the 3-minutes-remaining warning is sent.
pub const WARNING_AT_SECS: i64 = 12 * 60;
/// Inactivity at which the conversation is returned to the main menu.
pub const CONTEXT_RESET_AT_SECS: i64 = 8 * 60;
/// Cadence of the session monitor sweep.
pub const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub warning_sent: bool,
    pub expiry_notice_sent: bool,
    pub context_reset_sent: bool,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_activity_at: now,
            warning_sent: false,
            expiry_notice_sent: false,
            context_reset_sent: false,
        }
    }
}

/// Per-user session records. A record exists iff the user has an active,
/// non-expired conversation (expired records are removed on detection).
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { sessions: Mutex::new(HashMap::new()), clock }
    }

    pub fn exists(&self, user: &UserId) -> bool {
        self.sessions.lock().expect("session mutex poisoned").contains_key(user)
    }

    /// Creates or refreshes the session. Refreshing resets the notice flags:
    /// the message begins a new inactivity window.
    pub fn touch(&self, user: &UserId) {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .entry(user.clone())
            .and_modify(|session| {
                session.last_activity_at = now;
                session.warning_sent = false;
                session.expiry_notice_sent = false;
                session.context_reset_sent = false;
            })
            .or_insert_with(|| Session::new(now));
    }

    /// Refreshes activity without resetting the notice flags. Used by the
    /// monitor so its own context reset neither refires nor counts as user
    /// activity toward the notices already sent.
    pub fn refresh_activity(&self, user: &UserId) {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        if let Some(session) = sessions.get_mut(user) {
            session.last_activity_at = now;
        }
    }

    /// True iff a session exists and its inactivity exceeds the TTL. A
    /// non-existent session is "new", not "expired".
    pub fn is_expired(&self, user: &UserId) -> bool {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        match sessions.get(user) {
            Some(session) => {
                (self.clock.now() - session.last_activity_at).num_seconds() > SESSION_TTL_SECS
            }
            None => false,
        }
    }

    pub fn remove(&self, user: &UserId) {
        self.sessions.lock().expect("session mutex poisoned").remove(user);
    }

    /// One-shot flag setters: return true only when the flag was newly set,
    /// so each notice fires at most once per inactivity window.
    pub fn mark_warning_sent(&self, user: &UserId) -> bool {
        self.mark(user, |session| &mut session.warning_sent)
    }

    pub fn mark_expiry_notice_sent(&self, user: &UserId) -> bool {
        self.mark(user, |session| &mut session.expiry_notice_sent)
    }

    pub fn mark_context_reset_sent(&self, user: &UserId) -> bool {
        self.mark(user, |session| &mut session.context_reset_sent)
    }

    fn mark(&self, user: &UserId, flag: impl FnOnce(&mut Session) -> &mut bool) -> bool {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        match sessions.get_mut(user) {
            Some(session) => {
                let flag = flag(session);
                if *flag {
                    false
                } else {
                    *flag = true;
                    true
                }
            }
            None => false,
        }
    }

    /// Point-in-time copy of all sessions for the monitor sweep.
    pub fn snapshot(&self) -> Vec<(UserId, Session)> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.iter().map(|(user, session)| (user.clone(), session.clone())).collect()
    }
}
