//! Session Manager - token lifetime and activity-based renewal
//!
//! Tracks the current token, when it expires and when the user was last
//! active. Every mutation is written through to the [`TokenStore`] as one
//! record.

use super::clock::Clock;
use super::store::{StoredSession, TokenStore};
use chrono::{DateTime, Duration, Utc};
use dihadi_core::{DihadiResult, SessionWindows, UserSummary};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of reporting user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// Expiry moved to a full window from now
    Renewed,
    /// A warning is on screen; only an explicit extension renews now
    WarningActive,
    /// There is no valid session to renew
    NoSession,
}

pub struct SessionManager {
    windows: SessionWindows,
    clock: Arc<dyn Clock>,
    store: Box<dyn TokenStore>,
    session: Option<StoredSession>,
    warning_shown: bool,
}

impl SessionManager {
    pub fn new(windows: SessionWindows, clock: Arc<dyn Clock>, store: Box<dyn TokenStore>) -> Self {
        Self {
            windows,
            clock,
            store,
            session: None,
            warning_shown: false,
        }
    }

    pub fn windows(&self) -> &SessionWindows {
        &self.windows
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load the stored record. A record past its storage expiry is deleted.
    pub fn restore(&mut self) -> DihadiResult<Option<&StoredSession>> {
        let stored = self.store.load()?;
        let now = self.now();

        self.session = match stored {
            Some(record) if record.persist_until <= now => {
                debug!("Stored session past its storage expiry, discarding");
                self.store.clear()?;
                None
            }
            other => other,
        };
        self.warning_shown = false;

        Ok(self.session.as_ref())
    }

    pub fn set_session(&mut self, token: impl Into<String>, remember: bool) -> DihadiResult<()> {
        self.start_session(token.into(), remember, None)
    }

    /// Start a session for a known user
    pub fn set_session_for(
        &mut self,
        user: UserSummary,
        token: impl Into<String>,
        remember: bool,
    ) -> DihadiResult<()> {
        self.start_session(token.into(), remember, Some(user))
    }

    fn start_session(
        &mut self,
        token: String,
        remember: bool,
        user: Option<UserSummary>,
    ) -> DihadiResult<()> {
        let now = self.now();
        let window = self.windows.duration(remember);
        let record = StoredSession {
            token,
            expires_at: now + window,
            last_activity: now,
            remember,
            persist_until: now + window,
            user,
        };

        self.store.save(&record)?;
        info!(
            remember,
            expires_at = %record.expires_at,
            "Session started"
        );
        self.session = Some(record);
        self.warning_shown = false;
        Ok(())
    }

    /// Replace the cached user without touching the expiry
    pub fn set_user(&mut self, user: UserSummary) -> DihadiResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let updated = StoredSession {
            user: Some(user),
            ..session.clone()
        };
        self.store.save(&updated)?;
        *session = updated;
        Ok(())
    }

    pub fn get_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn user(&self) -> Option<&UserSummary> {
        self.session.as_ref().and_then(|s| s.user.as_ref())
    }

    pub fn expiry_time(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref().map(|s| s.expires_at)
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref().map(|s| s.last_activity)
    }

    pub fn is_remembered(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.remember)
    }

    pub fn has_token(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_valid(&self) -> bool {
        let now = self.now();
        self.session.as_ref().is_some_and(|s| now < s.expires_at)
    }

    /// Remaining lifetime, never negative
    pub fn time_until_expiry(&self) -> Duration {
        match &self.session {
            Some(session) => (session.expires_at - self.now()).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    pub fn should_warn(&self) -> bool {
        let remaining = self.time_until_expiry();
        remaining > Duration::zero() && remaining <= self.windows.warning()
    }

    pub fn warning_shown(&self) -> bool {
        self.warning_shown
    }

    /// Record that the expiry warning is on screen
    pub fn mark_warning_shown(&mut self) {
        self.warning_shown = true;
    }

    /// Take the warning down; returns whether one was shown
    pub fn dismiss_warning(&mut self) -> bool {
        std::mem::replace(&mut self.warning_shown, false)
    }

    /// Sliding renewal on qualifying user activity
    pub fn update_activity(&mut self) -> DihadiResult<ActivityOutcome> {
        if !self.is_valid() {
            return Ok(ActivityOutcome::NoSession);
        }
        if self.warning_shown {
            return Ok(ActivityOutcome::WarningActive);
        }

        self.renew()?;
        Ok(ActivityOutcome::Renewed)
    }

    /// Explicit extension from the warning prompt. Returns false without a valid session.
    pub fn extend(&mut self) -> DihadiResult<bool> {
        if !self.is_valid() {
            return Ok(false);
        }

        self.renew()?;
        self.warning_shown = false;
        info!(expires_at = ?self.expiry_time(), "Session extended");
        Ok(true)
    }

    fn renew(&mut self) -> DihadiResult<()> {
        let now = self.now();
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let window = self.windows.duration(session.remember);
        let renewed = StoredSession {
            expires_at: now + window,
            last_activity: now,
            persist_until: now + window,
            ..session.clone()
        };
        // Persist first so a storage failure leaves the old expiry in place
        self.store.save(&renewed)?;

        debug!(expires_at = %renewed.expires_at, "Session renewed");
        *session = renewed;
        Ok(())
    }

    /// Drop the session. In-memory state is cleared even if storage fails.
    pub fn clear(&mut self) -> DihadiResult<()> {
        self.session = None;
        self.warning_shown = false;

        if let Err(e) = self.store.clear() {
            warn!("Failed to remove stored session: {}", e);
            return Err(e);
        }
        debug!("Session cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("has_token", &self.has_token())
            .field("expires_at", &self.expiry_time())
            .field("warning_shown", &self.warning_shown)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use crate::session::store::MemoryTokenStore;
    use dihadi_core::Role;

    fn manager() -> (SessionManager, ManualClock, MemoryTokenStore) {
        let clock = ManualClock::default();
        let store = MemoryTokenStore::new();
        let manager = SessionManager::new(
            SessionWindows::default(),
            Arc::new(clock.clone()),
            Box::new(store.clone()),
        );
        (manager, clock, store)
    }

    #[test]
    fn test_short_session_lasts_thirty_minutes() {
        let (mut manager, clock, _) = manager();
        let set_time = clock.now();

        manager.set_session("abc", false).unwrap();

        assert_eq!(manager.expiry_time().unwrap() - set_time, Duration::minutes(30));
        assert_eq!(manager.get_token(), Some("abc"));
        assert!(manager.is_valid());
    }

    #[test]
    fn test_remembered_session_lasts_seven_days() {
        let (mut manager, clock, store) = manager();
        let set_time = clock.now();

        manager.set_session("abc", true).unwrap();

        assert_eq!(manager.expiry_time().unwrap() - set_time, Duration::days(7));
        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.persist_until - set_time, Duration::days(7));
        assert!(stored.remember);
    }

    #[test]
    fn test_warning_threshold() {
        let (mut manager, clock, _) = manager();
        manager.set_session("abc", false).unwrap();
        assert!(!manager.should_warn());

        clock.advance(Duration::minutes(24) + Duration::seconds(59));
        assert!(!manager.should_warn());

        clock.advance(Duration::seconds(1));
        assert_eq!(manager.time_until_expiry(), Duration::minutes(5));
        assert!(manager.should_warn());

        clock.advance(Duration::minutes(5));
        assert!(!manager.should_warn());
        assert!(!manager.is_valid());
        assert_eq!(manager.time_until_expiry(), Duration::zero());
    }

    #[test]
    fn test_activity_resets_full_window() {
        let (mut manager, clock, store) = manager();
        manager.set_session("abc", false).unwrap();

        clock.advance(Duration::minutes(29));
        // Past the warning threshold but no warning was displayed yet
        let activity_time = clock.now();
        assert_eq!(manager.update_activity().unwrap(), ActivityOutcome::Renewed);

        assert_eq!(
            manager.expiry_time().unwrap(),
            activity_time + Duration::minutes(30)
        );
        assert_eq!(manager.last_activity(), Some(activity_time));
        assert!(!manager.should_warn());
        assert_eq!(
            store.load().unwrap().unwrap().expires_at,
            activity_time + Duration::minutes(30)
        );
    }

    #[test]
    fn test_remembered_session_slides_with_long_window() {
        let (mut manager, clock, _) = manager();
        manager.set_session("abc", true).unwrap();

        clock.advance(Duration::days(3));
        manager.update_activity().unwrap();
        assert_eq!(manager.time_until_expiry(), Duration::days(7));
    }

    #[test]
    fn test_activity_suppressed_while_warning_shown() {
        let (mut manager, clock, _) = manager();
        manager.set_session("abc", false).unwrap();
        clock.advance(Duration::minutes(26));
        let expiry = manager.expiry_time();

        manager.mark_warning_shown();
        assert_eq!(
            manager.update_activity().unwrap(),
            ActivityOutcome::WarningActive
        );
        assert_eq!(manager.expiry_time(), expiry);

        assert!(manager.extend().unwrap());
        assert!(!manager.warning_shown());
        assert_eq!(manager.time_until_expiry(), Duration::minutes(30));
    }

    #[test]
    fn test_expired_session_cannot_be_renewed() {
        let (mut manager, clock, _) = manager();
        manager.set_session("abc", false).unwrap();

        clock.advance(Duration::minutes(31));
        assert!(!manager.is_valid());
        assert_eq!(manager.update_activity().unwrap(), ActivityOutcome::NoSession);
        assert!(!manager.extend().unwrap());
        assert!(!manager.is_valid());
    }

    #[test]
    fn test_clear_removes_token_and_expiry() {
        let (mut manager, _, store) = manager();
        manager.set_session("abc", false).unwrap();

        manager.clear().unwrap();

        assert!(!manager.is_valid());
        assert_eq!(manager.get_token(), None);
        assert_eq!(manager.expiry_time(), None);
        assert!(store.load().unwrap().is_none());

        // Clearing twice is harmless
        manager.clear().unwrap();
    }

    #[test]
    fn test_restore_respects_storage_expiry() {
        let (mut manager, clock, store) = manager();
        let user = UserSummary {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role: Role::Worker,
            phone: None,
        };
        manager.set_session_for(user.clone(), "abc", false).unwrap();

        let mut reloaded = SessionManager::new(
            SessionWindows::default(),
            Arc::new(clock.clone()),
            Box::new(store.clone()),
        );
        let restored = reloaded.restore().unwrap().cloned().unwrap();
        assert_eq!(restored.user, Some(user));
        assert!(reloaded.is_valid());

        clock.advance(Duration::minutes(30));
        assert!(reloaded.restore().unwrap().is_none());
        assert!(store.load().unwrap().is_none());
    }
}
