//! Auth Context - login state and session-expiry handling
//!
//! Wraps the [`SessionManager`] behind an async mutex and publishes
//! everything a UI would render (warnings, countdown, notices, redirects) as
//! [`SessionEvent`]s on a broadcast channel.

use crate::session::{ActivityOutcome, SessionManager};
use chrono::{DateTime, Utc};
use dihadi_core::UserSummary;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 64;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Where the UI should go next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    UserRequested,
    Expired,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn {
        user: UserSummary,
    },
    /// Expiry is near; the user should be offered an extension
    WarningShown {
        seconds: u64,
    },
    Countdown {
        seconds: u64,
        display: String,
    },
    WarningDismissed,
    Extended {
        expires_at: DateTime<Utc>,
    },
    LoggedOut {
        reason: LogoutReason,
    },
    Navigate(Route),
    Notify(Notice),
}

/// Qualifying user interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Pointer,
    Key,
    Scroll,
    Touch,
}

/// What a background poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nobody is logged in
    Idle,
    Active,
    WarningShown,
    /// A warning was already on screen and still applies
    Warning,
    WarningDismissed,
    Expired,
}

/// `mm:ss`, minutes unbounded
pub fn format_countdown(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub struct AuthContext {
    manager: Mutex<SessionManager>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthContext {
    pub fn new(manager: SessionManager) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            manager: Mutex::new(manager),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(SessionEvent::Notify(Notice::new(level, message)));
    }

    /// Resume a stored session on start-up
    pub async fn restore(&self) -> Option<UserSummary> {
        let mut manager = self.manager.lock().await;

        let stored = match manager.restore() {
            Ok(stored) => stored.cloned(),
            Err(e) => {
                warn!("Failed to load stored session: {}", e);
                return None;
            }
        };
        let record = stored?;

        if !manager.is_valid() {
            self.force_logout(&mut manager, LogoutReason::Expired);
            return None;
        }

        match record.user {
            Some(user) => {
                info!(user_id = %user.id, "Restored session");
                self.emit(SessionEvent::LoggedIn { user: user.clone() });
                Some(user)
            }
            None => {
                debug!("Stored session has no user, discarding");
                if let Err(e) = manager.clear() {
                    warn!("Failed to discard session without user: {}", e);
                }
                None
            }
        }
    }

    pub async fn login(
        &self,
        user: UserSummary,
        token: impl Into<String>,
        remember: bool,
    ) -> dihadi_core::DihadiResult<()> {
        let mut manager = self.manager.lock().await;
        if let Err(e) = manager.set_session_for(user.clone(), token, remember) {
            self.notify(NoticeLevel::Error, "Could not save your session");
            return Err(e);
        }

        info!(user_id = %user.id, remember, "Logged in");
        self.emit(SessionEvent::LoggedIn { user });
        self.emit(SessionEvent::Navigate(Route::Dashboard));
        self.notify(NoticeLevel::Success, "Logged in successfully");
        Ok(())
    }

    pub async fn logout(&self) {
        let mut manager = self.manager.lock().await;
        if let Err(e) = manager.clear() {
            warn!("Failed to remove stored session on logout: {}", e);
        }

        info!("Logged out");
        self.emit(SessionEvent::LoggedOut {
            reason: LogoutReason::UserRequested,
        });
        self.emit(SessionEvent::Navigate(Route::Login));
        self.notify(NoticeLevel::Info, "You have been logged out");
    }

    /// Extension chosen from the warning prompt
    pub async fn extend_session(&self) -> bool {
        let mut manager = self.manager.lock().await;
        let was_warning = manager.warning_shown();

        match manager.extend() {
            Ok(true) => {
                if was_warning {
                    self.emit(SessionEvent::WarningDismissed);
                }
                if let Some(expires_at) = manager.expiry_time() {
                    self.emit(SessionEvent::Extended { expires_at });
                }
                self.notify(NoticeLevel::Success, "Session extended");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("Failed to extend session: {}", e);
                self.notify(NoticeLevel::Error, "Could not extend your session");
                false
            }
        }
    }

    /// Forward a qualifying interaction. Never dismisses a displayed warning.
    pub async fn record_activity(&self, kind: ActivityKind) -> ActivityOutcome {
        let mut manager = self.manager.lock().await;
        match manager.update_activity() {
            Ok(outcome) => {
                debug!(?kind, ?outcome, "Activity recorded");
                outcome
            }
            Err(e) => {
                warn!("Failed to persist session renewal: {}", e);
                ActivityOutcome::NoSession
            }
        }
    }

    /// One background validity check
    pub async fn poll(&self) -> PollOutcome {
        let mut manager = self.manager.lock().await;

        if !manager.has_token() {
            return PollOutcome::Idle;
        }
        if !manager.is_valid() {
            self.force_logout(&mut manager, LogoutReason::Expired);
            return PollOutcome::Expired;
        }

        if manager.should_warn() {
            if manager.warning_shown() {
                return PollOutcome::Warning;
            }
            manager.mark_warning_shown();
            let seconds = whole_seconds(&manager);
            debug!(seconds, "Showing session expiry warning");
            self.emit(SessionEvent::WarningShown { seconds });
            self.emit(SessionEvent::Countdown {
                seconds,
                display: format_countdown(seconds),
            });
            return PollOutcome::WarningShown;
        }

        if manager.dismiss_warning() {
            self.emit(SessionEvent::WarningDismissed);
            return PollOutcome::WarningDismissed;
        }
        PollOutcome::Active
    }

    /// Countdown refresh while the warning is shown. Reaching zero logs out.
    pub async fn countdown_tick(&self) -> Option<u64> {
        let mut manager = self.manager.lock().await;
        if !manager.warning_shown() {
            return None;
        }

        let seconds = whole_seconds(&manager);
        if seconds == 0 {
            self.force_logout(&mut manager, LogoutReason::Expired);
            return Some(0);
        }

        self.emit(SessionEvent::Countdown {
            seconds,
            display: format_countdown(seconds),
        });
        Some(seconds)
    }

    /// The API rejected the token
    pub async fn handle_unauthorized(&self) -> bool {
        let mut manager = self.manager.lock().await;
        if !manager.has_token() {
            return false;
        }
        self.force_logout(&mut manager, LogoutReason::Unauthorized);
        true
    }

    fn force_logout(&self, manager: &mut SessionManager, reason: LogoutReason) {
        if let Err(e) = manager.clear() {
            warn!("Failed to remove stored session: {}", e);
        }

        info!(?reason, "Session ended");
        self.emit(SessionEvent::LoggedOut { reason });
        self.emit(SessionEvent::Navigate(Route::Login));
        self.notify(NoticeLevel::Warning, SESSION_EXPIRED_MESSAGE);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.manager.lock().await.is_valid()
    }

    pub async fn current_user(&self) -> Option<UserSummary> {
        let manager = self.manager.lock().await;
        if manager.is_valid() {
            manager.user().cloned()
        } else {
            None
        }
    }

    /// Bearer token of a valid session
    pub async fn token(&self) -> Option<String> {
        let manager = self.manager.lock().await;
        if manager.is_valid() {
            manager.get_token().map(str::to_string)
        } else {
            None
        }
    }

    /// Update the cached user after a profile change
    pub async fn refresh_user(&self, user: UserSummary) -> dihadi_core::DihadiResult<()> {
        self.manager.lock().await.set_user(user)
    }

    /// Run a closure against the session manager
    pub async fn with_manager<R>(&self, f: impl FnOnce(&mut SessionManager) -> R) -> R {
        let mut manager = self.manager.lock().await;
        f(&mut manager)
    }
}

/// Whole seconds left, truncating
fn whole_seconds(manager: &SessionManager) -> u64 {
    manager.time_until_expiry().num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Clock, ManualClock, MemoryTokenStore, TokenStore};
    use chrono::Duration;
    use dihadi_core::{Role, SessionWindows};
    use std::sync::Arc;

    fn context() -> (AuthContext, ManualClock, MemoryTokenStore) {
        let clock = ManualClock::default();
        let store = MemoryTokenStore::new();
        let manager = SessionManager::new(
            SessionWindows::default(),
            Arc::new(clock.clone()),
            Box::new(store.clone()),
        );
        (AuthContext::new(manager), clock, store)
    }

    fn user() -> UserSummary {
        UserSummary {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role: Role::Worker,
            phone: None,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(59), "0:59");
        assert_eq!(format_countdown(61), "1:01");
        assert_eq!(format_countdown(0), "0:00");
    }

    #[tokio::test]
    async fn test_login_navigates_to_dashboard() {
        let (ctx, _, store) = context();
        let mut rx = ctx.subscribe();

        ctx.login(user(), "tok", false).await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events[0], SessionEvent::LoggedIn { user: user() });
        assert_eq!(events[1], SessionEvent::Navigate(Route::Dashboard));
        assert!(matches!(&events[2], SessionEvent::Notify(n) if n.level == NoticeLevel::Success));
        assert_eq!(ctx.token().await.as_deref(), Some("tok"));
        assert_eq!(store.load().unwrap().unwrap().user, Some(user()));
    }

    #[tokio::test]
    async fn test_idle_session_is_logged_out_once() {
        let (ctx, clock, _) = context();
        ctx.login(user(), "tok", false).await.unwrap();
        let mut rx = ctx.subscribe();

        clock.advance(Duration::minutes(31));
        assert_eq!(ctx.poll().await, PollOutcome::Expired);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                SessionEvent::LoggedOut {
                    reason: LogoutReason::Expired
                },
                SessionEvent::Navigate(Route::Login),
                SessionEvent::Notify(Notice::new(NoticeLevel::Warning, SESSION_EXPIRED_MESSAGE)),
            ]
        );
        assert!(!ctx.is_authenticated().await);

        // Later polls stay quiet
        assert_eq!(ctx.poll().await, PollOutcome::Idle);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_warning_shown_on_first_transition_only() {
        let (ctx, clock, _) = context();
        ctx.login(user(), "tok", false).await.unwrap();
        let mut rx = ctx.subscribe();

        assert_eq!(ctx.poll().await, PollOutcome::Active);
        clock.advance(Duration::minutes(26));

        assert_eq!(ctx.poll().await, PollOutcome::WarningShown);
        assert_eq!(ctx.poll().await, PollOutcome::Warning);

        let events = drain(&mut rx);
        assert_eq!(events[0], SessionEvent::WarningShown { seconds: 240 });
        assert_eq!(
            events[1],
            SessionEvent::Countdown {
                seconds: 240,
                display: "4:00".to_string()
            }
        );
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_activity_does_not_dismiss_warning() {
        let (ctx, clock, _) = context();
        ctx.login(user(), "tok", false).await.unwrap();
        clock.advance(Duration::minutes(26));
        ctx.poll().await;

        assert_eq!(
            ctx.record_activity(ActivityKind::Key).await,
            ActivityOutcome::WarningActive
        );
        assert_eq!(ctx.poll().await, PollOutcome::Warning);
    }

    #[tokio::test]
    async fn test_extend_dismisses_warning() {
        let (ctx, clock, _) = context();
        ctx.login(user(), "tok", false).await.unwrap();
        clock.advance(Duration::minutes(27));
        ctx.poll().await;
        let mut rx = ctx.subscribe();

        assert!(ctx.extend_session().await);

        let events = drain(&mut rx);
        assert_eq!(events[0], SessionEvent::WarningDismissed);
        assert_eq!(
            events[1],
            SessionEvent::Extended {
                expires_at: clock.now() + Duration::minutes(30)
            }
        );
        assert_eq!(ctx.poll().await, PollOutcome::Active);
        assert_eq!(ctx.countdown_tick().await, None);
    }

    #[tokio::test]
    async fn test_poll_dismisses_warning_when_expiry_moves_out() {
        let (ctx, clock, _) = context();
        ctx.login(user(), "tok", false).await.unwrap();
        clock.advance(Duration::minutes(26));
        ctx.poll().await;

        // Another tab extended the same session
        ctx.with_manager(|m| m.set_session_for(user(), "tok", false))
            .await
            .unwrap();
        ctx.with_manager(|m| m.mark_warning_shown()).await;

        assert_eq!(ctx.poll().await, PollOutcome::WarningDismissed);
    }

    #[tokio::test]
    async fn test_countdown_truncates_and_expires_at_zero() {
        let (ctx, clock, _) = context();
        ctx.login(user(), "tok", false).await.unwrap();
        clock.advance(Duration::minutes(25) + Duration::milliseconds(500));
        ctx.poll().await;

        assert_eq!(ctx.countdown_tick().await, Some(299));

        clock.advance(Duration::seconds(299));
        let mut rx = ctx.subscribe();
        assert_eq!(ctx.countdown_tick().await, Some(0));
        assert!(!ctx.is_authenticated().await);
        assert!(drain(&mut rx).contains(&SessionEvent::LoggedOut {
            reason: LogoutReason::Expired
        }));
    }

    #[tokio::test]
    async fn test_unauthorized_forces_logout() {
        let (ctx, _, store) = context();
        ctx.login(user(), "tok", true).await.unwrap();

        assert!(ctx.handle_unauthorized().await);
        assert!(store.load().unwrap().is_none());
        assert!(!ctx.handle_unauthorized().await);
    }

    #[tokio::test]
    async fn test_restore() {
        let (ctx, clock, store) = context();
        ctx.login(user(), "tok", false).await.unwrap();

        let manager = SessionManager::new(
            SessionWindows::default(),
            Arc::new(clock.clone()),
            Box::new(store.clone()),
        );
        let restored = AuthContext::new(manager);
        assert_eq!(restored.restore().await, Some(user()));
        assert!(restored.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_restore_expired_remembered_session_logs_out() {
        let (ctx, clock, store) = context();
        ctx.login(user(), "tok", true).await.unwrap();

        // Record still within its storage expiry but the token has lapsed
        let mut record = store.load().unwrap().unwrap();
        record.expires_at = clock.now() - Duration::seconds(1);
        store.save(&record).unwrap();

        let manager = SessionManager::new(
            SessionWindows::default(),
            Arc::new(clock.clone()),
            Box::new(store.clone()),
        );
        let restored = AuthContext::new(manager);
        let mut rx = restored.subscribe();

        assert_eq!(restored.restore().await, None);
        assert!(drain(&mut rx).contains(&SessionEvent::Navigate(Route::Login)));
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout() {
        let (ctx, _, store) = context();
        ctx.login(user(), "tok", false).await.unwrap();
        let mut rx = ctx.subscribe();

        ctx.logout().await;

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            SessionEvent::LoggedOut {
                reason: LogoutReason::UserRequested
            }
        );
        assert_eq!(events[1], SessionEvent::Navigate(Route::Login));
        assert!(ctx.token().await.is_none());
        assert!(store.load().unwrap().is_none());
    }
}
