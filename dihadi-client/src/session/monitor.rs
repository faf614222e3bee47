//! Background session checks
//!
//! Two owned tasks drive the [`AuthContext`]: a validity poll and the
//! countdown refresh. Both stop when the [`MonitorHandle`] is shut down or
//! dropped.

use crate::auth_context::AuthContext;
use dihadi_core::SessionWindows;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct SessionMonitor;

impl SessionMonitor {
    /// Start the poll and countdown tasks for `ctx`
    pub fn spawn(ctx: Arc<AuthContext>, windows: &SessionWindows) -> MonitorHandle {
        let cancel = CancellationToken::new();

        let poll_ctx = ctx.clone();
        let poll = spawn_ticker(cancel.clone(), windows.poll_interval(), "poll", move || {
            let ctx = poll_ctx.clone();
            async move {
                ctx.poll().await;
            }
        });

        let countdown = spawn_ticker(
            cancel.clone(),
            windows.countdown_tick(),
            "countdown",
            move || {
                let ctx = ctx.clone();
                async move {
                    ctx.countdown_tick().await;
                }
            },
        );

        info!(
            poll_secs = windows.poll_interval_secs,
            countdown_secs = windows.countdown_tick_secs,
            "Session monitor started"
        );

        MonitorHandle {
            cancel,
            tasks: vec![poll, countdown],
        }
    }
}

fn spawn_ticker<F, Fut>(
    cancel: CancellationToken,
    period: Duration,
    name: &'static str,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(task = name, "Session monitor task stopped");
                    break;
                }
                _ = interval.tick() => tick().await,
            }
        }
    })
}

/// Owns the monitor tasks
pub struct MonitorHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.tasks.iter().any(|t| !t.is_finished())
    }

    /// A token that stops the monitor when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop both tasks and wait for them to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
        info!("Session monitor stopped");
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_context::{LogoutReason, SessionEvent};
    use crate::session::{ManualClock, MemoryTokenStore, SessionManager};
    use chrono::Duration as ChronoDuration;
    use dihadi_core::{Role, UserSummary};

    fn context(clock: &ManualClock) -> Arc<AuthContext> {
        let manager = SessionManager::new(
            SessionWindows::default(),
            Arc::new(clock.clone()),
            Box::new(MemoryTokenStore::new()),
        );
        Arc::new(AuthContext::new(manager))
    }

    fn user() -> UserSummary {
        UserSummary {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role: Role::Employer,
            phone: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_logs_out_idle_session() {
        let clock = ManualClock::default();
        let ctx = context(&clock);
        ctx.login(user(), "tok", false).await.unwrap();
        let mut rx = ctx.subscribe();

        let handle = SessionMonitor::spawn(ctx.clone(), &SessionWindows::default());
        assert!(handle.is_running());

        clock.advance(ChronoDuration::minutes(31));
        tokio::time::sleep(Duration::from_secs(11)).await;

        let mut logged_out = 0;
        while let Ok(event) = rx.try_recv() {
            if event
                == (SessionEvent::LoggedOut {
                    reason: LogoutReason::Expired,
                })
            {
                logged_out += 1;
            }
        }
        assert_eq!(logged_out, 1);
        assert!(!ctx.is_authenticated().await);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_while_warning_shown() {
        let clock = ManualClock::default();
        let ctx = context(&clock);
        ctx.login(user(), "tok", false).await.unwrap();
        clock.advance(ChronoDuration::minutes(26));
        let mut rx = ctx.subscribe();

        let handle = SessionMonitor::spawn(ctx.clone(), &SessionWindows::default());
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let countdowns = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, SessionEvent::Countdown { .. }))
            .count();
        assert!(countdowns >= 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_tasks() {
        let clock = ManualClock::default();
        let ctx = context(&clock);

        let handle = SessionMonitor::spawn(ctx.clone(), &SessionWindows::default());
        let token = handle.cancellation_token();
        drop(handle);

        assert!(token.is_cancelled());
    }
}
