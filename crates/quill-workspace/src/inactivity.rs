use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Idle time after which the session is ended.
pub const IDLE_LIMIT: Duration = Duration::from_secs(10 * 60);

/// User input that counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Click,
    MouseMove,
    Key,
    Scroll,
}

/// Background task that runs a callback once no activity has been seen for
/// the configured limit. Any [`Activity`] restarts the countdown. Dropping
/// the timer cancels it.
pub struct InactivityTimer {
    activity: watch::Sender<Instant>,
    expired: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl InactivityTimer {
    pub fn start<F>(limit: Duration, on_expire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (activity, mut last_seen) = watch::channel(Instant::now());
        let (expired_tx, expired) = watch::channel(false);

        let task = tokio::spawn(async move {
            if wait_for_idle(&mut last_seen, limit).await {
                info!("No activity for {:?}, ending session", limit);
                on_expire.await;
                expired_tx.send_replace(true);
            }
        });

        Self {
            activity,
            expired,
            task,
        }
    }

    pub fn touch(&self, activity: Activity) {
        debug!(?activity, "Activity");
        self.activity.send_replace(Instant::now());
    }

    /// True once the callback has run.
    pub fn is_expired(&self) -> bool {
        *self.expired.borrow()
    }

    /// Resolves after the callback has run.
    pub async fn expired(&mut self) {
        // An error means the task is gone without expiring; wait forever.
        if self.expired.wait_for(|expired| *expired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for InactivityTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Wait until `limit` passes with no new activity. Returns `false` if the
/// activity channel closes first.
async fn wait_for_idle(last_seen: &mut watch::Receiver<Instant>, limit: Duration) -> bool {
    loop {
        let deadline = *last_seen.borrow_and_update() + limit;
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            changed = last_seen.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    const LIMIT: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn fires_after_limit() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let started = Instant::now();

        let mut timer = InactivityTimer::start(LIMIT, async move {
            flag.store(true, Ordering::SeqCst);
        });
        timer.expired().await;

        assert!(started.elapsed() >= LIMIT);
        assert!(fired.load(Ordering::SeqCst));
        assert!(timer.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_restarts_countdown() {
        let mut timer = InactivityTimer::start(LIMIT, async {});

        tokio::time::sleep(LIMIT - Duration::from_secs(60)).await;
        timer.touch(Activity::Key);
        let touched = Instant::now();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!timer.is_expired());

        timer.expired().await;
        assert!(touched.elapsed() >= LIMIT);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        let timer = InactivityTimer::start(LIMIT, async move {
            flag.store(true, Ordering::SeqCst);
        });
        drop(timer);

        tokio::time::sleep(LIMIT * 2).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
