//! Repeating slideshow timer

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A timer firing. Carries the session it was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayTick {
    pub session: u64,
}

/// Single periodic task that emits [`AutoplayTick`]s.
///
/// Ticks are only requests to advance: the receiver checks [`Autoplay::accepts`]
/// at fire time, so a tick queued before a cancel or re-arm is dropped.
pub struct Autoplay {
    ticks: UnboundedSender<AutoplayTick>,
    task: Option<JoinHandle<()>>,
    session: u64,
    interval: Duration,
}

impl Autoplay {
    pub fn new(ticks: UnboundedSender<AutoplayTick>) -> Self {
        Self {
            ticks,
            task: None,
            session: 0,
            interval: Duration::from_secs(5),
        }
    }

    /// Arm the timer, replacing any running one. Must be called inside a tokio runtime.
    pub fn start(&mut self, interval: Duration) {
        self.cancel();
        self.session += 1;
        self.interval = interval;

        let session = self.session;
        let ticks = self.ticks.clone();
        self.task = Some(tokio::spawn(async move {
            // First tick one full period from now, not immediately
            let mut timer = interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                if ticks.send(AutoplayTick { session }).is_err() {
                    break;
                }
            }
        }));

        tracing::debug!("Autoplay armed: session {} every {:?}", session, interval);
    }

    /// Stop the timer. Safe to call when not running.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Autoplay cancelled: session {}", self.session);
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a tick belongs to the currently running timer
    pub fn accepts(&self, tick: AutoplayTick) -> bool {
        self.is_running() && tick.session == self.session
    }
}

impl Drop for Autoplay {
    fn drop(&mut self) {
        self.cancel();
    }
}
