//! Fixed-cadence refresh clock.
//!
//! Relative timestamps ("in 3 days") go stale even when no data changes. The
//! clock ticks once per period so the view can redraw them; ticks carry no
//! data and never touch subscriptions or the sort order.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Period between relative-time refreshes.
pub const REFRESH_PERIOD: Duration = Duration::from_secs(60);

/// One refresh tick, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTick {
    pub seq: u64,
}

/// Running refresh timer. Stopped explicitly or when dropped.
pub struct RefreshClock {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshClock {
    /// Start ticking every `period`, first tick one period from now.
    /// Must be called from within a tokio runtime.
    pub fn start(period: Duration, tick_tx: mpsc::Sender<RefreshTick>) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(clock_task(period, tick_tx, stop_rx));
        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the timer. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.handle.take();
    }
}

impl Drop for RefreshClock {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn clock_task(
    period: Duration,
    tick_tx: mpsc::Sender<RefreshTick>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seq = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                seq += 1;
                if tick_tx.send(RefreshTick { seq }).await.is_err() {
                    break;
                }
            }
            _ = &mut stop_rx => break,
        }
    }
}
