//! Update scheduling.
//!
//! # State Machine
//! ```text
//! one deadline slot, latest arm wins:
//!     start            → arm(0)
//!     relevant event   → suppress, arm(debounce)   (only if not suppressed)
//!     deadline reached → unsuppress, arm(poll), rebuild
//! ```
//!
//! # Design Decisions
//! - The deadline lives in a watch channel; the single consumer re-reads it
//!   whenever it changes, so re-arming never allocates a timer
//! - Rebuilds run inside the consumer task, one at a time
//! - Suppression is cleared and the poll deadline armed before the rebuild
//!   starts, so events arriving mid-rebuild schedule a follow-up

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant};

use crate::config::TimingConfig;

/// Something the scheduler can trigger.
#[async_trait]
pub trait Rebuilder: Send + Sync {
    /// Run one rebuild. Returns false if the attempt was aborted.
    async fn rebuild(&self) -> bool;
}

/// Single-slot timer mediating event-driven and periodic rebuilds.
#[derive(Debug)]
pub struct UpdateScheduler {
    deadline: watch::Sender<Instant>,
    suppressed: AtomicBool,
    debounce: Duration,
    polling_interval: Duration,
}

impl UpdateScheduler {
    /// Create a scheduler whose first deadline is due immediately.
    pub fn new(debounce: Duration, polling_interval: Duration) -> Self {
        let (deadline, _) = watch::channel(Instant::now());
        Self {
            deadline,
            suppressed: AtomicBool::new(false),
            debounce,
            polling_interval,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.debounce_delay(), timing.polling_interval())
    }

    /// Replace the pending deadline with `now + delay`.
    pub fn arm(&self, delay: Duration) {
        self.deadline.send_replace(Instant::now() + delay);
    }

    /// Currently pending deadline.
    pub fn deadline(&self) -> Instant {
        *self.deadline.borrow()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::Acquire)
    }

    /// Report a relevant orchestrator event.
    ///
    /// The first event after a rebuild suppresses further events and arms the
    /// debounce deadline. Returns true if this call armed it.
    pub fn notify_event(&self) -> bool {
        if self
            .suppressed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.arm(self.debounce);
            true
        } else {
            false
        }
    }

    /// Consume deadlines until shutdown.
    pub async fn run(&self, rebuilder: Arc<dyn Rebuilder>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            debounce_ms = self.debounce.as_millis() as u64,
            polling_interval_secs = self.polling_interval.as_secs(),
            "Update scheduler starting"
        );

        let mut deadlines = self.deadline.subscribe();
        loop {
            let deadline = *deadlines.borrow_and_update();
            tokio::select! {
                _ = time::sleep_until(deadline) => {
                    self.fire(rebuilder.as_ref()).await;
                }
                changed = deadlines.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Update scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn fire(&self, rebuilder: &dyn Rebuilder) {
        self.suppressed.store(false, Ordering::Release);
        self.arm(self.polling_interval);

        let completed = rebuilder.rebuild().await;
        if !completed {
            tracing::warn!(
                retry_in_secs = self.polling_interval.as_secs(),
                "Rebuild aborted, will retry on next trigger"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingRebuilder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Rebuilder for CountingRebuilder {
        async fn rebuild(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn start(
        scheduler: &Arc<UpdateScheduler>,
    ) -> (Arc<CountingRebuilder>, broadcast::Sender<()>) {
        let rebuilder = Arc::new(CountingRebuilder::default());
        let (tx, rx) = broadcast::channel(1);
        let scheduler = Arc::clone(scheduler);
        let target: Arc<dyn Rebuilder> = rebuilder.clone();
        tokio::spawn(async move { scheduler.run(target, rx).await });
        (rebuilder, tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_trigger_is_immediate_then_polls() {
        let scheduler = Arc::new(UpdateScheduler::new(
            Duration::from_millis(100),
            Duration::from_secs(30),
        ));
        let (rebuilder, _tx) = start(&scheduler);

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(29)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_one_rebuild() {
        let scheduler = Arc::new(UpdateScheduler::new(
            Duration::from_millis(100),
            Duration::from_secs(30),
        ));
        let (rebuilder, _tx) = start(&scheduler);
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 1);

        assert!(scheduler.notify_event());
        for _ in 0..20 {
            time::sleep(Duration::from_millis(4)).await;
            assert!(!scheduler.notify_event());
        }
        assert!(scheduler.is_suppressed());

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 2);
        assert!(!scheduler.is_suppressed());

        // Listening resumes after the rebuild
        assert!(scheduler.notify_event());
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_arm_wins() {
        let scheduler = Arc::new(UpdateScheduler::new(
            Duration::from_millis(100),
            Duration::from_secs(30),
        ));
        let (rebuilder, _tx) = start(&scheduler);
        time::sleep(Duration::from_millis(1)).await;

        scheduler.arm(Duration::from_secs(5));
        scheduler.arm(Duration::from_secs(1));
        time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 2);

        // The poll deadline replaced the 5s one
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let scheduler = Arc::new(UpdateScheduler::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
        ));
        let (rebuilder, tx) = start(&scheduler);
        time::sleep(Duration::from_millis(1)).await;
        tx.send(()).unwrap();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 1);
    }
}
