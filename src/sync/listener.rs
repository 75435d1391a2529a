//! Orchestrator event listener.
//!
//! # Responsibilities
//! - Keep an event subscription open for the lifetime of the process
//! - Forward relevant events to the scheduler's debounce
//! - Resubscribe after a fixed cooldown whenever the stream ends or fails

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;
use crate::orchestrator::{EventFilter, Orchestrator, OrchestratorEvent};
use crate::sync::scheduler::UpdateScheduler;

pub struct EventListener {
    orchestrator: Arc<dyn Orchestrator>,
    scheduler: Arc<UpdateScheduler>,
    filter: EventFilter,
    cooldown: Duration,
}

impl EventListener {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        scheduler: Arc<UpdateScheduler>,
        cooldown: Duration,
    ) -> Self {
        Self {
            orchestrator,
            scheduler,
            filter: EventFilter::lifecycle(),
            cooldown,
        }
    }

    /// Listen, wait out the cooldown, listen again. Only shutdown ends this.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                _ = self.listen_once() => {}
                _ = shutdown.recv() => break,
            }

            metrics::record_reconnect();
            tracing::info!(
                cooldown_secs = self.cooldown.as_secs(),
                "Resubscribing to orchestrator events after cooldown"
            );

            tokio::select! {
                _ = time::sleep(self.cooldown) => {}
                _ = shutdown.recv() => break,
            }
        }
        tracing::info!("Event listener received shutdown signal, exiting loop");
    }

    /// Consume one subscription until it errors or closes.
    async fn listen_once(&self) {
        tracing::info!("Connecting to orchestrator events");
        let mut events = self.orchestrator.events(&self.filter);

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Orchestrator events error");
                    return;
                }
            }
        }
        tracing::warn!("Orchestrator event stream closed");
    }

    /// Returns true if the event armed the debounce deadline.
    fn handle_event(&self, event: &OrchestratorEvent) -> bool {
        let relevant = event.is_update_worthy();
        metrics::record_event(relevant);
        if !relevant {
            return false;
        }

        let armed = self.scheduler.notify_event();
        if armed {
            tracing::debug!(
                entity = %event.entity,
                action = %event.action,
                "Relevant event, rebuild scheduled"
            );
        }
        armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestratorError;
    use crate::orchestrator::{EntityType, EventStream};
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scheduler() -> Arc<UpdateScheduler> {
        Arc::new(UpdateScheduler::new(
            Duration::from_millis(100),
            Duration::from_secs(30),
        ))
    }

    struct NoEvents;

    #[async_trait]
    impl Orchestrator for NoEvents {
        async fn ping(&self) -> Result<(), OrchestratorError> {
            Ok(())
        }

        fn events(&self, _filter: &EventFilter) -> EventStream {
            stream::empty().boxed()
        }
    }

    #[tokio::test]
    async fn test_only_first_relevant_event_arms() {
        let scheduler = scheduler();
        let listener = EventListener::new(
            Arc::new(NoEvents),
            scheduler.clone(),
            Duration::from_secs(30),
        );

        let irrelevant = OrchestratorEvent::new(EntityType::Container, "exec_start: sh");
        let relevant = OrchestratorEvent::new(EntityType::Service, "update");

        assert!(!listener.handle_event(&irrelevant));
        assert!(!scheduler.is_suppressed());

        assert!(listener.handle_event(&relevant));
        assert!(scheduler.is_suppressed());
        assert!(!listener.handle_event(&relevant));
    }

    /// Fails every subscription with one event followed by an error.
    struct FlakyOrchestrator {
        subscriptions: AtomicUsize,
    }

    #[async_trait]
    impl Orchestrator for FlakyOrchestrator {
        async fn ping(&self) -> Result<(), OrchestratorError> {
            Ok(())
        }

        fn events(&self, filter: &EventFilter) -> EventStream {
            assert_eq!(filter, &EventFilter::lifecycle());
            self.subscriptions.fetch_add(1, Ordering::SeqCst);
            stream::iter(vec![
                Ok(OrchestratorEvent::new(EntityType::Container, "start")),
                Err(OrchestratorError::Endpoint("connection reset".to_string())),
            ])
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribes_after_cooldown() {
        let orchestrator = Arc::new(FlakyOrchestrator {
            subscriptions: AtomicUsize::new(0),
        });
        let scheduler = scheduler();
        let listener = EventListener::new(
            orchestrator.clone(),
            scheduler.clone(),
            Duration::from_secs(30),
        );
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(listener.run(rx));

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(orchestrator.subscriptions.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_suppressed());

        time::sleep(Duration::from_secs(29)).await;
        assert_eq!(orchestrator.subscriptions.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(orchestrator.subscriptions.load(Ordering::SeqCst), 2);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(orchestrator.subscriptions.load(Ordering::SeqCst), 3);

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
