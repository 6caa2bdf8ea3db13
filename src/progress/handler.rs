//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while bringing a topology up
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Compose is about to start the infrastructure services
    InfrastructureStarting { services: Vec<String> },

    /// Compose returned; the warm-up pause follows
    InfrastructureStarted { warmup: Duration },

    /// A service became eligible and is being launched
    ServiceStarting {
        service: String,
        index: usize,
        total: usize,
    },

    /// A service reported ready
    ServiceReady { service: String, duration: Duration },

    /// A service failed to build, spawn or become ready
    ServiceFailed { service: String, error: String },

    /// No remaining service has all of its dependencies started
    Stalled { pending: Vec<String> },

    /// Every service is started
    Completed { started: usize, total_time: Duration },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::Stalled {
            pending: vec!["a".to_string()],
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::ServiceStarting {
            service: "config-server".to_string(),
            index: 1,
            total: 5,
        });
        handler.on_progress(&ProgressEvent::ServiceReady {
            service: "config-server".to_string(),
            duration: Duration::from_secs(12),
        });
        handler.on_progress(&ProgressEvent::Completed {
            started: 5,
            total_time: Duration::from_secs(90),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::InfrastructureStarted {
            warmup: Duration::from_secs(10),
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("InfrastructureStarted"));
        assert!(debug_str.contains("warmup"));
    }
}
