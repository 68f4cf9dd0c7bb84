//! In-process event bus
//!
//! Listeners register once with a name and the change kinds they want.
//! Events are delivered synchronously on the caller's thread, in
//! registration order. A listener cannot stop delivery to the others.

use std::sync::{Arc, RwLock};

use crate::context::Execution;
use crate::models::{ChangeKind, EventSource};

/// Subscriber to document change events
pub trait EventListener: Send + Sync {
    /// Unique name on the bus
    fn name(&self) -> &str;

    /// Kinds this listener wants delivered
    fn events(&self) -> &[ChangeKind];

    fn on_event(&self, kind: ChangeKind, source: &EventSource, execution: &Execution);
}

#[derive(Default)]
pub struct ObservationManager {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl ObservationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; a listener with the same name is replaced
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        let mut listeners = match self.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Listener registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        };

        listeners.retain(|l| l.name() != listener.name());
        tracing::info!(
            listener = %listener.name(),
            events = ?listener.events(),
            "Registered event listener"
        );
        listeners.push(listener);
    }

    pub fn listener_names(&self) -> Vec<String> {
        self.snapshot().iter().map(|l| l.name().to_string()).collect()
    }

    /// Deliver an event to every listener subscribed to `kind`
    pub fn notify(&self, kind: ChangeKind, source: &EventSource, execution: &Execution) {
        for listener in self.snapshot() {
            if listener.events().contains(&kind) {
                listener.on_event(kind, source, execution);
            }
        }
    }

    // Delivery runs without the lock held so listeners may re-register
    fn snapshot(&self) -> Vec<Arc<dyn EventListener>> {
        match self.listeners.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                tracing::error!("Listener registry lock poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }
}
