//! Diagnostic observers for resolution and binding events.
//!
//! Observers are notified synchronously while the container works, so keep
//! implementations lightweight.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::lifetime::BindFlags;

/// Observer trait for container events.
///
/// Only [`resolving`](Self::resolving) and [`resolved`](Self::resolved) are
/// required; binding events default to no-ops.
///
/// # Examples
///
/// ```
/// use ferrous_construct::{BindFlags, Container, ContainerObserver, Factory};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     events: Mutex<Vec<String>>,
/// }
///
/// impl ContainerObserver for Recorder {
///     fn resolving(&self, id: &str) {
///         self.events.lock().unwrap().push(format!("resolving {id}"));
///     }
///
///     fn resolved(&self, id: &str, _duration: Duration) {
///         self.events.lock().unwrap().push(format!("resolved {id}"));
///     }
///
///     fn bind_rejected(&self, id: &str) {
///         self.events.lock().unwrap().push(format!("rejected {id}"));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let container = Container::new();
/// container.add_observer(recorder.clone());
///
/// container.bind("port", Factory::value(80u16), BindFlags::PROTECTED);
/// container.bind("port", Factory::value(81u16), BindFlags::empty());
/// container.get("port").unwrap();
///
/// let events = recorder.events.lock().unwrap();
/// assert_eq!(*events, vec!["rejected port", "resolving port", "resolved port"]);
/// ```
pub trait ContainerObserver: Send + Sync {
    /// Called before a bound identifier is produced.
    fn resolving(&self, id: &str);

    /// Called after a bound identifier was produced successfully.
    fn resolved(&self, id: &str, duration: Duration);

    /// Called when a binding was installed or replaced.
    fn bound(&self, _id: &str, _flags: BindFlags) {}

    /// Called when a write to a protected binding was ignored.
    fn bind_rejected(&self, _id: &str) {}
}

/// Registered observers of one container.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn ContainerObserver>>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, observer: Arc<dyn ContainerObserver>) {
        self.observers.write().push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.read().is_empty()
    }

    // Snapshot so observers may touch the container without deadlocking.
    fn snapshot(&self) -> Vec<Arc<dyn ContainerObserver>> {
        self.observers.read().clone()
    }

    #[inline]
    pub(crate) fn resolving(&self, id: &str) {
        for observer in self.snapshot() {
            observer.resolving(id);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, id: &str, duration: Duration) {
        for observer in self.snapshot() {
            observer.resolved(id, duration);
        }
    }

    pub(crate) fn bound(&self, id: &str, flags: BindFlags) {
        for observer in self.snapshot() {
            observer.bound(id, flags);
        }
    }

    pub(crate) fn bind_rejected(&self, id: &str) {
        for observer in self.snapshot() {
            observer.bind_rejected(id);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.observers.read().len())
            .finish()
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Installed automatically when
/// [`ContainerConfig::trace_resolution`](crate::ContainerConfig) is set.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    prefix: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-construct".to_string(),
        }
    }

    /// Creates an observer tagging every event with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for TracingObserver {
    fn resolving(&self, id: &str) {
        tracing::trace!(prefix = %self.prefix, id, "resolving");
    }

    fn resolved(&self, id: &str, duration: Duration) {
        tracing::debug!(prefix = %self.prefix, id, ?duration, "resolved");
    }

    fn bound(&self, id: &str, flags: BindFlags) {
        tracing::debug!(prefix = %self.prefix, id, ?flags, "bound");
    }

    fn bind_rejected(&self, id: &str) {
        tracing::warn!(prefix = %self.prefix, id, "write to protected binding ignored");
    }
}
