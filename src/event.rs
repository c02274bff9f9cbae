//! Synchronous publish/subscribe used to announce environment lifecycle phases.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::warn;

use crate::Environment;

pub const PREPARE_ENVIRONMENT_TOPIC: &str = "nemo.environment.prepare.event";
pub const PRE_LOAD_ENVIRONMENT_TOPIC: &str = "nemo.environment.load.pre.event";
pub const POST_LOAD_ENVIRONMENT_TOPIC: &str = "nemo.environment.load.post.event";
pub const CONFUSED_ENVIRONMENT_TOPIC: &str = "nemo.environment.value.confused.event";

/// Payload delivered to listeners.
#[derive(Clone, Copy)]
pub enum Event<'a> {
    /// A lifecycle phase of this environment.
    Environment(&'a Environment),
    /// A raw `KEY=VALUE` environment entry containing a confused marker.
    ConfusedValue(&'a str),
    Custom(&'a (dyn Any + Send + Sync)),
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Environment(_) => f.write_str("Environment(..)"),
            Event::ConfusedValue(entry) => f.debug_tuple("ConfusedValue").field(entry).finish(),
            Event::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Arc<dyn Fn(&str, &Event<'_>) -> Result<(), ListenerError> + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventError {
    #[error("event topic can't be empty")]
    EmptyTopic,

    #[error("listener topics can't be empty")]
    NoTopics,

    #[error("{} listener(s) failed on '{topic}': [{}]", .messages.len(), .messages.join("; "))]
    ListenerFailed { topic: String, messages: Vec<String> },
}

/// Identifies a subscription for [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Listener {
    id: SubscriptionId,
    priority: i64,
    handler: Handler,
}

/// Listeners run in ascending priority, ties in registration order.
///
/// A failing listener does not stop the others; all failures are reported
/// together. Handlers may subscribe or unsubscribe while being dispatched.
#[derive(Default)]
pub struct EventBus {
    topics: RwLock<HashMap<String, Vec<Listener>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<T, F>(
        &self,
        topics: impl IntoIterator<Item = T>,
        priority: i64,
        handler: F,
    ) -> Result<SubscriptionId, EventError>
    where
        T: AsRef<str>,
        F: Fn(&str, &Event<'_>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        let topics: Vec<String> = topics.into_iter().map(|t| t.as_ref().to_string()).collect();
        if topics.is_empty() {
            return Err(EventError::NoTopics);
        }
        if topics.iter().any(|t| t.trim().is_empty()) {
            return Err(EventError::EmptyTopic);
        }

        let listener = Listener {
            id: SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            priority,
            handler: Arc::new(handler),
        };
        let id = listener.id;

        let mut registry = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        for topic in topics {
            let listeners = registry.entry(topic).or_default();
            let at = listeners.partition_point(|l| l.priority <= priority);
            listeners.insert(at, listener.clone());
        }
        Ok(id)
    }

    /// Removes the subscription from every topic. Returns whether anything was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for listeners in registry.values_mut() {
            let before = listeners.len();
            listeners.retain(|l| l.id != id);
            removed |= listeners.len() != before;
        }
        removed
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }

    pub fn publish(&self, topic: &str, event: &Event<'_>) -> Result<(), EventError> {
        if topic.trim().is_empty() {
            return Err(EventError::EmptyTopic);
        }

        let listeners = self
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .cloned()
            .unwrap_or_default();

        let mut messages = Vec::new();
        for listener in listeners {
            if let Err(e) = (listener.handler)(topic, event) {
                warn!(topic, priority = listener.priority, error = %e, "event listener failed");
                messages.push(e.to_string());
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(EventError::ListenerFailed {
                topic: topic.to_string(),
                messages,
            })
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        let mut topics: Vec<_> = registry.iter().map(|(t, l)| (t.as_str(), l.len())).collect();
        topics.sort_unstable();
        f.debug_struct("EventBus").field("topics", &topics).finish()
    }
}
