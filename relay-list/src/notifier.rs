//! Single-threaded change notification.

use std::collections::BTreeMap;
use std::fmt;

use log::trace;

/// Handle returned by [`EventNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u32);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__subscription_{}", self.0)
    }
}

type Listener<T> = Box<dyn FnMut(&T)>;

/// Holds the latest value of `T` and fans every new value out to listeners.
///
/// New listeners are called immediately with the latest value, so a
/// subscriber never has to ask for the initial state separately.
pub struct EventNotifier<T> {
    latest: T,
    next_id: u32,
    listeners: BTreeMap<SubscriptionId, Listener<T>>,
}

impl<T> EventNotifier<T> {
    pub fn new(initial: T) -> Self {
        Self {
            latest: initial,
            next_id: 0,
            listeners: BTreeMap::new(),
        }
    }

    pub fn latest(&self) -> &T {
        &self.latest
    }

    pub fn subscribe(&mut self, mut listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        listener(&self.latest);
        self.listeners.insert(id, Box::new(listener));
        trace!("Subscribed {}", id);
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn unsubscribe_all(&mut self) {
        self.listeners.clear();
    }

    /// Store `value` and call every listener in subscription order.
    pub fn notify(&mut self, value: T) {
        self.latest = value;
        for listener in self.listeners.values_mut() {
            listener(&self.latest);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T: fmt::Debug> fmt::Debug for EventNotifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier")
            .field("latest", &self.latest)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
