use std::collections::BTreeMap;

use crate::event::ListenerKind;

/// Handle returned by [`ListenerRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Host-side table of input subscriptions.
///
/// The host consults the registry before routing an event: an event kind
/// with no registration is dropped. Whoever registers is responsible for
/// removing its entries on teardown.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: BTreeMap<ListenerId, ListenerKind>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, kind);
        tracing::trace!(?id, ?kind, "listener registered");
        id
    }

    /// Remove a registration. Returns false if it was already gone.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            tracing::trace!(?id, "listener removed");
        }
        removed
    }

    /// Whether any registration exists for `kind`.
    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.entries.values().any(|k| *k == kind)
    }

    /// Total number of live registrations.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn count_of(&self, kind: ListenerKind) -> usize {
        self.entries.values().filter(|k| **k == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_remove() {
        let mut reg = ListenerRegistry::new();
        let a = reg.register(ListenerKind::Wheel);
        let b = reg.register(ListenerKind::Wheel);
        assert_ne!(a, b);
        assert_eq!(reg.count_of(ListenerKind::Wheel), 2);

        assert!(reg.remove(a));
        assert!(!reg.remove(a));
        assert!(reg.is_listening(ListenerKind::Wheel));
        assert!(reg.remove(b));
        assert!(!reg.is_listening(ListenerKind::Wheel));
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut reg = ListenerRegistry::new();
        let a = reg.register(ListenerKind::Resize);
        reg.remove(a);
        let b = reg.register(ListenerKind::Resize);
        assert_ne!(a, b);
    }
}
