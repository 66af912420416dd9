use parking_lot::RwLock;
use std::collections::HashMap;
use std::thread::{self, ThreadId};

/// Maps worker threads to their processor ids for the current activation.
///
/// The harness assigns each worker a slot during its entry routine; queue
/// strategies resolve the calling thread through a capability closure over
/// this registry rather than ambient thread-local state.
#[derive(Debug, Default)]
pub(crate) struct ProcessorRegistry {
    slots: RwLock<HashMap<ThreadId, usize>>,
}

impl ProcessorRegistry {
    pub(crate) fn assign_current(&self, processor_id: usize) {
        self.slots.write().insert(thread::current().id(), processor_id);
    }

    pub(crate) fn current(&self) -> Option<usize> {
        self.slots.read().get(&thread::current().id()).copied()
    }

    pub(crate) fn clear(&self) {
        self.slots.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unassigned_thread_resolves_none() {
        let registry = ProcessorRegistry::default();
        assert_eq!(registry.current(), None);
    }

    #[test]
    fn test_assignment_is_per_thread() {
        let registry = Arc::new(ProcessorRegistry::default());
        registry.assign_current(3);
        assert_eq!(registry.current(), Some(3));

        let other = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.current())
        };
        assert_eq!(other.join().unwrap(), None);

        registry.clear();
        assert_eq!(registry.current(), None);
    }
}
