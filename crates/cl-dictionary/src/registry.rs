use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::dictionary::CasedDictionary;

/// The set of dictionaries a lookup run consults, unique by name.
///
/// Passed explicitly to whoever needs it; there is no global instance.
/// Readers share the lock; registration takes it exclusively so the
/// duplicate check and the insert cannot interleave.
#[derive(Default)]
pub struct DictionaryRegistry {
    dictionaries: RwLock<Vec<Arc<dyn CasedDictionary>>>,
}

impl DictionaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dictionary. Returns false, leaving the registry unchanged,
    /// if one with the same name is already present.
    pub fn add(&self, dictionary: Arc<dyn CasedDictionary>) -> bool {
        let mut dictionaries = self.dictionaries.write();
        if dictionaries.iter().any(|d| d.name() == dictionary.name()) {
            warn!("Dictionary {} already registered", dictionary.name());
            return false;
        }
        info!("Registered dictionary {}", dictionary.name());
        dictionaries.push(dictionary);
        true
    }

    /// Snapshot of the registered dictionaries in registration order.
    pub fn all(&self) -> Vec<Arc<dyn CasedDictionary>> {
        self.dictionaries.read().clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CasedDictionary>> {
        self.dictionaries
            .read()
            .iter()
            .find(|d| d.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.dictionaries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDictionary;

    fn named(name: &str) -> Arc<dyn CasedDictionary> {
        Arc::new(MemoryDictionary::new(name))
    }

    #[test]
    fn add_and_list() {
        let registry = DictionaryRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.add(named("a")));
        assert!(registry.add(named("b")));
        let names: Vec<String> = registry.all().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(registry.get("b").is_some());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn duplicate_name_is_refused() {
        let registry = DictionaryRegistry::new();
        let first = named("a");
        assert!(registry.add(Arc::clone(&first)));
        assert!(!registry.add(named("a")));
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.all()[0], &first));
    }

    #[test]
    fn concurrent_registration_keeps_names_unique() {
        let registry = Arc::new(DictionaryRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.add(named(&format!("d{}", i % 4))))
            })
            .collect();
        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();
        assert_eq!(added, 4);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn readers_and_writers_interleave() {
        let registry = Arc::new(DictionaryRegistry::new());
        registry.add(named("base"));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        registry.add(named(&format!("w{i}")));
                    }
                    for _ in 0..100 {
                        assert!(registry.get("base").is_some());
                        assert!(!registry.all().is_empty());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 5);
    }
}
