use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use crate::entry::Entry;

/// An immutable, ordered collection of documentation entries.
///
/// Built once from an inventory and only ever read afterwards. Refreshing
/// the corpus means building a new index and swapping it in through an
/// [`IndexHandle`].
#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    project: String,
    version: String,
    base_url: String,
    entries: Vec<Entry>,
}

impl EntryIndex {
    pub fn new(
        project: impl Into<String>,
        version: impl Into<String>,
        base_url: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
            base_url: base_url.into(),
            entries,
        }
    }

    /// An index with no project metadata, mostly useful in tests.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self::new("", "", "", entries)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries per Sphinx domain, sorted by domain.
    pub fn domain_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.domain.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// A shared, swappable reference to the current [`EntryIndex`].
///
/// Readers take a snapshot and keep using it for the whole request, so a
/// concurrent [`IndexHandle::replace`] never changes results mid-flight.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<EntryIndex>>>,
}

impl IndexHandle {
    pub fn new(index: EntryIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// The index as of now.
    pub fn snapshot(&self) -> Arc<EntryIndex> {
        // The lock only guards a pointer swap, so a poisoned lock still
        // holds a complete index.
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Swap in a freshly built index.
    pub fn replace(&self, index: EntryIndex) {
        let index = Arc::new(index);
        match self.current.write() {
            Ok(mut guard) => *guard = index,
            Err(poisoned) => *poisoned.into_inner() = index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(project: &str) -> EntryIndex {
        EntryIndex::new(
            project,
            "1.0",
            "https://docs.example/",
            vec![
                Entry::new("a", "https://docs.example/a").with_domain("py:class"),
                Entry::new("b", "https://docs.example/b").with_domain("py:class"),
                Entry::new("c", "https://docs.example/c"),
            ],
        )
    }

    #[test]
    fn metadata_accessors() {
        let index = sample("demo");
        assert_eq!(index.project(), "demo");
        assert_eq!(index.version(), "1.0");
        assert_eq!(index.base_url(), "https://docs.example/");
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
    }

    #[test]
    fn domain_counts_groups_entries() {
        let index = sample("demo");
        let counts = index.domain_counts();
        assert_eq!(counts.get("py:class"), Some(&2));
        assert_eq!(counts.get("std:label"), Some(&1));
    }

    #[test]
    fn empty_index() {
        let index = EntryIndex::default();
        assert!(index.is_empty());
        assert!(index.domain_counts().is_empty());
    }

    #[test]
    fn replace_keeps_old_snapshots_valid() {
        let handle = IndexHandle::new(sample("old"));
        let before = handle.snapshot();

        handle.replace(sample("new"));

        assert_eq!(before.project(), "old");
        assert_eq!(handle.snapshot().project(), "new");
    }

    #[test]
    fn clones_share_the_same_slot() {
        let handle = IndexHandle::new(sample("old"));
        let other = handle.clone();

        other.replace(sample("new"));

        assert_eq!(handle.snapshot().project(), "new");
    }
}
