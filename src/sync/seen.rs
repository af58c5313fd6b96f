use std::collections::HashSet;

use super::error::SyncError;
use crate::store::LocalStore;

/// Snapshot of identifiers already in the local store, taken once at the
/// start of a run. Commits made during the run are not added back.
#[derive(Debug, Clone, Default)]
pub struct SeenSet(HashSet<String>);

impl SeenSet {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashSet<String>> for SeenSet {
    fn from(ids: HashSet<String>) -> Self {
        Self(ids)
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Read the seen set. A failure here aborts the run before any remote call.
pub async fn load_seen_set(store: &dyn LocalStore) -> Result<SeenSet, SyncError> {
    let seen = store
        .load_seen_ids()
        .await
        .map(SeenSet::from)
        .map_err(SyncError::SeenSetLoad)?;
    if seen.is_empty() {
        tracing::info!("Local store is empty, every ready item is new");
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MediaRow, SqliteStore};
    use crate::test_support::ready;

    #[tokio::test]
    async fn test_load_reflects_store_contents() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .write_batch(&[
                MediaRow::new(ready("A"), vec![]),
                MediaRow::new(ready("B"), vec![]),
            ])
            .await
            .unwrap();

        let seen = load_seen_set(&store).await.unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("A"));
        assert!(!seen.contains("C"));
    }

    #[test]
    fn test_collect_from_strs() {
        let seen: SeenSet = ["A", "B", "A"].into_iter().collect();
        assert_eq!(seen.len(), 2);
        assert!(!seen.is_empty());
    }
}
