//! The record store service — owns the three tables behind one async lock.
//!
//! All mutating operations hold the write lock for their whole
//! read-modify-write-flush sequence, so index-addressed calls always see the
//! positions they validated against. Every mutation is flushed to disk before
//! the call returns; if the flush fails, the in-memory table is rolled back to
//! the last persisted snapshot so memory and disk never diverge.

use crate::table::{load_or_create, write_table};
use ordbok_core::error::StoreError;
use ordbok_core::record::{Contact, Suggestion, VerbEntry};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Locations of the three table files.
#[derive(Debug, Clone)]
pub struct TablePaths {
    pub verbs: PathBuf,
    pub suggestions: PathBuf,
    pub contacts: PathBuf,
}

impl TablePaths {
    /// Conventional file names inside a data directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            verbs: dir.join("verbs.csv"),
            suggestions: dir.join("suggestions.csv"),
            contacts: dir.join("contacts.csv"),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    verbs: Vec<VerbEntry>,
    suggestions: Vec<Suggestion>,
    contacts: Vec<Contact>,
}

/// Outcome of a batched dedup insert: which keys went in and which were
/// rejected as duplicates. Duplicates are a reported category, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub added: Vec<String>,
    pub duplicates: Vec<String>,
}

/// Outcome of a caller-submitted suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// The infinitive is already in the Dictionary.
    InDictionary,
    /// The infinitive is already pending review.
    AlreadySuggested,
}

/// Outcome of a single direct insert into the Dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Inserted; `promoted` is true when a same-key Suggestion was consumed.
    Added { promoted: bool },
    Duplicate,
}

/// The record store: Dictionary, Suggestions, and Contacts tables.
pub struct RecordStore {
    paths: TablePaths,
    tables: RwLock<Tables>,
}

impl RecordStore {
    /// Load all three tables, creating any absent file with its canonical
    /// header. A table file that exists but cannot be read or decoded is
    /// fatal — the process must not start with a table it cannot trust.
    pub fn open(paths: TablePaths) -> Result<Self, StoreError> {
        let tables = Tables {
            verbs: load_or_create(&paths.verbs)?,
            suggestions: load_or_create(&paths.suggestions)?,
            contacts: load_or_create(&paths.contacts)?,
        };
        info!(
            verbs = tables.verbs.len(),
            suggestions = tables.suggestions.len(),
            contacts = tables.contacts.len(),
            "record store opened"
        );
        Ok(Self {
            paths,
            tables: RwLock::new(tables),
        })
    }

    // --- Dictionary ---

    /// Insert a batch of entries, skipping any whose `infinitive` is already
    /// in the Dictionary (earlier rows of the same batch count). One flush
    /// after the whole batch.
    pub async fn add_verbs(&self, rows: Vec<VerbEntry>) -> Result<BatchOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let snapshot = tables.verbs.clone();

        let mut outcome = BatchOutcome::default();
        for row in rows {
            if contains_infinitive(&tables.verbs, &row.infinitive) {
                outcome.duplicates.push(row.infinitive);
            } else {
                outcome.added.push(row.infinitive.clone());
                tables.verbs.push(row);
            }
        }

        if !outcome.added.is_empty() {
            if let Err(e) = write_table(&self.paths.verbs, &tables.verbs) {
                tables.verbs = snapshot;
                return Err(e);
            }
        }
        debug!(added = outcome.added.len(), duplicates = outcome.duplicates.len(), "add_verbs");
        Ok(outcome)
    }

    /// Insert one entry directly. A Dictionary duplicate is rejected even if
    /// the same infinitive is also pending. On success, a pending Suggestion
    /// with the same infinitive is consumed (promote semantics).
    pub async fn add_verb(&self, entry: VerbEntry) -> Result<AddOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        if contains_infinitive(&tables.verbs, &entry.infinitive) {
            return Ok(AddOutcome::Duplicate);
        }

        let verb_snapshot = tables.verbs.clone();
        let sug_snapshot = tables.suggestions.clone();

        let key = entry.infinitive.clone();
        tables.verbs.push(entry);
        let before = tables.suggestions.len();
        tables.suggestions.retain(|s| s.infinitive != key);
        let promoted = tables.suggestions.len() < before;

        let result = write_table(&self.paths.verbs, &tables.verbs).and_then(|()| {
            if promoted {
                write_table(&self.paths.suggestions, &tables.suggestions)
            } else {
                Ok(())
            }
        });
        if let Err(e) = result {
            tables.verbs = verb_snapshot;
            tables.suggestions = sug_snapshot;
            return Err(e);
        }
        Ok(AddOutcome::Added { promoted })
    }

    /// Snapshot of the Dictionary in insertion order.
    pub async fn verbs(&self) -> Vec<VerbEntry> {
        self.tables.read().await.verbs.clone()
    }

    // --- Suggestions ---

    /// Record a caller-submitted candidate, unless its infinitive already
    /// exists in the Dictionary or in the pending queue.
    pub async fn submit_suggestion(&self, sug: Suggestion) -> Result<SubmitOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        if contains_infinitive(&tables.verbs, &sug.infinitive) {
            return Ok(SubmitOutcome::InDictionary);
        }
        if tables.suggestions.iter().any(|s| s.infinitive == sug.infinitive) {
            return Ok(SubmitOutcome::AlreadySuggested);
        }

        tables.suggestions.push(sug);
        if let Err(e) = write_table(&self.paths.suggestions, &tables.suggestions) {
            tables.suggestions.pop();
            return Err(e);
        }
        Ok(SubmitOutcome::Accepted)
    }

    /// Promote the rows at the given 0-based indices into the Dictionary.
    ///
    /// Every index is validated against the current length before anything
    /// mutates; one stale index rejects the whole batch. Rows whose
    /// infinitive already exists in the Dictionary are reported as
    /// duplicates. The selected rows leave the queue only when at least one
    /// of them was actually promoted.
    pub async fn promote_by_indices(&self, indices: &[usize]) -> Result<BatchOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let len = tables.suggestions.len();
        if indices.iter().any(|&i| i >= len) {
            return Err(StoreError::IndexOutOfRange { len });
        }

        let selected: Vec<Suggestion> =
            indices.iter().map(|&i| tables.suggestions[i].clone()).collect();
        let verb_snapshot = tables.verbs.clone();
        let sug_snapshot = tables.suggestions.clone();

        let outcome = promote_into(&mut tables.verbs, &selected);
        if !outcome.added.is_empty() {
            let mut sorted: Vec<usize> = indices.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            for &i in sorted.iter().rev() {
                tables.suggestions.remove(i);
            }

            let result = write_table(&self.paths.verbs, &tables.verbs)
                .and_then(|()| write_table(&self.paths.suggestions, &tables.suggestions));
            if let Err(e) = result {
                tables.verbs = verb_snapshot;
                tables.suggestions = sug_snapshot;
                return Err(e);
            }
        }
        Ok(outcome)
    }

    /// Promote every pending row. The queue is emptied only when at least one
    /// row was actually promoted; an all-duplicates queue stays put.
    pub async fn promote_all(&self) -> Result<BatchOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        let selected = tables.suggestions.clone();
        let verb_snapshot = tables.verbs.clone();

        let outcome = promote_into(&mut tables.verbs, &selected);
        if !outcome.added.is_empty() {
            tables.suggestions.clear();

            let result = write_table(&self.paths.verbs, &tables.verbs)
                .and_then(|()| write_table(&self.paths.suggestions, &tables.suggestions));
            if let Err(e) = result {
                tables.verbs = verb_snapshot;
                tables.suggestions = selected;
                return Err(e);
            }
        }
        Ok(outcome)
    }

    /// Delete the rows at the given 0-based indices, returning the removed
    /// infinitives in the order the indices were given. One stale index
    /// rejects the whole batch with the valid range; nothing is deleted.
    pub async fn delete_suggestions(&self, indices: &[usize]) -> Result<Vec<String>, StoreError> {
        let mut tables = self.tables.write().await;
        let len = tables.suggestions.len();
        if indices.iter().any(|&i| i >= len) {
            return Err(StoreError::IndexOutOfRange { len });
        }

        let removed: Vec<String> = indices
            .iter()
            .map(|&i| tables.suggestions[i].infinitive.clone())
            .collect();
        let snapshot = tables.suggestions.clone();

        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for &i in sorted.iter().rev() {
            tables.suggestions.remove(i);
        }

        if let Err(e) = write_table(&self.paths.suggestions, &tables.suggestions) {
            tables.suggestions = snapshot;
            return Err(e);
        }
        Ok(removed)
    }

    /// Drop every pending row.
    pub async fn clear_suggestions(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let snapshot = std::mem::take(&mut tables.suggestions);
        if let Err(e) = write_table(&self.paths.suggestions, &tables.suggestions) {
            tables.suggestions = snapshot;
            return Err(e);
        }
        Ok(())
    }

    /// Replace the verb fields of the row at a 0-based index. The submitter
    /// identity fields survive the edit. Returns the updated row.
    pub async fn replace_suggestion(
        &self,
        index: usize,
        fields: VerbEntry,
    ) -> Result<Suggestion, StoreError> {
        let mut tables = self.tables.write().await;
        let len = tables.suggestions.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange { len });
        }

        let previous = tables.suggestions[index].clone();
        let row = &mut tables.suggestions[index];
        row.infinitive = fields.infinitive;
        row.present = fields.present;
        row.past = fields.past;
        row.past_participle = fields.past_participle;
        row.translation = fields.translation;
        let updated = row.clone();

        if let Err(e) = write_table(&self.paths.suggestions, &tables.suggestions) {
            tables.suggestions[index] = previous;
            return Err(e);
        }
        Ok(updated)
    }

    /// Snapshot of the pending queue in insertion order.
    pub async fn suggestions(&self) -> Vec<Suggestion> {
        self.tables.read().await.suggestions.clone()
    }

    pub async fn suggestion_count(&self) -> usize {
        self.tables.read().await.suggestions.len()
    }

    // --- Contacts ---

    /// Refresh the contact row for a caller, or append one. `username` and
    /// the last-active timestamp are refreshed on every call; `contact_info`
    /// is never set by this flow.
    pub async fn upsert_contact(
        &self,
        user_id: &str,
        username: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let snapshot = tables.contacts.clone();

        match tables.contacts.iter_mut().find(|c| c.user_id == user_id) {
            Some(contact) => contact.touch(username),
            None => tables.contacts.push(Contact::new(user_id, username)),
        }

        if let Err(e) = write_table(&self.paths.contacts, &tables.contacts) {
            tables.contacts = snapshot;
            return Err(e);
        }
        Ok(())
    }

    /// Snapshot of the contact log in insertion order.
    pub async fn contacts(&self) -> Vec<Contact> {
        self.tables.read().await.contacts.clone()
    }

    /// Row counts for all three tables: (verbs, suggestions, contacts).
    pub async fn counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read().await;
        (
            tables.verbs.len(),
            tables.suggestions.len(),
            tables.contacts.len(),
        )
    }
}

fn contains_infinitive(verbs: &[VerbEntry], infinitive: &str) -> bool {
    verbs.iter().any(|v| v.infinitive == infinitive)
}

/// Move non-duplicate suggestions into the dictionary vec, partitioning keys
/// into added and duplicate lists.
fn promote_into(verbs: &mut Vec<VerbEntry>, selected: &[Suggestion]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for sug in selected {
        if contains_infinitive(verbs, &sug.infinitive) {
            outcome.duplicates.push(sug.infinitive.clone());
        } else {
            outcome.added.push(sug.infinitive.clone());
            verbs.push(sug.entry());
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn entry(infinitive: &str) -> VerbEntry {
        VerbEntry::new(infinitive, "present", "past", "participle", "translation")
    }

    fn suggestion(infinitive: &str) -> Suggestion {
        Suggestion::from_entry(entry(infinitive), "1001", Some("alice"))
    }

    fn open_store() -> (TempDir, RecordStore) {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(TablePaths::in_dir(dir.path())).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn dedup_invariant_holds_across_batches() {
        let (_dir, store) = open_store();
        store
            .add_verbs(vec![entry("å danse"), entry("å legge")])
            .await
            .unwrap();
        let outcome = store
            .add_verbs(vec![entry("å danse"), entry("å være"), entry("å være")])
            .await
            .unwrap();

        assert_eq!(outcome.added, vec!["å være"]);
        assert_eq!(outcome.duplicates, vec!["å danse", "å være"]);

        let verbs = store.verbs().await;
        let mut keys: Vec<&str> = verbs.iter().map(|v| v.infinitive.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), verbs.len());
    }

    #[tokio::test]
    async fn mutations_survive_a_reopen() {
        let dir = tempdir().unwrap();
        let paths = TablePaths::in_dir(dir.path());

        let store = RecordStore::open(paths.clone()).unwrap();
        store.add_verbs(vec![entry("å danse")]).await.unwrap();
        store.submit_suggestion(suggestion("å gå")).await.unwrap();
        store.upsert_contact("7", Some("bob")).await.unwrap();
        drop(store);

        let reopened = RecordStore::open(paths).unwrap();
        assert_eq!(reopened.counts().await, (1, 1, 1));
        assert_eq!(reopened.verbs().await[0].infinitive, "å danse");
        assert_eq!(reopened.suggestions().await[0].submitter_name, "alice");
    }

    #[tokio::test]
    async fn submit_rejects_dictionary_and_pending_duplicates() {
        let (_dir, store) = open_store();
        store.add_verbs(vec![entry("å danse")]).await.unwrap();

        assert_eq!(
            store.submit_suggestion(suggestion("å danse")).await.unwrap(),
            SubmitOutcome::InDictionary
        );
        assert_eq!(
            store.submit_suggestion(suggestion("å gå")).await.unwrap(),
            SubmitOutcome::Accepted
        );
        assert_eq!(
            store.submit_suggestion(suggestion("å gå")).await.unwrap(),
            SubmitOutcome::AlreadySuggested
        );
        assert_eq!(store.suggestion_count().await, 1);
    }

    #[tokio::test]
    async fn delete_rejects_whole_batch_on_stale_index() {
        let (_dir, store) = open_store();
        for inf in ["a", "b", "c"] {
            store.submit_suggestion(suggestion(inf)).await.unwrap();
        }

        let err = store.delete_suggestions(&[0, 3]).await.unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfRange { len: 3 }));
        assert_eq!(store.suggestion_count().await, 3);

        let removed = store.delete_suggestions(&[2, 0]).await.unwrap();
        assert_eq!(removed, vec!["c", "a"]);
        assert_eq!(store.suggestions().await[0].infinitive, "b");
    }

    #[tokio::test]
    async fn promote_by_indices_moves_rows_and_reports_duplicates() {
        let (_dir, store) = open_store();
        store.add_verbs(vec![entry("b")]).await.unwrap();
        for inf in ["a", "b", "c"] {
            store.submit_suggestion(suggestion(inf)).await.unwrap();
        }

        let outcome = store.promote_by_indices(&[0, 1]).await.unwrap();
        assert_eq!(outcome.added, vec!["a"]);
        assert_eq!(outcome.duplicates, vec!["b"]);

        // Both selected rows left the queue; only "c" remains.
        let pending = store.suggestions().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].infinitive, "c");
        assert_eq!(store.verbs().await.len(), 2);
    }

    #[tokio::test]
    async fn promote_all_keeps_queue_when_everything_is_duplicate() {
        let (_dir, store) = open_store();
        store.add_verbs(vec![entry("a")]).await.unwrap();
        store.submit_suggestion(suggestion("a")).await.unwrap();

        let outcome = store.promote_all().await.unwrap();
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.duplicates, vec!["a"]);
        assert_eq!(store.suggestion_count().await, 1);
    }

    #[tokio::test]
    async fn promote_all_drains_queue_when_any_row_moves() {
        let (_dir, store) = open_store();
        store.submit_suggestion(suggestion("a")).await.unwrap();
        store.submit_suggestion(suggestion("b")).await.unwrap();

        let outcome = store.promote_all().await.unwrap();
        assert_eq!(outcome.added, vec!["a", "b"]);
        assert_eq!(store.suggestion_count().await, 0);
        assert_eq!(store.verbs().await.len(), 2);
    }

    #[tokio::test]
    async fn replace_preserves_submitter_fields() {
        let (_dir, store) = open_store();
        store.submit_suggestion(suggestion("å gå")).await.unwrap();

        let updated = store
            .replace_suggestion(0, VerbEntry::new("å gå", "går", "gikk", "har gått", "to go"))
            .await
            .unwrap();
        assert_eq!(updated.present, "går");
        assert_eq!(updated.submitter_id, "1001");
        assert_eq!(updated.submitter_name, "alice");

        let err = store.replace_suggestion(5, entry("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfRange { len: 1 }));
    }

    #[tokio::test]
    async fn add_verb_promotes_matching_suggestion() {
        let (_dir, store) = open_store();
        store.submit_suggestion(suggestion("å gå")).await.unwrap();

        let outcome = store.add_verb(entry("å gå")).await.unwrap();
        assert_eq!(outcome, AddOutcome::Added { promoted: true });
        assert_eq!(store.suggestion_count().await, 0);

        let outcome = store.add_verb(entry("å gå")).await.unwrap();
        assert_eq!(outcome, AddOutcome::Duplicate);
    }

    #[tokio::test]
    async fn upsert_contact_keeps_one_row_per_caller() {
        let (_dir, store) = open_store();
        store.upsert_contact("7", None).await.unwrap();
        store.upsert_contact("7", Some("bob")).await.unwrap();
        store.upsert_contact("8", Some("carol")).await.unwrap();

        let contacts = store.contacts().await;
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].user_id, "7");
        assert_eq!(contacts[0].username, "bob");
        assert_eq!(contacts[0].contact_info, "N/A");
    }

    #[tokio::test]
    async fn failed_flush_rolls_back_memory() {
        let dir = tempdir().unwrap();
        let paths = TablePaths::in_dir(dir.path());
        let store = RecordStore::open(paths.clone()).unwrap();
        store.add_verbs(vec![entry("å danse")]).await.unwrap();

        // Make the verbs path unwritable by turning it into a directory.
        std::fs::remove_file(&paths.verbs).unwrap();
        std::fs::create_dir(&paths.verbs).unwrap();

        let err = store.add_verbs(vec![entry("å gå")]).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        // In-memory state rolled back to the last persisted snapshot.
        assert_eq!(store.verbs().await.len(), 1);
    }
}
