use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, warn};

use super::domain::{FormState, LevelCatalog, QualificationRecord, RecordDraft, Tier};
use super::persistence::{decode_state, encode_state, BlobStore, StorageError, STORAGE_KEY};
use super::progress::ProgressBreakdown;
use super::submission::{build_payload, SubmissionPayload};
use super::validation::{submission_problems, validate_entry, ValidationError};

/// Errors raised by the form service.
#[derive(Debug, thiserror::Error)]
pub enum FormServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("submission blocked by {} problem(s)", problems.len())]
    SubmissionBlocked { problems: Vec<String> },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Sole owner of the form state. Every read and write goes through this
/// service; callers receive owned snapshots and can never alias the state.
///
/// Mutations persist synchronously through the injected blob store. Save
/// failures are logged and swallowed so the mutation path stays total.
pub struct QualificationFormService<S> {
    catalog: LevelCatalog,
    store: Arc<S>,
    state: Mutex<FormState>,
}

impl<S> QualificationFormService<S>
where
    S: BlobStore,
{
    /// Hydrate the service from the blob store, falling back to the empty
    /// default when nothing (or nothing usable) is stored.
    pub fn open(store: Arc<S>, catalog: LevelCatalog) -> Result<Self, FormServiceError> {
        let state = match store.load(STORAGE_KEY)? {
            Some(blob) => decode_state(&blob),
            None => FormState::default(),
        };

        Ok(Self {
            catalog,
            store,
            state: Mutex::new(state),
        })
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    fn locked(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().expect("form state mutex poisoned")
    }

    fn persist(&self, state: &FormState) {
        let result = encode_state(state).and_then(|blob| self.store.save(STORAGE_KEY, &blob));
        if let Err(error) = result {
            warn!(%error, "failed to persist form state; continuing with in-memory copy");
        }
    }

    /// Validate and append a record to `tier`'s sequence, returning the
    /// normalized record as stored.
    pub fn add_record(
        &self,
        tier: Tier,
        draft: &RecordDraft,
    ) -> Result<QualificationRecord, FormServiceError> {
        let record = validate_entry(&self.catalog, tier, draft)?;

        let mut state = self.locked();
        state.records_mut(tier).push(record.clone());
        self.persist(&state);
        debug!(tier = tier.slug(), subject = %record.subject, "record added");

        Ok(record)
    }

    /// Remove the record at `index` within `tier`. Out-of-bounds requests
    /// are silently ignored so the deletion path is total.
    pub fn remove_record(&self, tier: Tier, index: usize) {
        let mut state = self.locked();
        let records = state.records_mut(tier);
        if index >= records.len() {
            return;
        }

        records.remove(index);
        self.persist(&state);
        debug!(tier = tier.slug(), index, "record removed");
    }

    /// Replace the extenuating-circumstances note verbatim.
    pub fn set_note(&self, text: String) {
        let mut state = self.locked();
        state.extenuating = text;
        self.persist(&state);
    }

    /// Owned copy of the current state for read-only consumers.
    pub fn snapshot(&self) -> FormState {
        self.locked().clone()
    }

    pub fn progress(&self) -> u8 {
        self.progress_breakdown().total
    }

    pub fn progress_breakdown(&self) -> ProgressBreakdown {
        ProgressBreakdown::of(&self.locked())
    }

    /// All outstanding pre-submission problems; empty means submittable.
    pub fn submission_problems(&self) -> Vec<String> {
        submission_problems(&self.locked())
    }

    /// Run global validation and, if it passes, assemble the submission
    /// payload. The form state is unchanged either way.
    pub fn submit(&self) -> Result<SubmissionPayload, FormServiceError> {
        let state = self.locked();
        let problems = submission_problems(&state);
        if !problems.is_empty() {
            return Err(FormServiceError::SubmissionBlocked { problems });
        }

        Ok(build_payload(&state, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        blobs: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn blob(&self) -> Option<String> {
            self.blobs.lock().expect("lock").get(STORAGE_KEY).cloned()
        }
    }

    impl BlobStore for MemoryStore {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.blobs.lock().expect("lock").get(key).cloned())
        }

        fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
            self.blobs
                .lock()
                .expect("lock")
                .insert(key.to_string(), blob.to_string());
            Ok(())
        }
    }

    struct BrokenStore;

    impl BlobStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn save(&self, _key: &str, _blob: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn service() -> QualificationFormService<MemoryStore> {
        QualificationFormService::open(Arc::new(MemoryStore::default()), LevelCatalog::standard())
            .expect("opens with empty store")
    }

    fn maths_draft() -> RecordDraft {
        RecordDraft {
            subject: "Mathematics".to_string(),
            level: "GCSE".to_string(),
            grade: "9".to_string(),
            year: "2024".to_string(),
        }
    }

    #[test]
    fn rejected_draft_leaves_the_store_unchanged() {
        let service = service();
        let mut draft = maths_draft();
        draft.subject = "  ".to_string();

        match service.add_record(Tier::Gcse, &draft) {
            Err(FormServiceError::Validation(ValidationError::MissingField("subject"))) => {}
            other => panic!("expected missing subject, got {other:?}"),
        }
        assert!(service.snapshot().gcse.is_empty());
    }

    #[test]
    fn open_surfaces_load_failures_as_storage_errors() {
        struct OfflineStore;

        impl BlobStore for OfflineStore {
            fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Err(StorageError::Unavailable("disk offline".to_string()))
            }

            fn save(&self, _key: &str, _blob: &str) -> Result<(), StorageError> {
                Err(StorageError::Unavailable("disk offline".to_string()))
            }
        }

        match QualificationFormService::open(Arc::new(OfflineStore), LevelCatalog::standard()) {
            Err(FormServiceError::Storage(StorageError::Unavailable(_))) => {}
            Err(other) => panic!("expected storage error, got {other:?}"),
            Ok(_) => panic!("expected storage error, got a service"),
        }
    }

    #[test]
    fn added_record_is_persisted() {
        let store = Arc::new(MemoryStore::default());
        let service =
            QualificationFormService::open(store.clone(), LevelCatalog::standard()).expect("opens");

        service
            .add_record(Tier::Gcse, &maths_draft())
            .expect("valid draft");

        let blob = store.blob().expect("saved after mutation");
        assert!(blob.contains("Mathematics"));
    }

    #[test]
    fn reopening_from_the_same_store_restores_state() {
        let store = Arc::new(MemoryStore::default());
        {
            let service = QualificationFormService::open(store.clone(), LevelCatalog::standard())
                .expect("opens");
            service
                .add_record(Tier::LevelThree, &RecordDraft {
                    subject: "Physics".to_string(),
                    level: "A Level".to_string(),
                    grade: "B".to_string(),
                    year: String::new(),
                })
                .expect("valid draft");
            service.set_note("carried over".to_string());
        }

        let reopened =
            QualificationFormService::open(store, LevelCatalog::standard()).expect("reopens");
        let state = reopened.snapshot();
        assert_eq!(state.l3.len(), 1);
        assert_eq!(state.extenuating, "carried over");
    }

    #[test]
    fn out_of_bounds_removal_is_a_no_op() {
        let service = service();
        service
            .add_record(Tier::Gcse, &maths_draft())
            .expect("valid draft");

        service.remove_record(Tier::Gcse, 5);
        service.remove_record(Tier::LevelThree, 0);

        let state = service.snapshot();
        assert_eq!(state.gcse.len(), 1);
        assert_eq!(state.gcse[0].subject, "Mathematics");
    }

    #[test]
    fn removal_at_valid_index_drops_that_record() {
        let service = service();
        service
            .add_record(Tier::Gcse, &maths_draft())
            .expect("valid draft");
        let mut english = maths_draft();
        english.subject = "English Language".to_string();
        service
            .add_record(Tier::Gcse, &english)
            .expect("valid draft");

        service.remove_record(Tier::Gcse, 0);

        let state = service.snapshot();
        assert_eq!(state.gcse.len(), 1);
        assert_eq!(state.gcse[0].subject, "English Language");
    }

    #[test]
    fn set_note_stores_text_verbatim() {
        let service = service();
        service.set_note("  untrimmed note  ".to_string());
        assert_eq!(service.snapshot().extenuating, "  untrimmed note  ");
    }

    #[test]
    fn save_failures_do_not_block_mutations() {
        let service =
            QualificationFormService::open(Arc::new(BrokenStore), LevelCatalog::standard())
                .expect("opens despite broken saves");

        service
            .add_record(Tier::Gcse, &maths_draft())
            .expect("mutation succeeds even when persistence fails");
        assert_eq!(service.snapshot().gcse.len(), 1);
    }

    #[test]
    fn submit_blocked_until_global_rules_pass() {
        let service = service();
        match service.submit() {
            Err(FormServiceError::SubmissionBlocked { problems }) => {
                assert_eq!(problems.len(), 3);
            }
            other => panic!("expected blocked submission, got {other:?}"),
        }

        service
            .add_record(Tier::Gcse, &maths_draft())
            .expect("valid draft");
        let mut english = maths_draft();
        english.subject = "English Literature".to_string();
        service
            .add_record(Tier::Gcse, &english)
            .expect("valid draft");

        let payload = service.submit().expect("submittable");
        assert_eq!(payload.gcse.len(), 2);
        assert_eq!(payload.extenuating, None);
    }

    #[test]
    fn submit_does_not_mutate_state() {
        let service = service();
        let before = service.snapshot();
        let _ = service.submit();
        assert_eq!(service.snapshot(), before);
    }

    #[test]
    fn progress_reflects_store_contents() {
        let service = service();
        assert_eq!(service.progress(), 0);
        service
            .add_record(Tier::Gcse, &maths_draft())
            .expect("valid draft");
        assert_eq!(service.progress(), 30);
    }
}
