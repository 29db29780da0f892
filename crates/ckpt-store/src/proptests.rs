use ckpt_engine::InMemoryEngine;
use proptest::collection::vec;
use proptest::prelude::*;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::CheckpointStore;

fn store() -> CheckpointStore<InMemoryEngine> {
    CheckpointStore::with_engine(InMemoryEngine::new(), StoreConfig::default())
}

fn bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    vec(any::<u8>(), 0..max)
}

proptest! {
    #[test]
    fn save_then_get_returns_value_with_one_reference(key in bytes(64), value in bytes(512)) {
        let store = store();
        prop_assert_eq!(store.save(&key, &value).unwrap(), 1);
        let record = store.get(&key).unwrap();
        prop_assert_eq!(record.reference_count, 1);
        prop_assert_eq!(record.value, value);
    }

    #[test]
    fn mismatched_save_is_rejected_without_mutation(
        key in bytes(32),
        v1 in bytes(128),
        v2 in bytes(128),
    ) {
        prop_assume!(v1 != v2);
        let store = store();
        store.save(&key, &v1).unwrap();

        let err = store.save(&key, &v2).unwrap_err();
        prop_assert!(matches!(err, StoreError::ContentMismatch { .. }), "unexpected error: {:?}", err);

        let record = store.get(&key).unwrap();
        prop_assert_eq!(record.reference_count, 1);
        prop_assert_eq!(record.value, v1);
    }

    #[test]
    fn counts_rise_by_one_and_decay_to_removal(
        key in bytes(32),
        value in bytes(64),
        via_save in vec(any::<bool>(), 0..40),
    ) {
        let store = store();
        store.save(&key, &value).unwrap();

        for (i, save) in via_save.iter().enumerate() {
            let count = if *save {
                store.save(&key, &value).unwrap()
            } else {
                store.increment_reference(&key).unwrap()
            };
            prop_assert_eq!(count as usize, i + 2);
        }

        let total = via_save.len() as i32 + 1;
        prop_assert_eq!(store.get(&key).unwrap().reference_count, total);

        for expected in (0..total).rev() {
            prop_assert_eq!(store.delete(&key).unwrap(), expected);
        }
        prop_assert!(store.get(&key).unwrap_err().is_not_found());
    }

    #[test]
    fn failures_on_absent_keys_leave_store_unchanged(
        present in bytes(16),
        absent in bytes(16),
        value in bytes(64),
    ) {
        prop_assume!(present != absent);
        let store = store();
        store.save(&present, &value).unwrap();

        prop_assert!(store.increment_reference(&absent).unwrap_err().is_not_found());
        prop_assert!(store.delete(&absent).unwrap_err().is_not_found());
        prop_assert!(store.get(&absent).unwrap_err().is_not_found());

        let record = store.get(&present).unwrap();
        prop_assert_eq!(record.reference_count, 1);
        prop_assert_eq!(record.value, value);
        prop_assert_eq!(store.engine().len(), 1);
    }
}
