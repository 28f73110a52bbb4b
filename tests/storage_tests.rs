use kliksy_gate::storage::{DirectoryStore, KeyValueStore, MemoryStore, StoreError};

#[cfg(test)]
mod memory_tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        // Removing an empty slot is a no-op.
        store.remove("k").unwrap();
    }

    #[test]
    fn test_clones_share_slots() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.clone();

        tab_a.set("k", "from a").unwrap();
        assert_eq!(tab_b.get("k").unwrap().as_deref(), Some("from a"));
        assert_eq!(tab_b.len(), 1);
    }
}

#[cfg(test)]
mod directory_tests {
    use super::*;

    #[test]
    fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("origin"));

        assert_eq!(store.get("kliksyUser").unwrap(), None);
        store.set("kliksyUser", r#"{"email":"a@x.com"}"#).unwrap();

        // A second handle on the same directory sees the value, like a reload.
        let reopened = DirectoryStore::new(dir.path().join("origin"));
        assert_eq!(
            reopened.get("kliksyUser").unwrap().as_deref(),
            Some(r#"{"email":"a@x.com"}"#)
        );

        reopened.remove("kliksyUser").unwrap();
        reopened.remove("kliksyUser").unwrap();
        assert_eq!(store.get("kliksyUser").unwrap(), None);
    }

    #[test]
    fn test_keys_cannot_escape_origin() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin");
        let store = DirectoryStore::new(&origin);

        assert!(matches!(
            store.set("../../etc/passwd", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(!origin.exists());
        assert!(!dir.path().join("etc").exists());
    }

    #[test]
    fn test_unusable_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        for key in ["", ".", "..", "../", "a/b", "a\\b", "a\0b"] {
            assert!(
                matches!(store.get(key), Err(StoreError::InvalidKey(_))),
                "{key:?}"
            );
        }
    }

    #[test]
    fn test_similar_keys_use_distinct_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        store.set("a_b", "underscore").unwrap();
        assert!(store.set("a/b", "slash").is_err());
        assert_eq!(store.get("a_b").unwrap().as_deref(), Some("underscore"));
    }

    #[test]
    fn test_concurrent_writers_never_tear_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        let values: Vec<String> = (0..4).map(|n| n.to_string().repeat(4096)).collect();

        std::thread::scope(|scope| {
            for value in &values {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        store.set("kliksyUser", value).unwrap();
                    }
                });
            }
        });

        let stored = store.get("kliksyUser").unwrap().unwrap();
        assert!(values.contains(&stored));
        // No staging files are left behind.
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_other_slots_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        store.set("theme", "dark").unwrap();
        store.set("kliksyUser", "{}").unwrap();

        store.remove("kliksyUser").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }
}
