use std::{fs, time::Duration};

use multiprof::{
    CreateOptions, Error, LATEST_VERSION, OpenOptions, ProfileStore, Timestamp,
    persist::{NEXT_FILE, REGISTRY_FILE},
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> ProfileStore {
    ProfileStore::open(dir.path(), OpenOptions::default()).unwrap()
}

#[test]
fn create_on_empty_directory() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    assert!(store.active().is_none());

    let profile = store.create(CreateOptions::named("a")).unwrap().unwrap();
    assert!(profile.active);
    assert_eq!(profile.id, 0);
    assert_eq!(profile.name.as_deref(), Some("a"));
    assert_eq!(store.active(), Some(&profile));
}

#[test]
fn remove_then_collect() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    let first = store.create(CreateOptions::default()).unwrap().unwrap();
    let second = store.create(CreateOptions::default()).unwrap().unwrap();
    let storage = store.storage(first.id);
    fs::create_dir_all(storage.join("db")).unwrap();
    fs::write(storage.join("db").join("LOG"), "data").unwrap();

    assert!(store.remove(first.id).unwrap());
    assert_eq!(store.list(), std::slice::from_ref(&second));
    assert!(storage.exists());

    let report = store.collect(Duration::ZERO).unwrap();
    assert_eq!(report.collected, 1);
    assert!(store.pending().is_empty());
    assert!(!storage.exists());
}

#[test]
fn grace_period_is_respected_across_reopen() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    store.create(CreateOptions::default()).unwrap();
    store.remove(0).unwrap();

    let mut reopened = open(&dir);
    let report = reopened.collect(Duration::from_secs(3600)).unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(reopened.pending().len(), 1);
    // the pending id stays reserved
    let next = reopened.create(CreateOptions::default()).unwrap().unwrap();
    assert_eq!(next.id, 1);
}

#[test]
fn at_most_one_active_profile() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    for step in 0u64..40 {
        match step % 5 {
            0 | 1 => {
                let options = if step % 3 == 0 {
                    CreateOptions::default().inactive()
                } else {
                    CreateOptions::default()
                };
                store.create(options).unwrap();
            }
            2 => {
                let id = step % store.next_id().max(1);
                store.update(id, step % 2 == 0).unwrap();
            }
            3 => {
                if let Some(id) = store.list().first().map(|p| p.id) {
                    store.remove(id).unwrap();
                }
            }
            _ => {
                store.collect(Duration::ZERO).unwrap();
            }
        }
        let active = store.list().iter().filter(|p| p.active).count();
        assert!(active <= 1, "{active} active profiles after step {step}");
    }
}

#[test]
fn reopen_reproduces_profiles_and_pending_entries() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    store
        .create(CreateOptions::named("work").with_created(Timestamp(1_000)))
        .unwrap();
    store
        .create(
            CreateOptions::named("home")
                .with_created(Timestamp(2_000))
                .inactive(),
        )
        .unwrap();
    store.remove_at(0, Timestamp(3_000)).unwrap();

    let reopened = open(&dir);
    assert_eq!(reopened.version(), LATEST_VERSION);
    assert_eq!(reopened.list(), store.list());
    assert_eq!(reopened.pending(), store.pending());
}

#[test]
fn crash_before_rename_recovers_from_write_ahead_file() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    store.create(CreateOptions::named("a")).unwrap();
    fs::rename(
        dir.path().join(REGISTRY_FILE),
        dir.path().join(NEXT_FILE),
    )
    .unwrap();

    let reopened = open(&dir);
    assert_eq!(reopened.list(), store.list());
}

#[test]
fn relocated_directory_derives_new_storage() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("a");
    let moved = dir.path().join("b");
    let mut store = ProfileStore::open(&original, OpenOptions::default()).unwrap();
    store.create(CreateOptions::default()).unwrap();
    fs::rename(&original, &moved).unwrap();

    let reopened = ProfileStore::open(&moved, OpenOptions::default()).unwrap();
    assert_eq!(reopened.storage(0), moved.join("0"));
}

#[test]
fn unsupported_version_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(REGISTRY_FILE), r#"{"version": 9}"#).unwrap();
    let result = ProfileStore::open(dir.path(), OpenOptions::default());
    assert!(matches!(
        result,
        Err(Error::UnsupportedVersion { found: 9, .. })
    ));
    assert!(matches!(
        ProfileStore::migrate(dir.path()),
        Err(Error::UnsupportedVersion { found: 9, .. })
    ));
}

#[test]
fn migrate_legacy_layout() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("CORESTORE"), "").unwrap();
    fs::create_dir(dir.path().join("cores")).unwrap();

    let store = ProfileStore::migrate(dir.path()).unwrap();
    assert_eq!(store.list().len(), 1);
    let active = store.active().unwrap();
    assert_eq!(active.id, 0);
    assert!(active.active);
    assert!(dir.path().join("0").join("cores").is_dir());

    let again = ProfileStore::migrate(dir.path()).unwrap();
    assert_eq!(again.list(), store.list());
    assert_eq!(again.active().map(|p| p.id), Some(0));
}
