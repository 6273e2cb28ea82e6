use std::path::{Path, PathBuf};

use crate::{
    Error, Result,
    model::{GcEntry, Profile, Timestamp, storage_path},
    persist,
};

/// Newest registry schema this build understands
pub const LATEST_VERSION: u32 = 1;
/// Schema of the single-profile layout, before profiles existed
pub const OLDEST_VERSION: u32 = 0;

#[derive(Clone, Debug)]
pub struct OpenOptions {
    /// Version assumed when the registry on disk does not record one
    pub version: u32,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
        }
    }
}

/// Parameters of [`ProfileStore::create`]
///
/// Unset fields are resolved against the store state at call time: `id`
/// becomes [`ProfileStore::next_id`] and `created` becomes now.
#[derive(Clone, Debug)]
pub struct CreateOptions {
    pub active: bool,
    pub id: Option<u64>,
    pub name: Option<String>,
    pub created: Option<Timestamp>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            active: true,
            id: None,
            name: None,
            created: None,
        }
    }
}

impl CreateOptions {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_created(mut self, created: Timestamp) -> Self {
        self.created = Some(created);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Registry of profiles backed by one directory
///
/// Every mutation is committed to disk before the call returns.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    pub(crate) directory: PathBuf,
    pub(crate) version: u32,
    pub(crate) profiles: Vec<Profile>,
    pub(crate) gc: Vec<GcEntry>,
}

impl ProfileStore {
    /// Loads the registry in `directory`, starting empty if there is none.
    pub fn open<P: AsRef<Path>>(directory: P, options: OpenOptions) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let registry = persist::load(&directory).unwrap_or_default();

        let version = registry.version.unwrap_or(options.version);
        if version > LATEST_VERSION {
            return Err(Error::UnsupportedVersion {
                found: version,
                latest: LATEST_VERSION,
            });
        }

        log::debug!(
            "opened registry {directory:?} (version {version}, {} profiles, {} pending)",
            registry.profiles.len(),
            registry.gc.len()
        );
        Ok(Self {
            directory,
            version,
            profiles: registry.profiles,
            gc: registry.gc,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Storage directory owned by the profile `id`.
    pub fn storage(&self, id: u64) -> PathBuf {
        storage_path(&self.directory, id)
    }

    /// Writes the whole registry to disk.
    pub fn commit(&self) -> Result<()> {
        persist::commit(&self.directory, self.version, &self.profiles, &self.gc)
    }

    pub fn exists(&self, id: u64) -> bool {
        self.profiles.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: u64) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Smallest id above every live and pending id.
    pub fn next_id(&self) -> u64 {
        self.profiles
            .iter()
            .map(|p| p.id)
            .chain(self.gc.iter().map(|e| e.id))
            .map(|id| id.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Adds a profile, returning `None` if the id is already live.
    pub fn create(&mut self, options: CreateOptions) -> Result<Option<Profile>> {
        let CreateOptions {
            active,
            id,
            name,
            created,
        } = options;
        let id = id.unwrap_or_else(|| self.next_id());
        if self.exists(id) {
            log::debug!("profile {id} already exists, not created");
            return Ok(None);
        }

        let profile = Profile {
            id,
            name,
            active,
            created: created.unwrap_or_else(Timestamp::now),
        };
        if active {
            self.mark_all_inactive();
        }
        self.profiles.push(profile.clone());
        self.commit()?;
        log::debug!("created profile {id} (active: {active})");
        Ok(Some(profile))
    }

    /// Sets the active flag of a live profile, returning `None` if unknown.
    ///
    /// Activating a profile deactivates every other one.
    pub fn update(&mut self, id: u64, active: bool) -> Result<Option<Profile>> {
        let Some(index) = self.position(id) else {
            log::debug!("profile {id} not found, not updated");
            return Ok(None);
        };
        if active {
            self.mark_all_inactive();
        }
        let profile = &mut self.profiles[index];
        profile.active = active;
        let profile = profile.clone();
        self.commit()?;
        log::debug!("updated profile {id} (active: {active})");
        Ok(Some(profile))
    }

    /// Moves a live profile to the collection list, stamped with now.
    pub fn remove(&mut self, id: u64) -> Result<bool> {
        self.remove_at(id, Timestamp::now())
    }

    /// Moves a live profile to the collection list.
    ///
    /// No other profile is activated when the active one is removed.
    pub fn remove_at(&mut self, id: u64, removed: Timestamp) -> Result<bool> {
        let Some(index) = self.position(id) else {
            log::debug!("profile {id} not found, not removed");
            return Ok(false);
        };
        let profile = self.profiles.remove(index);
        self.gc.push(GcEntry::from_profile(profile, removed));
        self.commit()?;
        log::debug!("removed profile {id}, storage pending collection");
        Ok(true)
    }

    /// Live profiles in creation order.
    pub fn list(&self) -> &[Profile] {
        &self.profiles
    }

    /// Removed profiles whose storage has not been collected yet.
    pub fn pending(&self) -> &[GcEntry] {
        &self.gc
    }

    pub fn active(&self) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.active)
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.profiles.iter().position(|p| p.id == id)
    }

    fn mark_all_inactive(&mut self) {
        for p in &mut self.profiles {
            p.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn open(dir: &Path) -> ProfileStore {
        ProfileStore::open(dir, OpenOptions::default()).unwrap()
    }

    fn active_count(store: &ProfileStore) -> usize {
        store.list().iter().filter(|p| p.active).count()
    }

    #[test]
    fn empty_directory_has_no_active_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        assert!(store.active().is_none());
        assert!(store.list().is_empty());
        assert_eq!(store.version(), LATEST_VERSION);
        assert_eq!(store.next_id(), 0);
    }

    #[test]
    fn create_activates_exclusively() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        let a = store.create(CreateOptions::named("a")).unwrap().unwrap();
        assert_eq!(a.id, 0);
        assert!(a.active);
        assert_eq!(store.active(), Some(&a));

        let b = store.create(CreateOptions::named("b")).unwrap().unwrap();
        assert_eq!(b.id, 1);
        assert_eq!(store.active(), Some(&b));
        assert_eq!(active_count(&store), 1);

        let c = store
            .create(CreateOptions::named("c").inactive())
            .unwrap()
            .unwrap();
        assert!(!c.active);
        assert_eq!(store.active(), Some(&b));
    }

    #[test]
    fn create_with_live_id_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        store.create(CreateOptions::default().with_id(4)).unwrap();
        let again = store
            .create(CreateOptions::named("dup").with_id(4))
            .unwrap();
        assert!(again.is_none());
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.next_id(), 5);
    }

    #[test]
    fn next_id_skips_pending_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        store.create(CreateOptions::default()).unwrap();
        store.create(CreateOptions::default()).unwrap();
        assert!(store.remove(1).unwrap());
        assert_eq!(store.next_id(), 2);
        let p = store.create(CreateOptions::default()).unwrap().unwrap();
        assert_eq!(p.id, 2);
    }

    #[test]
    fn update_switches_active_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        store.create(CreateOptions::default()).unwrap();
        store.create(CreateOptions::default()).unwrap();

        let first = store.update(0, true).unwrap().unwrap();
        assert!(first.active);
        assert_eq!(store.active().map(|p| p.id), Some(0));
        assert_eq!(active_count(&store), 1);

        let first = store.update(0, false).unwrap().unwrap();
        assert!(!first.active);
        assert!(store.active().is_none());

        assert!(store.update(9, true).unwrap().is_none());
    }

    #[test]
    fn removing_active_profile_leaves_none_active() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        store.create(CreateOptions::default()).unwrap();
        store.create(CreateOptions::default().inactive()).unwrap();
        assert!(store.remove_at(0, Timestamp(42)).unwrap());
        assert!(store.active().is_none());
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.pending().len(), 1);
        assert_eq!(store.pending()[0].removed, Timestamp(42));
        assert!(!store.remove(0).unwrap());
    }

    #[test]
    fn reopen_reproduces_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open(dir.path());
        store
            .create(CreateOptions::named("a").with_created(Timestamp(10)))
            .unwrap();
        store
            .create(CreateOptions::default().with_created(Timestamp(20)))
            .unwrap();
        store.remove_at(0, Timestamp(30)).unwrap();

        let reopened = open(dir.path());
        assert_eq!(reopened.list(), store.list());
        assert_eq!(reopened.pending(), store.pending());
        assert_eq!(reopened.storage(1), dir.path().join("1"));
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(persist::REGISTRY_FILE),
            r#"{"version": 2, "profiles": [], "gc": []}"#,
        )
        .unwrap();
        let err = ProfileStore::open(dir.path(), OpenOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion {
                found: 2,
                latest: LATEST_VERSION
            }
        ));
    }

    #[test]
    fn null_profiles_keep_pending_ids_reserved() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(persist::REGISTRY_FILE),
            r#"{"version": 1, "profiles": null, "gc": [{"id": 5, "name": null, "created": 1, "removed": 2}]}"#,
        )
        .unwrap();
        let mut store = open(dir.path());
        assert_eq!(store.pending().len(), 1);
        assert_eq!(store.next_id(), 6);
        let p = store.create(CreateOptions::default()).unwrap().unwrap();
        assert_eq!(p.id, 6);
    }

    #[test]
    fn missing_version_uses_requested_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(persist::REGISTRY_FILE), r#"{"profiles": []}"#).unwrap();
        let store = ProfileStore::open(
            dir.path(),
            OpenOptions {
                version: OLDEST_VERSION,
            },
        )
        .unwrap();
        assert_eq!(store.version(), OLDEST_VERSION);
    }
}
