use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    store::{CreateOptions, LATEST_VERSION, OLDEST_VERSION, OpenOptions, ProfileStore},
    utils::try_remove_file,
};

/// Id given to the profile adopting a legacy layout
pub const LEGACY_PROFILE_ID: u64 = 0;

/// Shape of the single-profile layout recognized by
/// [`ProfileStore::migrate_with`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyLayout {
    /// Sentinel file at the directory root marking a legacy layout
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Directories at the root moved into the storage of profile 0
    #[serde(default = "default_content")]
    pub content: Vec<String>,
}

impl Default for LegacyLayout {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            content: default_content(),
        }
    }
}

fn default_marker() -> String {
    "CORESTORE".to_string()
}

fn default_content() -> Vec<String> {
    vec!["cores".to_string(), "db".to_string()]
}

impl ProfileStore {
    /// Opens `directory`, adopting a legacy layout as profile 0 if present.
    pub fn migrate<P: AsRef<Path>>(directory: P) -> Result<Self> {
        Self::migrate_with(directory, &LegacyLayout::default())
    }

    /// Opens `directory`, adopting a legacy layout described by `layout` as
    /// profile 0 if present.
    ///
    /// Does nothing when a profile is already active or the registry is past
    /// the legacy version. Every step checks the filesystem before acting, so
    /// an interrupted run can be repeated; the registry is first written by
    /// the final activation of profile 0.
    pub fn migrate_with<P: AsRef<Path>>(directory: P, layout: &LegacyLayout) -> Result<Self> {
        let directory = directory.as_ref();
        let mut store = Self::open(
            directory,
            OpenOptions {
                version: OLDEST_VERSION,
            },
        )?;

        if let Some(active) = store.active() {
            log::debug!("profile {} is active, nothing to migrate", active.id);
            return Ok(store);
        }
        let marker = directory.join(&layout.marker);
        if store.version() != OLDEST_VERSION || !marker.exists() {
            log::debug!("no legacy layout in {directory:?}");
            return Ok(store);
        }

        log::info!("migrating legacy layout in {directory:?} into profile {LEGACY_PROFILE_ID}");
        let destination = store.storage(LEGACY_PROFILE_ID);
        if !destination.exists() {
            fs::create_dir_all(&destination)
                .map_err(|e| Error::io("create profile directory", &destination, e))?;
        }
        for name in &layout.content {
            let from = directory.join(name);
            let to = destination.join(name);
            if to.exists() {
                log::debug!("{to:?} already in place");
                continue;
            }
            if !from.exists() {
                continue;
            }
            fs::rename(&from, &to).map_err(|e| Error::io("move legacy content", &from, e))?;
            log::info!("moved {from:?} to {to:?}");
        }

        store.version = LATEST_VERSION;
        if store.exists(LEGACY_PROFILE_ID) {
            // registry written at the legacy version already knows profile 0
            store.update(LEGACY_PROFILE_ID, true)?;
        } else {
            store.create(CreateOptions::default().with_id(LEGACY_PROFILE_ID))?;
        }
        try_remove_file(&marker);

        Ok(store)
    }
}
