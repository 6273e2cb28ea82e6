use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    Error, Result,
    model::{GcEntry, Profile},
    utils::{try_remove_file, try_rename},
};

/// Committed registry snapshot
pub const REGISTRY_FILE: &str = "profiles.json";
/// Write-ahead file, authoritative fallback when the rename did not happen
pub const NEXT_FILE: &str = "profiles-next.json";

/// Registry as found on disk, every field optional
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profiles: Vec<Profile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gc: Vec<GcEntry>,
}

/// Reads an explicit `null` the same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    version: u32,
    profiles: &'a [Profile],
    gc: &'a [GcEntry],
}

/// Reads the registry from `directory`.
///
/// Falls back to the write-ahead file when the committed snapshot is missing
/// or unreadable, and to `None` when neither can be parsed.
pub fn load<P: AsRef<Path>>(directory: P) -> Option<RegistryFile> {
    let directory = directory.as_ref();
    read_registry(&directory.join(REGISTRY_FILE))
        .or_else(|| read_registry(&directory.join(NEXT_FILE)))
}

fn read_registry(path: &Path) -> Option<RegistryFile> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            log::debug!("can not read {path:?}: {e}");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(registry) => {
            log::trace!("loaded registry from {path:?}");
            Some(registry)
        }
        Err(e) => {
            log::warn!("ignore {path:?}, not a valid registry: {e}");
            None
        }
    }
}

/// Writes the registry to `directory` with the write-ahead-then-rename
/// protocol.
///
/// Only directory creation, serialization and the write-ahead write are hard
/// failures. Replacing the committed snapshot is best-effort: if it does not
/// happen the write-ahead file is picked up by [`load`].
pub fn commit<P: AsRef<Path>>(
    directory: P,
    version: u32,
    profiles: &[Profile],
    gc: &[GcEntry],
) -> Result<()> {
    let directory = directory.as_ref();
    fs::create_dir_all(directory)
        .map_err(|e| Error::io("create registry directory", directory, e))?;

    let snapshot = Snapshot {
        version,
        profiles,
        gc,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    let next: PathBuf = directory.join(NEXT_FILE);
    let current: PathBuf = directory.join(REGISTRY_FILE);
    fs::write(&next, json).map_err(|e| Error::io("write", &next, e))?;

    // rename can not replace an existing file here
    if cfg!(windows) {
        try_remove_file(&current);
    }
    try_rename(&next, &current);

    log::trace!(
        "committed registry version {version} with {} profiles and {} pending entries to {directory:?}",
        profiles.len(),
        gc.len()
    );
    Ok(())
}
