use std::time::Duration;

use crate::{
    Result, current::Current, statistics::GcReport, store::ProfileStore, utils::try_remove_dir_all,
};

impl ProfileStore {
    /// Deletes the storage of removed profiles whose grace period `delay` has
    /// passed.
    pub fn collect(&mut self, delay: Duration) -> Result<GcReport> {
        self.collect_at(delay, &Current::new())
    }

    /// Same as [`ProfileStore::collect`], judged against `current`.
    ///
    /// Each due entry is dropped from the registry before its directory is
    /// deleted, and the registry is committed after every entry. A directory
    /// that can not be deleted is left orphaned; its entry is not requeued.
    pub fn collect_at(&mut self, delay: Duration, current: &Current) -> Result<GcReport> {
        let now = current.timestamp();
        let mut report = GcReport::default();

        let mut index = 0;
        while let Some(entry) = self.gc.get(index) {
            report.examined += 1;
            if !entry.due(delay, now) {
                log::trace!("keep pending profile {}, removed at {}", entry.id, entry.removed);
                report.kept += 1;
                index += 1;
                continue;
            }

            // the next entry shifts into `index`
            let entry = self.gc.remove(index);
            let storage = self.storage(entry.id);
            log::info!("collect profile {} at {storage:?}", entry.id);
            if !try_remove_dir_all(&storage) {
                report.orphaned += 1;
            }
            report.collected += 1;
            report.entries.push(entry);
            self.commit()?;
        }

        log::debug!(
            "collection finished: {} collected, {} kept",
            report.collected,
            report.kept
        );
        Ok(report)
    }
}
