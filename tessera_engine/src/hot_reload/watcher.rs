use super::HotReloadError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Where a watched manifest is in the reload cycle
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReloadState {
    Unchanged,
    /// Modified on disk, waiting to be staged
    PendingReload,
    /// Parsed and preloaded into the pending registry, waiting for the frame boundary
    Staged,
}

#[derive(Debug, Clone)]
struct WatchedFile {
    last_modified: SystemTime,
    state: ReloadState,
}

/// Polls modification times of registered files
#[derive(Debug, Default)]
pub struct FileWatcher {
    files: BTreeMap<PathBuf, WatchedFile>,
}

fn modified(path: &Path) -> Result<SystemTime, HotReloadError> {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|source| HotReloadError::Watch {
            path: path.to_path_buf(),
            source,
        })
}

impl FileWatcher {
    /// Start watching `path` from its current modification time, re-watching resets it
    pub fn watch(&mut self, path: impl Into<PathBuf>) -> Result<(), HotReloadError> {
        let path = path.into();
        let last_modified = modified(&path)?;
        tracing::trace!("Watching {:?}", path);
        self.files.insert(
            path,
            WatchedFile {
                last_modified,
                state: ReloadState::Unchanged,
            },
        );
        Ok(())
    }

    pub fn unwatch(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn state(&self, path: &Path) -> Option<ReloadState> {
        self.files.get(path).map(|file| file.state)
    }

    pub fn set_state(&mut self, path: &Path, state: ReloadState) {
        if let Some(file) = self.files.get_mut(path) {
            file.state = state;
        }
    }

    /// Flag every file whose modification time increased as [`ReloadState::PendingReload`]
    ///
    /// Returns the newly flagged paths. A single modification is only ever reported once, files
    /// which can no longer be read are skipped.
    pub fn poll(&mut self) -> Vec<PathBuf> {
        let mut changed = Vec::new();
        for (path, file) in self.files.iter_mut() {
            let current = match modified(path) {
                Ok(current) => current,
                Err(e) => {
                    tracing::warn!("{e}");
                    continue;
                }
            };
            if current > file.last_modified {
                file.last_modified = current;
                file.state = ReloadState::PendingReload;
                tracing::debug!("{:?} changed on disk", path);
                changed.push(path.clone());
            }
        }
        changed
    }

    /// Paths currently in `state`, sorted
    pub fn in_state(&self, state: ReloadState) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|(_, file)| file.state == state)
            .map(|(path, _)| path.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;

    fn bump(path: &Path, seconds: i64) {
        let now = FileTime::from_system_time(modified(path).unwrap());
        filetime::set_file_mtime(
            path,
            FileTime::from_unix_time(now.unix_seconds() + seconds, now.nanoseconds()),
        )
        .unwrap();
    }

    #[test]
    fn test_poll_flags_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{}").unwrap();

        let mut watcher = FileWatcher::default();
        watcher.watch(&path).unwrap();
        assert!(watcher.poll().is_empty());

        bump(&path, 10);
        assert_eq!(watcher.poll(), vec![path.clone()]);
        assert_eq!(watcher.state(&path), Some(ReloadState::PendingReload));
        assert!(watcher.poll().is_empty());
    }

    #[test]
    fn test_older_mtime_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{}").unwrap();

        let mut watcher = FileWatcher::default();
        watcher.watch(&path).unwrap();
        bump(&path, -60);
        assert!(watcher.poll().is_empty());
        assert_eq!(watcher.state(&path), Some(ReloadState::Unchanged));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        let mut watcher = FileWatcher::default();
        assert!(matches!(
            watcher.watch(&path),
            Err(HotReloadError::Watch { .. })
        ));

        std::fs::write(&path, "{}").unwrap();
        watcher.watch(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(watcher.poll().is_empty());
        assert!(watcher.is_watched(&path));
    }
}
