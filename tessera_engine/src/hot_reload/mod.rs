//! Live reloading of modified package manifests
//!
//! Each watched manifest moves through `Unchanged -> PendingReload -> Staged -> Unchanged`.
//! Changed packages are staged into a pending registry which is fully isolated from the active
//! [`ContentLibrary`], and only swapped in by [`HotReloadCoordinator::commit_pending_assets`] at
//! the end of a frame. Consumers therefore see either the old or the new version of a package,
//! never a mix.

mod error;
mod staging;
mod watcher;

pub use error::HotReloadError;
pub use staging::StagedReload;
pub use watcher::{FileWatcher, ReloadState};

use crate::ContentLibrary;
use bevy_ecs::prelude::Resource;
use staging::{StagingRequest, StagingWorker};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tessera_assets::{AssetError, AssetRegistry, PackageAssets};
use tessera_containers::prelude::DeferredRelease;
use tessera_packages::{DependencyGraph, Package, PackageSource, package_manifests_in};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StagingMode {
    /// Stage synchronously while checking for changes
    #[default]
    Inline,
    /// Stage on a worker thread, commit picks the result up once it is ready
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotReloadConfig {
    pub staging: StagingMode,
    /// Load the new versions of assets which are loaded in the active registry before committing
    pub preload_reloaded: bool,
    /// Frames the previous version of a package is kept alive after commit before its data is
    /// handed to the unloaders, 0 releases immediately
    pub release_delay_frames: usize,
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            staging: StagingMode::Inline,
            preload_reloaded: true,
            release_delay_frames: 0,
        }
    }
}

/// What one commit did
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Package ids now running their new version
    pub committed: Vec<String>,
    pub failures: Vec<(PathBuf, HotReloadError)>,
    /// Retired package versions handed to their unloaders this frame
    pub released: usize,
}

impl CommitReport {
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.failures.is_empty() && self.released == 0
    }
}

#[derive(Debug)]
enum Staging {
    Idle,
    Ready(StagedReload),
    InFlight(StagingWorker),
}

/// Watches package manifests and swaps reloaded packages into a [`ContentLibrary`]
#[derive(Debug, Resource)]
pub struct HotReloadCoordinator {
    config: HotReloadConfig,
    watcher: FileWatcher,
    staging: Staging,
    retired: DeferredRelease<PackageAssets>,
}

impl Default for HotReloadCoordinator {
    fn default() -> Self {
        Self::new(HotReloadConfig::default())
    }
}

impl HotReloadCoordinator {
    pub fn new(config: HotReloadConfig) -> Self {
        Self {
            config,
            watcher: FileWatcher::default(),
            staging: Staging::Idle,
            retired: DeferredRelease::new(),
        }
    }

    pub fn config(&self) -> &HotReloadConfig {
        &self.config
    }

    pub fn watcher(&self) -> &FileWatcher {
        &self.watcher
    }

    pub fn watch_package(&mut self, path: impl Into<PathBuf>) -> Result<(), HotReloadError> {
        self.watcher.watch(path)
    }

    /// Watch the manifest inside of every immediate subdirectory of `directory`
    pub fn watch_all_packages(
        &mut self,
        directory: &Path,
        source: &dyn PackageSource,
    ) -> Result<usize, HotReloadError> {
        let manifests = package_manifests_in(directory, source)?;
        let mut watched = 0;
        for manifest in manifests {
            match self.watcher.watch(&manifest) {
                Ok(()) => watched += 1,
                Err(e) => tracing::warn!("{e}"),
            }
        }
        tracing::debug!("Watching {watched} package(s) under {:?}", directory);
        Ok(watched)
    }

    pub fn reload_state(&self, path: &Path) -> Option<ReloadState> {
        self.watcher.state(path)
    }

    /// Flag every watched manifest modified since the last check, returns the flagged paths
    pub fn check_for_changes(&mut self) -> Vec<PathBuf> {
        self.watcher.poll()
    }

    /// Whether a staged reload is waiting for, or being prepared for, the next commit
    pub fn has_staged(&self) -> bool {
        !matches!(self.staging, Staging::Idle)
    }

    /// Stage every pending manifest against the current state of `library`
    ///
    /// Does nothing while a previous staging has not been committed yet, pending manifests are
    /// picked up on a later call. Returns how many manifests were submitted.
    pub fn stage_pending_reloads(&mut self, library: &ContentLibrary) -> usize {
        if self.has_staged() {
            return 0;
        }
        let pending = self.watcher.in_state(ReloadState::PendingReload);
        if pending.is_empty() {
            return 0;
        }
        for path in pending.iter() {
            self.watcher.set_state(path, ReloadState::Staged);
        }
        let count = pending.len();
        let request = StagingRequest::new(pending, library, self.config.preload_reloaded);
        self.staging = match self.config.staging {
            StagingMode::Inline => Staging::Ready(staging::stage(request)),
            StagingMode::Background => Staging::InFlight(StagingWorker::spawn(request)),
        };
        tracing::debug!("Staging {count} package reload(s)");
        count
    }

    /// Block until a background staging pass has finished, inline staging is always finished
    pub fn wait_for_staging(&mut self) -> Result<(), HotReloadError> {
        match std::mem::replace(&mut self.staging, Staging::Idle) {
            Staging::InFlight(worker) => match worker.wait() {
                Ok(staged) => self.staging = Staging::Ready(staged),
                Err(e) => {
                    self.abandon_staged();
                    return Err(e);
                }
            },
            other => self.staging = other,
        }
        Ok(())
    }

    fn abandon_staged(&mut self) {
        for path in self.watcher.in_state(ReloadState::Staged) {
            self.watcher.set_state(&path, ReloadState::Unchanged);
        }
    }

    /// Swap every staged package into `library`, call once per frame at the frame boundary
    ///
    /// If a background staging has not finished yet, only retired versions are released this
    /// frame. Failed reloads leave the active package untouched. Packages are committed with
    /// their staged dependencies first.
    pub fn commit_pending_assets(&mut self, library: &mut ContentLibrary) -> CommitReport {
        let mut report = CommitReport::default();
        for retired in self.retired.tick() {
            library.registry().release_assets(retired);
            report.released += 1;
        }

        let staged = match std::mem::replace(&mut self.staging, Staging::Idle) {
            Staging::Idle => return report,
            Staging::Ready(staged) => staged,
            Staging::InFlight(mut worker) => match worker.try_take() {
                Ok(Some(staged)) => staged,
                Ok(None) => {
                    self.staging = Staging::InFlight(worker);
                    return report;
                }
                Err(e) => {
                    tracing::error!("{e}");
                    self.abandon_staged();
                    return report;
                }
            },
        };

        let StagedReload {
            mut packages,
            mut registry,
            failures,
        } = staged;
        for (path, e) in failures {
            tracing::error!("Reload of {:?} failed, keeping the loaded version: {e}", path);
            self.finish(&path);
            report.failures.push((path, e));
        }
        sort_for_commit(&mut packages);
        for (path, package) in packages {
            let package_id = package.id().to_string();
            if self.config.preload_reloaded {
                if let Err(source) = load_missed(library.registry(), &mut registry, &package_id) {
                    registry.unregister_package_assets(&package_id);
                    let e = HotReloadError::Preload {
                        package: package_id,
                        source,
                    };
                    tracing::error!("Reload of {:?} failed, keeping the loaded version: {e}", path);
                    report.failures.push((path.clone(), e));
                    self.finish(&path);
                    continue;
                }
            }
            let Some(assets) = registry.take_package(&package_id) else {
                tracing::error!("Staged package {package_id} lost its assets");
                self.finish(&path);
                continue;
            };
            match library.replace_package(package, assets) {
                Ok(previous) => {
                    if let Some(previous) = previous {
                        self.retire(library, previous, &mut report);
                    }
                    tracing::debug!("Committed reload of {package_id}");
                    report.committed.push(package_id);
                }
                Err(e) => {
                    let e = HotReloadError::from(e);
                    tracing::error!("Reload of {:?} failed, keeping the loaded version: {e}", path);
                    report.failures.push((path.clone(), e));
                }
            }
            self.finish(&path);
        }
        report
    }

    fn retire(&mut self, library: &ContentLibrary, previous: PackageAssets, report: &mut CommitReport) {
        match self.config.release_delay_frames {
            0 => {
                library.registry().release_assets(previous);
                report.released += 1;
            }
            frames => {
                self.retired.insert(previous, frames, None);
            }
        }
    }

    /// A file modified again during staging stays pending
    fn finish(&mut self, path: &Path) {
        if self.watcher.state(path) == Some(ReloadState::Staged) {
            self.watcher.set_state(path, ReloadState::Unchanged);
        }
    }

    /// Release every retired package version right away
    pub fn flush_retired(&mut self, library: &ContentLibrary) -> usize {
        let retired = self.retired.drain();
        let count = retired.len();
        for assets in retired {
            library.registry().release_assets(assets);
        }
        count
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }
}

/// Order staged packages so each one comes after the staged packages it requires
fn sort_for_commit(packages: &mut [(PathBuf, Package)]) {
    let graph = DependencyGraph::from_packages(packages.iter().map(|(_, package)| package));
    let (order, unresolved) = graph.partial_order();
    let rank: HashMap<String, usize> = order
        .into_iter()
        .chain(unresolved)
        .enumerate()
        .map(|(rank, id)| (id, rank))
        .collect();
    packages.sort_by_key(|(_, package)| rank.get(package.id()).copied().unwrap_or(usize::MAX));
}

/// Load the staged copy of every asset of `package_id` which got loaded in the active registry
/// after staging ran
fn load_missed(
    active: &AssetRegistry,
    staged: &mut AssetRegistry,
    package_id: &str,
) -> Result<(), AssetError> {
    let missed: Vec<_> = active
        .loaded_asset_ids(package_id)
        .into_iter()
        .filter(|id| staged.contains(*id) && !staged.is_asset_loaded(*id))
        .collect();
    missed.into_iter().try_for_each(|id| staged.try_load_asset(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::{library_with_loaders, write_package};
    use filetime::FileTime;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use tessera_assets::{AssetType, LoadedAsset};

    static BUMPS: AtomicI64 = AtomicI64::new(0);

    /// Push the mtime further ahead on every call so repeated rewrites always register
    fn bump(path: &Path) {
        let now = FileTime::from_system_time(fs::metadata(path).unwrap().modified().unwrap());
        let offset = 5 * (BUMPS.fetch_add(1, Ordering::SeqCst) + 1);
        filetime::set_file_mtime(
            path,
            FileTime::from_unix_time(now.unix_seconds() + offset, now.nanoseconds()),
        )
        .unwrap();
    }

    fn rewrite(root: &Path, id: &str, deps: &[&str], mesh_bytes: usize) -> PathBuf {
        write_package(root, id, deps, mesh_bytes);
        let manifest = root.join(id).join("package.json");
        bump(&manifest);
        manifest
    }

    fn setup(config: HotReloadConfig) -> (tempfile::TempDir, ContentLibrary, HotReloadCoordinator) {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path(), "core", &[], 32);
        write_package(dir.path(), "dlc", &["core"], 8);
        let mut library = library_with_loaders();
        assert_eq!(library.load_directory(dir.path()).loaded.len(), 2);
        let mut coordinator = HotReloadCoordinator::new(config);
        let source = library.manager().source().clone();
        assert_eq!(
            coordinator
                .watch_all_packages(dir.path(), source.as_ref())
                .unwrap(),
            2
        );
        (dir, library, coordinator)
    }

    fn mesh_len(library: &ContentLibrary, package: &str) -> Option<usize> {
        library
            .asset_data::<Vec<u8>>(package, "mesh")
            .map(Vec::len)
    }

    #[test]
    fn test_staging_is_isolated_until_commit() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig::default());
        let core_mesh = library.resolve_reference("core", "mesh").unwrap();
        assert!(library.registry_mut().load_asset(core_mesh));
        assert_eq!(mesh_len(&library, "core"), Some(32));

        let manifest = rewrite(dir.path(), "core", &[], 64);
        assert_eq!(coordinator.check_for_changes(), vec![manifest.clone()]);
        assert_eq!(
            coordinator.reload_state(&manifest),
            Some(ReloadState::PendingReload)
        );
        assert_eq!(coordinator.stage_pending_reloads(&library), 1);
        assert_eq!(coordinator.reload_state(&manifest), Some(ReloadState::Staged));

        // active registry still serves the old data
        assert_eq!(mesh_len(&library, "core"), Some(32));
        assert_eq!(library.memory_stats().total_memory_usage, 32);

        let report = coordinator.commit_pending_assets(&mut library);
        assert_eq!(report.committed, vec!["core"]);
        assert_eq!(report.released, 1);
        assert_eq!(mesh_len(&library, "core"), Some(64));
        assert_eq!(library.memory_stats().total_memory_usage, 64);
        assert_eq!(coordinator.reload_state(&manifest), Some(ReloadState::Unchanged));
        assert!(coordinator.commit_pending_assets(&mut library).is_empty());
    }

    #[test]
    fn test_unloaded_assets_stay_unloaded() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig::default());
        rewrite(dir.path(), "dlc", &["core"], 12);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);
        let report = coordinator.commit_pending_assets(&mut library);
        assert_eq!(report.committed, vec!["dlc"]);
        assert_eq!(library.memory_stats().loaded_assets, 0);
    }

    #[test]
    fn test_failed_reload_keeps_stale_package() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig::default());
        let manifest = rewrite(dir.path(), "dlc", &["core", "missing"], 8);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);
        let report = coordinator.commit_pending_assets(&mut library);
        assert!(report.committed.is_empty());
        assert!(matches!(
            report.failures.as_slice(),
            [(_, HotReloadError::Package(_))]
        ));
        assert_eq!(
            library.manager().get_package("dlc").unwrap().metadata.dependencies.len(),
            1
        );
        assert_eq!(coordinator.reload_state(&manifest), Some(ReloadState::Unchanged));

        fs::write(&manifest, "{ broken").unwrap();
        bump(&manifest);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);
        let report = coordinator.commit_pending_assets(&mut library);
        assert!(matches!(
            report.failures.as_slice(),
            [(_, HotReloadError::Parse { .. })]
        ));
        assert!(library.manager().is_loaded("dlc"));
    }

    #[test]
    fn test_changed_package_id_rejected() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig::default());
        let manifest = dir.path().join("dlc/package.json");
        let text = fs::read_to_string(&manifest)
            .unwrap()
            .replace(r#""id": "dlc""#, r#""id": "renamed""#);
        fs::write(&manifest, text).unwrap();
        bump(&manifest);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);
        let report = coordinator.commit_pending_assets(&mut library);
        assert!(matches!(
            report.failures.as_slice(),
            [(_, HotReloadError::IdChanged { .. })]
        ));
        assert!(library.manager().is_loaded("dlc"));
        assert!(!library.manager().is_loaded("renamed"));
    }

    #[test]
    fn test_delayed_release() {
        let unloads = Arc::new(AtomicUsize::new(0));
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig {
            release_delay_frames: 2,
            ..Default::default()
        });
        let counter = unloads.clone();
        library.registry_mut().register_loader_fn(
            AssetType::Mesh,
            |path| Ok(LoadedAsset::from(fs::read(path)?)),
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        let core_mesh = library.resolve_reference("core", "mesh").unwrap();
        library.registry_mut().load_asset(core_mesh);

        rewrite(dir.path(), "core", &[], 16);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);
        let report = coordinator.commit_pending_assets(&mut library);
        assert_eq!(report.released, 0);
        assert_eq!(coordinator.retired_count(), 1);
        assert_eq!(mesh_len(&library, "core"), Some(16));

        assert_eq!(coordinator.commit_pending_assets(&mut library).released, 0);
        assert_eq!(unloads.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.commit_pending_assets(&mut library).released, 1);
        assert_eq!(unloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retired_versions_unloaded_on_drop() {
        let unloads = Arc::new(AtomicUsize::new(0));
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig {
            release_delay_frames: 5,
            ..Default::default()
        });
        let counter = unloads.clone();
        library.registry_mut().register_loader_fn(
            AssetType::Mesh,
            |path| Ok(LoadedAsset::from(fs::read(path)?)),
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        let core_mesh = library.resolve_reference("core", "mesh").unwrap();
        library.registry_mut().load_asset(core_mesh);

        rewrite(dir.path(), "core", &[], 16);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);
        assert_eq!(coordinator.commit_pending_assets(&mut library).committed, vec!["core"]);
        assert_eq!(coordinator.retired_count(), 1);
        assert_eq!(unloads.load(Ordering::SeqCst), 0);

        drop(coordinator);
        assert_eq!(unloads.load(Ordering::SeqCst), 1);
        drop(library);
        assert_eq!(unloads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_asset_loaded_after_staging_survives_commit() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig::default());
        rewrite(dir.path(), "core", &[], 24);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);

        // loaded between staging and commit, the staged copy was never preloaded
        let core_mesh = library.resolve_reference("core", "mesh").unwrap();
        assert!(library.registry_mut().load_asset(core_mesh));

        let report = coordinator.commit_pending_assets(&mut library);
        assert_eq!(report.committed, vec!["core"]);
        assert!(library.registry().is_asset_loaded(core_mesh));
        assert_eq!(mesh_len(&library, "core"), Some(24));
    }

    #[test]
    fn test_commit_follows_new_dependencies() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig::default());
        // core now requires dlc while dlc drops its requirement on core
        rewrite(dir.path(), "core", &["dlc"], 4);
        rewrite(dir.path(), "dlc", &[], 4);
        coordinator.check_for_changes();
        coordinator.stage_pending_reloads(&library);

        let report = coordinator.commit_pending_assets(&mut library);
        assert!(report.failures.is_empty());
        assert_eq!(report.committed, vec!["dlc", "core"]);
        assert!(library.manager().get_package("core").unwrap().requires("dlc"));
        assert!(!library.manager().get_package("dlc").unwrap().requires("core"));
    }

    #[test]
    fn test_background_staging() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig {
            staging: StagingMode::Background,
            ..Default::default()
        });
        let core_mesh = library.resolve_reference("core", "mesh").unwrap();
        library.registry_mut().load_asset(core_mesh);

        let manifest = rewrite(dir.path(), "core", &[], 48);
        coordinator.check_for_changes();
        assert_eq!(coordinator.stage_pending_reloads(&library), 1);
        // a second request while staging is in flight is deferred
        assert_eq!(coordinator.stage_pending_reloads(&library), 0);
        coordinator.wait_for_staging().unwrap();
        assert_eq!(mesh_len(&library, "core"), Some(32));

        let report = coordinator.commit_pending_assets(&mut library);
        assert_eq!(report.committed, vec!["core"]);
        assert_eq!(mesh_len(&library, "core"), Some(48));
        assert_eq!(coordinator.reload_state(&manifest), Some(ReloadState::Unchanged));
    }

    #[test]
    fn test_reload_with_new_staged_dependency() {
        let (dir, mut library, mut coordinator) = setup(HotReloadConfig::default());
        // both change in the same frame, dlc keeps depending on core
        rewrite(dir.path(), "core", &[], 4);
        rewrite(dir.path(), "dlc", &["core"], 4);
        assert_eq!(coordinator.check_for_changes().len(), 2);
        coordinator.stage_pending_reloads(&library);
        let mut committed = coordinator.commit_pending_assets(&mut library).committed;
        committed.sort();
        assert_eq!(committed, vec!["core", "dlc"]);
        assert_eq!(library.registry().asset_count(), 4);
    }
}
