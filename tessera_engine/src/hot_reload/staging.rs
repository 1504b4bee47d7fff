use super::HotReloadError;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tessera_assets::{AssetId, AssetLoaders, AssetRegistry};
use tessera_packages::{Package, PackageError, PackageSource, ParsedPackage};
use crate::ContentLibrary;

/// Everything staging needs, detached from the active library so it can move to a worker
pub(crate) struct StagingRequest {
    pub paths: Vec<PathBuf>,
    pub source: Arc<dyn PackageSource>,
    pub loaders: AssetLoaders,
    /// Manifest path -> id of the active package parsed from it
    pub active_packages: HashMap<PathBuf, String>,
    pub active_ids: HashSet<String>,
    /// Assets loaded in the active registry at the time of the request
    pub loaded_assets: HashSet<AssetId>,
    pub preload: bool,
}

impl StagingRequest {
    pub fn new(paths: Vec<PathBuf>, library: &ContentLibrary, preload: bool) -> Self {
        let manager = library.manager();
        let registry = library.registry();
        Self {
            paths,
            source: manager.source().clone(),
            loaders: registry.loaders().clone(),
            active_packages: manager
                .packages()
                .map(|package| (package.source_path.clone(), package.id().to_string()))
                .collect(),
            active_ids: manager.loaded_package_ids().iter().cloned().collect(),
            loaded_assets: registry
                .iter()
                .filter(|info| info.is_loaded())
                .map(|info| info.id())
                .collect(),
            preload,
        }
    }
}

/// Result of staging, the pending registry holds the assets of every staged package
#[derive(Debug)]
pub struct StagedReload {
    /// Staged packages paired with their manifest path
    pub(crate) packages: Vec<(PathBuf, Package)>,
    pub(crate) registry: AssetRegistry,
    pub(crate) failures: Vec<(PathBuf, HotReloadError)>,
}

impl StagedReload {
    pub fn package_ids(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|(_, package)| package.id())
    }

    pub fn failures(&self) -> &[(PathBuf, HotReloadError)] {
        &self.failures
    }
}

/// Parse, validate and preload every requested manifest into an isolated registry
pub(crate) fn stage(request: StagingRequest) -> StagedReload {
    let StagingRequest {
        paths,
        source,
        loaders,
        active_packages,
        active_ids,
        loaded_assets,
        preload,
    } = request;
    let mut failures = Vec::new();

    let mut parsed: Vec<(PathBuf, Package)> = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(expected) = active_packages.get(&path) else {
            failures.push((path.clone(), HotReloadError::NotLoaded { path }));
            continue;
        };
        match source.parse(&path) {
            Ok(ParsedPackage { package, warnings }) => {
                for warning in warnings.iter() {
                    tracing::warn!("{warning}");
                }
                if package.id() == expected {
                    parsed.push((path, package));
                } else {
                    failures.push((
                        path.clone(),
                        HotReloadError::IdChanged {
                            expected: expected.clone(),
                            found: package.id().to_string(),
                            path,
                        },
                    ));
                }
            }
            Err(failure) => {
                for warning in failure.warnings.iter() {
                    tracing::warn!("{warning}");
                }
                failures.push((
                    path.clone(),
                    HotReloadError::Parse {
                        path,
                        errors: failure.errors,
                    },
                ));
            }
        }
    }

    // required dependencies may live in the active set or among the staged packages
    let staged_ids: HashSet<String> = parsed
        .iter()
        .map(|(_, package)| package.id().to_string())
        .collect();
    let mut validated = Vec::with_capacity(parsed.len());
    for (path, package) in parsed {
        let missing = package
            .required_dependencies()
            .find(|dependency| !active_ids.contains(*dependency) && !staged_ids.contains(*dependency))
            .map(str::to_string);
        match missing {
            Some(dependency) => failures.push((
                path,
                HotReloadError::Package(PackageError::MissingDependency {
                    package: package.id().to_string(),
                    dependency,
                }),
            )),
            None => validated.push((path, package)),
        }
    }

    let mut registry = AssetRegistry::with_loaders(loaders);
    let mut packages = Vec::with_capacity(validated.len());
    for (path, package) in validated {
        let ids = registry.register_package_assets(&package);
        if preload {
            let result = ids
                .into_iter()
                .filter(|id| loaded_assets.contains(id))
                .try_for_each(|id| registry.try_load_asset(id));
            if let Err(source) = result {
                registry.unregister_package_assets(package.id());
                failures.push((
                    path,
                    HotReloadError::Preload {
                        package: package.id().to_string(),
                        source,
                    },
                ));
                continue;
            }
        }
        tracing::debug!(
            "Staged {} with {} preloaded asset(s)",
            package.id(),
            registry.loaded_asset_ids(package.id()).len()
        );
        packages.push((path, package));
    }

    StagedReload {
        packages,
        registry,
        failures,
    }
}

/// Runs one staging pass on its own thread, joined on drop
#[derive(Debug)]
pub(crate) struct StagingWorker {
    recv: crossbeam_channel::Receiver<StagedReload>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl StagingWorker {
    pub fn spawn(request: StagingRequest) -> Self {
        let (send, recv) = crossbeam_channel::bounded(1);
        let thread = std::thread::spawn(move || {
            let staged = stage(request);
            if send.send(staged).is_err() {
                tracing::trace!("Staging result dropped, coordinator is gone");
            }
        });
        Self {
            recv,
            thread: Some(thread),
        }
    }

    /// `Ok(None)` while the worker is still staging
    pub fn try_take(&mut self) -> Result<Option<StagedReload>, HotReloadError> {
        match self.recv.try_recv() {
            Ok(staged) => {
                self.join();
                Ok(Some(staged))
            }
            Err(crossbeam_channel::TryRecvError::Empty) => Ok(None),
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                self.join();
                Err(HotReloadError::WorkerDisconnected)
            }
        }
    }

    /// Block until the worker hands over its result
    pub fn wait(mut self) -> Result<StagedReload, HotReloadError> {
        let staged = self
            .recv
            .recv()
            .map_err(|_| HotReloadError::WorkerDisconnected);
        self.join();
        staged
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Staging worker panicked");
            }
        }
    }
}

impl Drop for StagingWorker {
    fn drop(&mut self) {
        self.join();
    }
}
