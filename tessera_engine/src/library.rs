use bevy_ecs::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tessera_assets::{AssetId, AssetRegistry, MemoryStats, PackageAssets};
use tessera_packages::{
    AssetReference, DirectoryLoadReport, JsonPackageSource, LoadResult, Package, PackageError,
    PackageManager, PackageSource,
};

/// The active content of the application
///
/// Pairs a [`PackageManager`] with the [`AssetRegistry`] holding the assets of every loaded
/// package. Packages only enter or leave through this type so both sides always agree on the
/// loaded set.
#[derive(Resource, Debug)]
pub struct ContentLibrary {
    manager: PackageManager,
    registry: AssetRegistry,
}

impl Default for ContentLibrary {
    fn default() -> Self {
        Self::new(Arc::new(JsonPackageSource::default()))
    }
}

impl ContentLibrary {
    pub fn new(source: Arc<dyn PackageSource>) -> Self {
        Self {
            manager: PackageManager::new(source),
            registry: AssetRegistry::new(),
        }
    }

    pub fn manager(&self) -> &PackageManager {
        &self.manager
    }

    /// Hook registration and delta draining, loading goes through the library
    pub fn manager_mut(&mut self) -> &mut PackageManager {
        &mut self.manager
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    /// Loader registration and per-asset load/unload
    pub fn registry_mut(&mut self) -> &mut AssetRegistry {
        &mut self.registry
    }

    pub fn load_package(&mut self, path: &Path) -> LoadResult {
        let result = self.manager.load_package(path);
        if let Some(package) = result
            .package_id
            .as_deref()
            .and_then(|id| self.manager.get_package(id))
        {
            self.registry.register_package_assets(package);
        }
        result
    }

    pub fn load_directory(&mut self, directory: &Path) -> DirectoryLoadReport {
        let report = self.manager.load_directory(directory);
        for package_id in report.loaded.iter() {
            if let Some(package) = self.manager.get_package(package_id) {
                self.registry.register_package_assets(package);
            }
        }
        report
    }

    /// Unload a package and every one of its assets
    pub fn try_unload_package(&mut self, package_id: &str) -> Result<Package, PackageError> {
        let package = self.manager.try_unload_package(package_id)?;
        self.registry.unregister_package_assets(package_id);
        Ok(package)
    }

    pub fn unload_package(&mut self, package_id: &str) -> bool {
        match self.try_unload_package(package_id) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("{e}");
                false
            }
        }
    }

    /// Swap in a new version of a loaded package together with its already staged assets
    ///
    /// Returns the assets of the previous version, still holding their data until they are
    /// released through [`AssetRegistry::release_assets`] or dropped. On failure the staged assets
    /// are released and nothing changes.
    pub fn replace_package(
        &mut self,
        package: Package,
        assets: PackageAssets,
    ) -> Result<Option<PackageAssets>, PackageError> {
        let package_id = package.id().to_string();
        if let Err(e) = self.manager.replace_package(package) {
            self.registry.release_assets(assets);
            return Err(e);
        }
        let previous = self.registry.take_package(&package_id);
        self.registry.adopt_package(assets);
        Ok(previous)
    }

    pub fn preload_package(&mut self, package_id: &str) -> usize {
        self.registry.preload_package_assets(package_id)
    }

    /// Resolve `reference` as written inside of `package_id`, either `asset` or `package:asset`
    pub fn resolve_reference(&self, package_id: &str, reference: &str) -> Option<AssetId> {
        let reference = AssetReference::parse(reference);
        let owner = reference.package_or(package_id);
        let id = self
            .manager
            .resolve_asset_reference(owner, reference.asset_name)?;
        if self.registry.contains(id) {
            Some(id)
        } else {
            tracing::warn!(
                "{owner}:{} resolved to {id} which is not registered",
                reference.asset_name
            );
            None
        }
    }

    /// Data of a loaded asset by reference
    pub fn asset_data<T: 'static>(&self, package_id: &str, reference: &str) -> Option<&T> {
        self.registry
            .asset_data(self.resolve_reference(package_id, reference)?)
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.registry.memory_stats()
    }
}
