use crate::{
    AssetData, AssetError, AssetId, AssetInfo, AssetLoader, AssetLoaders, AssetManifest,
    AssetType, FnAssetLoader, LoadedAsset, MemoryStats, PackageAssets,
};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;
use tessera_containers::prelude::ErasedBox;

/// Keeps track of every registered asset and brings their data in and out of memory through the
/// loader registered for their [`AssetType`]
///
/// # Ownership
/// Loaded data is owned by the registry. Before any data is dropped, be it through
/// [`Self::unload_asset`], unregistering its package, or dropping the registry, the unloader of
/// its type is called with it.
#[derive(Debug)]
pub struct AssetRegistry {
    assets: HashMap<AssetId, AssetInfo>,
    /// Package id -> asset ids in declaration order
    package_assets: HashMap<String, Vec<AssetId>>,
    loaders: AssetLoaders,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::with_loaders(AssetLoaders::default())
    }

    /// Make a registry sharing an existing set of loaders
    pub fn with_loaders(loaders: AssetLoaders) -> Self {
        Self {
            assets: HashMap::new(),
            package_assets: HashMap::new(),
            loaders,
        }
    }

    pub fn loaders(&self) -> &AssetLoaders {
        &self.loaders
    }

    /// Register the loader for `asset_type`, returns `true` if a previous loader got replaced
    pub fn register_asset_loader<L: AssetLoader + 'static>(
        &mut self,
        asset_type: AssetType,
        loader: L,
    ) -> bool {
        let replaced = self.loaders.insert(asset_type, Arc::new(loader));
        if replaced {
            tracing::debug!("Replaced loader for {asset_type}");
        }
        replaced
    }

    /// Register a load/unload closure pair for `asset_type`
    pub fn register_loader_fn<L, U>(&mut self, asset_type: AssetType, load: L, unload: U) -> bool
    where
        L: Fn(&Path) -> anyhow::Result<LoadedAsset> + Send + Sync + 'static,
        U: Fn(ErasedBox, AssetType) + Send + Sync + 'static,
    {
        self.register_asset_loader(asset_type, FnAssetLoader::new(load, unload))
    }

    pub fn has_loader(&self, asset_type: AssetType) -> bool {
        self.loaders.contains(asset_type)
    }

    /// Register every asset declared by `manifest` in an unloaded state
    ///
    /// Registering a package which is already registered replaces its previous assets, those are
    /// unloaded first.
    pub fn register_package_assets<M: AssetManifest + ?Sized>(&mut self, manifest: &M) -> Vec<AssetId> {
        let package_id = manifest.package_id();
        if self.package_assets.contains_key(package_id) {
            tracing::debug!("Package {package_id} is already registered, replacing its assets");
            self.unregister_package_assets(package_id);
        }

        let mut ids = Vec::with_capacity(manifest.asset_definitions().len());
        for definition in manifest.asset_definitions() {
            let info = AssetInfo::new(
                package_id,
                &definition.id,
                definition.asset_type(),
                definition.resolve_file_path(manifest.manifest_path()),
            );
            let id = info.id;
            if let Some(existing) = self.assets.get(&id) {
                tracing::warn!(
                    "Asset {package_id}:{} collides with {}:{} on id {id}, skipping",
                    definition.id,
                    existing.package_id,
                    existing.asset_name
                );
                continue;
            }
            tracing::trace!("Registered asset {package_id}:{} as {id}", definition.id);
            self.assets.insert(id, info);
            ids.push(id);
        }
        tracing::debug!("Registered {} assets for package {package_id}", ids.len());
        self.package_assets.insert(package_id.to_string(), ids.clone());
        ids
    }

    /// Unload and forget every asset of `package_id`, returns how many were removed
    pub fn unregister_package_assets(&mut self, package_id: &str) -> usize {
        let Some(ids) = self.package_assets.remove(package_id) else {
            return 0;
        };
        for id in ids.iter() {
            if let Some(mut info) = self.assets.remove(id) {
                if let Some(data) = info.data.take() {
                    release_data(&self.loaders, *id, data);
                }
            }
        }
        tracing::debug!("Unregistered {} assets of package {package_id}", ids.len());
        ids.len()
    }

    /// Load an asset, already loaded assets are left untouched
    pub fn try_load_asset(&mut self, id: AssetId) -> Result<(), AssetError> {
        let info = self
            .assets
            .get_mut(&id)
            .ok_or(AssetError::UnknownAsset(id))?;
        if info.is_loaded() {
            return Ok(());
        }
        let loader = self
            .loaders
            .get(info.asset_type)
            .ok_or(AssetError::NoLoader(info.asset_type))?;
        let loaded = loader
            .load(&info.file_path)
            .map_err(|source| AssetError::LoaderFailed {
                asset_type: info.asset_type,
                path: info.file_path.clone(),
                source,
            })?;
        tracing::trace!(
            "Loaded asset {}:{} ({} bytes)",
            info.package_id,
            info.asset_name,
            loaded.size
        );
        info.data = Some(AssetData::new(info.asset_type, loaded));
        Ok(())
    }

    /// Returns `false` if the asset could not be loaded
    pub fn load_asset(&mut self, id: AssetId) -> bool {
        match self.try_load_asset(id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to load asset {id}: {e:#}");
                false
            }
        }
    }

    /// Unload an asset through its type's unloader, returns `false` if it was not loaded
    pub fn unload_asset(&mut self, id: AssetId) -> bool {
        let Some(data) = self.assets.get_mut(&id).and_then(|info| info.data.take()) else {
            return false;
        };
        release_data(&self.loaders, id, data);
        true
    }

    /// Load every asset of a package, returns the number of assets loaded afterwards
    ///
    /// A failing asset does not stop the rest of the package from loading.
    pub fn preload_package_assets(&mut self, package_id: &str) -> usize {
        let ids = self.package_assets(package_id).to_vec();
        ids.into_iter().filter(|id| self.load_asset(*id)).count()
    }

    pub fn unload_package_assets(&mut self, package_id: &str) {
        let ids = self.package_assets(package_id).to_vec();
        for id in ids {
            self.unload_asset(id);
        }
    }

    pub fn memory_stats(&self) -> MemoryStats {
        let mut stats = MemoryStats {
            total_assets: self.assets.len(),
            ..Default::default()
        };
        for data in self.assets.values().filter_map(|info| info.data.as_ref()) {
            stats.loaded_assets += 1;
            stats.total_memory_usage += data.size();
            *stats.memory_by_type.entry(data.asset_type()).or_default() += data.size();
        }
        stats
    }

    /// Typed access to loaded data, [`None`] if unloaded or not a `T`
    pub fn asset_data<T: 'static>(&self, id: AssetId) -> Option<&T> {
        self.asset_data_untyped(id)?.get::<T>()
    }

    pub fn asset_data_untyped(&self, id: AssetId) -> Option<&AssetData> {
        self.assets.get(&id)?.data.as_ref()
    }

    pub fn asset_info(&self, id: AssetId) -> Option<&AssetInfo> {
        self.assets.get(&id)
    }

    pub fn is_asset_loaded(&self, id: AssetId) -> bool {
        self.assets.get(&id).is_some_and(AssetInfo::is_loaded)
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.assets.contains_key(&id)
    }

    /// Resolve a symbolic name inside of a registered package
    pub fn resolve(&self, package_id: &str, asset_name: &str) -> Option<AssetId> {
        let id = AssetId::generate(package_id, asset_name);
        self.assets
            .get(&id)
            .filter(|info| info.package_id == package_id && info.asset_name == asset_name)
            .map(|info| info.id)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn is_package_registered(&self, package_id: &str) -> bool {
        self.package_assets.contains_key(package_id)
    }

    /// Asset ids of a package in declaration order
    pub fn package_assets(&self, package_id: &str) -> &[AssetId] {
        self.package_assets
            .get(package_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn loaded_asset_ids(&self, package_id: &str) -> Vec<AssetId> {
        self.package_assets(package_id)
            .iter()
            .copied()
            .filter(|id| self.is_asset_loaded(*id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetInfo> {
        self.assets.values()
    }

    /// Move every asset of a package out of the registry, loaded data included
    ///
    /// Nothing is unloaded here. Hand the assets to [`Self::adopt_package`] or
    /// [`Self::release_assets`], dropping them unloads through this registry's loaders.
    pub fn take_package(&mut self, package_id: &str) -> Option<PackageAssets> {
        let ids = self.package_assets.remove(package_id)?;
        let infos = ids
            .iter()
            .filter_map(|id| self.assets.remove(id))
            .collect();
        Some(PackageAssets {
            package_id: package_id.to_string(),
            infos,
            loaders: self.loaders.clone(),
        })
    }

    /// Insert assets moved out of another registry, replacing any previous registration of the
    /// same package
    pub fn adopt_package(&mut self, mut assets: PackageAssets) -> Vec<AssetId> {
        let package_id = std::mem::take(&mut assets.package_id);
        let infos = std::mem::take(&mut assets.infos);
        if self.package_assets.contains_key(&package_id) {
            self.unregister_package_assets(&package_id);
        }
        let mut ids = Vec::with_capacity(infos.len());
        for mut info in infos {
            if let Some(existing) = self.assets.get(&info.id) {
                tracing::warn!(
                    "Asset {package_id}:{} collides with {}:{} on id {}, skipping",
                    info.asset_name,
                    existing.package_id,
                    existing.asset_name,
                    info.id
                );
                if let Some(data) = info.data.take() {
                    release_data(&self.loaders, info.id, data);
                }
                continue;
            }
            ids.push(info.id);
            self.assets.insert(info.id, info);
        }
        self.package_assets.insert(package_id, ids.clone());
        ids
    }

    /// Unload assets which were moved out with [`Self::take_package`]
    pub fn release_assets(&self, mut assets: PackageAssets) {
        for mut info in std::mem::take(&mut assets.infos) {
            if let Some(data) = info.data.take() {
                release_data(&self.loaders, info.id, data);
            }
        }
    }
}

impl Drop for AssetRegistry {
    fn drop(&mut self) {
        for info in self.assets.values_mut() {
            if let Some(data) = info.data.take() {
                release_data(&self.loaders, info.id, data);
            }
        }
    }
}

/// Hand `data` to its unloader. Unloader errors and panics are logged and never propagated.
pub(crate) fn release_data(loaders: &AssetLoaders, id: AssetId, data: AssetData) {
    let asset_type = data.asset_type();
    let Some(loader) = loaders.get(asset_type) else {
        tracing::warn!("No unloader registered for {asset_type}, dropping data of asset {id}");
        return;
    };
    match catch_unwind(AssertUnwindSafe(|| {
        loader.unload(data.into_value(), asset_type)
    })) {
        Ok(Ok(())) => tracing::trace!("Unloaded asset {id}"),
        Ok(Err(e)) => tracing::warn!("Unloader for {asset_type} failed on asset {id}: {e:#}"),
        Err(_) => tracing::error!("Unloader for {asset_type} panicked on asset {id}"),
    }
}
