use crate::{AssetType, LoadedAsset};
use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tessera_containers::prelude::ErasedBox;

/// Loads and unloads the data of one [`AssetType`]
///
/// Loaders never see the registry, they only get the file path and hand data back.
pub trait AssetLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedAsset>;

    /// Release data previously produced by [`Self::load`]
    fn unload(&self, data: ErasedBox, asset_type: AssetType) -> Result<()> {
        let _ = asset_type;
        drop(data);
        Ok(())
    }
}

/// Closure pair backed [`AssetLoader`]
pub struct FnAssetLoader<L, U> {
    load: L,
    unload: U,
}

impl<L, U> FnAssetLoader<L, U>
where
    L: Fn(&Path) -> Result<LoadedAsset> + Send + Sync,
    U: Fn(ErasedBox, AssetType) + Send + Sync,
{
    pub fn new(load: L, unload: U) -> Self {
        Self { load, unload }
    }
}

impl<L, U> AssetLoader for FnAssetLoader<L, U>
where
    L: Fn(&Path) -> Result<LoadedAsset> + Send + Sync,
    U: Fn(ErasedBox, AssetType) + Send + Sync,
{
    fn load(&self, path: &Path) -> Result<LoadedAsset> {
        (self.load)(path)
    }

    fn unload(&self, data: ErasedBox, asset_type: AssetType) -> Result<()> {
        (self.unload)(data, asset_type);
        Ok(())
    }
}

/// Set of loaders keyed by [`AssetType`]
///
/// Cloning is cheap, loaders are shared between the active and a pending registry.
#[derive(Clone, Default)]
pub struct AssetLoaders {
    loaders: HashMap<AssetType, Arc<dyn AssetLoader>>,
}

impl fmt::Debug for AssetLoaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&AssetType> = self.loaders.keys().collect();
        types.sort();
        f.debug_struct("AssetLoaders").field("types", &types).finish()
    }
}

impl AssetLoaders {
    /// Replaces any loader previously registered for `asset_type`
    pub fn insert(&mut self, asset_type: AssetType, loader: Arc<dyn AssetLoader>) -> bool {
        self.loaders.insert(asset_type, loader).is_some()
    }

    pub fn get(&self, asset_type: AssetType) -> Option<&Arc<dyn AssetLoader>> {
        self.loaders.get(&asset_type)
    }

    pub fn contains(&self, asset_type: AssetType) -> bool {
        self.loaders.contains_key(&asset_type)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}
