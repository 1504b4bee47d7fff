use crate::AssetType;
use std::any::Any;
use tessera_containers::prelude::{ContainerErrors, ErasedBox};

/// What a loader hands back to the registry
#[derive(Debug)]
pub struct LoadedAsset {
    pub value: ErasedBox,
    /// Bytes accounted against memory statistics
    pub size: usize,
}

impl LoadedAsset {
    pub fn new<T: Any + Send + Sync>(value: T, size: usize) -> Self {
        Self {
            value: ErasedBox::new(value),
            size,
        }
    }
}

impl From<Vec<u8>> for LoadedAsset {
    fn from(value: Vec<u8>) -> Self {
        let size = value.len();
        Self::new(value, size)
    }
}

/// Loaded data owned by the registry, tagged with the type of asset it was loaded for
#[derive(Debug)]
pub struct AssetData {
    asset_type: AssetType,
    size: usize,
    value: ErasedBox,
}

impl AssetData {
    pub(crate) fn new(asset_type: AssetType, loaded: LoadedAsset) -> Self {
        Self {
            asset_type,
            size: loaded.size,
            value: loaded.value,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn try_get<T: 'static>(&self) -> Result<&T, ContainerErrors> {
        self.value.try_downcast_ref::<T>()
    }

    pub fn value(&self) -> &ErasedBox {
        &self.value
    }

    pub(crate) fn into_value(self) -> ErasedBox {
        self.value
    }
}
