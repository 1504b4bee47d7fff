use crate::registry::release_data;
use crate::{AssetData, AssetId, AssetLoaders, AssetType};
use std::path::{Path, PathBuf};

/// Responsible for an individual asset's state
#[derive(Debug)]
pub struct AssetInfo {
    pub(crate) id: AssetId,
    pub(crate) package_id: String,
    pub(crate) asset_name: String,
    pub(crate) asset_type: AssetType,
    pub(crate) file_path: PathBuf,
    /// Present iff the asset is loaded
    pub(crate) data: Option<AssetData>,
}

impl AssetInfo {
    pub(crate) fn new(
        package_id: &str,
        asset_name: &str,
        asset_type: AssetType,
        file_path: PathBuf,
    ) -> Self {
        Self {
            id: AssetId::generate(package_id, asset_name),
            package_id: package_id.to_string(),
            asset_name: asset_name.to_string(),
            asset_type,
            file_path,
            data: None,
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&AssetData> {
        self.data.as_ref()
    }

    /// 0 while unloaded
    pub fn data_size(&self) -> usize {
        self.data.as_ref().map_or(0, AssetData::size)
    }
}

/// Every asset of one package, moved out of a registry as a unit
///
/// Carries the loaders of the registry it came from. Data still loaded when the bundle is
/// dropped goes through those unloaders.
#[derive(Debug)]
pub struct PackageAssets {
    pub(crate) package_id: String,
    pub(crate) infos: Vec<AssetInfo>,
    pub(crate) loaders: AssetLoaders,
}

impl PackageAssets {
    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn infos(&self) -> &[AssetInfo] {
        &self.infos
    }

    pub fn loaded_count(&self) -> usize {
        self.infos.iter().filter(|info| info.is_loaded()).count()
    }
}

impl Drop for PackageAssets {
    fn drop(&mut self) {
        for info in self.infos.iter_mut() {
            if let Some(data) = info.data.take() {
                release_data(&self.loaders, info.id, data);
            }
        }
    }
}
