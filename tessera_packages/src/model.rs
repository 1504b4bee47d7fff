use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tessera_assets::{AssetDefinition, AssetId, AssetManifest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
    pub package_id: String,
    pub version: String,
    /// Optional dependencies never block loading or unloading
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub dependencies: Vec<PackageDependency>,
}

/// An entity placed by a scene, components map to asset references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEntity {
    pub name: String,
    pub components: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDefinition {
    pub id: String,
    pub path: Option<PathBuf>,
    pub entities: Vec<SceneEntity>,
}

/// A named, versioned bundle of asset and scene definitions
///
/// Produced once by a [`crate::PackageSource`], afterwards owned by the [`crate::PackageManager`]
/// and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub metadata: PackageMetadata,
    pub assets: Vec<AssetDefinition>,
    pub scenes: Vec<SceneDefinition>,
    /// Path of the manifest the package was parsed from
    pub source_path: PathBuf,
}

impl Package {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Ids of every required dependency in declaration order
    pub fn required_dependencies(&self) -> impl Iterator<Item = &str> {
        self.metadata
            .dependencies
            .iter()
            .filter(|dependency| dependency.required)
            .map(|dependency| dependency.package_id.as_str())
    }

    pub fn requires(&self, package_id: &str) -> bool {
        self.required_dependencies().any(|id| id == package_id)
    }

    pub fn find_asset(&self, asset_name: &str) -> Option<&AssetDefinition> {
        self.assets.iter().find(|asset| asset.id == asset_name)
    }

    pub fn find_scene(&self, scene_id: &str) -> Option<&SceneDefinition> {
        self.scenes.iter().find(|scene| scene.id == scene_id)
    }

    pub fn asset_id(&self, asset_name: &str) -> Option<AssetId> {
        self.find_asset(asset_name)
            .map(|asset| AssetId::generate(self.id(), &asset.id))
    }
}

impl AssetManifest for Package {
    fn package_id(&self) -> &str {
        self.id()
    }

    fn manifest_path(&self) -> &Path {
        &self.source_path
    }

    fn asset_definitions(&self) -> &[AssetDefinition] {
        &self.assets
    }
}

/// A reference to an asset, either `asset` (inside the referencing package) or `package:asset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetReference<'a> {
    pub package_id: Option<&'a str>,
    pub asset_name: &'a str,
}

impl<'a> AssetReference<'a> {
    pub fn parse(reference: &'a str) -> Self {
        match reference.split_once(':') {
            Some((package_id, asset_name)) if !package_id.is_empty() => Self {
                package_id: Some(package_id),
                asset_name,
            },
            Some((_, asset_name)) => Self {
                package_id: None,
                asset_name,
            },
            None => Self {
                package_id: None,
                asset_name: reference,
            },
        }
    }

    /// Package the reference points into when written inside of `current_package`
    pub fn package_or<'b>(&self, current_package: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.package_id.unwrap_or(current_package)
    }
}
