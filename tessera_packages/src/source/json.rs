//! JSON manifest source.
//!
//! ```json
//! {
//!   "metadata": {
//!     "id": "core",
//!     "name": "Core",
//!     "version": "1.0.0",
//!     "dependencies": [{ "packageId": "base", "version": "1.0.0", "required": true }]
//!   },
//!   "assets": [
//!     { "id": "rock", "type": "mesh", "path": "meshes/rock.mesh" },
//!     { "id": "stone", "type": "material", "shader": "lit", "textures": { "albedo": "stone_albedo" } }
//!   ],
//!   "scenes": [{ "id": "intro", "path": "scenes/intro.scene" }]
//! }
//! ```

use super::{PackageSource, ParsedPackage};
use crate::{
    Package, PackageDependency, PackageError, PackageMetadata, ParseFailure, SceneDefinition,
    SceneEntity,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tessera_assets::{
    AssetDefinition, AssetPayload, AssetType, AudioDefinition, MaterialDefinition,
    MeshDefinition, SceneAssetDefinition, ShaderDefinition, TextureDefinition,
};

pub const DEFAULT_MANIFEST_NAME: &str = "package.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    metadata: RawMetadata,
    #[serde(default)]
    assets: Vec<RawAsset>,
    #[serde(default)]
    scenes: Vec<RawScene>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    id: String,
    name: Option<String>,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDependency {
    package_id: String,
    #[serde(default)]
    version: String,
    #[serde(default = "default_true")]
    required: bool,
}

/// Union of every asset field, which ones are required depends on `type`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAsset {
    id: String,
    #[serde(rename = "type")]
    asset_type: String,
    path: Option<PathBuf>,
    #[serde(default)]
    compressed: bool,
    #[serde(default = "default_true")]
    generate_mipmaps: bool,
    #[serde(default)]
    streaming: bool,
    shader: Option<String>,
    #[serde(default)]
    textures: BTreeMap<String, String>,
    #[serde(default)]
    parameters: BTreeMap<String, Vec<f32>>,
    vertex: Option<PathBuf>,
    fragment: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScene {
    id: String,
    path: Option<PathBuf>,
    #[serde(default)]
    entities: Vec<RawEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntity {
    name: String,
    #[serde(default)]
    components: BTreeMap<String, String>,
}

/// Reads `package.json` style manifests
#[derive(Debug, Clone)]
pub struct JsonPackageSource {
    manifest_name: String,
}

impl Default for JsonPackageSource {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_NAME)
    }
}

impl JsonPackageSource {
    pub fn new(manifest_name: impl Into<String>) -> Self {
        Self {
            manifest_name: manifest_name.into(),
        }
    }

    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    /// Parse manifest text which claims to live at `path`
    pub fn parse_str(&self, path: &Path, text: &str) -> Result<ParsedPackage, ParseFailure> {
        let raw: RawManifest = serde_json::from_str(text).map_err(|e| PackageError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        convert_manifest(path, raw)
    }
}

impl PackageSource for JsonPackageSource {
    fn parse(&self, path: &Path) -> Result<ParsedPackage, ParseFailure> {
        let text = std::fs::read_to_string(path).map_err(|source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(path, &text)
    }

    fn is_manifest(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| name == self.manifest_name.as_str())
    }
}

fn convert_manifest(path: &Path, raw: RawManifest) -> Result<ParsedPackage, ParseFailure> {
    let mut failure = ParseFailure::default();
    let package_id = raw.metadata.id.trim().to_string();
    if package_id.is_empty() {
        failure.errors.push(PackageError::Parse {
            path: path.to_path_buf(),
            message: "metadata.id must not be empty".into(),
        });
    }

    let name = raw.metadata.name.unwrap_or_else(|| {
        failure
            .warnings
            .push(format!("{package_id}: metadata.name missing, using the id"));
        package_id.clone()
    });

    let mut seen = HashSet::new();
    let mut assets = Vec::with_capacity(raw.assets.len());
    for raw_asset in raw.assets {
        if !seen.insert(raw_asset.id.clone()) {
            failure.errors.push(PackageError::DuplicateAsset {
                package: package_id.clone(),
                asset: raw_asset.id,
            });
            continue;
        }
        match convert_asset(path, &package_id, raw_asset) {
            Ok(asset) => assets.push(asset),
            Err(e) => failure.errors.push(e),
        }
    }

    if !failure.errors.is_empty() {
        return Err(failure);
    }

    let package = Package {
        metadata: PackageMetadata {
            id: package_id,
            name,
            version: raw.metadata.version,
            description: raw.metadata.description,
            author: raw.metadata.author,
            dependencies: raw
                .metadata
                .dependencies
                .into_iter()
                .map(|dependency| PackageDependency {
                    package_id: dependency.package_id,
                    version: dependency.version,
                    required: dependency.required,
                })
                .collect(),
        },
        assets,
        scenes: raw
            .scenes
            .into_iter()
            .map(|scene| SceneDefinition {
                id: scene.id,
                path: scene.path,
                entities: scene
                    .entities
                    .into_iter()
                    .map(|entity| SceneEntity {
                        name: entity.name,
                        components: entity.components,
                    })
                    .collect(),
            })
            .collect(),
        source_path: path.to_path_buf(),
    };
    Ok(ParsedPackage {
        package,
        warnings: failure.warnings,
    })
}

fn convert_asset(
    path: &Path,
    package_id: &str,
    raw: RawAsset,
) -> Result<AssetDefinition, PackageError> {
    let asset_type: AssetType = raw.asset_type.parse().map_err(|_| PackageError::Parse {
        path: path.to_path_buf(),
        message: format!("asset {} has unknown type {:?}", raw.id, raw.asset_type),
    })?;
    let missing = |field: &'static str| PackageError::MissingAssetField {
        package: package_id.to_string(),
        asset: raw.id.clone(),
        field,
    };

    let payload = match asset_type {
        AssetType::Material => AssetPayload::Material(MaterialDefinition {
            shader: raw.shader,
            textures: raw.textures,
            parameters: raw.parameters,
        }),
        AssetType::Mesh => AssetPayload::Mesh(MeshDefinition {
            path: raw.path.ok_or_else(|| missing("path"))?,
            compressed: raw.compressed,
        }),
        AssetType::Texture => AssetPayload::Texture(TextureDefinition {
            path: raw.path.ok_or_else(|| missing("path"))?,
            compressed: raw.compressed,
            generate_mipmaps: raw.generate_mipmaps,
        }),
        AssetType::Shader => AssetPayload::Shader(ShaderDefinition {
            vertex: raw.vertex.or(raw.path).ok_or_else(|| missing("vertex"))?,
            fragment: raw.fragment,
        }),
        AssetType::Audio => AssetPayload::Audio(AudioDefinition {
            path: raw.path.ok_or_else(|| missing("path"))?,
            streaming: raw.streaming,
        }),
        AssetType::Scene => AssetPayload::Scene(SceneAssetDefinition {
            path: raw.path.ok_or_else(|| missing("path"))?,
        }),
    };
    Ok(AssetDefinition::new(raw.id, payload))
}
