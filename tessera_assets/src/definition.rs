use crate::AssetType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Material defined inline in a manifest
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDefinition {
    /// Asset reference to the shader used
    pub shader: Option<String>,
    /// Texture slot -> asset reference
    pub textures: BTreeMap<String, String>,
    /// Named scalar/vector parameters
    pub parameters: BTreeMap<String, Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshDefinition {
    pub path: PathBuf,
    pub compressed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDefinition {
    pub path: PathBuf,
    pub compressed: bool,
    pub generate_mipmaps: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDefinition {
    pub vertex: PathBuf,
    pub fragment: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDefinition {
    pub path: PathBuf,
    /// Stream from disk rather than decoding up front
    pub streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneAssetDefinition {
    pub path: PathBuf,
}

/// Type specific fields of an asset definition
#[derive(Debug, Clone, PartialEq)]
pub enum AssetPayload {
    Material(MaterialDefinition),
    Mesh(MeshDefinition),
    Texture(TextureDefinition),
    Shader(ShaderDefinition),
    Audio(AudioDefinition),
    Scene(SceneAssetDefinition),
}

impl AssetPayload {
    pub fn asset_type(&self) -> AssetType {
        match self {
            AssetPayload::Material(_) => AssetType::Material,
            AssetPayload::Mesh(_) => AssetType::Mesh,
            AssetPayload::Texture(_) => AssetType::Texture,
            AssetPayload::Shader(_) => AssetType::Shader,
            AssetPayload::Audio(_) => AssetType::Audio,
            AssetPayload::Scene(_) => AssetType::Scene,
        }
    }

    /// Primary file backing the payload, [`None`] for payloads living inside the manifest
    pub fn source_path(&self) -> Option<&Path> {
        match self {
            AssetPayload::Material(_) => None,
            AssetPayload::Mesh(mesh) => Some(&mesh.path),
            AssetPayload::Texture(texture) => Some(&texture.path),
            AssetPayload::Shader(shader) => Some(&shader.vertex),
            AssetPayload::Audio(audio) => Some(&audio.path),
            AssetPayload::Scene(scene) => Some(&scene.path),
        }
    }
}

/// A single asset declared by a package
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDefinition {
    /// Symbolic name, unique within the package
    pub id: String,
    pub payload: AssetPayload,
}

impl AssetDefinition {
    pub fn new(id: impl Into<String>, payload: AssetPayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        self.payload.asset_type()
    }

    /// Resolve the file a loader receives for this asset
    ///
    /// Relative paths are resolved against the manifest's directory, inline payloads resolve to
    /// the manifest itself.
    pub fn resolve_file_path(&self, manifest_path: &Path) -> PathBuf {
        match self.payload.source_path() {
            None => manifest_path.to_path_buf(),
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => manifest_path
                .parent()
                .map(|parent| parent.join(path))
                .unwrap_or_else(|| path.to_path_buf()),
        }
    }

    /// Asset references this definition points at
    pub fn references(&self) -> Vec<&str> {
        match &self.payload {
            AssetPayload::Material(material) => material
                .shader
                .iter()
                .map(String::as_str)
                .chain(material.textures.values().map(String::as_str))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Anything which declares a set of assets on behalf of a package
pub trait AssetManifest {
    fn package_id(&self) -> &str;

    fn manifest_path(&self) -> &Path;

    fn asset_definitions(&self) -> &[AssetDefinition];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let mesh = AssetDefinition::new(
            "rock",
            AssetPayload::Mesh(MeshDefinition {
                path: PathBuf::from("meshes/rock.mesh"),
                compressed: false,
            }),
        );
        assert_eq!(
            mesh.resolve_file_path(Path::new("/content/core/package.json")),
            PathBuf::from("/content/core/meshes/rock.mesh")
        );
    }

    #[test]
    fn test_inline_material_resolves_to_manifest() {
        let material = AssetDefinition::new(
            "stone",
            AssetPayload::Material(MaterialDefinition {
                shader: Some("lit".into()),
                textures: BTreeMap::from([("albedo".into(), "stone_albedo".into())]),
                parameters: BTreeMap::new(),
            }),
        );
        assert_eq!(material.asset_type(), AssetType::Material);
        assert_eq!(
            material.resolve_file_path(Path::new("/content/core/package.json")),
            PathBuf::from("/content/core/package.json")
        );
        assert_eq!(material.references(), vec!["lit", "stone_albedo"]);
    }
}
