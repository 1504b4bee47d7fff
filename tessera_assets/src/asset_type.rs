use std::fmt;
use std::str::FromStr;

/// Kind of asset, every kind has at most one loader registered at a time
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetType {
    Material,
    Mesh,
    Texture,
    Shader,
    Audio,
    Scene,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::Material,
        AssetType::Mesh,
        AssetType::Texture,
        AssetType::Shader,
        AssetType::Audio,
        AssetType::Scene,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Material => "material",
            AssetType::Mesh => "mesh",
            AssetType::Texture => "texture",
            AssetType::Shader => "shader",
            AssetType::Audio => "audio",
            AssetType::Scene => "scene",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = crate::AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|asset_type| asset_type.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::AssetError::UnknownAssetType(s.to_string()))
    }
}
