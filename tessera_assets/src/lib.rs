mod asset_id;
mod asset_type;
mod data;
mod definition;
mod error;
mod info;
mod loader;
mod registry;
mod stats;

pub use asset_id::AssetId;
pub use asset_type::AssetType;
pub use data::{AssetData, LoadedAsset};
pub use definition::{
    AssetDefinition, AssetManifest, AssetPayload, AudioDefinition, MaterialDefinition,
    MeshDefinition, SceneAssetDefinition, ShaderDefinition, TextureDefinition,
};
pub use error::AssetError;
pub use info::{AssetInfo, PackageAssets};
pub use loader::{AssetLoader, AssetLoaders, FnAssetLoader};
pub use registry::AssetRegistry;
pub use stats::MemoryStats;
