use crate::{AssetId, AssetType};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset {0} is not registered")]
    UnknownAsset(AssetId),
    #[error("No loader registered for asset type {0}")]
    NoLoader(AssetType),
    #[error("Loader for {asset_type} failed to load {path:?}")]
    LoaderFailed {
        asset_type: AssetType,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("Unknown asset type {0:?}")]
    UnknownAssetType(String),
}
