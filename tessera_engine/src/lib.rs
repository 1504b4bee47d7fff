//! Runtime side of the content pipeline: the active [`ContentLibrary`], hot reloading and the
//! plugin wiring both into an [`tessera_ecs::App`]

pub mod hot_reload;
mod library;
mod plugin;

pub use hot_reload::{
    CommitReport, FileWatcher, HotReloadConfig, HotReloadCoordinator, HotReloadError,
    ReloadState, StagedReload, StagingMode,
};
pub use library::ContentLibrary;
pub use plugin::{ContentPlugin, commit_reloads, stage_reloads};

pub mod prelude {
    pub use super::{ContentLibrary, ContentPlugin, HotReloadConfig, HotReloadCoordinator};
    pub use tessera_assets::{AssetId, AssetRegistry, AssetType, LoadedAsset};
    pub use tessera_packages::{Package, PackageManager};
}
