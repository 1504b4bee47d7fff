//! Content packages: manifests, dependency ordering and the package lifecycle

pub mod discovery;
pub mod error;
pub mod graph;
pub mod manager;
pub mod model;
pub mod source;

pub use discovery::{Discovery, discover_packages, package_manifests_in};
pub use error::{PackageError, ParseFailure};
pub use graph::DependencyGraph;
pub use manager::{DirectoryLoadReport, LoadResult, PackageCallback, PackageDelta, PackageManager};
pub use model::{
    AssetReference, Package, PackageDependency, PackageMetadata, SceneDefinition, SceneEntity,
};
pub use source::{JsonPackageSource, PackageSource, ParsedPackage};
