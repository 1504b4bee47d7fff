mod json;

pub use json::DEFAULT_MANIFEST_NAME;

pub use json::JsonPackageSource;

use crate::{Package, ParseFailure};
use std::path::Path;

/// A parsed package and the non-fatal problems found in its manifest
#[derive(Debug, Clone)]
pub struct ParsedPackage {
    pub package: Package,
    pub warnings: Vec<String>,
}

impl From<Package> for ParsedPackage {
    fn from(package: Package) -> Self {
        Self {
            package,
            warnings: Vec::new(),
        }
    }
}

/// Turns a manifest on disk into a [`Package`]
///
/// The package manager only depends on this contract, never on a manifest syntax.
pub trait PackageSource: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ParsedPackage, ParseFailure>;

    /// Whether `path` names a manifest this source understands
    fn is_manifest(&self, path: &Path) -> bool;
}
