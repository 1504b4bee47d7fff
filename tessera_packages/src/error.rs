use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Package directory {0:?} does not exist")]
    DirectoryNotFound(PathBuf),
    #[error("Failed to scan {path:?}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read manifest {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse manifest {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Package {0} is already loaded")]
    AlreadyLoaded(String),
    #[error("Package {package} requires {dependency} which is not loaded")]
    MissingDependency { package: String, dependency: String },
    #[error("Asset {asset} of package {package} is missing required field {field:?}")]
    MissingAssetField {
        package: String,
        asset: String,
        field: &'static str,
    },
    #[error("Package {package} declares asset {asset} more than once")]
    DuplicateAsset { package: String, asset: String },
    #[error("Dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
    #[error("Package {0} is not loaded")]
    NotLoaded(String),
    #[error("Package {package} is still required by {dependents:?}")]
    HasDependents {
        package: String,
        dependents: Vec<String>,
    },
}

/// Everything that went wrong while parsing one manifest
#[derive(Debug, Default)]
pub struct ParseFailure {
    pub errors: Vec<PackageError>,
    pub warnings: Vec<String>,
}

impl ParseFailure {
    pub fn new(error: PackageError) -> Self {
        Self {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }
}

impl From<PackageError> for ParseFailure {
    fn from(value: PackageError) -> Self {
        Self::new(value)
    }
}
