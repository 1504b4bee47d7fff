use std::path::PathBuf;
use tessera_assets::AssetError;
use tessera_packages::PackageError;

#[derive(Debug, thiserror::Error)]
pub enum HotReloadError {
    #[error("Cannot watch {path:?}")]
    Watch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error("Failed to parse {path:?}: {}", .errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Parse {
        path: PathBuf,
        errors: Vec<PackageError>,
    },
    #[error("{path:?} is not the manifest of a loaded package")]
    NotLoaded { path: PathBuf },
    #[error("{path:?} changed package id from {expected} to {found}")]
    IdChanged {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("Failed to preload {package}")]
    Preload {
        package: String,
        #[source]
        source: AssetError,
    },
    #[error("Staging worker exited without a result")]
    WorkerDisconnected,
}
