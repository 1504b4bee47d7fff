use crate::{PackageError, PackageSource};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of a directory scan, errors never abort the scan
#[derive(Debug, Default)]
pub struct Discovery {
    /// Manifest paths sorted by path
    pub package_paths: Vec<PathBuf>,
    pub errors: Vec<PackageError>,
}

impl Discovery {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Recursively collect every manifest under `directory`
pub fn discover_packages(directory: &Path, source: &dyn PackageSource) -> Discovery {
    let mut discovery = Discovery::default();
    if !directory.is_dir() {
        discovery
            .errors
            .push(PackageError::DirectoryNotFound(directory.to_path_buf()));
        return discovery;
    }
    scan(directory, source, &mut discovery);
    discovery.package_paths.sort();
    tracing::debug!(
        "Discovered {} package(s) under {:?} with {} error(s)",
        discovery.package_paths.len(),
        directory,
        discovery.errors.len()
    );
    discovery
}

fn scan(directory: &Path, source: &dyn PackageSource, discovery: &mut Discovery) {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(source) => {
            discovery.errors.push(PackageError::Discovery {
                path: directory.to_path_buf(),
                source,
            });
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                discovery.errors.push(PackageError::Discovery {
                    path: directory.to_path_buf(),
                    source,
                });
                continue;
            }
        };
        let path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => scan(&path, source, discovery),
            Ok(_) => {
                if source.is_manifest(&path) {
                    discovery.package_paths.push(path);
                }
            }
            Err(source) => discovery
                .errors
                .push(PackageError::Discovery { path, source }),
        }
    }
}

/// Manifests sitting directly inside the immediate subdirectories of `directory`
///
/// Matches the `content/<package>/package.json` layout used for watching.
pub fn package_manifests_in(
    directory: &Path,
    source: &dyn PackageSource,
) -> Result<Vec<PathBuf>, PackageError> {
    let entries = fs::read_dir(directory).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PackageError::DirectoryNotFound(directory.to_path_buf()),
        _ => PackageError::Discovery {
            path: directory.to_path_buf(),
            source: e,
        },
    })?;
    let mut manifests = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PackageError::Discovery {
            path: directory.to_path_buf(),
            source,
        })?;
        let sub_directory = entry.path();
        if !sub_directory.is_dir() {
            continue;
        }
        let Ok(children) = fs::read_dir(&sub_directory) else {
            tracing::warn!("Skipping unreadable directory {:?}", sub_directory);
            continue;
        };
        manifests.extend(
            children
                .filter_map(Result::ok)
                .map(|child| child.path())
                .filter(|path| path.is_file() && source.is_manifest(path)),
        );
    }
    manifests.sort();
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonPackageSource;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("zeta/package.json"));
        touch(&dir.path().join("alpha/package.json"));
        touch(&dir.path().join("alpha/nested/deeper/package.json"));
        touch(&dir.path().join("alpha/readme.txt"));

        let discovery = discover_packages(dir.path(), &JsonPackageSource::default());
        assert!(discovery.is_clean());
        assert_eq!(
            discovery.package_paths,
            vec![
                dir.path().join("alpha/nested/deeper/package.json"),
                dir.path().join("alpha/package.json"),
                dir.path().join("zeta/package.json"),
            ]
        );
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = discover_packages(&dir.path().join("nope"), &JsonPackageSource::default());
        assert!(discovery.package_paths.is_empty());
        assert!(matches!(
            discovery.errors.as_slice(),
            [PackageError::DirectoryNotFound(_)]
        ));
    }

    #[test]
    fn test_manifests_in_immediate_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b/package.json"));
        touch(&dir.path().join("a/package.json"));
        touch(&dir.path().join("a/deep/package.json"));
        touch(&dir.path().join("package.json"));

        let manifests = package_manifests_in(dir.path(), &JsonPackageSource::default()).unwrap();
        assert_eq!(
            manifests,
            vec![
                dir.path().join("a/package.json"),
                dir.path().join("b/package.json")
            ]
        );
    }
}
