use crate::discovery::{self, Discovery};
use crate::{
    AssetReference, DependencyGraph, Package, PackageError, PackageSource, ParseFailure,
    ParsedPackage,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tessera_assets::AssetId;

pub type PackageCallback = Box<dyn FnMut(&Package) + Send + Sync>;

/// Published for every change to the loaded package set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageDelta {
    Loaded(String),
    Unloaded(String),
    Reloaded(String),
}

/// Outcome of loading a single package
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Id of the package now owned by the manager, `None` on failure
    pub package_id: Option<String>,
    pub errors: Vec<PackageError>,
    pub warnings: Vec<String>,
}

impl LoadResult {
    pub fn success(&self) -> bool {
        self.package_id.is_some() && self.errors.is_empty()
    }

    fn failed(failure: ParseFailure) -> Self {
        Self {
            package_id: None,
            errors: failure.errors,
            warnings: failure.warnings,
        }
    }
}

/// Outcome of [`PackageManager::load_directory`]
#[derive(Debug, Default)]
pub struct DirectoryLoadReport {
    /// Loaded package ids in load order
    pub loaded: Vec<String>,
    /// Package ids which parsed but could not be loaded
    pub skipped: Vec<String>,
    pub errors: Vec<PackageError>,
    pub warnings: Vec<String>,
}

/// Owns every loaded [`Package`] and guards the dependency invariants between them
///
/// # Invariants
/// - A package id is loaded at most once
/// - Every required dependency of a loaded package is loaded
/// - A failed load leaves the manager untouched
pub struct PackageManager {
    source: Arc<dyn PackageSource>,
    packages: HashMap<String, Package>,
    /// Package ids in the order they were loaded
    load_sequence: Vec<String>,
    on_loaded: Option<PackageCallback>,
    on_unloaded: Option<PackageCallback>,
    delta_send: crossbeam_channel::Sender<PackageDelta>,
    delta_recv: crossbeam_channel::Receiver<PackageDelta>,
}

impl fmt::Debug for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageManager")
            .field("packages", &self.load_sequence)
            .field("on_loaded", &self.on_loaded.is_some())
            .field("on_unloaded", &self.on_unloaded.is_some())
            .finish()
    }
}

impl PackageManager {
    pub fn new(source: Arc<dyn PackageSource>) -> Self {
        let (delta_send, delta_recv) = crossbeam_channel::unbounded();
        Self {
            source,
            packages: HashMap::new(),
            load_sequence: Vec::new(),
            on_loaded: None,
            on_unloaded: None,
            delta_send,
            delta_recv,
        }
    }

    pub fn source(&self) -> &Arc<dyn PackageSource> {
        &self.source
    }

    /// Invoked after a package has been loaded
    pub fn set_on_loaded<F: FnMut(&Package) + Send + Sync + 'static>(&mut self, callback: F) {
        self.on_loaded = Some(Box::new(callback));
    }

    /// Invoked right before a package is removed, the package is still readable
    pub fn set_on_unloaded<F: FnMut(&Package) + Send + Sync + 'static>(&mut self, callback: F) {
        self.on_unloaded = Some(Box::new(callback));
    }

    /// Every delta published since the last drain
    pub fn drain_deltas(&self) -> Vec<PackageDelta> {
        let mut deltas = Vec::new();
        while let Ok(delta) = self.delta_recv.try_recv() {
            deltas.push(delta);
        }
        deltas
    }

    /// Additional receiver for consumers living elsewhere, shares the queue with
    /// [`Self::drain_deltas`]
    pub fn delta_receiver(&self) -> crossbeam_channel::Receiver<PackageDelta> {
        self.delta_recv.clone()
    }

    fn publish(&self, delta: PackageDelta) {
        if let Err(e) = self.delta_send.send(delta) {
            tracing::warn!("Failed to publish package delta {:?}", e.0);
        }
    }

    pub fn discover_packages(&self, directory: &Path) -> Discovery {
        discovery::discover_packages(directory, self.source.as_ref())
    }

    pub fn parse_package(&self, path: &Path) -> Result<ParsedPackage, ParseFailure> {
        self.source.parse(path)
    }

    /// Parse the manifest at `path` and take ownership of the package
    pub fn load_package(&mut self, path: &Path) -> LoadResult {
        match self.parse_package(path) {
            Ok(ParsedPackage {
                package,
                mut warnings,
            }) => {
                let mut result = self.insert_package(package);
                warnings.append(&mut result.warnings);
                result.warnings = warnings;
                result
            }
            Err(failure) => {
                tracing::warn!(
                    "Failed to parse {:?} with {} error(s)",
                    path,
                    failure.errors.len()
                );
                LoadResult::failed(failure)
            }
        }
    }

    /// Validate and take ownership of an already parsed package
    pub fn insert_package(&mut self, package: Package) -> LoadResult {
        let mut result = LoadResult::default();
        if self.packages.contains_key(package.id()) {
            result
                .errors
                .push(PackageError::AlreadyLoaded(package.id().to_string()));
            return result;
        }
        for dependency in package.metadata.dependencies.iter() {
            if self.packages.contains_key(&dependency.package_id) {
                continue;
            }
            if dependency.required {
                result.errors.push(PackageError::MissingDependency {
                    package: package.id().to_string(),
                    dependency: dependency.package_id.clone(),
                });
            } else {
                result.warnings.push(format!(
                    "Optional dependency {} of {} is not loaded",
                    dependency.package_id,
                    package.id()
                ));
            }
        }
        if !result.errors.is_empty() {
            tracing::warn!(
                "Refusing to load {} with {} error(s)",
                package.id(),
                result.errors.len()
            );
            return result;
        }

        let package_id = package.id().to_string();
        tracing::debug!(
            "Loaded package {} v{} with {} asset(s)",
            package_id,
            package.metadata.version,
            package.assets.len()
        );
        self.load_sequence.push(package_id.clone());
        self.packages.insert(package_id.clone(), package);
        if let (Some(callback), Some(package)) =
            (self.on_loaded.as_mut(), self.packages.get(&package_id))
        {
            callback(package);
        }
        self.publish(PackageDelta::Loaded(package_id.clone()));
        result.package_id = Some(package_id);
        result
    }

    /// Loaded packages which list `package_id` as a required dependency, in load order
    pub fn dependents_of(&self, package_id: &str) -> Vec<String> {
        self.load_sequence
            .iter()
            .filter(|id| id.as_str() != package_id)
            .filter(|id| {
                self.packages
                    .get(id.as_str())
                    .is_some_and(|package| package.requires(package_id))
            })
            .cloned()
            .collect()
    }

    /// Remove a package, refusing while another loaded package requires it
    pub fn try_unload_package(&mut self, package_id: &str) -> Result<Package, PackageError> {
        if !self.packages.contains_key(package_id) {
            return Err(PackageError::NotLoaded(package_id.to_string()));
        }
        let dependents = self.dependents_of(package_id);
        if !dependents.is_empty() {
            return Err(PackageError::HasDependents {
                package: package_id.to_string(),
                dependents,
            });
        }
        if let (Some(callback), Some(package)) =
            (self.on_unloaded.as_mut(), self.packages.get(package_id))
        {
            callback(package);
        }
        let package = self
            .packages
            .remove(package_id)
            .ok_or_else(|| PackageError::NotLoaded(package_id.to_string()))?;
        self.load_sequence.retain(|id| id != package_id);
        self.publish(PackageDelta::Unloaded(package_id.to_string()));
        tracing::debug!("Unloaded package {}", package_id);
        Ok(package)
    }

    pub fn unload_package(&mut self, package_id: &str) -> bool {
        match self.try_unload_package(package_id) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("{e}");
                false
            }
        }
    }

    /// Swap a loaded package for a freshly parsed version with the same id
    ///
    /// The replacement must have its required dependencies loaded and must not close a cycle
    /// with the loaded set. Returns the previous package.
    pub fn replace_package(&mut self, package: Package) -> Result<Package, PackageError> {
        let package_id = package.id().to_string();
        if !self.packages.contains_key(&package_id) {
            return Err(PackageError::NotLoaded(package_id));
        }
        if let Some(missing) = package
            .required_dependencies()
            .find(|dependency| *dependency != package_id && !self.packages.contains_key(*dependency))
        {
            return Err(PackageError::MissingDependency {
                package: package_id.clone(),
                dependency: missing.to_string(),
            });
        }
        let graph = DependencyGraph::from_packages(
            self.packages
                .values()
                .filter(|loaded| loaded.id() != package_id)
                .chain(std::iter::once(&package)),
        );
        if let Some(cycle) = graph.find_cycle() {
            return Err(PackageError::DependencyCycle(cycle));
        }

        if let (Some(callback), Some(old)) =
            (self.on_unloaded.as_mut(), self.packages.get(&package_id))
        {
            callback(old);
        }
        let old = self
            .packages
            .insert(package_id.clone(), package)
            .ok_or_else(|| PackageError::NotLoaded(package_id.clone()))?;
        if let (Some(callback), Some(new)) =
            (self.on_loaded.as_mut(), self.packages.get(&package_id))
        {
            callback(new);
        }
        self.publish(PackageDelta::Reloaded(package_id.clone()));
        tracing::debug!("Replaced package {}", package_id);
        Ok(old)
    }

    /// Order `package_ids` so that every package comes after its required dependencies
    ///
    /// Ids which are not loaded are ignored. An empty result signals a dependency cycle.
    pub fn get_load_order<S: AsRef<str>>(&self, package_ids: &[S]) -> Vec<String> {
        let mut graph = DependencyGraph::new();
        for id in package_ids {
            match self.packages.get(id.as_ref()) {
                Some(package) => graph.add_package(package.id(), package.required_dependencies()),
                None => tracing::warn!("Cannot order unloaded package {}", id.as_ref()),
            }
        }
        graph.load_order()
    }

    /// Id of the asset named `asset_reference` inside of `package_id`, no other package is
    /// searched
    pub fn resolve_asset_reference(&self, package_id: &str, asset_reference: &str) -> Option<AssetId> {
        self.packages.get(package_id)?.asset_id(asset_reference)
    }

    /// References made by the assets and scene entities of `package_id` which resolve to no
    /// asset
    pub fn dangling_references(&self, package_id: &str) -> Vec<String> {
        let Some(package) = self.packages.get(package_id) else {
            return Vec::new();
        };
        let scene_references = package.scenes.iter().flat_map(|scene| {
            scene
                .entities
                .iter()
                .flat_map(|entity| entity.components.values().map(String::as_str))
        });
        package
            .assets
            .iter()
            .flat_map(|asset| asset.references())
            .chain(scene_references)
            .filter(|reference| {
                let reference = AssetReference::parse(reference);
                self.resolve_asset_reference(reference.package_or(package_id), reference.asset_name)
                    .is_none()
            })
            .map(str::to_string)
            .collect()
    }

    /// Linear scan over every loaded asset
    pub fn find_package_containing_asset(&self, asset_id: AssetId) -> Option<&Package> {
        self.load_sequence
            .iter()
            .filter_map(|id| self.packages.get(id))
            .find(|package| {
                package
                    .assets
                    .iter()
                    .any(|asset| AssetId::generate(package.id(), &asset.id) == asset_id)
            })
    }

    pub fn get_package(&self, package_id: &str) -> Option<&Package> {
        self.packages.get(package_id)
    }

    pub fn is_loaded(&self, package_id: &str) -> bool {
        self.packages.contains_key(package_id)
    }

    /// Loaded package ids in load order
    pub fn loaded_package_ids(&self) -> &[String] {
        &self.load_sequence
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.load_sequence
            .iter()
            .filter_map(|id| self.packages.get(id))
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Discover, parse and load every package under `directory` in dependency order
    ///
    /// Packages on or behind a cycle are skipped, their siblings still load.
    pub fn load_directory(&mut self, directory: &Path) -> DirectoryLoadReport {
        let mut report = DirectoryLoadReport::default();
        let discovery = self.discover_packages(directory);
        report.errors.extend(discovery.errors);

        let mut parsed: Vec<Package> = Vec::with_capacity(discovery.package_paths.len());
        for path in discovery.package_paths.iter() {
            match self.parse_package(path) {
                Ok(ParsedPackage { package, warnings }) => {
                    report.warnings.extend(warnings);
                    if parsed.iter().any(|other| other.id() == package.id()) {
                        report
                            .errors
                            .push(PackageError::AlreadyLoaded(package.id().to_string()));
                        report.skipped.push(package.id().to_string());
                    } else {
                        parsed.push(package);
                    }
                }
                Err(failure) => {
                    report.errors.extend(failure.errors);
                    report.warnings.extend(failure.warnings);
                }
            }
        }

        let graph = DependencyGraph::from_packages(parsed.iter());
        if let Some(cycle) = graph.find_cycle() {
            report.errors.push(PackageError::DependencyCycle(cycle));
        }
        let (order, unresolved) = graph.partial_order();
        report.skipped.extend(unresolved);

        let mut by_id: HashMap<String, Package> = parsed
            .into_iter()
            .map(|package| (package.id().to_string(), package))
            .collect();
        for package_id in order {
            let Some(package) = by_id.remove(&package_id) else {
                continue;
            };
            let result = self.insert_package(package);
            let loaded = result.success();
            report.warnings.extend(result.warnings);
            if loaded {
                report.loaded.push(package_id);
            } else {
                report.errors.extend(result.errors);
                report.skipped.push(package_id);
            }
        }
        tracing::debug!(
            "Loaded {} package(s) from {:?}, skipped {}",
            report.loaded.len(),
            directory,
            report.skipped.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::package;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Serves packages from memory keyed by their source path
    #[derive(Default)]
    struct MemorySource {
        packages: HashMap<PathBuf, Package>,
    }

    impl MemorySource {
        fn with(packages: Vec<Package>) -> Arc<Self> {
            Arc::new(Self {
                packages: packages
                    .into_iter()
                    .map(|package| (package.source_path.clone(), package))
                    .collect(),
            })
        }
    }

    impl PackageSource for MemorySource {
        fn parse(&self, path: &Path) -> Result<ParsedPackage, ParseFailure> {
            self.packages
                .get(path)
                .cloned()
                .map(ParsedPackage::from)
                .ok_or_else(|| {
                    ParseFailure::new(PackageError::Io {
                        path: path.to_path_buf(),
                        source: std::io::ErrorKind::NotFound.into(),
                    })
                })
        }

        fn is_manifest(&self, path: &Path) -> bool {
            path.ends_with("package.json")
        }
    }

    fn manifest(id: &str) -> PathBuf {
        PathBuf::from(format!("/content/{id}/package.json"))
    }

    fn manager(packages: Vec<Package>) -> PackageManager {
        PackageManager::new(MemorySource::with(packages))
    }

    #[test]
    fn test_load_with_dependency() {
        let mut manager = manager(vec![package("A", &[], &[]), package("B", &["A"], &[])]);
        assert!(manager.load_package(&manifest("A")).success());
        assert!(manager.load_package(&manifest("B")).success());
        assert_eq!(manager.get_load_order(&["A", "B"]), vec!["A", "B"]);
        assert_eq!(manager.get_load_order(&["B", "A"]), vec!["A", "B"]);
        assert_eq!(
            manager.drain_deltas(),
            vec![
                PackageDelta::Loaded("A".into()),
                PackageDelta::Loaded("B".into())
            ]
        );
    }

    #[test]
    fn test_missing_required_dependency() {
        let mut manager = manager(vec![package("B", &["A"], &[])]);
        let result = manager.load_package(&manifest("B"));
        assert!(!result.success());
        assert!(matches!(
            result.errors.as_slice(),
            [PackageError::MissingDependency { package, dependency }] if package == "B" && dependency == "A"
        ));
        assert!(!manager.is_loaded("B"));
        assert_eq!(manager.package_count(), 0);
        assert!(manager.drain_deltas().is_empty());
    }

    #[test]
    fn test_missing_optional_dependency_warns() {
        let mut manager = manager(vec![package("B", &[], &["A"])]);
        let result = manager.load_package(&manifest("B"));
        assert!(result.success());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_load_package_forwards_parse_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{ "metadata": { "id": "solo" } }"#).unwrap();
        let mut manager = PackageManager::new(Arc::new(crate::JsonPackageSource::default()));
        let result = manager.load_package(&path);
        assert!(result.success());
        assert_eq!(result.warnings, vec!["solo: metadata.name missing, using the id"]);
    }

    #[test]
    fn test_duplicate_load_rejected() {
        let mut manager = manager(vec![package("A", &[], &[])]);
        assert!(manager.load_package(&manifest("A")).success());
        let result = manager.load_package(&manifest("A"));
        assert!(matches!(
            result.errors.as_slice(),
            [PackageError::AlreadyLoaded(id)] if id == "A"
        ));
        assert_eq!(manager.package_count(), 1);
    }

    #[test]
    fn test_parse_failure_leaves_no_state() {
        let mut manager = manager(Vec::new());
        let result = manager.load_package(&manifest("ghost"));
        assert!(!result.success());
        assert!(matches!(result.errors.as_slice(), [PackageError::Io { .. }]));
        assert_eq!(manager.package_count(), 0);
    }

    #[test]
    fn test_unload_blocked_by_required_dependent() {
        let mut manager = manager(vec![
            package("A", &[], &[]),
            package("B", &["A"], &[]),
            package("C", &[], &["A"]),
        ]);
        for id in ["A", "B", "C"] {
            assert!(manager.load_package(&manifest(id)).success());
        }
        manager.drain_deltas();

        assert!(!manager.unload_package("A"));
        assert!(manager.is_loaded("A"));
        assert!(manager.drain_deltas().is_empty());
        assert_eq!(manager.dependents_of("A"), vec!["B"]);

        // optional dependents never block
        assert!(manager.unload_package("B"));
        assert!(manager.unload_package("A"));
        assert_eq!(manager.loaded_package_ids(), &["C".to_string()]);
        assert!(!manager.unload_package("A"));
    }

    #[test]
    fn test_callbacks_see_package() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut manager = manager(vec![package("A", &[], &[])]);
        let loaded = seen.clone();
        manager.set_on_loaded(move |package| {
            loaded.lock().unwrap().push(format!("+{}", package.id()));
        });
        let unloaded = seen.clone();
        manager.set_on_unloaded(move |package| {
            unloaded
                .lock()
                .unwrap()
                .push(format!("-{}:{}", package.id(), package.assets.len()));
        });
        manager.load_package(&manifest("A"));
        manager.unload_package("A");
        assert_eq!(*seen.lock().unwrap(), vec!["+A", "-A:1"]);
    }

    #[test]
    fn test_resolve_asset_reference() {
        let mut manager = manager(vec![package("A", &[], &[]), package("B", &["A"], &[])]);
        manager.load_package(&manifest("A"));
        manager.load_package(&manifest("B"));

        assert_eq!(
            manager.resolve_asset_reference("A", "A_mesh"),
            Some(AssetId::generate("A", "A_mesh"))
        );
        // no search across packages for plain names
        assert_eq!(manager.resolve_asset_reference("B", "A_mesh"), None);
        // qualified names are split by the caller
        assert_eq!(manager.resolve_asset_reference("B", "A:A_mesh"), None);
        assert_eq!(manager.resolve_asset_reference("missing", "A_mesh"), None);

        let owner = manager
            .find_package_containing_asset(AssetId::generate("B", "B_mesh"))
            .unwrap();
        assert_eq!(owner.id(), "B");
        assert!(manager
            .find_package_containing_asset(AssetId::generate("B", "nothing"))
            .is_none());
    }

    #[test]
    fn test_resolve_name_containing_colon() {
        use tessera_assets::{AssetDefinition, AssetPayload, MeshDefinition};

        let mut b = package("B", &[], &[]);
        b.assets.push(AssetDefinition::new(
            "ui:button",
            AssetPayload::Mesh(MeshDefinition {
                path: PathBuf::from("button.mesh"),
                compressed: false,
            }),
        ));
        let mut manager = manager(vec![package("ui", &[], &[]), b]);
        manager.load_package(&manifest("ui"));
        manager.load_package(&manifest("B"));
        assert_eq!(
            manager.resolve_asset_reference("B", "ui:button"),
            Some(AssetId::generate("B", "ui:button"))
        );
        assert_eq!(manager.resolve_asset_reference("ui", "button"), None);
    }

    #[test]
    fn test_dangling_references() {
        use crate::{SceneDefinition, SceneEntity};
        use std::collections::BTreeMap;
        use tessera_assets::{AssetDefinition, AssetPayload, MaterialDefinition};

        let mut b = package("B", &["A"], &[]);
        b.assets.push(AssetDefinition::new(
            "paint",
            AssetPayload::Material(MaterialDefinition {
                shader: Some("ghost_shader".into()),
                textures: BTreeMap::from([("albedo".into(), "A:A_mesh".into())]),
                parameters: BTreeMap::new(),
            }),
        ));
        b.scenes.push(SceneDefinition {
            id: "intro".into(),
            path: None,
            entities: vec![SceneEntity {
                name: "rock".into(),
                components: BTreeMap::from([
                    ("mesh".into(), "B_mesh".into()),
                    ("material".into(), "C:paint".into()),
                ]),
            }],
        });
        let mut manager = manager(vec![package("A", &[], &[]), b]);
        manager.load_package(&manifest("A"));
        manager.load_package(&manifest("B"));
        assert_eq!(manager.dangling_references("B"), vec!["ghost_shader", "C:paint"]);
        assert!(manager.dangling_references("A").is_empty());
    }

    #[test]
    fn test_replace_package() {
        let mut manager = manager(vec![package("A", &[], &[]), package("B", &["A"], &[])]);
        manager.load_package(&manifest("A"));
        manager.load_package(&manifest("B"));
        manager.drain_deltas();

        let mut updated = package("A", &[], &[]);
        updated.metadata.version = "2.0.0".into();
        let old = manager.replace_package(updated).unwrap();
        assert_eq!(old.metadata.version, "1.0.0");
        assert_eq!(manager.get_package("A").unwrap().metadata.version, "2.0.0");
        assert_eq!(manager.loaded_package_ids(), &["A".to_string(), "B".to_string()]);
        assert_eq!(manager.drain_deltas(), vec![PackageDelta::Reloaded("A".into())]);

        // A requiring B would close a cycle
        let cyclic = package("A", &["B"], &[]);
        assert!(matches!(
            manager.replace_package(cyclic),
            Err(PackageError::DependencyCycle(_))
        ));
        assert_eq!(manager.get_package("A").unwrap().metadata.version, "2.0.0");

        assert!(matches!(
            manager.replace_package(package("C", &[], &[])),
            Err(PackageError::NotLoaded(_))
        ));
        assert!(matches!(
            manager.replace_package(package("B", &["Z"], &[])),
            Err(PackageError::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let write = |id: &str, body: &str| {
            let path = dir.path().join(id).join("package.json");
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        };
        write(
            "app",
            r#"{ "metadata": { "id": "app", "name": "App", "dependencies": [{ "packageId": "core" }] } }"#,
        );
        write("core", r#"{ "metadata": { "id": "core" } }"#);
        write(
            "loop_a",
            r#"{ "metadata": { "id": "loop_a", "name": "A", "dependencies": [{ "packageId": "loop_b" }] } }"#,
        );
        write(
            "loop_b",
            r#"{ "metadata": { "id": "loop_b", "name": "B", "dependencies": [{ "packageId": "loop_a" }] } }"#,
        );
        write("broken", "{ nope");

        let mut manager = PackageManager::new(Arc::new(crate::JsonPackageSource::default()));
        let report = manager.load_directory(dir.path());
        assert_eq!(report.loaded, vec!["core", "app"]);
        assert_eq!(report.skipped, vec!["loop_a", "loop_b"]);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, PackageError::DependencyCycle(_))));
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, PackageError::Parse { .. })));
        assert_eq!(manager.package_count(), 2);
        assert!(report
            .warnings
            .iter()
            .any(|warning| warning.contains("core: metadata.name missing")));
    }
}
