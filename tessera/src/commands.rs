use anyhow::{Context, Result, bail};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tessera_ecs::App;
use tessera_engine::prelude::*;
use tessera_engine::StagingMode;
use tessera_packages::{JsonPackageSource, PackageDelta, PackageSource, ParsedPackage};

pub fn source(manifest_name: &str) -> Arc<dyn PackageSource> {
    Arc::new(JsonPackageSource::new(manifest_name))
}

/// Every asset type stored in its own file is loaded as raw bytes
fn library_with_byte_loaders(source: Arc<dyn PackageSource>) -> ContentLibrary {
    let mut library = ContentLibrary::new(source);
    for asset_type in [
        AssetType::Mesh,
        AssetType::Texture,
        AssetType::Shader,
        AssetType::Audio,
        AssetType::Scene,
    ] {
        library.registry_mut().register_loader_fn(
            asset_type,
            |path| {
                let bytes = std::fs::read(path).with_context(|| format!("Reading {path:?}"))?;
                Ok(LoadedAsset::from(bytes))
            },
            |_, _| {},
        );
    }
    library
}

/// Load every asset which has a loader, returns how many loaded
fn preload_all(library: &mut ContentLibrary) -> usize {
    let loadable: Vec<AssetId> = library
        .registry()
        .iter()
        .filter(|info| library.registry().has_loader(info.asset_type()))
        .map(|info| info.id())
        .collect();
    let mut loaded = 0;
    for id in loadable {
        match library.registry_mut().try_load_asset(id) {
            Ok(()) => loaded += 1,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
    loaded
}

pub fn scan(source: Arc<dyn PackageSource>, directory: &Path) -> Result<()> {
    let manager = PackageManager::new(source);
    let discovery = manager.discover_packages(directory);
    for e in discovery.errors.iter() {
        eprintln!("error: {e}");
    }
    let mut failed = 0;
    for path in discovery.package_paths.iter() {
        match manager.parse_package(path) {
            Ok(ParsedPackage { package, warnings }) => {
                println!(
                    "{:<24} {:<10} {:>4} assets {:>3} scenes  {}",
                    package.id(),
                    package.metadata.version,
                    package.assets.len(),
                    package.scenes.len(),
                    path.display()
                );
                for warning in warnings.iter() {
                    println!("    warning: {warning}");
                }
            }
            Err(failure) => {
                failed += 1;
                println!("{:<24} {}", "<invalid>", path.display());
                for e in failure.errors.iter() {
                    println!("    {e}");
                }
            }
        }
    }
    println!(
        "{} manifest(s), {} invalid",
        discovery.package_paths.len(),
        failed
    );
    Ok(())
}

pub fn order(source: Arc<dyn PackageSource>, directory: &Path) -> Result<()> {
    let mut manager = PackageManager::new(source);
    let report = manager.load_directory(directory);
    for (i, package_id) in report.loaded.iter().enumerate() {
        println!("{:>3}. {package_id}", i + 1);
        for reference in manager.dangling_references(package_id) {
            println!("       dangling reference {reference}");
        }
    }
    for package_id in report.skipped.iter() {
        println!("  skipped {package_id}");
    }
    for e in report.errors.iter() {
        eprintln!("error: {e}");
    }
    if report.loaded.is_empty() && !report.errors.is_empty() {
        bail!("No package could be loaded from {:?}", directory);
    }
    Ok(())
}

pub fn stats(source: Arc<dyn PackageSource>, directory: &Path) -> Result<()> {
    let mut library = library_with_byte_loaders(source);
    let report = library.load_directory(directory);
    for e in report.errors.iter() {
        eprintln!("error: {e}");
    }
    preload_all(&mut library);

    let stats = library.memory_stats();
    println!("packages        {}", library.manager().package_count());
    println!("assets          {}", stats.total_assets);
    println!("loaded          {}", stats.loaded_assets);
    println!("memory          {} bytes", stats.total_memory_usage);
    for (asset_type, bytes) in stats.memory_by_type.iter() {
        println!("  {:<13} {} bytes", asset_type, bytes);
    }
    Ok(())
}

pub fn watch(
    source: Arc<dyn PackageSource>,
    directory: &Path,
    background: bool,
    interval_ms: u64,
    frames: Option<u64>,
) -> Result<()> {
    let config = HotReloadConfig {
        staging: if background {
            StagingMode::Background
        } else {
            StagingMode::Inline
        },
        ..Default::default()
    };
    let mut app = App::new();
    app.insert_resource(library_with_byte_loaders(source));
    app.add_plugin(ContentPlugin::new(directory).with_hot_reload(config));
    if app.world().get_resource::<HotReloadCoordinator>().is_none() {
        bail!("Cannot watch {:?}", directory);
    }
    {
        let mut library = app.world_mut().resource_mut::<ContentLibrary>();
        let loaded = preload_all(&mut library);
        println!(
            "Watching {} package(s) with {loaded} loaded asset(s) in {}",
            library.manager().package_count(),
            directory.display()
        );
        library.manager().drain_deltas();
    }

    let interval = Duration::from_millis(interval_ms);
    while frames.is_none_or(|frames| app.frame() < frames) {
        app.tick();
        let library = app.world().resource::<ContentLibrary>();
        for delta in library.manager().drain_deltas() {
            if let PackageDelta::Reloaded(package_id) = delta {
                let stats = library.memory_stats();
                println!(
                    "[frame {}] reloaded {package_id}, {} bytes loaded",
                    app.frame(),
                    stats.total_memory_usage
                );
            }
        }
        std::thread::sleep(interval);
    }
    Ok(())
}
