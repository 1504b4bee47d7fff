use crate::{ContentLibrary, HotReloadConfig, HotReloadCoordinator};
use bevy_ecs::prelude::*;
use std::path::PathBuf;
use tessera_ecs::{App, AppStage, Plugin};

/// Loads every package under `root` into the [`ContentLibrary`] resource and, when enabled,
/// reloads modified packages: changes are detected and staged in [`AppStage::First`] and
/// committed in [`AppStage::Last`]
#[derive(Debug, Clone)]
pub struct ContentPlugin {
    pub root: PathBuf,
    pub hot_reload: Option<HotReloadConfig>,
}

impl ContentPlugin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            hot_reload: None,
        }
    }

    pub fn with_hot_reload(mut self, config: HotReloadConfig) -> Self {
        self.hot_reload = Some(config);
        self
    }
}

impl Plugin for ContentPlugin {
    fn build(&self, app: &mut App) {
        let world = app.world_mut();
        if !world.contains_resource::<ContentLibrary>() {
            world.insert_resource(ContentLibrary::default());
        }
        let source = {
            let mut library = world.resource_mut::<ContentLibrary>();
            let report = library.load_directory(&self.root);
            for e in report.errors.iter() {
                tracing::warn!("{e}");
            }
            tracing::debug!(
                "Content plugin loaded {} package(s) from {:?}",
                report.loaded.len(),
                self.root
            );
            library.manager().source().clone()
        };

        let Some(config) = self.hot_reload.clone() else {
            return;
        };
        let mut coordinator = HotReloadCoordinator::new(config);
        if let Err(e) = coordinator.watch_all_packages(&self.root, source.as_ref()) {
            tracing::warn!("Hot reload disabled: {e}");
            return;
        }
        app.insert_resource(coordinator)
            .add_systems(AppStage::First, stage_reloads)
            .add_systems(AppStage::Last, commit_reloads);
    }
}

pub fn stage_reloads(mut coordinator: ResMut<HotReloadCoordinator>, library: Res<ContentLibrary>) {
    coordinator.check_for_changes();
    // also picks up manifests flagged while an earlier reload was still in flight
    coordinator.stage_pending_reloads(&library);
}

pub fn commit_reloads(
    mut coordinator: ResMut<HotReloadCoordinator>,
    mut library: ResMut<ContentLibrary>,
) {
    let report = coordinator.commit_pending_assets(&mut library);
    if !report.committed.is_empty() {
        tracing::debug!("Hot reloaded {:?}", report.committed);
    }
}
