mod plugin;

pub use plugin::Plugin;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ScheduleLabel;
use bevy_ecs::system::ScheduleSystem;

/// A simple staged application driving one [`World`] a frame at a time
pub struct App {
    world: World,
    schedule: Schedule,
}

#[derive(ScheduleLabel, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct FrameSchedule;

#[derive(SystemSet, Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum AppStage {
    First,
    PreUpdate,
    Update,
    PostUpdate,
    /// End of frame, state handed between frames is committed here
    Last,
}

/// Number of completed ticks
#[derive(Resource, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FrameCount(pub u64);

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        let mut world = World::new();
        world.init_resource::<FrameCount>();
        let mut schedule = Schedule::new(FrameSchedule);
        schedule.configure_sets(
            (
                AppStage::First,
                AppStage::PreUpdate,
                AppStage::Update,
                AppStage::PostUpdate,
                AppStage::Last,
            )
                .chain(),
        );

        fn end_frame(world: &mut World) {
            world.resource_mut::<FrameCount>().0 += 1;
            world.clear_trackers();
        }
        schedule.add_systems(end_frame.in_set(AppStage::Last));

        Self { world, schedule }
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }
    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
    #[inline]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn insert_resource<R: Resource>(&mut self, resource: R) -> &mut Self {
        self.world.insert_resource(resource);
        self
    }

    pub fn add_systems<M>(
        &mut self,
        stage: AppStage,
        systems: impl IntoScheduleConfigs<ScheduleSystem, M>,
    ) -> &mut Self {
        self.schedule.add_systems(systems.in_set(stage));
        self
    }

    pub fn add_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        plugin.build(self);
        self
    }

    pub fn frame(&self) -> u64 {
        self.world.get_resource::<FrameCount>().map_or(0, |f| f.0)
    }

    /// Tick the app
    pub fn tick(&mut self) {
        self.schedule.run(&mut self.world);
    }
}
