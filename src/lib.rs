//! A first-person archery range.
//!
//! Input sources are resolved through a per-player registry, locomotion and look
//! are requested each frame and applied by the physics pass, and the bow turns
//! an aim hold into a drawn, released and simulated arrow.

pub mod bow;
pub mod camera;
pub mod character_controller;
pub mod deferred;
pub mod fx;
pub mod game_states;
pub mod input;
pub mod interpolate;
pub mod menu;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod world;

use bevy::app::PluginGroupBuilder;
use bevy::prelude::*;

/// Every gameplay plugin, in the order they need to be added.
pub struct ArcheryRangePlugins;

impl PluginGroup for ArcheryRangePlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(game_states::GameStatePlugin)
            .add(physics::PhysicsPlugin)
            .add(input::InputPlugin)
            .add(deferred::DeferredPlugin)
            .add(character_controller::CharacterControllerPlugin)
            .add(camera::CameraPlugin)
            .add(bow::BowPlugin)
            .add(projectile::ProjectilePlugin)
            .add(fx::FxPlugin)
            .add(menu::MenuPlugin)
            .add(player::PlayerPlugin)
            .add(world::WorldPlugin)
    }
}
