use avian3d::prelude::*;
use bevy::prelude::*;

/// Collision layers used across the range.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum GameLayer {
    /// Anything spawned without explicit layers.
    #[default]
    Default,
    /// Static geometry the player can stand on.
    Environment,
    Player,
    Projectile,
    /// Bodies that score when an arrow embeds in them.
    Target,
}

impl GameLayer {
    /// Layers an armed arrow collides with.
    pub fn projectile_layers() -> CollisionLayers {
        CollisionLayers::new(
            GameLayer::Projectile,
            [
                GameLayer::Default,
                GameLayer::Environment,
                GameLayer::Player,
                GameLayer::Target,
            ],
        )
    }

    /// Layers of an arrow stuck in the world. The player walks through it.
    pub fn embedded_layers() -> CollisionLayers {
        CollisionLayers::new(
            GameLayer::Projectile,
            [GameLayer::Default, GameLayer::Environment, GameLayer::Target],
        )
    }

    /// Layers the aim probe can hit.
    pub fn aim_probe_mask() -> LayerMask {
        LayerMask::from([GameLayer::Default, GameLayer::Environment, GameLayer::Target])
    }
}

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default());
    }
}
