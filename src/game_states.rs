use bevy::app::{App, Plugin};
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Menu,
    InGame,
}

/// Per-frame ordering of the gameplay systems in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    /// Input registries are refreshed from the backends.
    Input,
    /// Resolved input turns into locomotion requests and an aim flag.
    Control,
    /// Yaw, pitch and aim zoom.
    Camera,
    /// Bow draw, release and projectile launch.
    Weapon,
}

pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>().configure_sets(
            Update,
            (
                FrameSet::Input,
                FrameSet::Control,
                FrameSet::Camera,
                FrameSet::Weapon,
            )
                .chain()
                .run_if(in_state(AppState::InGame)),
        );
    }
}
