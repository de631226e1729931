mod components;
mod input;
mod physics;

use bevy::prelude::*;

use crate::game_states::{AppState, FrameSet};

pub use components::{CharacterController, GroundProbe, Grounded, Motor};

pub struct CharacterControllerPlugin;

impl Plugin for CharacterControllerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<GroundProbe>()
            .register_type::<Motor>()
            .add_systems(
                Update,
                (
                    physics::update_grounded,
                    input::player_input.pipe(input::log_input_error),
                )
                    .chain()
                    .in_set(FrameSet::Control),
            )
            .add_systems(
                FixedUpdate,
                physics::apply_motion.run_if(in_state(AppState::InGame)),
            )
            .add_systems(
                Update,
                physics::debug_visualize_ground_probe
                    .run_if(in_state(AppState::InGame))
                    .run_if(|| cfg!(debug_assertions)),
            );
    }
}
