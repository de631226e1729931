use avian3d::prelude::Rotation;
use bevy::prelude::*;

use crate::camera::AimState;
use crate::character_controller::components::Motor;
use crate::input::{InputError, InputRegistry};
use crate::player::{AIM_INPUT, CursorLock, Player, SPRINT_INPUT};

/// Turns the player's resolved inputs into motion requests and the aim flag.
pub fn player_input(
    cursor: Res<CursorLock>,
    mut query: Query<(&InputRegistry, &Player, &Rotation, &mut Motor, &mut AimState)>,
) -> Result<(), InputError> {
    let Ok((registry, player, rotation, mut motor, mut aim)) = query.get_single_mut() else {
        return Ok(());
    };

    let sprinting = registry.get(SPRINT_INPUT)?.pressed();
    let direction = planar_direction(rotation.0, registry.horizontal()?, registry.vertical()?);
    motor.set_velocity(direction * player.speed(sprinting));

    if cursor.locked {
        let (yaw, pitch) = player.look(registry.mouse_x()?, registry.mouse_y()?);
        motor.set_rotation(yaw, pitch);
    }

    if registry.jump()? {
        motor.set_jump(player.jump_force);
    }

    aim.set_aim(registry.get(AIM_INPUT)?.pressed());
    Ok(())
}

pub fn log_input_error(In(result): In<Result<(), InputError>>) {
    if let Err(error) = result {
        error!("player input: {error}");
    }
}

/// Unit direction in the body's local basis: `x` strafes right, `z` moves forward.
fn planar_direction(rotation: Quat, x: f32, z: f32) -> Vec3 {
    let right = rotation * Vec3::X;
    let forward = rotation * Vec3::NEG_Z;
    (right * x + forward * z).normalize_or_zero()
}
