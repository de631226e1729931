use avian3d::prelude::*;
use bevy::color::Color;
use bevy::prelude::*;

use crate::character_controller::components::*;
use crate::physics::GameLayer;

/// Overlaps the ground probe with environment geometry and records the result on the
/// [`Motor`] and as the [`Grounded`] marker.
pub fn update_grounded(
    mut commands: Commands,
    spatial_query: SpatialQuery,
    mut query: Query<(Entity, &Position, &Rotation, &GroundProbe, &mut Motor), With<CharacterController>>,
) {
    for (entity, position, rotation, probe, mut motor) in &mut query {
        let filter = SpatialQueryFilter::from_mask(GameLayer::Environment)
            .with_excluded_entities([entity]);
        let hits = spatial_query.shape_intersections(
            &Collider::sphere(probe.radius),
            position.0 + rotation.0 * probe.offset,
            Quat::IDENTITY,
            &filter,
        );

        let is_grounded = !hits.is_empty();
        if is_grounded != motor.is_grounded() {
            trace!("{entity}: grounded = {is_grounded}");
        }
        motor.set_grounded(is_grounded);

        if is_grounded {
            commands.entity(entity).insert(Grounded);
        } else {
            commands.entity(entity).remove::<Grounded>();
        }
    }
}

/// Fixed-rate pass: writes the accepted planar velocity and fires a latched jump.
pub fn apply_motion(
    mut query: Query<(&mut Motor, &mut LinearVelocity, &mut ExternalImpulse), With<CharacterController>>,
) {
    for (mut motor, mut linear_velocity, mut impulse) in &mut query {
        if let Some(planar) = motor.velocity() {
            linear_velocity.x = planar.x;
            linear_velocity.z = planar.z;
        }

        if let Some(force) = motor.take_jump() {
            impulse.apply_impulse(Vec3::Y * force);
        }
    }
}

pub fn debug_visualize_ground_probe(
    mut gizmos: Gizmos,
    query: Query<(&Position, &Rotation, &GroundProbe, Has<Grounded>)>,
) {
    for (position, rotation, probe, grounded) in &query {
        let origin = position.0 + rotation.0 * probe.offset;
        let color = if grounded {
            Color::srgb(0.0, 1.0, 0.0)
        } else {
            Color::srgb(1.0, 0.0, 0.0)
        };

        gizmos.sphere(Isometry3d::from_translation(origin), probe.radius, color);
    }
}
