use std::f32::consts::{FRAC_PI_2, PI};

use avian3d::prelude::*;
use bevy::pbr::CascadeShadowConfigBuilder;
use bevy::prelude::*;

use crate::game_states::AppState;
use crate::physics::GameLayer;
use crate::projectile::ScoreTarget;

/// Lateral offset and distance down range of each target stand, in metres.
const TARGET_LANES: [(f32, f32); 3] = [(-4.0, 10.0), (0.0, 18.0), (5.0, 26.0)];
const TARGET_RADIUS: f32 = 0.6;

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), setup);
    }
}

fn environment() -> CollisionLayers {
    CollisionLayers::new(GameLayer::Environment, LayerMask::ALL)
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let ground_material = materials.add(Color::srgb(0.35, 0.5, 0.3));
    commands.spawn((
        Name::new("Ground"),
        RigidBody::Static,
        Collider::cuboid(80.0, 0.2, 80.0),
        environment(),
        Mesh3d(meshes.add(Cuboid::new(80.0, 0.2, 80.0))),
        MeshMaterial3d(ground_material),
        Transform::from_xyz(0.0, -0.1, 0.0),
    ));

    // A couple of steps to jump onto.
    let platform_material = materials.add(Color::srgb(0.6, 0.55, 0.5));
    for (i, height) in [0.5_f32, 1.0].into_iter().enumerate() {
        commands.spawn((
            Name::new(format!("Platform {i}")),
            RigidBody::Static,
            Collider::cuboid(3.0, height, 3.0),
            environment(),
            Mesh3d(meshes.add(Cuboid::new(3.0, height, 3.0))),
            MeshMaterial3d(platform_material.clone()),
            Transform::from_xyz(6.0 + i as f32 * 3.0, height * 0.5, 6.0),
        ));
    }

    let face_material = materials.add(Color::srgb(0.85, 0.15, 0.1));
    let stand_material = materials.add(Color::srgb(0.4, 0.3, 0.2));
    for (i, (x, distance)) in TARGET_LANES.into_iter().enumerate() {
        // The cylinder axis points back at the shooting line.
        commands.spawn((
            Name::new(format!("Target {i}")),
            ScoreTarget,
            RigidBody::Static,
            Collider::cylinder(TARGET_RADIUS, 0.2),
            CollisionLayers::new(GameLayer::Target, LayerMask::ALL),
            Mesh3d(meshes.add(Cylinder::new(TARGET_RADIUS, 0.2))),
            MeshMaterial3d(face_material.clone()),
            Transform::from_xyz(x, 1.5, 8.0 - distance)
                .with_rotation(Quat::from_rotation_x(FRAC_PI_2)),
        ));
        commands.spawn((
            Name::new(format!("Target stand {i}")),
            RigidBody::Static,
            Collider::cuboid(0.15, 1.0, 0.15),
            environment(),
            Mesh3d(meshes.add(Cuboid::new(0.15, 1.0, 0.15))),
            MeshMaterial3d(stand_material.clone()),
            Transform::from_xyz(x, 0.5, 8.0 - distance - 0.2),
        ));
    }

    commands.spawn((
        Transform::from_rotation(Quat::from_euler(EulerRot::ZYX, 0.0, 1.0, -PI / 4.)),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        CascadeShadowConfigBuilder {
            first_cascade_far_bound: 30.0,
            maximum_distance: 120.0,
            ..default()
        }
        .build(),
    ));
}
