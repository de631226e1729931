use avian3d::prelude::Rotation;
use bevy::{
    core_pipeline::{bloom::Bloom, tonemapping::Tonemapping},
    prelude::*,
};

use crate::character_controller::Motor;
use crate::game_states::FrameSet;
use crate::interpolate::{approach, step_factor};

/// Pitch state of the first-person camera. Angles are in degrees.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CameraRig {
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub pitch: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            min_pitch: -45.0,
            max_pitch: 45.0,
            pitch: 0.0,
        }
    }
}

impl CameraRig {
    /// Adds a pitch delta and keeps the result inside the configured range.
    pub fn add_pitch(&mut self, delta: f32) -> f32 {
        self.pitch = clamp_angle(self.pitch + delta, self.min_pitch, self.max_pitch);
        self.pitch
    }
}

/// Field-of-view zoom applied while aiming. FOVs are vertical, in degrees.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct AimZoom {
    pub normal_fov: f32,
    pub zoomed_fov: f32,
    pub rate: f32,
    pub epsilon: f32,
}

impl Default for AimZoom {
    fn default() -> Self {
        Self {
            normal_fov: 60.0,
            zoomed_fov: 30.0,
            rate: 5.0,
            epsilon: 0.1,
        }
    }
}

/// Aim flag set from input, and whether the zoom-in has settled.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct AimState {
    aiming: bool,
    zoomed: bool,
}

impl AimState {
    pub fn set_aim(&mut self, aiming: bool) {
        self.aiming = aiming;
        if !aiming {
            self.zoomed = false;
        }
    }

    pub fn aiming(&self) -> bool {
        self.aiming
    }

    pub fn zoomed(&self) -> bool {
        self.zoomed
    }

    pub(crate) fn set_zoomed(&mut self, zoomed: bool) {
        self.zoomed = zoomed && self.aiming;
    }
}

/// The weapon held in front of the camera, with its resting local offset.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct WeaponMount {
    pub original_offset: Vec3,
}

/// Wraps an angle in degrees to (-180, 180] and clamps it to `[min, max]`.
pub fn clamp_angle(angle: f32, min: f32, max: f32) -> f32 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    let wrapped = if wrapped == -180.0 { 180.0 } else { wrapped };
    wrapped.clamp(min, max)
}

/// One frame of aim zoom. Returns whether the zoom-in has settled.
///
/// While aiming the FOV approaches the zoomed value and the weapon slides toward
/// the camera centre line. Otherwise both return to their resting values, with
/// the weapon's height and depth snapped back at once.
pub fn step_zoom(
    zoom: &AimZoom,
    aiming: bool,
    delta_secs: f32,
    fov: &mut f32,
    weapon: &mut Vec3,
    original: Vec3,
) -> bool {
    let t = step_factor(zoom.rate, delta_secs);

    if aiming {
        if approach(fov, zoom.zoomed_fov, t, zoom.epsilon) {
            return true;
        }
        weapon.x += (0.0 - weapon.x) * t;
        return false;
    }

    weapon.y = original.y;
    weapon.z = original.z;
    if approach(fov, zoom.normal_fov, t, zoom.epsilon) {
        weapon.x = original.x;
    } else {
        weapon.x += (original.x - weapon.x) * t;
    }
    false
}

pub fn first_person_camera() -> impl Bundle {
    let zoom = AimZoom::default();
    (
        Camera3d::default(),
        Camera {
            hdr: true,
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: zoom.normal_fov.to_radians(),
            ..default()
        }),
        DistanceFog {
            color: Color::srgb_u8(170, 190, 210),
            falloff: FogFalloff::Exponential { density: 4e-3 },
            ..default()
        },
        Bloom {
            intensity: 0.03,
            ..default()
        },
        Tonemapping::TonyMcMapface,
        CameraRig::default(),
        zoom,
        Transform::from_xyz(0.0, 0.6, 0.0),
    )
}

/// Applies this frame's yaw to the body and the accumulated pitch to the camera.
fn apply_rotation(
    mut bodies: Query<(&mut Rotation, &mut Motor)>,
    mut cameras: Query<(&mut Transform, &mut CameraRig)>,
) {
    let Ok((mut rotation, mut motor)) = bodies.get_single_mut() else { return };
    let Ok((mut camera_transform, mut rig)) = cameras.get_single_mut() else { return };

    let (yaw, pitch) = motor.take_rotation();
    if yaw != 0.0 {
        rotation.0 = (rotation.0 * Quat::from_rotation_y(-yaw.to_radians())).normalize();
    }

    let pitch = rig.add_pitch(pitch);
    camera_transform.rotation = Quat::from_rotation_x(pitch.to_radians());
}

fn zoom_on_aim(
    time: Res<Time>,
    mut aimers: Query<&mut AimState>,
    mut cameras: Query<(&mut Projection, &AimZoom)>,
    mut weapons: Query<(&mut Transform, &WeaponMount)>,
) {
    let Ok(mut aim) = aimers.get_single_mut() else { return };
    let Ok((mut projection, zoom)) = cameras.get_single_mut() else { return };
    let Projection::Perspective(perspective) = &mut *projection else { return };

    let mut fov = perspective.fov.to_degrees();
    let (mut offset, original) = match weapons.get_single() {
        Ok((transform, mount)) => (transform.translation, mount.original_offset),
        Err(_) => (Vec3::ZERO, Vec3::ZERO),
    };

    let zoomed = step_zoom(zoom, aim.aiming(), time.delta_secs(), &mut fov, &mut offset, original);

    perspective.fov = fov.to_radians();
    if let Ok((mut transform, _)) = weapons.get_single_mut() {
        transform.translation = offset;
    }
    if aim.zoomed() != zoomed {
        aim.set_zoomed(zoomed);
    }
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<CameraRig>()
            .register_type::<AimZoom>()
            .register_type::<AimState>()
            .register_type::<WeaponMount>()
            .add_systems(
                Update,
                (apply_rotation, zoom_on_aim).chain().in_set(FrameSet::Camera),
            );
    }
}
