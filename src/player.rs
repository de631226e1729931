//! The archer: a dynamic capsule body with a first-person camera and a bow.
//!
//! Entering the game spawns the body with its input registry, then the camera,
//! the weapon mount and the bow parts as a hierarchy under it.

use std::collections::HashMap;

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::bow::{ArrowAssets, BowDraw, BowRig, BowSettings, BowString, ExitPoint, NockedArrow};
use crate::camera::{AimState, WeaponMount, first_person_camera};
use crate::character_controller::CharacterController;
use crate::game_states::AppState;
use crate::input::{
    AIM, ActionInput, ActionMap, DefaultInputs, InputRegistry, InputSource, KeyInput, XrDevices,
};
use crate::physics::GameLayer;
use crate::projectile::ARROW_HALF_EXTENTS;

/// Custom input holding the sprint key.
pub const SPRINT_INPUT: &str = "sprint";
/// Custom input mirroring the "Aim" action.
pub const AIM_INPUT: &str = "aim";

const WEAPON_OFFSET: Vec3 = Vec3::new(0.3, -0.25, -0.6);
const STRING_REST_Z: f32 = 0.1;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Player>()
            .init_resource::<CursorLock>()
            .add_systems(OnEnter(AppState::InGame), (setup, grab_cursor))
            .add_systems(
                Update,
                (release_cursor, regrab_cursor).run_if(in_state(AppState::InGame)),
            );
    }
}

/// Whether the window holds the cursor. Mouse look only runs while it does.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CursorLock {
    pub locked: bool,
}

/// Movement and look settings.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Player {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub jump_force: f32,
    /// Degrees of yaw per unit of the "Mouse X" axis.
    pub mouse_x_sensitivity: f32,
    /// Degrees of pitch per unit of the "Mouse Y" axis.
    pub mouse_y_sensitivity: f32,
    pub invert_y: bool,
    pub sprint_key: KeyCode,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            sprint_speed: 7.0,
            jump_force: 5.0,
            mouse_x_sensitivity: 5.0,
            mouse_y_sensitivity: 5.0,
            invert_y: false,
            sprint_key: KeyCode::ShiftLeft,
        }
    }
}

impl Player {
    pub fn speed(&self, sprinting: bool) -> f32 {
        if sprinting {
            self.sprint_speed
        } else {
            self.walk_speed
        }
    }

    /// Yaw and pitch requests in degrees for this frame's look axes.
    pub fn look(&self, mouse_x: f32, mouse_y: f32) -> (f32, f32) {
        let pitch = mouse_y * self.mouse_y_sensitivity;
        let pitch = if self.invert_y { -pitch } else { pitch };
        (mouse_x * self.mouse_x_sensitivity, pitch)
    }

    /// Setup problems worth a warning. None of them stop the game.
    pub fn validate(&self, actions: &ActionMap) -> Vec<String> {
        let mut problems = Vec::new();
        if self.walk_speed >= self.sprint_speed {
            problems.push(format!(
                "walk speed {} is not below sprint speed {}",
                self.walk_speed, self.sprint_speed
            ));
        }
        if actions.button_uses_key(AIM, self.sprint_key) {
            problems.push(format!(
                "sprint key {:?} is also bound to the \"{AIM}\" action",
                self.sprint_key
            ));
        }
        problems
    }

    /// The registry the player reads from: sprint and aim on top of the defaults.
    pub fn input_registry(&self, defaults: DefaultInputs) -> InputRegistry {
        let custom: Vec<Box<dyn InputSource>> = vec![
            Box::new(KeyInput::new(self.sprint_key)),
            Box::new(ActionInput::button(AIM)),
        ];
        let index = HashMap::from([(SPRINT_INPUT.to_string(), 0), (AIM_INPUT.to_string(), 1)]);
        InputRegistry::with_defaults(defaults, custom, Some(index))
    }
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    actions: Res<ActionMap>,
    xr: Res<XrDevices>,
) {
    let player = Player::default();
    for problem in player.validate(&actions) {
        warn!("player setup: {problem}");
    }

    let defaults = if xr.controllers().next().is_some() {
        info!("XR controllers connected, using controller defaults");
        DefaultInputs::xr()
    } else {
        DefaultInputs::desktop()
    };
    let registry = player.input_registry(defaults);

    let arrow_assets = ArrowAssets {
        mesh: meshes.add(Cuboid::from_size(ARROW_HALF_EXTENTS * 2.0)),
        material: materials.add(Color::srgb(0.55, 0.4, 0.25)),
    };
    commands.insert_resource(arrow_assets.clone());

    let body = commands
        .spawn((
            Name::new("Player"),
            player,
            CharacterController,
            registry,
            AimState::default(),
            RigidBody::Dynamic,
            Collider::capsule(0.4, 1.0),
            LockedAxes::ROTATION_LOCKED,
            CollisionLayers::new(
                GameLayer::Player,
                [
                    GameLayer::Default,
                    GameLayer::Environment,
                    GameLayer::Projectile,
                    GameLayer::Target,
                ],
            ),
            Friction::ZERO.with_combine_rule(CoefficientCombine::Min),
            Restitution::ZERO.with_combine_rule(CoefficientCombine::Min),
            ExternalImpulse::default(),
            Transform::from_xyz(0.0, 1.5, 8.0),
        ))
        .id();

    let camera = commands.spawn((Name::new("Camera"), first_person_camera())).id();

    let nocked_arrow = commands
        .spawn((
            Name::new("Nocked arrow"),
            NockedArrow,
            Mesh3d(arrow_assets.mesh.clone()),
            MeshMaterial3d(arrow_assets.material.clone()),
            Transform::default(),
        ))
        .id();
    let string = commands
        .spawn((
            Name::new("Bow string"),
            BowString,
            Mesh3d(meshes.add(Cuboid::new(0.005, 0.9, 0.005))),
            MeshMaterial3d(materials.add(Color::srgb(0.9, 0.9, 0.85))),
            Transform::from_xyz(0.0, 0.0, STRING_REST_Z),
        ))
        .id();
    let exit_point = commands
        .spawn((
            Name::new("Exit point"),
            ExitPoint,
            Transform::from_xyz(0.0, 0.0, -ARROW_HALF_EXTENTS.z - 0.1),
        ))
        .id();

    let weapon = commands
        .spawn((
            Name::new("Bow"),
            BowDraw::new(0.0),
            BowSettings::default(),
            BowRig {
                shooter: body,
                camera,
                nocked_arrow,
                string,
                exit_point,
                string_rest_z: STRING_REST_Z,
            },
            WeaponMount {
                original_offset: WEAPON_OFFSET,
            },
            Mesh3d(meshes.add(Cuboid::new(0.04, 1.0, 0.04))),
            MeshMaterial3d(materials.add(Color::srgb(0.35, 0.2, 0.1))),
            Transform::from_translation(WEAPON_OFFSET),
        ))
        .add_children(&[nocked_arrow, string, exit_point])
        .id();

    commands.entity(camera).add_child(weapon);
    commands.entity(body).add_child(camera);
}

fn set_cursor_lock(
    windows: &mut Query<&mut Window, With<PrimaryWindow>>,
    lock: &mut CursorLock,
    locked: bool,
) {
    lock.locked = locked;
    let Ok(mut window) = windows.get_single_mut() else { return };
    window.cursor_options.grab_mode = if locked {
        CursorGrabMode::Locked
    } else {
        CursorGrabMode::None
    };
    window.cursor_options.visible = !locked;
}

fn grab_cursor(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut lock: ResMut<CursorLock>,
) {
    set_cursor_lock(&mut windows, &mut lock, true);
}

fn release_cursor(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut lock: ResMut<CursorLock>,
) {
    if lock.locked && keyboard.just_pressed(KeyCode::Escape) {
        set_cursor_lock(&mut windows, &mut lock, false);
    }
}

/// Clicking back into the window resumes mouse look.
fn regrab_cursor(
    mouse: Res<ButtonInput<MouseButton>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut lock: ResMut<CursorLock>,
) {
    if !lock.locked && mouse.just_pressed(MouseButton::Left) {
        set_cursor_lock(&mut windows, &mut lock, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ActionBinding, ButtonBinding, InputError};

    #[test]
    fn sprint_speed_only_while_sprinting() {
        let player = Player::default();
        assert_eq!(player.speed(false), 5.0);
        assert_eq!(player.speed(true), 7.0);
    }

    #[test]
    fn inverted_look_flips_pitch_only() {
        let mut player = Player::default();
        assert_eq!(player.look(1.0, 0.5), (5.0, 2.5));
        player.invert_y = true;
        assert_eq!(player.look(1.0, 0.5), (5.0, -2.5));
    }

    #[test]
    fn default_setup_is_valid() {
        assert!(Player::default().validate(&ActionMap::default()).is_empty());
    }

    #[test]
    fn misconfiguration_is_reported() {
        let player = Player {
            walk_speed: 8.0,
            sprint_key: KeyCode::KeyC,
            ..default()
        };
        let problems = player.validate(&ActionMap::default());
        assert_eq!(problems.len(), 2);

        let mut actions = ActionMap::empty();
        actions.insert(
            AIM,
            ActionBinding::Button(ButtonBinding {
                keys: vec![KeyCode::KeyQ],
                ..default()
            }),
        );
        let problems = player.validate(&actions);
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn registry_tracks_sprint_and_aim() {
        let registry = Player::default().input_registry(DefaultInputs::desktop());
        assert_eq!(registry.custom_index(SPRINT_INPUT), Some(0));
        assert_eq!(registry.custom_index(AIM_INPUT), Some(1));
        assert_eq!(registry.get(SPRINT_INPUT).map(|input| input.name()), Ok("ShiftLeft"));
        assert!(matches!(
            registry.get("crouch"),
            Err(InputError::UnknownInput { .. })
        ));
    }

    #[test]
    fn escape_frees_the_cursor_and_a_click_takes_it_back() {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .insert_resource(CursorLock { locked: true })
            .add_systems(Update, (release_cursor, regrab_cursor));
        let window = app.world_mut().spawn((Window::default(), PrimaryWindow)).id();
        let grab_mode = |app: &App| app.world().get::<Window>(window).unwrap().cursor_options.grab_mode;

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();
        assert!(!app.world().resource::<CursorLock>().locked);
        assert_eq!(grab_mode(&app), CursorGrabMode::None);
        assert!(app.world().get::<Window>(window).unwrap().cursor_options.visible);

        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().clear();
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        assert!(app.world().resource::<CursorLock>().locked);
        assert_eq!(grab_mode(&app), CursorGrabMode::Locked);
        assert!(!app.world().get::<Window>(window).unwrap().cursor_options.visible);
    }
}
