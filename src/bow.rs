//! Draw, release and reload of the player's bow.
//!
//! [`BowDraw`] is the frame-stepped state machine. The systems around it move the
//! nocked arrow and string, and turn a release into a launched [`Projectile`].

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::camera::AimState;
use crate::deferred::{Deferred, DeferredAction};
use crate::game_states::FrameSet;
use crate::interpolate::{approach, settled, step_factor};
use crate::physics::GameLayer;
use crate::projectile::{ARROW_HALF_EXTENTS, Projectile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing,
    Released,
    Reloading,
}

/// Tunables for drawing and shooting. Offsets are local z of the nocked arrow.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct BowSettings {
    pub pull_target_z: f32,
    pub pull_epsilon: f32,
    pub pull_rate: f32,
    pub reload_rate: f32,
    pub release_force: f32,
    pub arrow_range: f32,
    pub release_offset_z: f32,
    pub arrow_mass: f32,
    pub collision_grace: f32,
    pub nock_delay: f32,
    pub embed_lifetime: f32,
}

impl Default for BowSettings {
    fn default() -> Self {
        Self {
            pull_target_z: 0.3,
            pull_epsilon: 0.1,
            pull_rate: 1.2,
            reload_rate: 3.0,
            release_force: 5.0,
            arrow_range: 20.0,
            release_offset_z: -3.0,
            arrow_mass: 0.15,
            collision_grace: 0.05,
            nock_delay: 1.0,
            embed_lifetime: 60.0,
        }
    }
}

/// Emitted by the state machine on the frame the aim flag drops mid-draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub pull_fraction: f32,
}

#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct BowDraw {
    state: DrawState,
    rest_z: f32,
    arrow_z: f32,
    pull_fraction: f32,
    was_aiming: bool,
}

impl BowDraw {
    pub fn new(rest_z: f32) -> Self {
        Self {
            rest_z,
            arrow_z: rest_z,
            ..default()
        }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn pull_fraction(&self) -> f32 {
        self.pull_fraction
    }

    /// Local z of the nocked arrow.
    pub fn arrow_offset(&self) -> f32 {
        self.arrow_z
    }

    /// How far the string is pulled back from rest. Zero unless drawing.
    pub fn string_offset(&self) -> f32 {
        match self.state {
            DrawState::Drawing => self.arrow_z - self.rest_z,
            _ => 0.0,
        }
    }

    /// Advances one frame. Drawing only starts once the zoom has settled, and a
    /// release is only reported after at least one frame spent drawing.
    pub fn update(
        &mut self,
        aiming: bool,
        zoomed: bool,
        delta_secs: f32,
        settings: &BowSettings,
    ) -> Option<Release> {
        match self.state {
            DrawState::Idle | DrawState::Reloading if aiming && zoomed => {
                self.state = DrawState::Drawing;
                self.pull_fraction = 0.0;
                self.was_aiming = false;
                self.pull(delta_secs, settings);
                None
            }
            DrawState::Idle => None,
            DrawState::Reloading => {
                let t = step_factor(settings.reload_rate, delta_secs);
                if approach(&mut self.arrow_z, self.rest_z, t, settings.pull_epsilon) {
                    self.arrow_z = self.rest_z;
                    self.pull_fraction = 0.0;
                    self.state = DrawState::Idle;
                }
                None
            }
            DrawState::Drawing if aiming => {
                self.pull(delta_secs, settings);
                None
            }
            DrawState::Drawing if self.was_aiming => {
                self.was_aiming = false;
                self.arrow_z = settings.release_offset_z;
                self.state = DrawState::Released;
                Some(Release {
                    pull_fraction: self.pull_fraction,
                })
            }
            DrawState::Drawing => {
                self.state = DrawState::Idle;
                None
            }
            DrawState::Released => {
                self.state = DrawState::Reloading;
                None
            }
        }
    }

    fn pull(&mut self, delta_secs: f32, settings: &BowSettings) {
        let t = step_factor(settings.pull_rate, delta_secs);
        approach(&mut self.arrow_z, settings.pull_target_z, t, settings.pull_epsilon);

        let fraction = if settled(self.arrow_z, settings.pull_target_z, settings.pull_epsilon) {
            1.0
        } else {
            pull_fraction(self.rest_z, settings.pull_target_z, self.arrow_z)
        };
        self.pull_fraction = self.pull_fraction.max(fraction);
        self.was_aiming = true;
    }
}

/// Share of the rest-to-target distance already covered, in `[0, 1]`.
pub fn pull_fraction(rest_z: f32, target_z: f32, current_z: f32) -> f32 {
    let range = (target_z - rest_z).abs();
    if range <= f32::EPSILON {
        return 1.0;
    }
    (1.0 - (target_z - current_z).abs() / range).clamp(0.0, 1.0)
}

/// Where the shot is headed: the first hit along the camera's forward axis, or the
/// point at full range.
pub fn aim_target(origin: Vec3, forward: Vec3, hit_distance: Option<f32>, range: f32) -> Vec3 {
    origin + forward * hit_distance.unwrap_or(range)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub origin: Vec3,
    pub rotation: Quat,
    pub direction: Vec3,
    pub initial_velocity: Vec3,
    pub impulse: Vec3,
}

/// Spawn pose and motion for a released arrow.
#[allow(clippy::too_many_arguments)]
pub fn plan_launch(
    bow_position: Vec3,
    exit_position: Vec3,
    bow_rotation: Quat,
    target: Vec3,
    fallback: Vec3,
    shooter_speed: f32,
    release_force: f32,
    pull_fraction: f32,
) -> Launch {
    let direction = (target - bow_position)
        .try_normalize()
        .unwrap_or_else(|| fallback.normalize_or_zero());

    Launch {
        origin: exit_position,
        rotation: bow_rotation,
        direction,
        initial_velocity: direction * shooter_speed,
        impulse: direction * release_force * pull_fraction,
    }
}

/// Marks the bow and links the parts the draw systems move.
#[derive(Component, Debug, Clone)]
pub struct BowRig {
    pub shooter: Entity,
    pub camera: Entity,
    pub nocked_arrow: Entity,
    pub string: Entity,
    pub exit_point: Entity,
    pub string_rest_z: f32,
}

#[derive(Component)]
pub struct NockedArrow;

#[derive(Component)]
pub struct BowString;

#[derive(Component)]
pub struct ExitPoint;

/// Mesh and material shared by the nocked arrow and every launched arrow.
#[derive(Resource, Clone)]
pub struct ArrowAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ArrowReleased {
    pub bow: Entity,
    pub pull_fraction: f32,
}

pub struct BowPlugin;

impl Plugin for BowPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<BowSettings>()
            .register_type::<BowDraw>()
            .add_event::<ArrowReleased>()
            .add_systems(
                Update,
                (draw_bow, launch_arrow).chain().in_set(FrameSet::Weapon),
            );
    }
}

fn draw_bow(
    time: Res<Time>,
    mut bows: Query<(Entity, &mut BowDraw, &BowSettings, &BowRig)>,
    aimers: Query<&AimState>,
    mut parts: Query<&mut Transform>,
    mut released: EventWriter<ArrowReleased>,
) {
    for (entity, mut draw, settings, rig) in &mut bows {
        let Ok(aim) = aimers.get(rig.shooter) else { continue };

        let release = draw.update(aim.aiming(), aim.zoomed(), time.delta_secs(), settings);

        if let Ok(mut transform) = parts.get_mut(rig.nocked_arrow) {
            transform.translation.z = draw.arrow_offset();
        }
        if let Ok(mut transform) = parts.get_mut(rig.string) {
            transform.translation.z = rig.string_rest_z + draw.string_offset();
        }

        if let Some(release) = release {
            debug!("bow {entity} released at pull {:.2}", release.pull_fraction);
            released.send(ArrowReleased {
                bow: entity,
                pull_fraction: release.pull_fraction,
            });
        }
    }
}

fn launch_arrow(
    mut commands: Commands,
    mut releases: EventReader<ArrowReleased>,
    spatial_query: SpatialQuery,
    assets: Option<Res<ArrowAssets>>,
    bows: Query<(&BowSettings, &BowRig, &GlobalTransform)>,
    globals: Query<&GlobalTransform>,
    velocities: Query<&LinearVelocity>,
    mut pending: Query<&mut Deferred, With<NockedArrow>>,
) {
    for release in releases.read() {
        let Ok((settings, rig, bow_transform)) = bows.get(release.bow) else { continue };
        let (Ok(camera), Ok(exit)) = (globals.get(rig.camera), globals.get(rig.exit_point)) else {
            warn!("bow {} is missing its camera or exit point", release.bow);
            continue;
        };

        let origin = camera.translation();
        let forward = camera.forward();
        let filter = SpatialQueryFilter::from_mask(GameLayer::aim_probe_mask())
            .with_excluded_entities([rig.shooter]);
        // The aim ray is unbounded; `arrow_range` only places the point for a miss.
        let hit = spatial_query.cast_ray(origin, forward, f32::MAX, true, &filter);
        let target = aim_target(origin, *forward, hit.map(|hit| hit.distance), settings.arrow_range);

        let shooter_speed = velocities
            .get(rig.shooter)
            .map(|velocity| velocity.length())
            .unwrap_or(0.0);
        let launch = plan_launch(
            bow_transform.translation(),
            exit.translation(),
            bow_transform.compute_transform().rotation,
            target,
            *forward,
            shooter_speed,
            settings.release_force,
            release.pull_fraction,
        );

        let mut arrow = commands.spawn((
            Projectile::new(rig.shooter, settings.embed_lifetime),
            Transform::from_translation(launch.origin).with_rotation(launch.rotation),
            RigidBody::Dynamic,
            Collider::cuboid(
                ARROW_HALF_EXTENTS.x * 2.0,
                ARROW_HALF_EXTENTS.y * 2.0,
                ARROW_HALF_EXTENTS.z * 2.0,
            ),
            ColliderDensity(settings.arrow_mass / arrow_volume()),
            CollisionLayers::NONE,
            Deferred::once(
                settings.collision_grace,
                DeferredAction::SetLayers(GameLayer::projectile_layers()),
            ),
            SweptCcd::default(),
            TransformInterpolation,
            LinearVelocity(launch.initial_velocity),
            ExternalImpulse::new(launch.impulse),
        ));
        if let Some(assets) = assets.as_deref() {
            arrow.insert((
                Mesh3d(assets.mesh.clone()),
                MeshMaterial3d(assets.material.clone()),
            ));
        }

        commands.entity(rig.nocked_arrow).insert(Visibility::Hidden);
        match pending.get_mut(rig.nocked_arrow) {
            Ok(mut deferred) => {
                // Only the latest shot decides when the arrow comes back.
                deferred.cancel(DeferredAction::Show);
                deferred.schedule(settings.nock_delay, DeferredAction::Show);
            }
            Err(_) => {
                commands
                    .entity(rig.nocked_arrow)
                    .insert(Deferred::once(settings.nock_delay, DeferredAction::Show));
            }
        }

        debug!(
            "arrow launched toward {target} with impulse {}",
            launch.impulse.length()
        );
    }
}

fn arrow_volume() -> f32 {
    ARROW_HALF_EXTENTS.x * ARROW_HALF_EXTENTS.y * ARROW_HALF_EXTENTS.z * 8.0
}
