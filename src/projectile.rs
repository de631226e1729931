use avian3d::prelude::*;
use bevy::prelude::*;

use crate::deferred::{Deferred, DeferredAction};
use crate::game_states::{AppState, FrameSet};
use crate::physics::GameLayer;

/// Half size of the arrow's box collider. The shaft points along local -z.
pub const ARROW_HALF_EXTENTS: Vec3 = Vec3::new(0.02, 0.02, 0.4);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub enum ProjectilePhase {
    #[default]
    Flying,
    Embedded,
    /// Hit its own shooter and is being removed.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Ignore,
    Discard,
    Embed { scored: bool },
}

/// A launched arrow.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub shooter: Entity,
    /// Seconds an embedded arrow stays in the world.
    pub embed_lifetime: f32,
    phase: ProjectilePhase,
}

impl Projectile {
    pub fn new(shooter: Entity, embed_lifetime: f32) -> Self {
        Self {
            shooter,
            embed_lifetime,
            phase: ProjectilePhase::Flying,
        }
    }

    pub fn phase(&self) -> ProjectilePhase {
        self.phase
    }

    /// Decides what the first contact with `other` does. Only a flying arrow reacts.
    pub fn resolve_impact(&mut self, other_is_shooter: bool, other_is_target: bool) -> Impact {
        if self.phase != ProjectilePhase::Flying {
            return Impact::Ignore;
        }

        if other_is_shooter {
            self.phase = ProjectilePhase::Discarded;
            Impact::Discard
        } else {
            self.phase = ProjectilePhase::Embedded;
            Impact::Embed {
                scored: other_is_target,
            }
        }
    }
}

/// Bodies that count a hit when an arrow embeds in them.
#[derive(Component, Debug, Default)]
pub struct ScoreTarget;

#[derive(Event, Debug, Clone, Copy)]
pub struct TargetHit {
    pub projectile: Entity,
    pub target: Entity,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ArrowEmbedded {
    pub position: Vec3,
}

#[derive(Resource, Debug, Default)]
pub struct Score {
    pub hits: u32,
}

pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Score>()
            .add_event::<TargetHit>()
            .add_event::<ArrowEmbedded>()
            .add_systems(
                Update,
                (handle_projectile_collisions, count_hits)
                    .chain()
                    .after(FrameSet::Weapon)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

fn handle_projectile_collisions(
    mut commands: Commands,
    mut collisions: EventReader<CollisionStarted>,
    colliders: Query<&ColliderParent>,
    mut projectiles: Query<(&mut Projectile, &Transform, Option<&mut Deferred>)>,
    targets: Query<(), With<ScoreTarget>>,
    mut hits: EventWriter<TargetHit>,
    mut embedded: EventWriter<ArrowEmbedded>,
) {
    let body_of = |collider: Entity| {
        colliders
            .get(collider)
            .map(ColliderParent::get)
            .unwrap_or(collider)
    };

    for CollisionStarted(first, second) in collisions.read() {
        let (first, second) = (body_of(*first), body_of(*second));

        for (entity, other) in [(first, second), (second, first)] {
            let Ok((mut projectile, transform, deferred)) = projectiles.get_mut(entity) else {
                continue;
            };

            let shooter = projectile.shooter;
            let impact = projectile.resolve_impact(other == shooter, targets.contains(other));
            match impact {
                Impact::Ignore => {}
                Impact::Discard => {
                    debug!("arrow {entity} hit its shooter");
                    commands.entity(entity).despawn_recursive();
                }
                Impact::Embed { scored } => {
                    commands.entity(entity).insert((
                        LinearVelocity::ZERO,
                        AngularVelocity::ZERO,
                        GravityScale(0.0),
                        RigidBody::Kinematic,
                        LockedAxes::ALL_LOCKED,
                        GameLayer::embedded_layers(),
                    ));
                    match deferred {
                        Some(mut deferred) => {
                            deferred.schedule(projectile.embed_lifetime, DeferredAction::Despawn)
                        }
                        None => {
                            commands.entity(entity).insert(Deferred::once(
                                projectile.embed_lifetime,
                                DeferredAction::Despawn,
                            ));
                        }
                    }

                    embedded.send(ArrowEmbedded {
                        position: transform.translation,
                    });
                    if scored {
                        hits.send(TargetHit {
                            projectile: entity,
                            target: other,
                        });
                    }
                }
            }
        }
    }
}

fn count_hits(mut hits: EventReader<TargetHit>, mut score: ResMut<Score>) {
    for hit in hits.read() {
        score.hits += 1;
        info!("target {} hit, {} so far", hit.target, score.hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn shooter_contact_discards_once() {
        let mut projectile = Projectile::new(entity(1), 60.0);
        assert_eq!(projectile.resolve_impact(true, false), Impact::Discard);
        assert_eq!(projectile.resolve_impact(false, true), Impact::Ignore);
    }

    #[test]
    fn embedded_arrow_ignores_later_contacts() {
        let mut projectile = Projectile::new(entity(1), 60.0);
        assert_eq!(
            projectile.resolve_impact(false, true),
            Impact::Embed { scored: true }
        );
        assert_eq!(projectile.phase(), ProjectilePhase::Embedded);
        assert_eq!(projectile.resolve_impact(false, true), Impact::Ignore);
        assert_eq!(projectile.resolve_impact(true, false), Impact::Ignore);
    }

    fn collision_app() -> App {
        let mut app = App::new();
        app.init_resource::<Score>()
            .add_event::<CollisionStarted>()
            .add_event::<TargetHit>()
            .add_event::<ArrowEmbedded>()
            .add_systems(Update, (handle_projectile_collisions, count_hits).chain());
        app
    }

    #[test]
    fn self_collision_removes_the_arrow_without_scoring() {
        let mut app = collision_app();
        let shooter = app.world_mut().spawn_empty().id();
        let arrow = app
            .world_mut()
            .spawn((Projectile::new(shooter, 60.0), Transform::default()))
            .id();

        app.world_mut().send_event(CollisionStarted(shooter, arrow));
        app.update();

        assert!(app.world().get::<Projectile>(arrow).is_none());
        assert!(app.world().entities().contains(shooter));
        assert_eq!(app.world().resource::<Score>().hits, 0);
        assert!(app.world().resource::<Events<ArrowEmbedded>>().is_empty());
    }

    #[test]
    fn target_hit_embeds_and_scores() {
        let mut app = collision_app();
        let shooter = app.world_mut().spawn_empty().id();
        let target = app.world_mut().spawn(ScoreTarget).id();
        let arrow = app
            .world_mut()
            .spawn((
                Projectile::new(shooter, 60.0),
                Transform::from_xyz(1.0, 2.0, -8.0),
                LinearVelocity(Vec3::new(0.0, -1.0, -20.0)),
                Deferred::default(),
            ))
            .id();

        app.world_mut().send_event(CollisionStarted(arrow, target));
        app.update();

        let world = app.world();
        assert_eq!(
            world.get::<Projectile>(arrow).unwrap().phase(),
            ProjectilePhase::Embedded
        );
        assert_eq!(world.get::<LinearVelocity>(arrow).unwrap().0, Vec3::ZERO);
        assert_eq!(world.get::<RigidBody>(arrow), Some(&RigidBody::Kinematic));
        let player = CollisionLayers::new(GameLayer::Player, LayerMask::ALL);
        let layers = world.get::<CollisionLayers>(arrow).unwrap();
        assert!(!layers.interacts_with(player));
        assert!(layers.interacts_with(CollisionLayers::new(GameLayer::Target, LayerMask::ALL)));
        assert!(world
            .get::<Deferred>(arrow)
            .unwrap()
            .is_pending(DeferredAction::Despawn));
        assert_eq!(world.resource::<Score>().hits, 1);

        let embeds: Vec<ArrowEmbedded> = app
            .world_mut()
            .resource_mut::<Events<ArrowEmbedded>>()
            .drain()
            .collect();
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].position, Vec3::new(1.0, 2.0, -8.0));
    }

    #[test]
    fn environment_hit_embeds_without_scoring() {
        let mut app = collision_app();
        let shooter = app.world_mut().spawn_empty().id();
        let wall = app.world_mut().spawn_empty().id();
        let arrow = app
            .world_mut()
            .spawn((Projectile::new(shooter, 60.0), Transform::default()))
            .id();

        app.world_mut().send_event(CollisionStarted(wall, arrow));
        app.world_mut().send_event(CollisionStarted(arrow, wall));
        app.update();

        assert!(app
            .world()
            .get::<Deferred>(arrow)
            .is_some_and(|deferred| deferred.is_pending(DeferredAction::Despawn)));
        assert_eq!(app.world().resource::<Score>().hits, 0);
    }
}
