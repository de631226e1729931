use bevy::prelude::*;
use bevy_hanabi::prelude::*;

use crate::game_states::AppState;
use crate::projectile::ArrowEmbedded;

/// Effect assets created once on entering the game, spawned on demand.
#[derive(Resource)]
pub struct EffectHandles {
    pub impact: Handle<EffectAsset>,
}

/// Splinters and dust thrown out where an arrow embeds.
fn create_impact_effect(effects: &mut Assets<EffectAsset>) -> Handle<EffectAsset> {
    let mut color_gradient = Gradient::new();
    color_gradient.add_key(0.0, Vec4::new(1.6, 1.3, 0.9, 1.0));
    color_gradient.add_key(0.3, Vec4::new(0.9, 0.7, 0.45, 0.9));
    color_gradient.add_key(0.7, Vec4::new(0.5, 0.4, 0.3, 0.5));
    color_gradient.add_key(1.0, Vec4::new(0.3, 0.25, 0.2, 0.0));

    let mut size_gradient = Gradient::new();
    size_gradient.add_key(0.0, Vec3::new(0.006, 0.03, 0.006));
    size_gradient.add_key(0.5, Vec3::new(0.004, 0.015, 0.004));
    size_gradient.add_key(1.0, Vec3::splat(0.001));

    let writer = ExprWriter::new();

    let init_pos = SetPositionSphereModifier {
        center: writer.lit(Vec3::ZERO).expr(),
        radius: writer.lit(0.02).expr(),
        dimension: ShapeDimension::Volume,
    };
    let init_vel = SetVelocitySphereModifier {
        center: writer.lit(Vec3::ZERO).expr(),
        speed: writer.lit(0.8).uniform(writer.lit(2.0)).expr(),
    };
    let init_age = SetAttributeModifier::new(Attribute::AGE, writer.lit(0.0).expr());
    let init_lifetime = SetAttributeModifier::new(
        Attribute::LIFETIME,
        writer.lit(0.25).uniform(writer.lit(0.5)).expr(),
    );

    let update_accel = AccelModifier::new(writer.lit(Vec3::new(0.0, -4.0, 0.0)).expr());
    let update_drag = LinearDragModifier::new(writer.lit(1.5).expr());

    let module = writer.finish();

    effects.add(
        EffectAsset::new(128, Spawner::once(40.0.into(), true), module)
            .with_name("arrow_impact")
            .init(init_pos)
            .init(init_vel)
            .init(init_age)
            .init(init_lifetime)
            .update(update_accel)
            .update(update_drag)
            .render(ColorOverLifetimeModifier {
                gradient: color_gradient,
            })
            .render(SizeOverLifetimeModifier {
                gradient: size_gradient,
                screen_space_size: false,
            })
            .render(OrientModifier::new(OrientMode::AlongVelocity)),
    )
}

fn start_fx_resources(mut commands: Commands, mut effects: ResMut<Assets<EffectAsset>>) {
    let impact = create_impact_effect(&mut effects);
    commands.insert_resource(EffectHandles { impact });
}

/// A particle effect that spawns once at a position and despawns after `duration`.
#[derive(Component)]
pub struct OneShotParticleEffect {
    effect_handle: Handle<EffectAsset>,
    position: Vec3,
    timer: Timer,
    spawned: bool,
}

impl OneShotParticleEffect {
    pub fn new(effect_handle: Handle<EffectAsset>, position: Vec3, duration: f32) -> Self {
        Self {
            effect_handle,
            position,
            timer: Timer::from_seconds(duration, TimerMode::Once),
            spawned: false,
        }
    }
}

fn spawn_impact_effects(
    mut commands: Commands,
    mut embeds: EventReader<ArrowEmbedded>,
    handles: Option<Res<EffectHandles>>,
) {
    let Some(handles) = handles else {
        embeds.clear();
        return;
    };

    for embed in embeds.read() {
        commands.spawn(OneShotParticleEffect::new(
            handles.impact.clone(),
            embed.position,
            1.0,
        ));
    }
}

fn handle_one_shot_effects(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut OneShotParticleEffect)>,
) {
    for (entity, mut effect) in &mut query {
        if !effect.spawned {
            commands.entity(entity).insert((
                ParticleEffect::new(effect.effect_handle.clone()),
                Transform::from_translation(effect.position),
            ));
            effect.spawned = true;
        }

        if effect.timer.tick(time.delta()).just_finished() {
            commands.entity(entity).despawn_recursive();
        }
    }
}

pub struct FxPlugin;

impl Plugin for FxPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(HanabiPlugin)
            .add_systems(OnEnter(AppState::InGame), start_fx_resources)
            .add_systems(
                Update,
                (spawn_impact_effects, handle_one_shot_effects)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_burst_per_embedded_arrow() {
        let mut app = App::new();
        app.add_event::<ArrowEmbedded>()
            .insert_resource(EffectHandles {
                impact: Handle::default(),
            })
            .add_systems(Update, spawn_impact_effects);

        app.world_mut().send_event(ArrowEmbedded {
            position: Vec3::new(0.0, 1.0, -10.0),
        });
        app.world_mut().send_event(ArrowEmbedded {
            position: Vec3::new(2.0, 1.0, -10.0),
        });
        app.update();

        let mut effects = app.world_mut().query::<&OneShotParticleEffect>();
        let positions: Vec<Vec3> = effects
            .iter(app.world())
            .map(|effect| effect.position)
            .collect();
        assert_eq!(positions.len(), 2);
        assert!(positions.contains(&Vec3::new(2.0, 1.0, -10.0)));
    }
}
