//! One-shot actions scheduled against the frame clock.
//!
//! Pending actions live in a [`Deferred`] component on the entity they act on, so
//! despawning the entity drops them with it and nothing ever runs against a
//! despawned entity.

use std::mem::discriminant;
use std::time::Duration;

use avian3d::prelude::CollisionLayers;
use bevy::prelude::*;

use crate::game_states::AppState;

#[derive(Debug, Clone, Copy)]
pub enum DeferredAction {
    /// Re-arms collisions by restoring the given layers.
    SetLayers(CollisionLayers),
    /// Makes a hidden entity visible again.
    Show,
    Despawn,
}

impl DeferredAction {
    fn same_kind(&self, other: &DeferredAction) -> bool {
        discriminant(self) == discriminant(other)
    }
}

#[derive(Debug)]
struct ScheduledTask {
    timer: Timer,
    action: DeferredAction,
}

#[derive(Component, Debug, Default)]
pub struct Deferred {
    tasks: Vec<ScheduledTask>,
}

impl Deferred {
    pub fn once(delay_secs: f32, action: DeferredAction) -> Self {
        let mut deferred = Self::default();
        deferred.schedule(delay_secs, action);
        deferred
    }

    pub fn schedule(&mut self, delay_secs: f32, action: DeferredAction) {
        self.tasks.push(ScheduledTask {
            timer: Timer::from_seconds(delay_secs.max(0.0), TimerMode::Once),
            action,
        });
    }

    /// Drops every pending action of the same kind. Returns how many were dropped.
    pub fn cancel(&mut self, action: DeferredAction) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.action.same_kind(&action));
        before - self.tasks.len()
    }

    pub fn is_pending(&self, action: DeferredAction) -> bool {
        self.tasks.iter().any(|task| task.action.same_kind(&action))
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advances every timer and removes the actions that came due, in scheduling order.
    pub fn tick(&mut self, delta: Duration) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        self.tasks.retain_mut(|task| {
            if task.timer.tick(delta).finished() {
                due.push(task.action);
                false
            } else {
                true
            }
        });
        due
    }
}

pub struct DeferredPlugin;

impl Plugin for DeferredPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, run_deferred.run_if(in_state(AppState::InGame)));
    }
}

fn run_deferred(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Deferred)>,
) {
    for (entity, mut deferred) in &mut query {
        for action in deferred.tick(time.delta()) {
            match action {
                DeferredAction::SetLayers(layers) => {
                    commands.entity(entity).insert(layers);
                }
                DeferredAction::Show => {
                    commands.entity(entity).insert(Visibility::Inherited);
                }
                DeferredAction::Despawn => {
                    commands.entity(entity).despawn_recursive();
                    break;
                }
            }
        }
    }
}
