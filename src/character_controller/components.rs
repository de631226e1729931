use std::mem;

use bevy::prelude::*;

/// Jump requests smaller than this count as "nothing latched".
const JUMP_EPSILON: f32 = 1e-4;

/// A marker component indicating that an entity is using a character controller.
/// Requires the components the locomotion systems read.
#[derive(Component)]
#[require(Motor, GroundProbe)]
pub struct CharacterController;

/// A marker component indicating that an entity is on the ground.
#[derive(Component)]
#[component(storage = "SparseSet")]
pub struct Grounded;

/// Sphere overlap used to decide whether the body stands on environment geometry.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct GroundProbe {
    /// Probe centre relative to the body origin.
    pub offset: Vec3,
    pub radius: f32,
}

impl Default for GroundProbe {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, -0.9, 0.0),
            radius: 0.1,
        }
    }
}

/// Motion requests gathered during the frame and applied by the fixed-rate pass.
///
/// Planar velocity is only accepted while grounded: a request made in the air is
/// dropped and the body keeps its momentum. Jumps latch until a grounded step
/// consumes them.
#[derive(Component, Reflect, Debug, Default, Clone)]
#[reflect(Component)]
pub struct Motor {
    grounded: bool,
    velocity: Option<Vec3>,
    jump: f32,
    yaw: f32,
    pitch: f32,
}

impl Motor {
    pub fn set_grounded(&mut self, grounded: bool) {
        self.grounded = grounded;
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = self.grounded.then_some(velocity);
    }

    /// The planar velocity to write this step, if any was accepted.
    pub fn velocity(&self) -> Option<Vec3> {
        self.velocity
    }

    /// Latches a jump unless one is already waiting.
    pub fn set_jump(&mut self, magnitude: f32) {
        if self.jump.abs() <= JUMP_EPSILON {
            self.jump = magnitude;
        }
    }

    pub fn jump_latched(&self) -> bool {
        self.jump.abs() > JUMP_EPSILON
    }

    /// Hands out the latched jump once, and only while grounded.
    pub fn take_jump(&mut self) -> Option<f32> {
        if !self.grounded || !self.jump_latched() {
            return None;
        }
        Some(mem::take(&mut self.jump))
    }

    /// Yaw and pitch in degrees for this frame. Positive yaw turns right.
    pub fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
    }

    pub fn take_rotation(&mut self) -> (f32, f32) {
        (mem::take(&mut self.yaw), mem::take(&mut self.pitch))
    }
}
