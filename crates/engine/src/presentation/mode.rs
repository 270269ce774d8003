use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::{EntityId, SceneWorld};
use crate::math::{clamp_pitch, horizontal_direction, normalize_degrees, pitch_degrees_of, yaw_facing};

pub const DEFAULT_LOOK_SENSITIVITY: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookConfig {
    /// Degrees per unit of look delta per second.
    pub sensitivity: f32,
    /// When false, unlocking only restores the cursor and leaves the stored
    /// yaw/pitch untouched.
    pub resync_on_unlock: bool,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_LOOK_SENSITIVITY,
            resync_on_unlock: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Unlocked,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorGrab {
    Confined,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub visible: bool,
    pub grab: CursorGrab,
}

impl CursorState {
    const GAMEPLAY: Self = Self {
        visible: false,
        grab: CursorGrab::Confined,
    };
    const DIALOGUE: Self = Self {
        visible: true,
        grab: CursorGrab::Free,
    };
}

/// Free-look versus dialogue-locked input. Yaw lives on `body`, pitch on the
/// `viewpoint` child.
#[derive(Debug)]
pub struct ModeCoordinator {
    body: EntityId,
    viewpoint: EntityId,
    mode: InputMode,
    config: LookConfig,
    pitch_degrees: f32,
    look_input: Vec2,
    cursor: CursorState,
    resync_count: u32,
}

impl ModeCoordinator {
    pub fn new(world: &SceneWorld, body: EntityId, viewpoint: EntityId, config: LookConfig) -> Self {
        let pitch_degrees = world
            .local_rotation(viewpoint)
            .map(|rotation| clamp_pitch(pitch_degrees_of(rotation)))
            .unwrap_or_else(|| {
                warn!(viewpoint = viewpoint.0, "mouse_look_viewpoint_missing");
                0.0
            });
        Self {
            body,
            viewpoint,
            mode: InputMode::Unlocked,
            config,
            pitch_degrees,
            look_input: Vec2::ZERO,
            cursor: CursorState::GAMEPLAY,
            resync_count: 0,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.mode == InputMode::Locked
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn pitch_degrees(&self) -> f32 {
        self.pitch_degrees
    }

    pub fn resync_count(&self) -> u32 {
        self.resync_count
    }

    pub fn body(&self) -> EntityId {
        self.body
    }

    pub fn viewpoint(&self) -> EntityId {
        self.viewpoint
    }

    pub fn on_look(&mut self, delta: Vec2) {
        if self.is_locked() {
            return;
        }
        self.look_input = delta;
    }

    pub fn tick(&mut self, fixed_dt_seconds: f32, world: &mut SceneWorld) {
        if self.is_locked() {
            return;
        }
        let scale = self.config.sensitivity * fixed_dt_seconds;
        let yaw_degrees = self.look_input.x * scale;
        let pitch_delta = self.look_input.y * scale;
        if yaw_degrees == 0.0 && pitch_delta == 0.0 {
            return;
        }

        if let Some(body_rotation) = world.local_rotation(self.body) {
            let turn = Quat::from_rotation_y(-yaw_degrees.to_radians());
            world.set_local_rotation(self.body, turn * body_rotation);
        }
        self.pitch_degrees = clamp_pitch(self.pitch_degrees + pitch_delta);
        world.set_local_rotation(
            self.viewpoint,
            Quat::from_rotation_x(self.pitch_degrees.to_radians()),
        );
    }

    /// Enters dialogue mode. Returns false when already locked.
    pub fn lock(&mut self) -> bool {
        if self.is_locked() {
            return false;
        }
        self.mode = InputMode::Locked;
        self.look_input = Vec2::ZERO;
        self.cursor = CursorState::DIALOGUE;
        info!("mouse_look_locked");
        true
    }

    /// Returns to free-look. Returns false when already unlocked.
    pub fn unlock(&mut self, world: &mut SceneWorld) -> bool {
        if !self.is_locked() {
            return false;
        }
        self.mode = InputMode::Unlocked;
        self.cursor = CursorState::GAMEPLAY;
        if self.config.resync_on_unlock {
            self.resync_orientation(world);
        }
        info!(pitch_degrees = self.pitch_degrees, "mouse_look_unlocked");
        true
    }

    /// Re-derives body yaw and stored pitch from wherever the viewpoint is
    /// currently looking, so free-look resumes without a snap.
    pub fn resync_orientation(&mut self, world: &mut SceneWorld) {
        let Some(view_rotation) = world.world_rotation(self.viewpoint) else {
            warn!(viewpoint = self.viewpoint.0, "mouse_look_viewpoint_missing");
            return;
        };
        let forward = view_rotation * Vec3::NEG_Z;

        if let Some(horizontal) = horizontal_direction(forward) {
            let yaw = yaw_facing(horizontal);
            if !world.set_world_rotation(self.body, Quat::from_rotation_y(yaw)) {
                warn!(body = self.body.0, "mouse_look_body_missing");
            }
        }
        world.set_world_rotation(self.viewpoint, view_rotation);

        let local_pitch = world
            .local_rotation(self.viewpoint)
            .map(pitch_degrees_of)
            .unwrap_or(self.pitch_degrees);
        self.pitch_degrees = clamp_pitch(normalize_degrees(local_pitch));
        world.set_local_rotation(
            self.viewpoint,
            Quat::from_rotation_x(self.pitch_degrees.to_radians()),
        );
        self.resync_count = self.resync_count.saturating_add(1);
        debug!(pitch_degrees = self.pitch_degrees, "mouse_look_resynced");
    }
}
