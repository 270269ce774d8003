use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::{EntityId, SceneWorld};
use crate::math::look_rotation;

use super::tween::{Easing, RotationTween};

pub const DEFAULT_FOCUS_DURATION_SECONDS: f32 = 0.6;
pub const DEFAULT_FOLLOW_ROTATION_SPEED: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FocusMotionSpec {
    Tween {
        #[serde(default = "default_focus_duration")]
        duration_seconds: f32,
        #[serde(default)]
        easing: Easing,
    },
    Follow {
        #[serde(default = "default_follow_speed")]
        rotation_speed: f32,
    },
}

fn default_focus_duration() -> f32 {
    DEFAULT_FOCUS_DURATION_SECONDS
}

fn default_follow_speed() -> f32 {
    DEFAULT_FOLLOW_ROTATION_SPEED
}

impl Default for FocusMotionSpec {
    fn default() -> Self {
        Self::Tween {
            duration_seconds: DEFAULT_FOCUS_DURATION_SECONDS,
            easing: Easing::default(),
        }
    }
}

impl FocusMotionSpec {
    pub fn build(&self) -> Box<dyn FocusMotion> {
        match *self {
            Self::Tween {
                duration_seconds,
                easing,
            } => Box::new(TweenFocus::new(duration_seconds, easing)),
            Self::Follow { rotation_speed } => Box::new(FollowFocus::new(rotation_speed)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub motion: FocusMotionSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterTarget {
    pub speaker: String,
    pub target: EntityId,
    pub offset: Vec3,
}

/// Speaker name to look-at point. Read-only once the scene is built; the
/// first entry with a matching name wins.
#[derive(Debug, Clone, Default)]
pub struct CharacterTargetRegistry {
    targets: Vec<CharacterTarget>,
}

impl CharacterTargetRegistry {
    pub fn new(targets: Vec<CharacterTarget>) -> Self {
        Self { targets }
    }

    pub fn lookup(&self, speaker: &str) -> Option<&CharacterTarget> {
        if speaker.is_empty() {
            return None;
        }
        self.targets.iter().find(|entry| entry.speaker == speaker)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusGoal {
    pub target: EntityId,
    pub offset: Vec3,
    pub rotation: Quat,
}

/// How the camera gets from its current rotation to a focus goal.
pub trait FocusMotion: fmt::Debug {
    /// Supersedes whatever is in flight.
    fn begin(&mut self, from: Quat, goal: FocusGoal);
    fn clear(&mut self);
    fn advance(&mut self, dt_seconds: f32, camera: EntityId, world: &SceneWorld) -> Option<Quat>;
    fn active_goal(&self) -> Option<FocusGoal>;
    fn active_task_count(&self) -> usize {
        usize::from(self.active_goal().is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RotationTaskId(pub u64);

/// Fixed-duration eased rotation toward the goal computed at focus time.
#[derive(Debug)]
pub struct TweenFocus {
    duration_seconds: f32,
    easing: Easing,
    active: Option<(RotationTaskId, FocusGoal, RotationTween)>,
    next_task_id: u64,
    superseded: u32,
}

impl TweenFocus {
    pub fn new(duration_seconds: f32, easing: Easing) -> Self {
        Self {
            duration_seconds,
            easing,
            active: None,
            next_task_id: 0,
            superseded: 0,
        }
    }

    pub fn active_task(&self) -> Option<RotationTaskId> {
        self.active.as_ref().map(|(id, _, _)| *id)
    }

    pub fn superseded_count(&self) -> u32 {
        self.superseded
    }

    /// Stops the in-flight task where it is and returns that rotation.
    fn cancel_active(&mut self) -> Option<Quat> {
        let (id, _, mut tween) = self.active.take()?;
        let frozen = tween.complete_at_current();
        self.superseded = self.superseded.saturating_add(1);
        debug!(task = id.0, "focus_rotation_superseded");
        Some(frozen)
    }
}

impl FocusMotion for TweenFocus {
    fn begin(&mut self, from: Quat, goal: FocusGoal) {
        // A superseded task hands over from its frozen rotation.
        let from = self.cancel_active().unwrap_or(from);
        let id = RotationTaskId(self.next_task_id);
        self.next_task_id = self.next_task_id.saturating_add(1);
        let tween = RotationTween::new(from, goal.rotation, self.duration_seconds, self.easing);
        self.active = Some((id, goal, tween));
    }

    fn clear(&mut self) {
        self.cancel_active();
    }

    fn advance(&mut self, dt_seconds: f32, _camera: EntityId, _world: &SceneWorld) -> Option<Quat> {
        let (id, _, tween) = self.active.as_mut()?;
        let rotation = tween.advance(dt_seconds);
        if tween.is_finished() {
            debug!(task = id.0, "focus_rotation_finished");
            self.active = None;
        }
        Some(rotation)
    }

    fn active_goal(&self) -> Option<FocusGoal> {
        self.active.as_ref().map(|(_, goal, _)| *goal)
    }
}

/// Per-tick slerp that keeps tracking a moving target until cleared.
#[derive(Debug)]
pub struct FollowFocus {
    rotation_speed: f32,
    goal: Option<FocusGoal>,
}

impl FollowFocus {
    pub fn new(rotation_speed: f32) -> Self {
        Self {
            rotation_speed,
            goal: None,
        }
    }
}

impl FocusMotion for FollowFocus {
    fn begin(&mut self, _from: Quat, goal: FocusGoal) {
        self.goal = Some(goal);
    }

    fn clear(&mut self) {
        self.goal = None;
    }

    fn advance(&mut self, dt_seconds: f32, camera: EntityId, world: &SceneWorld) -> Option<Quat> {
        let goal = self.goal.as_mut()?;
        let (camera_position, camera_rotation) = world.world_pose(camera)?;
        if let Some(target_position) = world.world_position(goal.target) {
            if let Some(rotation) =
                look_rotation(target_position + goal.offset - camera_position, Vec3::Y)
            {
                goal.rotation = rotation;
            }
        }
        let t = (dt_seconds * self.rotation_speed).clamp(0.0, 1.0);
        Some(camera_rotation.slerp(goal.rotation, t).normalize())
    }

    fn active_goal(&self) -> Option<FocusGoal> {
        self.goal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Focused { target: EntityId },
    Cleared { was_focused: bool },
    LookupMiss { was_focused: bool },
}

impl FocusOutcome {
    /// True when this call took away a focus that was active before it.
    pub fn dropped_focus(self) -> bool {
        matches!(
            self,
            Self::Cleared { was_focused: true } | Self::LookupMiss { was_focused: true }
        )
    }
}

#[derive(Debug)]
pub struct CameraFocusDirector {
    camera: EntityId,
    registry: CharacterTargetRegistry,
    motion: Box<dyn FocusMotion>,
    focused_speaker: Option<String>,
}

impl CameraFocusDirector {
    pub fn new(camera: EntityId, registry: CharacterTargetRegistry, config: FocusConfig) -> Self {
        Self::with_motion(camera, registry, config.motion.build())
    }

    pub fn with_motion(
        camera: EntityId,
        registry: CharacterTargetRegistry,
        motion: Box<dyn FocusMotion>,
    ) -> Self {
        Self {
            camera,
            registry,
            motion,
            focused_speaker: None,
        }
    }

    pub fn focused_speaker(&self) -> Option<&str> {
        self.focused_speaker.as_deref()
    }

    pub fn motion(&self) -> &dyn FocusMotion {
        self.motion.as_ref()
    }

    pub fn registry(&self) -> &CharacterTargetRegistry {
        &self.registry
    }

    pub fn focus_on_character(&mut self, speaker: &str, world: &SceneWorld) -> FocusOutcome {
        debug!(speaker = %speaker, "focus_requested");
        if speaker.is_empty() {
            return FocusOutcome::Cleared {
                was_focused: self.clear_focus(),
            };
        }

        let Some(entry) = self.registry.lookup(speaker) else {
            warn!(speaker = %speaker, "focus_lookup_miss");
            return FocusOutcome::LookupMiss {
                was_focused: self.clear_focus(),
            };
        };
        let (target, offset) = (entry.target, entry.offset);

        let (Some(target_position), Some((camera_position, camera_rotation))) =
            (world.world_position(target), world.world_pose(self.camera))
        else {
            warn!(
                speaker = %speaker,
                target = target.0,
                camera = self.camera.0,
                "focus_transform_missing"
            );
            return FocusOutcome::LookupMiss {
                was_focused: self.clear_focus(),
            };
        };

        let rotation = look_rotation(target_position + offset - camera_position, Vec3::Y)
            .unwrap_or(camera_rotation);
        self.motion.begin(
            camera_rotation,
            FocusGoal {
                target,
                offset,
                rotation,
            },
        );
        self.focused_speaker = Some(speaker.to_string());
        debug!(speaker = %speaker, target = target.0, "focus_started");
        FocusOutcome::Focused { target }
    }

    /// Drops any focus; the camera stays wherever it currently points.
    pub fn reset_focus(&mut self) -> bool {
        self.clear_focus()
    }

    pub fn tick(&mut self, fixed_dt_seconds: f32, world: &mut SceneWorld) {
        if let Some(rotation) = self.motion.advance(fixed_dt_seconds, self.camera, world) {
            world.set_world_rotation(self.camera, rotation);
        }
    }

    fn clear_focus(&mut self) -> bool {
        self.motion.clear();
        self.focused_speaker.take().is_some()
    }
}
