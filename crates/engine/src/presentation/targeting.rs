use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::{EntityId, SceneWorld};
use crate::physics::{Ray, RayCaster};

use super::interactable::{InteractableSet, InteractionEffect};
use super::ui::PromptPanel;

pub const DEFAULT_INTERACTION_DISTANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    pub interaction_distance: f32,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            interaction_distance: DEFAULT_INTERACTION_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetTransition {
    /// No change since last tick; carries the (unchanged) target if any.
    Idle(Option<EntityId>),
    Entered(EntityId),
    Exited(EntityId),
    Switched { from: EntityId, to: EntityId },
}

pub fn classify_transition(previous: Option<EntityId>, next: Option<EntityId>) -> TargetTransition {
    match (previous, next) {
        (None, Some(to)) => TargetTransition::Entered(to),
        (Some(from), None) => TargetTransition::Exited(from),
        (Some(from), Some(to)) if from != to => TargetTransition::Switched { from, to },
        (_, unchanged) => TargetTransition::Idle(unchanged),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRequest {
    pub target: EntityId,
    pub effects: Vec<InteractionEffect>,
}

/// Tracks what the viewpoint is facing, one ray per tick.
#[derive(Debug)]
pub struct TargetAcquisition {
    viewpoint: EntityId,
    max_distance: f32,
    current: Option<EntityId>,
    viewpoint_missing_warned: bool,
}

impl TargetAcquisition {
    pub fn new(viewpoint: EntityId, config: TargetingConfig) -> Self {
        Self {
            viewpoint,
            max_distance: config.interaction_distance,
            current: None,
            viewpoint_missing_warned: false,
        }
    }

    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn tick(
        &mut self,
        world: &mut SceneWorld,
        ray_caster: &dyn RayCaster,
        interactables: &mut InteractableSet,
        prompt: &mut dyn PromptPanel,
    ) -> TargetTransition {
        let next = self.resolve_target(world, ray_caster, interactables);
        let transition = classify_transition(self.current, next);

        match transition {
            TargetTransition::Entered(to) => {
                if let Some(interactable) = interactables.get_mut(to) {
                    prompt.show(&interactable.prompt);
                    interactable.highlight(world);
                }
                debug!(target = to.0, "target_entered");
            }
            TargetTransition::Exited(from) => {
                prompt.hide();
                if let Some(interactable) = interactables.get_mut(from) {
                    interactable.unhighlight(world);
                }
                debug!(target = from.0, "target_exited");
            }
            TargetTransition::Switched { from, to } => {
                if let Some(previous) = interactables.get_mut(from) {
                    previous.unhighlight(world);
                }
                if let Some(interactable) = interactables.get_mut(to) {
                    prompt.show(&interactable.prompt);
                    interactable.highlight(world);
                }
                debug!(from = from.0, to = to.0, "target_switched");
            }
            TargetTransition::Idle(_) => {}
        }

        self.current = next;
        transition
    }

    /// Effects of the current target, if the press lands on one.
    pub fn on_interact(
        &self,
        pressed: bool,
        interactables: &InteractableSet,
    ) -> Option<InteractionRequest> {
        if !pressed {
            return None;
        }
        let target = self.current?;
        let interactable = interactables.get(target)?;
        Some(InteractionRequest {
            target,
            effects: interactable.on_interact.clone(),
        })
    }

    /// Drops the current target, hiding the prompt and its highlight.
    pub fn release(
        &mut self,
        world: &mut SceneWorld,
        interactables: &mut InteractableSet,
        prompt: &mut dyn PromptPanel,
    ) {
        if let Some(previous) = self.current.take() {
            prompt.hide();
            if let Some(interactable) = interactables.get_mut(previous) {
                interactable.unhighlight(world);
            }
        }
    }

    fn resolve_target(
        &mut self,
        world: &SceneWorld,
        ray_caster: &dyn RayCaster,
        interactables: &InteractableSet,
    ) -> Option<EntityId> {
        let (Some(origin), Some(direction)) = (
            world.world_position(self.viewpoint),
            world.forward(self.viewpoint),
        ) else {
            if !self.viewpoint_missing_warned {
                warn!(viewpoint = self.viewpoint.0, "targeting_viewpoint_missing");
                self.viewpoint_missing_warned = true;
            }
            return None;
        };
        self.viewpoint_missing_warned = false;

        let hit = ray_caster.cast_ray(
            world,
            Ray { origin, direction },
            self.max_distance,
        )?;
        interactables.contains(hit.entity).then_some(hit.entity)
    }
}
