use serde::{Deserialize, Serialize};

use crate::app::{EntityId, SceneWorld};

use super::highlight::{HighlightSpec, HighlightStrategy};

pub const DEFAULT_PROMPT: &str = "[E] Interact";

/// What an interactable does when the player triggers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum InteractionEffect {
    DrainConcentration,
    StartDialogue { node: String },
    Note { message: String },
}

#[derive(Debug)]
pub struct Interactable {
    pub entity: EntityId,
    pub prompt: String,
    pub on_interact: Vec<InteractionEffect>,
    highlight: Box<dyn HighlightStrategy>,
}

impl Interactable {
    pub fn new(
        entity: EntityId,
        prompt: impl Into<String>,
        highlight: Box<dyn HighlightStrategy>,
        on_interact: Vec<InteractionEffect>,
    ) -> Self {
        Self {
            entity,
            prompt: prompt.into(),
            on_interact,
            highlight,
        }
    }

    pub fn from_spec(
        world: &SceneWorld,
        entity: EntityId,
        prompt: Option<String>,
        highlight: &HighlightSpec,
        on_interact: Vec<InteractionEffect>,
    ) -> Self {
        Self::new(
            entity,
            prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            highlight.build(world, entity),
            on_interact,
        )
    }

    pub fn highlight(&mut self, world: &mut SceneWorld) {
        self.highlight.enable(world);
    }

    pub fn unhighlight(&mut self, world: &mut SceneWorld) {
        self.highlight.disable(world);
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight.is_highlighted()
    }

    pub fn highlight_strategy(&self) -> &dyn HighlightStrategy {
        self.highlight.as_ref()
    }
}

/// Scene-owned interactables, keyed by the entity that carries them.
#[derive(Debug, Default)]
pub struct InteractableSet {
    interactables: Vec<Interactable>,
}

impl InteractableSet {
    /// Replaces any interactable already attached to the same entity.
    pub fn insert(&mut self, interactable: Interactable) {
        self.interactables
            .retain(|existing| existing.entity != interactable.entity);
        self.interactables.push(interactable);
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<Interactable> {
        let index = self
            .interactables
            .iter()
            .position(|interactable| interactable.entity == entity)?;
        Some(self.interactables.remove(index))
    }

    pub fn get(&self, entity: EntityId) -> Option<&Interactable> {
        self.interactables
            .iter()
            .find(|interactable| interactable.entity == entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut Interactable> {
        self.interactables
            .iter_mut()
            .find(|interactable| interactable.entity == entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.get(entity).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interactable> {
        self.interactables.iter()
    }

    pub fn highlighted_entities(&self) -> Vec<EntityId> {
        self.interactables
            .iter()
            .filter(|interactable| interactable.is_highlighted())
            .map(|interactable| interactable.entity)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.interactables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactables.is_empty()
    }

    pub fn clear(&mut self) {
        self.interactables.clear();
    }
}
