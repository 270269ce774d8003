use glam::{Quat, Vec3};
use thiserror::Error;

use super::input::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerId(pub u8);

pub const DEFAULT_LAYER: LayerId = LayerId(0);
const MAX_LAYERS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
    #[error("unknown parent {0:?}")]
    UnknownParent(EntityId),
    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialId),
    #[error("layer table is full ({max} layers); cannot register '{name}'")]
    LayerTableFull { name: String, max: usize },
}

/// Name table for render layers, resolved by name the way layer masks are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerTable {
    names: Vec<String>,
}

impl Default for LayerTable {
    fn default() -> Self {
        Self {
            names: vec!["Default".to_string()],
        }
    }
}

impl LayerTable {
    pub fn register(&mut self, name: &str) -> Result<LayerId, SceneError> {
        if let Some(existing) = self.name_to_layer(name) {
            return Ok(existing);
        }
        if self.names.len() >= MAX_LAYERS {
            return Err(SceneError::LayerTableFull {
                name: name.to_string(),
                max: MAX_LAYERS,
            });
        }
        self.names.push(name.to_string());
        Ok(LayerId((self.names.len() - 1) as u8))
    }

    pub fn name_to_layer(&self, name: &str) -> Option<LayerId> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| LayerId(index as u8))
    }

    pub fn name(&self, layer: LayerId) -> Option<&str> {
        self.names.get(layer.0 as usize).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionSlot {
    pub color: Vec3,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// `None` when the surface has no emissive property at all.
    pub emission: Option<EmissionSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshRenderer {
    pub materials: Vec<MaterialId>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub transform: Transform,
    pub layer: LayerId,
    pub renderer: Option<MeshRenderer>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

impl Entity {
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    layers: LayerTable,
    materials: Vec<Material>,
}

impl SceneWorld {
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        parent: Option<EntityId>,
    ) -> Result<EntityId, SceneError> {
        if let Some(parent_id) = parent {
            if self.find_entity(parent_id).is_none() {
                return Err(SceneError::UnknownParent(parent_id));
            }
        }
        let id = self.allocator.allocate();
        let layer = parent
            .and_then(|parent_id| self.layer(parent_id))
            .unwrap_or(DEFAULT_LAYER);
        self.entities.push(Entity {
            id,
            name: name.into(),
            transform,
            layer,
            renderer: None,
            parent,
            children: Vec::new(),
        });
        if let Some(parent_id) = parent {
            if let Some(parent_entity) = self.find_entity_mut(parent_id) {
                parent_entity.children.push(id);
            }
        }
        Ok(id)
    }

    /// Removes the entity and its whole subtree. Returns false for unknown ids.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(parent) = self.find_entity(id).map(Entity::parent) else {
            return false;
        };
        let doomed = self.subtree_ids(id);
        if let Some(parent_entity) = parent.and_then(|parent_id| self.find_entity_mut(parent_id)) {
            parent_entity.children.retain(|child| *child != id);
        }
        self.entities.retain(|entity| !doomed.contains(&entity.id));
        true
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.materials.clear();
        self.layers = LayerTable::default();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|entity| entity.name == name)
            .map(|entity| entity.id)
    }

    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.find_entity(id)
            .map(Entity::children)
            .unwrap_or_default()
    }

    /// Pre-order walk over `root` and every descendant.
    pub fn walk_subtree(&self, root: EntityId, mut visit: impl FnMut(&Entity)) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(entity) = self.find_entity(id) else {
                continue;
            };
            visit(entity);
            stack.extend(entity.children.iter().rev().copied());
        }
    }

    pub fn subtree_ids(&self, root: EntityId) -> Vec<EntityId> {
        let mut ids = Vec::new();
        self.walk_subtree(root, |entity| ids.push(entity.id));
        ids
    }

    pub fn local_transform(&self, id: EntityId) -> Option<Transform> {
        self.find_entity(id).map(|entity| entity.transform)
    }

    pub fn set_local_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.transform.position = position;
                true
            }
            None => false,
        }
    }

    pub fn local_rotation(&self, id: EntityId) -> Option<Quat> {
        self.find_entity(id).map(|entity| entity.transform.rotation)
    }

    pub fn set_local_rotation(&mut self, id: EntityId, rotation: Quat) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.transform.rotation = rotation.normalize();
                true
            }
            None => false,
        }
    }

    /// World-space position and rotation composed from the root down.
    pub fn world_pose(&self, id: EntityId) -> Option<(Vec3, Quat)> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let entity = self.find_entity(current)?;
            chain.push(entity.transform);
            cursor = entity.parent;
        }

        let mut position = Vec3::ZERO;
        let mut rotation = Quat::IDENTITY;
        for local in chain.iter().rev() {
            position += rotation * local.position;
            rotation = (rotation * local.rotation).normalize();
        }
        Some((position, rotation))
    }

    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        self.world_pose(id).map(|(position, _)| position)
    }

    pub fn world_rotation(&self, id: EntityId) -> Option<Quat> {
        self.world_pose(id).map(|(_, rotation)| rotation)
    }

    pub fn forward(&self, id: EntityId) -> Option<Vec3> {
        self.world_rotation(id).map(|rotation| rotation * Vec3::NEG_Z)
    }

    pub fn set_world_rotation(&mut self, id: EntityId, rotation: Quat) -> bool {
        let Some(parent) = self.find_entity(id).map(Entity::parent) else {
            return false;
        };
        let parent_rotation = parent
            .and_then(|parent_id| self.world_rotation(parent_id))
            .unwrap_or(Quat::IDENTITY);
        self.set_local_rotation(id, parent_rotation.inverse() * rotation)
    }

    pub fn layers(&self) -> &LayerTable {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerTable {
        &mut self.layers
    }

    pub fn layer(&self, id: EntityId) -> Option<LayerId> {
        self.find_entity(id).map(|entity| entity.layer)
    }

    pub fn set_layer(&mut self, id: EntityId, layer: LayerId) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.layer = layer;
                true
            }
            None => false,
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId((self.materials.len() - 1) as u32)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    pub fn find_material(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|material| material.name == name)
            .map(|index| MaterialId(index as u32))
    }

    pub fn attach_renderer(
        &mut self,
        id: EntityId,
        materials: Vec<MaterialId>,
    ) -> Result<(), SceneError> {
        if let Some(missing) = materials
            .iter()
            .copied()
            .find(|material| self.material(*material).is_none())
        {
            return Err(SceneError::UnknownMaterial(missing));
        }
        let entity = self
            .find_entity_mut(id)
            .ok_or(SceneError::UnknownEntity(id))?;
        entity.renderer = Some(MeshRenderer { materials });
        Ok(())
    }

    /// Material list of the entity's renderer, `None` when it has no renderer.
    pub fn materials_of(&self, id: EntityId) -> Option<&[MaterialId]> {
        self.find_entity(id)
            .and_then(|entity| entity.renderer.as_ref())
            .map(|renderer| renderer.materials.as_slice())
    }

    pub fn set_materials(&mut self, id: EntityId, materials: Vec<MaterialId>) -> bool {
        match self
            .find_entity_mut(id)
            .and_then(|entity| entity.renderer.as_mut())
        {
            Some(renderer) => {
                renderer.materials = materials;
                true
            }
            None => false,
        }
    }

    /// `None` when the material is unknown or has no emissive property.
    pub fn emission(&self, id: MaterialId) -> Option<EmissionSlot> {
        self.material(id).and_then(|material| material.emission)
    }

    pub fn set_emission_color(&mut self, id: MaterialId, color: Vec3) -> bool {
        match self.emission_slot_mut(id) {
            Some(slot) => {
                slot.color = color;
                true
            }
            None => false,
        }
    }

    pub fn set_emission_enabled(&mut self, id: MaterialId, enabled: bool) -> bool {
        match self.emission_slot_mut(id) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    fn emission_slot_mut(&mut self, id: MaterialId) -> Option<&mut EmissionSlot> {
        self.materials
            .get_mut(id.0 as usize)
            .and_then(|material| material.emission.as_mut())
    }
}
