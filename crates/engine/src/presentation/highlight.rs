use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::app::{EntityId, LayerId, MaterialId, SceneWorld};

pub const DEFAULT_HIGHLIGHT_LAYER: &str = "Outlined Object";
pub const DEFAULT_EMISSIVE_INTENSITY: f32 = 1.5;
pub const DEFAULT_EMISSIVE_GAMMA: f32 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    LayerSwap,
    OutlineMaterial,
    Emissive,
}

/// Visual emphasis for one entity. `enable` and `disable` are idempotent and
/// never fail: missing capabilities turn them into no-ops.
pub trait HighlightStrategy: fmt::Debug {
    fn kind(&self) -> HighlightKind;
    fn is_highlighted(&self) -> bool;
    fn enable(&mut self, world: &mut SceneWorld);
    fn disable(&mut self, world: &mut SceneWorld);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HighlightSpec {
    LayerSwap {
        #[serde(default = "default_highlight_layer")]
        layer: String,
    },
    OutlineMaterial {
        material: String,
    },
    Emissive {
        #[serde(default = "default_emissive_color")]
        color: Vec3,
        #[serde(default = "default_emissive_intensity")]
        intensity: f32,
        #[serde(default = "default_emissive_gamma")]
        gamma: f32,
    },
}

impl Default for HighlightSpec {
    fn default() -> Self {
        Self::LayerSwap {
            layer: default_highlight_layer(),
        }
    }
}

fn default_highlight_layer() -> String {
    DEFAULT_HIGHLIGHT_LAYER.to_string()
}

fn default_emissive_color() -> Vec3 {
    Vec3::new(1.0, 0.85, 0.4)
}

fn default_emissive_intensity() -> f32 {
    DEFAULT_EMISSIVE_INTENSITY
}

fn default_emissive_gamma() -> f32 {
    DEFAULT_EMISSIVE_GAMMA
}

impl HighlightSpec {
    /// Captures restoration data from the current state of `entity`.
    pub fn build(&self, world: &SceneWorld, entity: EntityId) -> Box<dyn HighlightStrategy> {
        match self {
            Self::LayerSwap { layer } => Box::new(LayerSwapHighlight::new(world, entity, layer)),
            Self::OutlineMaterial { material } => {
                let outline = world.find_material(material);
                if outline.is_none() {
                    error!(
                        entity = entity.0,
                        material = %material,
                        "highlight_outline_material_missing"
                    );
                }
                Box::new(OutlineMaterialHighlight::new(world, entity, outline))
            }
            Self::Emissive {
                color,
                intensity,
                gamma,
            } => Box::new(EmissiveHighlight::new(
                world, entity, *color, *intensity, *gamma,
            )),
        }
    }
}

/// Moves the entity and its whole subtree onto a highlight layer.
#[derive(Debug, Clone)]
pub struct LayerSwapHighlight {
    root: EntityId,
    highlight_layer: Option<LayerId>,
    root_layer: LayerId,
    original_layers: Vec<(EntityId, LayerId)>,
    highlighted: bool,
}

impl LayerSwapHighlight {
    pub fn new(world: &SceneWorld, root: EntityId, highlight_layer_name: &str) -> Self {
        let highlight_layer = world.layers().name_to_layer(highlight_layer_name);
        if highlight_layer.is_none() {
            error!(
                entity = root.0,
                layer = %highlight_layer_name,
                "highlight_layer_missing"
            );
        }
        let mut original_layers = Vec::new();
        world.walk_subtree(root, |entity| original_layers.push((entity.id, entity.layer)));
        let root_layer = world.layer(root).unwrap_or_default();

        Self {
            root,
            highlight_layer,
            root_layer,
            original_layers,
            highlighted: false,
        }
    }

    fn original_layer(&self, id: EntityId) -> LayerId {
        self.original_layers
            .iter()
            .find(|(entity, _)| *entity == id)
            .map(|(_, layer)| *layer)
            .unwrap_or(self.root_layer)
    }
}

impl HighlightStrategy for LayerSwapHighlight {
    fn kind(&self) -> HighlightKind {
        HighlightKind::LayerSwap
    }

    fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    fn enable(&mut self, world: &mut SceneWorld) {
        let Some(layer) = self.highlight_layer else {
            return;
        };
        if self.highlighted {
            return;
        }
        self.highlighted = true;
        for id in world.subtree_ids(self.root) {
            world.set_layer(id, layer);
        }
    }

    fn disable(&mut self, world: &mut SceneWorld) {
        if !self.highlighted {
            return;
        }
        self.highlighted = false;
        for id in world.subtree_ids(self.root) {
            world.set_layer(id, self.original_layer(id));
        }
    }
}

/// Appends one shared outline material to a copy of the original list.
#[derive(Debug, Clone)]
pub struct OutlineMaterialHighlight {
    entity: EntityId,
    outline: Option<MaterialId>,
    original_materials: Option<Vec<MaterialId>>,
    highlighted: bool,
}

impl OutlineMaterialHighlight {
    pub fn new(world: &SceneWorld, entity: EntityId, outline: Option<MaterialId>) -> Self {
        let original_materials = world.materials_of(entity).map(<[MaterialId]>::to_vec);
        if original_materials.is_none() {
            warn!(entity = entity.0, "highlight_renderer_missing");
        }
        Self {
            entity,
            outline,
            original_materials,
            highlighted: false,
        }
    }
}

impl HighlightStrategy for OutlineMaterialHighlight {
    fn kind(&self) -> HighlightKind {
        HighlightKind::OutlineMaterial
    }

    fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    fn enable(&mut self, world: &mut SceneWorld) {
        let (Some(outline), Some(original)) = (self.outline, self.original_materials.as_ref())
        else {
            return;
        };
        if self.highlighted {
            return;
        }
        let mut highlighted = original.clone();
        highlighted.push(outline);
        if world.set_materials(self.entity, highlighted) {
            self.highlighted = true;
        }
    }

    fn disable(&mut self, world: &mut SceneWorld) {
        if !self.highlighted {
            return;
        }
        self.highlighted = false;
        if let Some(original) = &self.original_materials {
            world.set_materials(self.entity, original.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CapturedEmission {
    material: MaterialId,
    color: Vec3,
    enabled: bool,
}

/// Recolours every emissive-capable surface of the entity's renderer.
#[derive(Debug, Clone)]
pub struct EmissiveHighlight {
    highlight_color: Vec3,
    captured: Vec<CapturedEmission>,
    highlighted: bool,
}

impl EmissiveHighlight {
    pub fn new(world: &SceneWorld, entity: EntityId, color: Vec3, intensity: f32, gamma: f32) -> Self {
        let captured = match world.materials_of(entity) {
            Some(materials) => materials
                .iter()
                .filter_map(|material| {
                    world.emission(*material).map(|slot| CapturedEmission {
                        material: *material,
                        color: slot.color,
                        enabled: slot.enabled,
                    })
                })
                .collect::<Vec<_>>(),
            None => {
                warn!(entity = entity.0, "highlight_renderer_missing");
                Vec::new()
            }
        };
        if captured.is_empty() {
            warn!(entity = entity.0, "highlight_no_emissive_surfaces");
        }

        Self {
            highlight_color: color * linear_intensity(intensity, gamma),
            captured,
            highlighted: false,
        }
    }

    pub fn highlight_color(&self) -> Vec3 {
        self.highlight_color
    }
}

/// Converts a display-space intensity into a linear multiplier.
pub fn linear_intensity(intensity: f32, gamma: f32) -> f32 {
    if !intensity.is_finite() || !gamma.is_finite() || intensity <= 0.0 {
        return 0.0;
    }
    intensity.powf(gamma)
}

impl HighlightStrategy for EmissiveHighlight {
    fn kind(&self) -> HighlightKind {
        HighlightKind::Emissive
    }

    fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    fn enable(&mut self, world: &mut SceneWorld) {
        if self.highlighted {
            return;
        }
        self.highlighted = true;
        for captured in &self.captured {
            world.set_emission_color(captured.material, self.highlight_color);
            world.set_emission_enabled(captured.material, true);
        }
    }

    fn disable(&mut self, world: &mut SceneWorld) {
        if !self.highlighted {
            return;
        }
        self.highlighted = false;
        for captured in &self.captured {
            world.set_emission_color(captured.material, captured.color);
            // A zero emission left enabled still costs a shader keyword.
            let enabled = captured.enabled && captured.color != Vec3::ZERO;
            world.set_emission_enabled(captured.material, enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EmissionSlot, Material, Transform, DEFAULT_LAYER};

    fn spawn(world: &mut SceneWorld, name: &str, parent: Option<EntityId>) -> EntityId {
        world
            .spawn(name, Transform::default(), parent)
            .expect("spawn")
    }

    fn material(world: &mut SceneWorld, name: &str, emission: Option<EmissionSlot>) -> MaterialId {
        world.add_material(Material {
            name: name.to_string(),
            emission,
        })
    }

    #[test]
    fn layer_swap_covers_nested_children_and_restores_each_original() {
        let mut world = SceneWorld::default();
        let outlined = world.layers_mut().register(DEFAULT_HIGHLIGHT_LAYER).unwrap();
        let props = world.layers_mut().register("Props").unwrap();
        let desk = spawn(&mut world, "desk", None);
        let drawer = spawn(&mut world, "drawer", Some(desk));
        let handle = spawn(&mut world, "handle", Some(drawer));
        world.set_layer(handle, props);

        let mut highlight = LayerSwapHighlight::new(&world, desk, DEFAULT_HIGHLIGHT_LAYER);
        highlight.enable(&mut world);
        for id in [desk, drawer, handle] {
            assert_eq!(world.layer(id), Some(outlined));
        }

        highlight.disable(&mut world);
        assert_eq!(world.layer(desk), Some(DEFAULT_LAYER));
        assert_eq!(world.layer(drawer), Some(DEFAULT_LAYER));
        assert_eq!(world.layer(handle), Some(props));
    }

    #[test]
    fn layer_swap_is_idempotent() {
        let mut world = SceneWorld::default();
        world.layers_mut().register(DEFAULT_HIGHLIGHT_LAYER).unwrap();
        let desk = spawn(&mut world, "desk", None);
        let mut highlight = LayerSwapHighlight::new(&world, desk, DEFAULT_HIGHLIGHT_LAYER);

        highlight.disable(&mut world);
        assert_eq!(world.layer(desk), Some(DEFAULT_LAYER));
        highlight.enable(&mut world);
        highlight.enable(&mut world);
        assert!(highlight.is_highlighted());
        highlight.disable(&mut world);
        highlight.disable(&mut world);
        assert!(!highlight.is_highlighted());
        assert_eq!(world.layer(desk), Some(DEFAULT_LAYER));
    }

    #[test]
    fn layer_swap_without_registered_layer_is_a_no_op() {
        let mut world = SceneWorld::default();
        let desk = spawn(&mut world, "desk", None);
        let mut highlight = LayerSwapHighlight::new(&world, desk, "Missing Layer");
        highlight.enable(&mut world);
        assert!(!highlight.is_highlighted());
        assert_eq!(world.layer(desk), Some(DEFAULT_LAYER));
    }

    #[test]
    fn layer_swap_restores_late_children_to_root_layer() {
        let mut world = SceneWorld::default();
        world.layers_mut().register(DEFAULT_HIGHLIGHT_LAYER).unwrap();
        let desk = spawn(&mut world, "desk", None);
        let mut highlight = LayerSwapHighlight::new(&world, desk, DEFAULT_HIGHLIGHT_LAYER);
        let late = spawn(&mut world, "late", Some(desk));

        highlight.enable(&mut world);
        highlight.disable(&mut world);
        assert_eq!(world.layer(late), Some(DEFAULT_LAYER));
    }

    #[test]
    fn outline_appends_to_a_copy_and_restores_exact_list() {
        let mut world = SceneWorld::default();
        let wood = material(&mut world, "wood", None);
        let brass = material(&mut world, "brass", None);
        let outline = material(&mut world, "outline", None);
        let desk = spawn(&mut world, "desk", None);
        world.attach_renderer(desk, vec![wood, brass]).unwrap();

        let mut highlight = OutlineMaterialHighlight::new(&world, desk, Some(outline));
        highlight.enable(&mut world);
        highlight.enable(&mut world);
        assert_eq!(world.materials_of(desk), Some(&[wood, brass, outline][..]));

        highlight.disable(&mut world);
        assert_eq!(world.materials_of(desk), Some(&[wood, brass][..]));

        highlight.enable(&mut world);
        assert_eq!(world.materials_of(desk), Some(&[wood, brass, outline][..]));
    }

    #[test]
    fn outline_without_renderer_never_highlights() {
        let mut world = SceneWorld::default();
        let outline = material(&mut world, "outline", None);
        let ghost = spawn(&mut world, "ghost", None);
        let mut highlight = OutlineMaterialHighlight::new(&world, ghost, Some(outline));
        highlight.enable(&mut world);
        assert!(!highlight.is_highlighted());
        highlight.disable(&mut world);
        assert!(world.materials_of(ghost).is_none());
    }

    #[test]
    fn emissive_recolors_capable_surfaces_and_skips_others() {
        let mut world = SceneWorld::default();
        let lit = material(
            &mut world,
            "lit",
            Some(EmissionSlot {
                color: Vec3::new(0.2, 0.0, 0.0),
                enabled: true,
            }),
        );
        let dark = material(
            &mut world,
            "dark",
            Some(EmissionSlot {
                color: Vec3::ZERO,
                enabled: false,
            }),
        );
        let matte = material(&mut world, "matte", None);
        let lamp = spawn(&mut world, "lamp", None);
        world.attach_renderer(lamp, vec![lit, dark, matte]).unwrap();

        let mut highlight = EmissiveHighlight::new(&world, lamp, Vec3::ONE, 2.0, 1.0);
        highlight.enable(&mut world);
        for id in [lit, dark] {
            let slot = world.emission(id).expect("emissive");
            assert_eq!(slot.color, Vec3::splat(2.0));
            assert!(slot.enabled);
        }
        assert!(world.emission(matte).is_none());

        highlight.disable(&mut world);
        assert_eq!(
            world.emission(lit),
            Some(EmissionSlot {
                color: Vec3::new(0.2, 0.0, 0.0),
                enabled: true
            })
        );
        assert_eq!(
            world.emission(dark),
            Some(EmissionSlot {
                color: Vec3::ZERO,
                enabled: false
            })
        );
    }

    #[test]
    fn emissive_disables_zero_originals_even_if_they_were_enabled() {
        let mut world = SceneWorld::default();
        let zero_on = material(
            &mut world,
            "zero_on",
            Some(EmissionSlot {
                color: Vec3::ZERO,
                enabled: true,
            }),
        );
        let lamp = spawn(&mut world, "lamp", None);
        world.attach_renderer(lamp, vec![zero_on]).unwrap();
        let mut highlight = EmissiveHighlight::new(&world, lamp, Vec3::ONE, 1.0, 2.2);

        highlight.enable(&mut world);
        highlight.disable(&mut world);
        assert!(!world.emission(zero_on).expect("slot").enabled);
    }

    #[test]
    fn linear_intensity_applies_gamma() {
        assert!((linear_intensity(2.0, 2.0) - 4.0).abs() < 1e-6);
        assert_eq!(linear_intensity(-1.0, 2.2), 0.0);
        assert_eq!(linear_intensity(f32::NAN, 2.2), 0.0);
    }

    #[test]
    fn highlight_config_builds_requested_strategy() {
        let mut world = SceneWorld::default();
        world.layers_mut().register(DEFAULT_HIGHLIGHT_LAYER).unwrap();
        let desk = spawn(&mut world, "desk", None);

        let spec: HighlightSpec = serde_json::from_str(r#"{"kind":"layer_swap"}"#).unwrap();
        assert_eq!(spec, HighlightSpec::default());
        assert_eq!(spec.build(&world, desk).kind(), HighlightKind::LayerSwap);

        let spec: HighlightSpec =
            serde_json::from_str(r#"{"kind":"emissive","intensity":1.0}"#).unwrap();
        assert_eq!(spec.build(&world, desk).kind(), HighlightKind::Emissive);

        let spec: HighlightSpec =
            serde_json::from_str(r#"{"kind":"outline_material","material":"nope"}"#).unwrap();
        let mut strategy = spec.build(&world, desk);
        strategy.enable(&mut world);
        assert!(!strategy.is_highlighted());
    }
}
