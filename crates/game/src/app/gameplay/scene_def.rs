#[derive(Debug)]
pub(crate) enum SceneDefError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { origin: String, path: String, message: String },
    Invalid(String),
    Build(String),
}

impl fmt::Display for SceneDefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "read scene '{}': {source}", path.display())
            }
            Self::Parse {
                origin,
                path,
                message,
            } => {
                if path.is_empty() || path == "." {
                    write!(f, "parse scene {origin}: {message}")
                } else {
                    write!(f, "parse scene {origin} at {path}: {message}")
                }
            }
            Self::Invalid(reason) => write!(f, "invalid scene: {reason}"),
            Self::Build(reason) => write!(f, "build scene: {reason}"),
        }
    }
}

impl std::error::Error for SceneDefError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

type SceneDefResult<T> = Result<T, SceneDefError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SceneSource {
    Embedded,
    File(PathBuf),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SceneDef {
    name: String,
    #[serde(default)]
    config: GameConfig,
    #[serde(default)]
    layers: Vec<String>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
    player: PlayerDef,
    #[serde(default)]
    entities: Vec<EntityDef>,
    #[serde(default)]
    characters: Vec<CharacterDef>,
    #[serde(default)]
    dialogue: Vec<DialogueNodeDef>,
    /// Concentration managers placed in the scene; only the first is kept.
    #[serde(default)]
    placed_concentration: Vec<ConcentrationConfig>,
    #[serde(default)]
    input_script: Vec<ScriptStepDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialDef {
    name: String,
    #[serde(default)]
    emission: Option<EmissionDef>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmissionDef {
    color: Vec3,
    #[serde(default)]
    enabled: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerDef {
    position: Vec3,
    #[serde(default = "default_eye_height")]
    eye_height: f32,
    #[serde(default)]
    yaw_degrees: f32,
}

fn default_eye_height() -> f32 {
    DEFAULT_EYE_HEIGHT
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityDef {
    name: String,
    position: Vec3,
    #[serde(default)]
    yaw_degrees: f32,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    collider: Option<ColliderDef>,
    #[serde(default)]
    interactable: Option<InteractableDef>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
enum ColliderDef {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl ColliderDef {
    fn to_collider(self) -> Collider {
        match self {
            Self::Sphere { radius } => Collider::Sphere { radius },
            Self::Box { half_extents } => Collider::Box { half_extents },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct InteractableDef {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    highlight: HighlightSpec,
    #[serde(default)]
    on_interact: Vec<InteractionEffect>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct CharacterDef {
    speaker: String,
    entity: String,
    #[serde(default)]
    offset: Vec3,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DialogueNodeDef {
    name: String,
    #[serde(default = "default_hold_ticks")]
    hold_ticks: u32,
    steps: Vec<DialogueStepDef>,
}

fn default_hold_ticks() -> u32 {
    DEFAULT_DIALOGUE_HOLD_TICKS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum DialogueStepDef {
    Line { speaker: String, text: String },
    Options { choices: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptStepDef {
    tick: u64,
    #[serde(default)]
    look: Option<Vec2>,
    #[serde(default)]
    interact: Option<bool>,
    #[serde(default)]
    quit: bool,
}

/// Everything the scene builder produced besides the world itself.
#[derive(Debug)]
pub(crate) struct BuiltScene {
    rig: SessionRig,
    colliders: ColliderSet,
}

pub(crate) fn load_scene_def(source: &SceneSource) -> SceneDefResult<SceneDef> {
    match source {
        SceneSource::Embedded => parse_scene_def(DEFAULT_SCENE_JSON, "<embedded>"),
        SceneSource::File(path) => load_scene_def_file(path),
    }
}

fn load_scene_def_file(path: &Path) -> SceneDefResult<SceneDef> {
    let raw = fs::read_to_string(path).map_err(|source| SceneDefError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scene_def(&raw, &format!("'{}'", path.display()))
}

fn parse_scene_def(raw: &str, origin: &str) -> SceneDefResult<SceneDef> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let def: SceneDef = match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(def) => def,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            return Err(SceneDefError::Parse {
                origin: origin.to_string(),
                path,
                message: source.to_string(),
            });
        }
    };
    def.validate()?;
    Ok(def)
}

impl SceneDef {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn config(&self) -> GameConfig {
        self.config
    }

    fn validate(&self) -> SceneDefResult<()> {
        self.config
            .validate()
            .map_err(|error| SceneDefError::Invalid(format!("config: {error}")))?;
        for (index, placed) in self.placed_concentration.iter().enumerate() {
            placed.validate().map_err(|error| {
                SceneDefError::Invalid(format!("placed_concentration[{index}]: {error}"))
            })?;
        }

        let material_names: HashSet<&str> = self.materials.iter().map(|m| m.name.as_str()).collect();
        let node_names: HashSet<&str> = self.dialogue.iter().map(|n| n.name.as_str()).collect();
        let mut entity_names: HashSet<&str> = HashSet::new();

        for entity in &self.entities {
            if let Some(parent) = &entity.parent {
                if !entity_names.contains(parent.as_str()) {
                    return Err(SceneDefError::Invalid(format!(
                        "entity '{}' names parent '{parent}' which is not declared before it",
                        entity.name
                    )));
                }
            }
            if !entity_names.insert(entity.name.as_str()) {
                return Err(SceneDefError::Invalid(format!(
                    "duplicate entity name '{}'",
                    entity.name
                )));
            }
            if let Some(missing) = entity
                .materials
                .iter()
                .find(|name| !material_names.contains(name.as_str()))
            {
                return Err(SceneDefError::Invalid(format!(
                    "entity '{}' uses unknown material '{missing}'",
                    entity.name
                )));
            }
            let effects = entity
                .interactable
                .iter()
                .flat_map(|interactable| interactable.on_interact.iter());
            for effect in effects {
                if let InteractionEffect::StartDialogue { node } = effect {
                    if !node_names.contains(node.as_str()) {
                        return Err(SceneDefError::Invalid(format!(
                            "entity '{}' starts unknown dialogue node '{node}'",
                            entity.name
                        )));
                    }
                }
            }
        }

        if let Some(character) = self
            .characters
            .iter()
            .find(|character| !entity_names.contains(character.entity.as_str()))
        {
            return Err(SceneDefError::Invalid(format!(
                "character '{}' points at unknown entity '{}'",
                character.speaker, character.entity
            )));
        }

        let mut seen_nodes = HashSet::new();
        for node in &self.dialogue {
            if !seen_nodes.insert(node.name.as_str()) {
                return Err(SceneDefError::Invalid(format!(
                    "duplicate dialogue node '{}'",
                    node.name
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn build(&self, world: &mut SceneWorld) -> SceneDefResult<BuiltScene> {
        let build_error = |error: SceneError| SceneDefError::Build(error.to_string());

        for layer in &self.layers {
            world.layers_mut().register(layer).map_err(build_error)?;
        }
        for material in &self.materials {
            world.add_material(Material {
                name: material.name.clone(),
                emission: material.emission.map(|emission| EmissionSlot {
                    color: emission.color,
                    enabled: emission.enabled,
                }),
            });
        }

        let body = world
            .spawn(
                "player",
                Transform {
                    position: self.player.position,
                    rotation: yaw_rotation(self.player.yaw_degrees),
                },
                None,
            )
            .map_err(build_error)?;
        let viewpoint = world
            .spawn(
                "player_camera",
                Transform::from_position(Vec3::new(0.0, self.player.eye_height, 0.0)),
                Some(body),
            )
            .map_err(build_error)?;

        let mut ids: HashMap<&str, EntityId> = HashMap::new();
        for entity in &self.entities {
            let parent = entity
                .parent
                .as_deref()
                .and_then(|name| ids.get(name).copied());
            let id = world
                .spawn(
                    &entity.name,
                    Transform {
                        position: entity.position,
                        rotation: yaw_rotation(entity.yaw_degrees),
                    },
                    parent,
                )
                .map_err(build_error)?;
            if let Some(layer_name) = &entity.layer {
                match world.layers().name_to_layer(layer_name) {
                    Some(layer) => {
                        world.set_layer(id, layer);
                    }
                    None => warn!(entity = %entity.name, layer = %layer_name, "scene_layer_unknown"),
                }
            }
            if !entity.materials.is_empty() {
                let materials = entity
                    .materials
                    .iter()
                    .filter_map(|name| world.find_material(name))
                    .collect();
                world.attach_renderer(id, materials).map_err(build_error)?;
            }
            ids.insert(entity.name.as_str(), id);
        }

        // Interactables capture highlight state, so they are built once the
        // whole hierarchy exists.
        let mut colliders = ColliderSet::default();
        let mut interactables = InteractableSet::default();
        for entity in &self.entities {
            let Some(&id) = ids.get(entity.name.as_str()) else {
                continue;
            };
            if let Some(collider) = entity.collider {
                colliders.insert(id, collider.to_collider());
            }
            if let Some(def) = &entity.interactable {
                interactables.insert(Interactable::from_spec(
                    world,
                    id,
                    def.prompt.clone(),
                    &def.highlight,
                    def.on_interact.clone(),
                ));
            }
        }

        let characters = self
            .characters
            .iter()
            .filter_map(|character| {
                ids.get(character.entity.as_str()).map(|&target| CharacterTarget {
                    speaker: character.speaker.clone(),
                    target,
                    offset: character.offset,
                })
            })
            .collect();

        info!(
            scene = %self.name,
            entities = world.entity_count(),
            interactables = interactables.len(),
            colliders = colliders.len(),
            "scene_built"
        );
        Ok(BuiltScene {
            rig: SessionRig {
                body,
                viewpoint,
                interactables,
                characters: CharacterTargetRegistry::new(characters),
            },
            colliders,
        })
    }

    pub(crate) fn dialogue_runner(&self) -> ScriptedDialogueRunner {
        ScriptedDialogueRunner::new(
            self.dialogue
                .iter()
                .map(|node| (node.name.clone(), (node.hold_ticks, node.steps.clone())))
                .collect(),
        )
    }

    pub(crate) fn input_script(&self) -> ScriptedInput {
        ScriptedInput::new(self.input_script.clone())
    }

    fn placed_concentration_meters(&self) -> Vec<ConcentrationMeter> {
        self.placed_concentration
            .iter()
            .copied()
            .map(ConcentrationMeter::new)
            .collect()
    }
}

fn yaw_rotation(yaw_degrees: f32) -> Quat {
    Quat::from_rotation_y(-yaw_degrees.to_radians())
}
