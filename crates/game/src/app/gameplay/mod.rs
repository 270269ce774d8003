use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, error, info, warn};
use vigil_engine::presentation::{
    CharacterTarget, CharacterTargetRegistry, Collaborators, ConcentrationConfig,
    ConcentrationMeter, DialogueError, DialogueEvent, DialogueOption, DialogueRunner, GameSession,
    GaugeState, HighlightSpec, Interactable, InteractableSet, InteractionEffect, PromptState,
    SessionEventCounts, SessionEventKind, SessionRig,
};
use vigil_engine::app::{EmissionSlot, Material};
use vigil_engine::{
    Collider, ColliderSet, EntityId, GameConfig, InputCollector, InputSnapshot, InputSource, Quat,
    Scene, SceneCommand, SceneError, SceneWorld, Transform, Vec2, Vec3,
};

const DEFAULT_SCENE_JSON: &str = include_str!("../../../assets/study_scene.json");
const DEFAULT_EYE_HEIGHT: f32 = 1.6;
const DEFAULT_DIALOGUE_HOLD_TICKS: u32 = 45;

include!("scene_def.rs");
include!("dialogue_script.rs");
include!("input_script.rs");
include!("scene_impl.rs");
