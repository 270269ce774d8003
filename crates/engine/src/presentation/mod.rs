mod camera_focus;
mod concentration;
mod dialogue;
mod highlight;
mod interactable;
mod managers;
mod mode;
mod session;
mod targeting;
mod tween;
mod ui;

pub use camera_focus::{
    CameraFocusDirector, CharacterTarget, CharacterTargetRegistry, FocusConfig, FocusGoal,
    FocusMotion, FocusMotionSpec, FocusOutcome, FollowFocus, RotationTaskId, TweenFocus,
    DEFAULT_FOCUS_DURATION_SECONDS, DEFAULT_FOLLOW_ROTATION_SPEED,
};
pub use concentration::{
    ConcentrationConfig, ConcentrationEvent, ConcentrationMeter, ConcentrationState,
};
pub use dialogue::{
    DialogueBridge, DialogueContext, DialogueError, DialogueEvent, DialogueOption, DialogueRunner,
};
pub use highlight::{
    linear_intensity, EmissiveHighlight, HighlightKind, HighlightSpec, HighlightStrategy,
    LayerSwapHighlight, OutlineMaterialHighlight, DEFAULT_HIGHLIGHT_LAYER,
};
pub use interactable::{Interactable, InteractableSet, InteractionEffect, DEFAULT_PROMPT};
pub use managers::{ManagerConfig, ManagerError, ManagerSlot};
pub use mode::{CursorGrab, CursorState, InputMode, LookConfig, ModeCoordinator};
pub use session::{
    Collaborators, GameSession, SessionEvent, SessionEventBus, SessionEventCounts,
    SessionEventKind, SessionRig,
};
pub use targeting::{
    classify_transition, InteractionRequest, TargetAcquisition, TargetTransition, TargetingConfig,
};
pub use tween::{Easing, RotationTween};
pub use ui::{ConcentrationGauge, GaugeState, PromptPanel, PromptState};
