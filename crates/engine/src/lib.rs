pub mod app;
pub mod config;
pub mod math;
pub mod physics;
pub mod presentation;

pub use app::{
    run_headless, run_headless_with_metrics, AppError, ClockMode, EntityId, InputCollector,
    InputSnapshot, InputSource, LoopConfig, LoopMetricsSnapshot, MetricsHandle, RunSummary, Scene,
    SceneCommand, SceneError, SceneWorld, StopReason, Transform,
};
pub use config::{ConfigError, GameConfig};
pub use physics::{Collider, ColliderSet, Ray, RayCaster, RayHit};
pub use presentation::{
    Collaborators, ConcentrationMeter, DialogueEvent, DialogueRunner, GameSession, SessionRig,
};

pub use glam::{Quat, Vec2, Vec3};
