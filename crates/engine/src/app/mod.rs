mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::{InputCollector, InputSnapshot};
pub use loop_runner::{
    run_headless, run_headless_with_metrics, AppError, ClockMode, InputSource, LoopConfig,
    RunSummary, StopReason,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use scene::{
    EmissionSlot, Entity, EntityId, EntityIdAllocator, LayerId, LayerTable, Material, MaterialId,
    MeshRenderer, Scene, SceneCommand, SceneError, SceneWorld, Transform, DEFAULT_LAYER,
};
