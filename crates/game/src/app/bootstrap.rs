use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vigil_engine::{ClockMode, LoopConfig};

use super::gameplay::{load_scene_def, SceneSource, ScriptedInput, StudyScene};

const SCENE_ENV_VAR: &str = "VIGIL_SCENE";
const MAX_TICKS_ENV_VAR: &str = "VIGIL_MAX_TICKS";
const SIMULATED_CLOCK_ENV_VAR: &str = "VIGIL_SIMULATED_CLOCK";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: StudyScene,
    pub(crate) input: ScriptedInput,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Vigil Startup ===");

    let source = parse_scene_source(std::env::var(SCENE_ENV_VAR).ok());
    let def = load_scene_def(&source).map_err(|err| err.to_string())?;
    info!(scene = %def.name(), source = ?source, "scene_definition_loaded");

    let config = LoopConfig {
        max_ticks: parse_max_ticks(std::env::var(MAX_TICKS_ENV_VAR).ok().as_deref()),
        clock: parse_clock_mode(std::env::var(SIMULATED_CLOCK_ENV_VAR).ok().as_deref()),
        ..LoopConfig::default()
    };
    let input = def.input_script();

    Ok(AppWiring {
        config,
        scene: StudyScene::new(def),
        input,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_scene_source(raw: Option<String>) -> SceneSource {
    match raw.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => SceneSource::File(PathBuf::from(path)),
        _ => SceneSource::Embedded,
    }
}

fn parse_max_ticks(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => {
            warn!(
                env = MAX_TICKS_ENV_VAR,
                value = raw,
                "env_value_invalid_using_default"
            );
            None
        }
        Ok(limit) => Some(limit),
    }
}

/// Any truthy value swaps wall-clock pacing for fixed 60 Hz frames.
fn parse_clock_mode(raw: Option<&str>) -> ClockMode {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return ClockMode::Realtime;
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => ClockMode::Simulated {
            frame_delta: Duration::from_secs_f64(1.0 / 60.0),
        },
        "0" | "false" | "no" | "off" => ClockMode::Realtime,
        _ => {
            warn!(
                env = SIMULATED_CLOCK_ENV_VAR,
                value = raw,
                "env_value_invalid_using_default"
            );
            ClockMode::Realtime
        }
    }
}
