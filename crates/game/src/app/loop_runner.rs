use std::process::ExitCode;

use tracing::{error, info};
use vigil_engine::run_headless;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut scene,
        mut input,
    } = app;

    let summary = match run_headless(config, &mut scene, &mut input) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };
    if let Some(reason) = scene.load_error() {
        error!(error = %reason, "scene_load_failed");
        return ExitCode::FAILURE;
    }

    let report = scene.report();
    info!(
        ticks = summary.ticks,
        frames = summary.frames,
        reason = ?summary.stop_reason,
        target_changes = report.target_changes,
        interactions = report.interactions,
        notes = report.notes,
        dialogue_requested = report.dialogue_requested,
        dialogue_refused = report.dialogue_refused,
        dialogue_started = report.dialogue_started,
        dialogue_completed = report.dialogue_completed,
        dialogue_lines = report.dialogue_lines,
        dialogue_choices = scene.dialogue().choices().len(),
        dialogue_active = scene.dialogue().active_node().unwrap_or(""),
        orientation_resyncs = report.orientation_resyncs,
        gauge_fraction = report.gauge.fraction(),
        prompt_shows = report.prompt.show_count(),
        game_over = report.game_over,
        script_steps_left = input.remaining_steps(),
        "run_finished"
    );
    ExitCode::SUCCESS
}
