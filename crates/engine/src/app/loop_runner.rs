use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::input::InputCollector;
use super::metrics::PacingWindow;
use super::scene::{Scene, SceneCommand, SceneWorld};
use super::MetricsHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Wall-clock frames, paced to the tick rate.
    Realtime,
    /// Every frame advances by exactly `frame_delta`; nothing sleeps.
    Simulated { frame_delta: Duration },
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_ticks: Option<u64>,
    pub clock: ClockMode,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_ticks: None,
            clock: ClockMode::Realtime,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("simulated clock frame delta must be non-zero")]
    StalledClock,
    #[error("tick limit of zero would never run the scene")]
    ZeroTickLimit,
}

/// Feeds device or scripted input into the collector once per frame.
pub trait InputSource {
    fn pump(&mut self, next_tick: u64, collector: &mut InputCollector);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SceneQuit,
    QuitRequested,
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames: u64,
    pub stop_reason: StopReason,
}

pub fn run_headless(
    config: LoopConfig,
    scene: &mut dyn Scene,
    input: &mut dyn InputSource,
) -> Result<RunSummary, AppError> {
    run_headless_with_metrics(config, scene, input, MetricsHandle::default())
}

pub fn run_headless_with_metrics(
    config: LoopConfig,
    scene: &mut dyn Scene,
    input: &mut dyn InputSource,
    metrics_handle: MetricsHandle,
) -> Result<RunSummary, AppError> {
    if config.max_ticks == Some(0) {
        return Err(AppError::ZeroTickLimit);
    }
    let mut clock = FrameClock::new(config.clock)?;

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        max_ticks = ?config.max_ticks,
        clock = ?config.clock,
        "loop_config"
    );

    let mut world = SceneWorld::default();
    scene.load(&mut world);
    let title = scene.debug_title(&world);
    info!(
        entity_count = world.entity_count(),
        title = title.as_deref().unwrap_or(""),
        "scene_loaded"
    );

    let mut collector = InputCollector::new();
    let mut accumulator = Duration::ZERO;
    let mut elapsed_total = Duration::ZERO;
    let mut pacing = PacingWindow::new(metrics_log_interval);
    let mut ticks = 0u64;
    let mut frames = 0u64;

    let stop_reason = 'frames: loop {
        let frame_started = Instant::now();
        let raw_frame_dt = clock.next_frame_delta(fixed_dt);
        frames = frames.saturating_add(1);
        input.pump(ticks, &mut collector);

        accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        accumulator = step_plan.remaining_accumulator;
        let clamped = step_plan.dropped_backlog > Duration::ZERO;
        if clamped {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        for _ in 0..step_plan.ticks_to_run {
            let snapshot = collector.snapshot_for_tick();
            if snapshot.quit_requested() {
                info!(reason = "input", "shutdown_requested");
                break 'frames StopReason::QuitRequested;
            }
            let command = scene.update(fixed_dt_seconds, &snapshot, &mut world);
            ticks = ticks.saturating_add(1);
            pacing.record_tick();

            if command == SceneCommand::Quit {
                info!(reason = "scene", tick = ticks, "shutdown_requested");
                break 'frames StopReason::SceneQuit;
            }
            if config.max_ticks.is_some_and(|limit| ticks >= limit) {
                info!(reason = "tick_limit", tick = ticks, "shutdown_requested");
                break 'frames StopReason::TickLimit;
            }
        }

        pacing.record_frame(raw_frame_dt, clamped);
        elapsed_total = elapsed_total.saturating_add(raw_frame_dt);
        if let Some(snapshot) = pacing.close_if_due(elapsed_total) {
            metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                clamped_frames = snapshot.clamped_frames,
                ticks_total = snapshot.ticks_total,
                entity_count = world.entity_count(),
                "loop_metrics"
            );
        }

        if clock.is_realtime() {
            let pacing_sleep = compute_pacing_sleep(frame_started.elapsed(), fixed_dt);
            if pacing_sleep > Duration::ZERO {
                thread::sleep(pacing_sleep);
            }
        }
    };

    scene.unload(&mut world);
    info!(ticks, frames, reason = ?stop_reason, "shutdown");
    Ok(RunSummary {
        ticks,
        frames,
        stop_reason,
    })
}

#[derive(Debug)]
enum FrameClock {
    Realtime { last_frame: Option<Instant> },
    Simulated { frame_delta: Duration },
}

impl FrameClock {
    fn new(mode: ClockMode) -> Result<Self, AppError> {
        match mode {
            ClockMode::Realtime => Ok(Self::Realtime { last_frame: None }),
            ClockMode::Simulated { frame_delta } if frame_delta.is_zero() => {
                Err(AppError::StalledClock)
            }
            ClockMode::Simulated { frame_delta } => Ok(Self::Simulated { frame_delta }),
        }
    }

    fn is_realtime(&self) -> bool {
        matches!(self, Self::Realtime { .. })
    }

    /// The first realtime frame counts as one full tick.
    fn next_frame_delta(&mut self, fixed_dt: Duration) -> Duration {
        match self {
            Self::Realtime { last_frame } => {
                let now = Instant::now();
                let delta = last_frame
                    .map(|previous| now.saturating_duration_since(previous))
                    .unwrap_or(fixed_dt);
                *last_frame = Some(now);
                delta
            }
            Self::Simulated { frame_delta } => {
                debug!(frame_delta_us = frame_delta.as_micros() as u64, "simulated_frame");
                *frame_delta
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    let mut remaining = accumulator;
    let mut ticks_to_run = 0u32;
    while remaining >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        remaining = remaining.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    // Anything still owed after the cap is dropped rather than carried.
    let dropped_backlog = if remaining >= fixed_dt {
        std::mem::take(&mut remaining)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: remaining,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_pacing_sleep(frame_elapsed: Duration, frame_budget: Duration) -> Duration {
    frame_budget.saturating_sub(frame_elapsed)
}
