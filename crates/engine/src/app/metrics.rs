use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Loop pacing over the most recent window, plus run-wide tick totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    /// Frames in the window that hit the per-frame tick cap and shed backlog.
    pub clamped_frames: u32,
    pub ticks_total: u64,
}

impl LoopMetricsSnapshot {
    /// True when the simulation kept up with the wall clock for the window.
    pub fn is_keeping_pace(&self) -> bool {
        self.clamped_frames == 0
    }
}

/// Shared view of the latest loop metrics; cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        // A panicking writer leaves a whole `Copy` value behind, never a torn one.
        *self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

/// Frame and tick counts for one reporting window, measured on the loop's
/// own clock so simulated runs report simulated rates.
#[derive(Debug)]
pub(crate) struct PacingWindow {
    opened_at: Duration,
    length: Duration,
    frames: u32,
    ticks: u32,
    clamped_frames: u32,
    frame_time_sum: Duration,
    ticks_total: u64,
}

impl PacingWindow {
    pub(crate) fn new(length: Duration) -> Self {
        Self {
            opened_at: Duration::ZERO,
            length,
            frames: 0,
            ticks: 0,
            clamped_frames: 0,
            frame_time_sum: Duration::ZERO,
            ticks_total: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, clamped: bool) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        if clamped {
            self.clamped_frames = self.clamped_frames.saturating_add(1);
        }
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
        self.ticks_total = self.ticks_total.saturating_add(1);
    }

    /// Closes the window once it has run its length and starts the next.
    pub(crate) fn close_if_due(&mut self, now: Duration) -> Option<LoopMetricsSnapshot> {
        let span = now.saturating_sub(self.opened_at);
        if span < self.length {
            return None;
        }

        let seconds = span.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_sum.as_secs_f32() * 1000.0 / frames as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            clamped_frames: self.clamped_frames,
            ticks_total: self.ticks_total,
        };

        *self = Self {
            opened_at: now,
            ticks_total: self.ticks_total,
            ..Self::new(self.length)
        };
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn window_reports_rates_and_carries_the_tick_total() {
        let mut window = PacingWindow::new(Duration::from_secs(1));
        for _ in 0..30 {
            window.record_frame(Duration::from_millis(20), false);
            window.record_tick();
            window.record_tick();
        }

        let first = window
            .close_if_due(Duration::from_millis(1500))
            .expect("window should close");
        assert!((first.fps - 20.0).abs() < 0.05);
        assert!((first.tps - 40.0).abs() < 0.05);
        assert!((first.frame_time_ms - 20.0).abs() < 0.001);
        assert_eq!(first.ticks_total, 60);
        assert!(first.is_keeping_pace());

        // The next window opens where the previous one closed.
        assert!(window.close_if_due(Duration::from_millis(2000)).is_none());
        window.record_tick();
        let second = window
            .close_if_due(Duration::from_millis(2500))
            .expect("second window");
        assert_eq!(second.ticks_total, 61);
        assert_eq!(second.fps, 0.0);
    }

    #[test]
    fn clamped_frames_reset_per_window() {
        let mut window = PacingWindow::new(Duration::from_secs(1));
        window.record_frame(Duration::from_millis(300), true);
        window.record_frame(Duration::from_millis(16), false);
        assert!(window.close_if_due(Duration::from_millis(500)).is_none());

        let lagging = window
            .close_if_due(Duration::from_secs(1))
            .expect("window");
        assert_eq!(lagging.clamped_frames, 1);
        assert!(!lagging.is_keeping_pace());

        window.record_frame(Duration::from_millis(16), false);
        let recovered = window.close_if_due(Duration::from_secs(2)).expect("window");
        assert_eq!(recovered.clamped_frames, 0);
    }

    #[test]
    fn handle_survives_a_panicking_writer() {
        let handle = MetricsHandle::default();
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = handle.latest.write().expect("write guard");
                    panic!("writer died mid-publish");
                })
                .join();
        });
        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());

        let expected = LoopMetricsSnapshot {
            fps: 60.0,
            tps: 60.0,
            frame_time_ms: 16.0,
            clamped_frames: 0,
            ticks_total: 600,
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }
}
