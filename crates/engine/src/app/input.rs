use glam::Vec2;

/// Per-tick input as seen by scenes. `interact_pressed` is edge-triggered;
/// `look_delta` is the raw pointer delta accumulated since the last tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    interact_pressed: bool,
    look_delta: Vec2,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn look_delta(&self) -> Vec2 {
        self.look_delta
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_interact_pressed(mut self, interact_pressed: bool) -> Self {
        self.interact_pressed = interact_pressed;
        self
    }

    pub fn with_look_delta(mut self, look_delta: Vec2) -> Self {
        self.look_delta = look_delta;
        self
    }
}

/// Edge detector for the interact button. Holding the button produces a
/// single press on the first tick only.
#[derive(Debug, Default)]
pub struct InputCollector {
    interact_is_down: bool,
    interact_pressed_edge: bool,
    quit_requested: bool,
    pending_look_delta: Vec2,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_interact(&mut self, is_down: bool) {
        if is_down && !self.interact_is_down {
            self.interact_pressed_edge = true;
        }
        self.interact_is_down = is_down;
    }

    pub fn handle_look(&mut self, delta: Vec2) {
        self.pending_look_delta += delta;
    }

    pub fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            quit_requested: self.quit_requested,
            interact_pressed: self.interact_pressed_edge,
            look_delta: self.pending_look_delta,
        };
        self.interact_pressed_edge = false;
        self.pending_look_delta = Vec2::ZERO;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interact_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::new();
        input.handle_interact(true);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.interact_pressed());
        assert!(!second.interact_pressed());
    }

    #[test]
    fn held_interact_does_not_spam_press_edges() {
        let mut input = InputCollector::new();
        input.handle_interact(true);
        let _ = input.snapshot_for_tick();
        input.handle_interact(true);
        assert!(!input.snapshot_for_tick().interact_pressed());

        input.handle_interact(false);
        input.handle_interact(true);
        assert!(input.snapshot_for_tick().interact_pressed());
    }

    #[test]
    fn quit_request_sticks_while_edges_clear() {
        let mut input = InputCollector::new();
        input.handle_interact(true);
        input.mark_quit_requested();

        let first = input.snapshot_for_tick();
        assert!(first.quit_requested() && first.interact_pressed());
        let second = input.snapshot_for_tick();
        assert!(second.quit_requested());
        assert!(!second.interact_pressed());
    }

    #[test]
    fn look_delta_accumulates_until_consumed() {
        let mut input = InputCollector::new();
        input.handle_look(Vec2::new(1.0, 2.0));
        input.handle_look(Vec2::new(0.5, -1.0));

        assert_eq!(input.snapshot_for_tick().look_delta(), Vec2::new(1.5, 1.0));
        assert_eq!(input.snapshot_for_tick().look_delta(), Vec2::ZERO);
    }
}
