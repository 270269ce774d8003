/// Replays the scene's input script against the loop's tick counter. A look
/// delta is held every frame until a later step replaces it.
#[derive(Debug, Default)]
pub(crate) struct ScriptedInput {
    steps: VecDeque<ScriptStepDef>,
    held_look: Vec2,
}

impl ScriptedInput {
    fn new(mut steps: Vec<ScriptStepDef>) -> Self {
        steps.sort_by_key(|step| step.tick);
        Self {
            steps: steps.into(),
            held_look: Vec2::ZERO,
        }
    }

    pub(crate) fn remaining_steps(&self) -> usize {
        self.steps.len()
    }
}

impl InputSource for ScriptedInput {
    fn pump(&mut self, next_tick: u64, collector: &mut InputCollector) {
        while let Some(step) = self.steps.front().copied() {
            if step.tick > next_tick {
                break;
            }
            self.steps.pop_front();
            if let Some(look) = step.look {
                self.held_look = look;
            }
            if let Some(is_down) = step.interact {
                collector.handle_interact(is_down);
            }
            if step.quit {
                collector.mark_quit_requested();
            }
            debug!(tick = step.tick, "input_script_step");
        }
        if self.held_look != Vec2::ZERO {
            collector.handle_look(self.held_look);
        }
    }
}
