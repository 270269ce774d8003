/// Plays dialogue nodes declared in the scene file, one step per
/// `hold_ticks` polls. Option steps wait for a selection.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDialogueRunner {
    nodes: HashMap<String, (u32, Vec<DialogueStepDef>)>,
    active: Option<ActiveNode>,
    choices: Vec<(String, usize)>,
}

#[derive(Debug)]
struct ActiveNode {
    name: String,
    hold_ticks: u32,
    steps: Vec<DialogueStepDef>,
    cursor: usize,
    started: bool,
    hold_remaining: u32,
    awaiting_choice: Option<Vec<DialogueOption>>,
}

impl ScriptedDialogueRunner {
    fn new(nodes: HashMap<String, (u32, Vec<DialogueStepDef>)>) -> Self {
        Self {
            nodes,
            active: None,
            choices: Vec::new(),
        }
    }

    pub(crate) fn choices(&self) -> &[(String, usize)] {
        &self.choices
    }

    pub(crate) fn active_node(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.name.as_str())
    }
}

impl ActiveNode {
    /// Emits the step under the cursor, or `Completed` past the end.
    fn emit_current(&mut self, events: &mut Vec<DialogueEvent>) -> bool {
        match self.steps.get(self.cursor) {
            Some(DialogueStepDef::Line { speaker, text }) => {
                events.push(DialogueEvent::Line {
                    speaker: speaker.clone(),
                    text: text.clone(),
                });
                self.hold_remaining = self.hold_ticks.max(1);
                false
            }
            Some(DialogueStepDef::Options { choices }) => {
                let options: Vec<DialogueOption> = choices
                    .iter()
                    .enumerate()
                    .map(|(index, text)| DialogueOption {
                        index,
                        text: text.clone(),
                        available: true,
                    })
                    .collect();
                events.push(DialogueEvent::Options(options.clone()));
                self.awaiting_choice = Some(options);
                false
            }
            None => {
                events.push(DialogueEvent::Completed);
                true
            }
        }
    }
}

impl DialogueRunner for ScriptedDialogueRunner {
    fn start_dialogue(&mut self, node: &str) -> Result<(), DialogueError> {
        if let Some(active) = &self.active {
            debug!(active = %active.name, requested = %node, "scripted_dialogue_busy");
            return Err(DialogueError::AlreadyRunning {
                requested: node.to_string(),
            });
        }
        let Some((hold_ticks, steps)) = self.nodes.get(node) else {
            return Err(DialogueError::UnknownNode(node.to_string()));
        };
        self.active = Some(ActiveNode {
            name: node.to_string(),
            hold_ticks: *hold_ticks,
            steps: steps.clone(),
            cursor: 0,
            started: false,
            hold_remaining: 0,
            awaiting_choice: None,
        });
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.active.is_some()
    }

    fn poll_events(&mut self) -> Vec<DialogueEvent> {
        let mut events = Vec::new();
        let Some(active) = self.active.as_mut() else {
            return events;
        };

        let finished = if !active.started {
            active.started = true;
            events.push(DialogueEvent::Started {
                node: active.name.clone(),
            });
            active.emit_current(&mut events)
        } else if active.awaiting_choice.is_some() {
            false
        } else {
            active.hold_remaining = active.hold_remaining.saturating_sub(1);
            if active.hold_remaining > 0 {
                false
            } else {
                active.cursor += 1;
                active.emit_current(&mut events)
            }
        };

        if finished {
            debug!(node = %active.name, "scripted_dialogue_finished");
            self.active = None;
        }
        events
    }

    fn choose_option(&mut self, selection: Option<usize>) {
        let Some(active) = self.active.as_mut() else {
            warn!("scripted_dialogue_choice_without_node");
            return;
        };
        let Some(options) = active.awaiting_choice.take() else {
            warn!(node = %active.name, "scripted_dialogue_choice_unexpected");
            return;
        };
        // No selection means the dialogue view picks: first available option.
        let chosen = selection
            .filter(|index| options.iter().any(|option| option.index == *index && option.available))
            .or_else(|| options.iter().find(|option| option.available).map(|option| option.index));
        match chosen {
            Some(index) => {
                info!(node = %active.name, option = index, "scripted_dialogue_option_chosen");
                self.choices.push((active.name.clone(), index));
            }
            None => warn!(node = %active.name, "scripted_dialogue_no_available_option"),
        }
        // The next poll moves past the options step.
        active.hold_remaining = 1;
    }
}
