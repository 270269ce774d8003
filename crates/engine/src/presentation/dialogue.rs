use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::SceneWorld;

use super::camera_focus::{CameraFocusDirector, FocusOutcome};
use super::concentration::{ConcentrationEvent, ConcentrationMeter};
use super::mode::ModeCoordinator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueOption {
    pub index: usize,
    pub text: String,
    pub available: bool,
}

/// Lifecycle callbacks from the dialogue engine. Always delivered between
/// ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEvent {
    Started { node: String },
    Line { speaker: String, text: String },
    Options(Vec<DialogueOption>),
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("dialogue node `{0}` does not exist")]
    UnknownNode(String),
    #[error("dialogue already running; refused to start `{requested}`")]
    AlreadyRunning { requested: String },
}

pub trait DialogueRunner {
    fn start_dialogue(&mut self, node: &str) -> Result<(), DialogueError>;
    fn is_running(&self) -> bool;
    /// Drains the events produced since the last poll.
    fn poll_events(&mut self) -> Vec<DialogueEvent>;
    fn choose_option(&mut self, selection: Option<usize>);
}

pub struct DialogueContext<'a> {
    pub mode: Option<&'a mut ModeCoordinator>,
    pub focus: &'a mut CameraFocusDirector,
    pub world: &'a mut SceneWorld,
}

/// Maps dialogue lifecycle onto input mode and camera focus.
#[derive(Debug, Default)]
pub struct DialogueBridge {
    in_session: bool,
    lines_seen: u32,
    resync_requests: u32,
}

impl DialogueBridge {
    pub fn in_session(&self) -> bool {
        self.in_session
    }

    pub fn lines_seen(&self) -> u32 {
        self.lines_seen
    }

    pub fn resync_requests(&self) -> u32 {
        self.resync_requests
    }

    /// Charges one interaction step, then asks the runner to start `node`.
    pub fn start_dialogue(
        &mut self,
        runner: &mut dyn DialogueRunner,
        concentration: Option<&mut ConcentrationMeter>,
        node: &str,
    ) -> Result<Option<ConcentrationEvent>, DialogueError> {
        if runner.is_running() {
            return Err(DialogueError::AlreadyRunning {
                requested: node.to_string(),
            });
        }
        let event = match concentration {
            Some(meter) => meter.decrease_on_interact(),
            None => {
                warn!(node = %node, "dialogue_started_without_concentration");
                None
            }
        };
        runner.start_dialogue(node)?;
        info!(node = %node, "dialogue_requested");
        Ok(event)
    }

    /// Returns the option selection for `Options`; always `None`, the
    /// runner's own view picks.
    pub fn handle(&mut self, event: &DialogueEvent, context: DialogueContext<'_>) -> Option<usize> {
        match event {
            DialogueEvent::Started { node } => {
                self.in_session = true;
                self.lines_seen = 0;
                if let Some(mode) = context.mode {
                    mode.lock();
                }
                info!(node = %node, "dialogue_session_started");
                None
            }
            DialogueEvent::Line { speaker, text } => {
                self.lines_seen = self.lines_seen.saturating_add(1);
                debug!(speaker = %speaker, chars = text.chars().count(), "dialogue_line");
                let outcome = context.focus.focus_on_character(speaker, context.world);
                if outcome.dropped_focus() {
                    self.request_resync(outcome, context.mode, context.world);
                }
                None
            }
            DialogueEvent::Options(options) => {
                debug!(count = options.len(), "dialogue_options");
                None
            }
            DialogueEvent::Completed => {
                self.in_session = false;
                context.focus.reset_focus();
                if let Some(mode) = context.mode {
                    mode.unlock(context.world);
                }
                info!(lines = self.lines_seen, "dialogue_session_completed");
                None
            }
        }
    }

    fn request_resync(
        &mut self,
        outcome: FocusOutcome,
        mode: Option<&mut ModeCoordinator>,
        world: &mut SceneWorld,
    ) {
        let Some(mode) = mode else {
            warn!(?outcome, "dialogue_resync_without_mode");
            return;
        };
        mode.resync_orientation(world);
        self.resync_requests = self.resync_requests.saturating_add(1);
    }
}
