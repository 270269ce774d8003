use tracing::{debug, error, info, warn};

use crate::app::{EntityId, InputSnapshot, SceneWorld};
use crate::config::GameConfig;
use crate::physics::RayCaster;

use super::camera_focus::{CameraFocusDirector, CharacterTargetRegistry};
use super::concentration::{ConcentrationEvent, ConcentrationMeter};
use super::dialogue::{DialogueBridge, DialogueContext, DialogueEvent, DialogueRunner};
use super::interactable::{InteractableSet, InteractionEffect};
use super::managers::{ManagerError, ManagerSlot};
use super::mode::ModeCoordinator;
use super::targeting::{TargetAcquisition, TargetTransition};
use super::ui::{ConcentrationGauge, PromptPanel};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TargetChanged(TargetTransition),
    InteractionTriggered { target: EntityId },
    DialogueRequested { node: String },
    DialogueRefused { node: String, reason: String },
    Note { target: EntityId, message: String },
    DialogueStarted,
    DialogueCompleted,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    TargetChanged,
    InteractionTriggered,
    DialogueRequested,
    DialogueRefused,
    Note,
    DialogueStarted,
    DialogueCompleted,
    GameOver,
}

impl SessionEvent {
    pub fn kind(&self) -> SessionEventKind {
        match self {
            Self::TargetChanged(_) => SessionEventKind::TargetChanged,
            Self::InteractionTriggered { .. } => SessionEventKind::InteractionTriggered,
            Self::DialogueRequested { .. } => SessionEventKind::DialogueRequested,
            Self::DialogueRefused { .. } => SessionEventKind::DialogueRefused,
            Self::Note { .. } => SessionEventKind::Note,
            Self::DialogueStarted => SessionEventKind::DialogueStarted,
            Self::DialogueCompleted => SessionEventKind::DialogueCompleted,
            Self::GameOver => SessionEventKind::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionEventCounts {
    pub total: u32,
    pub target_changed: u32,
    pub interaction_triggered: u32,
    pub dialogue_requested: u32,
    pub dialogue_refused: u32,
    pub note: u32,
    pub dialogue_started: u32,
    pub dialogue_completed: u32,
    pub game_over: u32,
}

impl SessionEventCounts {
    fn record(&mut self, kind: SessionEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            SessionEventKind::TargetChanged => &mut self.target_changed,
            SessionEventKind::InteractionTriggered => &mut self.interaction_triggered,
            SessionEventKind::DialogueRequested => &mut self.dialogue_requested,
            SessionEventKind::DialogueRefused => &mut self.dialogue_refused,
            SessionEventKind::Note => &mut self.note,
            SessionEventKind::DialogueStarted => &mut self.dialogue_started,
            SessionEventKind::DialogueCompleted => &mut self.dialogue_completed,
            SessionEventKind::GameOver => &mut self.game_over,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Events since the last tick boundary, plus the per-kind counts of the
/// tick that just finished.
#[derive(Debug, Default)]
pub struct SessionEventBus {
    current_tick_events: Vec<SessionEvent>,
    last_tick_counts: SessionEventCounts,
}

impl SessionEventBus {
    pub fn emit(&mut self, event: SessionEvent) {
        self.current_tick_events.push(event);
    }

    pub fn iter_emitted_so_far(&self) -> impl Iterator<Item = &SessionEvent> {
        self.current_tick_events.iter()
    }

    pub fn finish_tick_rollover(&mut self) {
        let mut counts = SessionEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.current_tick_events.clear();
    }

    pub fn last_tick_counts(&self) -> SessionEventCounts {
        self.last_tick_counts
    }
}

/// External systems the session talks to during a tick.
pub struct Collaborators<'a> {
    pub ray_caster: &'a dyn RayCaster,
    pub prompt: &'a mut dyn PromptPanel,
    pub gauge: Option<&'a mut dyn ConcentrationGauge>,
    pub dialogue: &'a mut dyn DialogueRunner,
}

/// Entities and registries a session is wired to.
#[derive(Debug)]
pub struct SessionRig {
    pub body: EntityId,
    pub viewpoint: EntityId,
    pub interactables: InteractableSet,
    pub characters: CharacterTargetRegistry,
}

#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    body: EntityId,
    viewpoint: EntityId,
    mode: ManagerSlot<ModeCoordinator>,
    concentration: ManagerSlot<ConcentrationMeter>,
    targeting: TargetAcquisition,
    interactables: InteractableSet,
    focus: CameraFocusDirector,
    bridge: DialogueBridge,
    events: SessionEventBus,
    game_over: bool,
    gauge_state: GaugeLink,
    tick_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GaugeLink {
    Pending,
    Configured,
    Missing,
}

impl GameSession {
    pub fn new(config: GameConfig, rig: SessionRig) -> Self {
        Self {
            config,
            body: rig.body,
            viewpoint: rig.viewpoint,
            mode: ManagerSlot::new("mode", config.managers.mode_persistent),
            concentration: ManagerSlot::new(
                "concentration",
                config.managers.concentration_persistent,
            ),
            targeting: TargetAcquisition::new(rig.viewpoint, config.targeting),
            interactables: rig.interactables,
            focus: CameraFocusDirector::new(rig.viewpoint, rig.characters, config.focus),
            bridge: DialogueBridge::default(),
            events: SessionEventBus::default(),
            game_over: false,
            gauge_state: GaugeLink::Pending,
            tick_count: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Managers placed by the scene; these take precedence over lazily
    /// created ones.
    pub fn install_placed_managers(
        &mut self,
        modes: Vec<ModeCoordinator>,
        meters: Vec<ConcentrationMeter>,
    ) -> Result<(), ManagerError> {
        self.mode.install_placed(modes)?;
        self.concentration.install_placed(meters)?;
        Ok(())
    }

    pub fn mode(&self) -> Result<&ModeCoordinator, ManagerError> {
        self.mode.get()
    }

    pub fn concentration(&self) -> Result<&ConcentrationMeter, ManagerError> {
        self.concentration.get()
    }

    pub fn targeting(&self) -> &TargetAcquisition {
        &self.targeting
    }

    pub fn interactables(&self) -> &InteractableSet {
        &self.interactables
    }

    pub fn focus(&self) -> &CameraFocusDirector {
        &self.focus
    }

    pub fn bridge(&self) -> &DialogueBridge {
        &self.bridge
    }

    pub fn events(&self) -> &SessionEventBus {
        &self.events
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
        collaborators: &mut Collaborators<'_>,
    ) {
        self.tick_count = self.tick_count.saturating_add(1);
        self.ensure_managers(world);
        self.link_gauge(collaborators);

        if let Ok(mode) = self.mode.get_mut() {
            mode.on_look(input.look_delta());
            mode.tick(fixed_dt_seconds, world);
        }

        let transition = self.targeting.tick(
            world,
            collaborators.ray_caster,
            &mut self.interactables,
            &mut *collaborators.prompt,
        );
        if !matches!(transition, TargetTransition::Idle(_)) {
            self.events.emit(SessionEvent::TargetChanged(transition));
        }

        if let Some(request) = self
            .targeting
            .on_interact(input.interact_pressed(), &self.interactables)
        {
            self.apply_interaction(request.target, &request.effects, collaborators);
        }

        self.focus.tick(fixed_dt_seconds, world);

        let depleted = self
            .concentration
            .get_mut()
            .ok()
            .and_then(|meter| meter.tick(fixed_dt_seconds));
        self.note_concentration(depleted);
        self.push_gauge(collaborators);

        self.events.finish_tick_rollover();
    }

    /// Routes one dialogue lifecycle callback. Returns the option selection
    /// for `Options` events.
    pub fn dispatch_dialogue_event(
        &mut self,
        event: &DialogueEvent,
        world: &mut SceneWorld,
    ) -> Option<usize> {
        match event {
            DialogueEvent::Started { .. } => self.events.emit(SessionEvent::DialogueStarted),
            DialogueEvent::Completed => self.events.emit(SessionEvent::DialogueCompleted),
            DialogueEvent::Line { .. } | DialogueEvent::Options(_) => {}
        }
        let mode = match self.mode.get_mut() {
            Ok(mode) => Some(mode),
            Err(err) => {
                warn!(error = %err, "dialogue_event_without_mode");
                None
            }
        };
        self.bridge.handle(
            event,
            DialogueContext {
                mode,
                focus: &mut self.focus,
                world,
            },
        )
    }

    /// Hides the prompt and any highlight and drops scene-scoped managers.
    pub fn unload(&mut self, world: &mut SceneWorld, prompt: &mut dyn PromptPanel) {
        self.targeting
            .release(world, &mut self.interactables, prompt);
        self.focus.reset_focus();
        self.mode.on_scene_unload();
        self.concentration.on_scene_unload();
        self.gauge_state = GaugeLink::Pending;
    }

    pub fn shutdown(&mut self) {
        self.mode.shutdown();
        self.concentration.shutdown();
        info!(ticks = self.tick_count, "session_shut_down");
    }

    fn ensure_managers(&mut self, world: &SceneWorld) {
        let (body, viewpoint, look) = (self.body, self.viewpoint, self.config.look);
        if let Err(err) = self
            .mode
            .get_or_create(|| ModeCoordinator::new(world, body, viewpoint, look))
        {
            debug!(error = %err, "mode_manager_unavailable");
        }
        let concentration = self.config.concentration;
        if let Err(err) = self
            .concentration
            .get_or_create(|| ConcentrationMeter::new(concentration))
        {
            debug!(error = %err, "concentration_manager_unavailable");
        }
    }

    fn link_gauge(&mut self, collaborators: &mut Collaborators<'_>) {
        if self.gauge_state != GaugeLink::Pending {
            return;
        }
        let Ok(meter) = self.concentration.get() else {
            return;
        };
        match collaborators.gauge.as_deref_mut() {
            Some(gauge) => {
                meter.configure_gauge(gauge);
                self.gauge_state = GaugeLink::Configured;
            }
            None => {
                error!("concentration_gauge_missing");
                self.gauge_state = GaugeLink::Missing;
            }
        }
    }

    fn push_gauge(&self, collaborators: &mut Collaborators<'_>) {
        if self.gauge_state != GaugeLink::Configured {
            return;
        }
        if let (Ok(meter), Some(gauge)) =
            (self.concentration.get(), collaborators.gauge.as_deref_mut())
        {
            meter.sync_gauge(gauge);
        }
    }

    fn apply_interaction(
        &mut self,
        target: EntityId,
        effects: &[InteractionEffect],
        collaborators: &mut Collaborators<'_>,
    ) {
        if self.game_over {
            debug!(target = target.0, "interaction_ignored_after_game_over");
            return;
        }

        info!(target = target.0, effects = effects.len(), "interaction_triggered");
        self.events
            .emit(SessionEvent::InteractionTriggered { target });

        for effect in effects {
            match effect {
                InteractionEffect::DrainConcentration => {
                    let depleted = self
                        .concentration
                        .get_mut()
                        .ok()
                        .and_then(ConcentrationMeter::decrease_on_interact);
                    self.note_concentration(depleted);
                }
                InteractionEffect::StartDialogue { node } => {
                    let meter = self.concentration.get_mut().ok();
                    match self
                        .bridge
                        .start_dialogue(&mut *collaborators.dialogue, meter, node)
                    {
                        Ok(depleted) => {
                            self.events
                                .emit(SessionEvent::DialogueRequested { node: node.clone() });
                            self.note_concentration(depleted);
                        }
                        Err(err) => {
                            warn!(node = %node, error = %err, "dialogue_refused");
                            self.events.emit(SessionEvent::DialogueRefused {
                                node: node.clone(),
                                reason: err.to_string(),
                            });
                        }
                    }
                }
                InteractionEffect::Note { message } => {
                    info!(target = target.0, message = %message, "interaction_note");
                    self.events.emit(SessionEvent::Note {
                        target,
                        message: message.clone(),
                    });
                }
            }
            if self.game_over {
                break;
            }
        }
    }

    fn note_concentration(&mut self, event: Option<ConcentrationEvent>) {
        let Some(ConcentrationEvent::GameOver) = event else {
            return;
        };
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.events.emit(SessionEvent::GameOver);
        info!(tick = self.tick_count, "game_over");
    }
}
