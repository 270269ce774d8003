/// Running totals for one scene lifetime, read back after the loop exits.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SceneReport {
    pub(crate) ticks: u64,
    pub(crate) target_changes: u32,
    pub(crate) interactions: u32,
    pub(crate) notes: u32,
    pub(crate) dialogue_requested: u32,
    pub(crate) dialogue_refused: u32,
    pub(crate) dialogue_started: u32,
    pub(crate) dialogue_completed: u32,
    pub(crate) dialogue_lines: u32,
    pub(crate) orientation_resyncs: u32,
    pub(crate) concentration: Option<f32>,
    pub(crate) game_over: bool,
    pub(crate) gauge: GaugeState,
    pub(crate) prompt: PromptState,
}

impl SceneReport {
    fn absorb(&mut self, counts: SessionEventCounts) {
        self.target_changes += counts.target_changed;
        self.interactions += counts.interaction_triggered;
        self.notes += counts.note;
        self.dialogue_requested += counts.dialogue_requested;
        self.dialogue_refused += counts.dialogue_refused;
        self.dialogue_started += counts.dialogue_started;
        self.dialogue_completed += counts.dialogue_completed;
        self.game_over |= counts.game_over > 0;
    }
}

#[derive(Debug)]
pub(crate) struct StudyScene {
    def: SceneDef,
    session: Option<GameSession>,
    colliders: ColliderSet,
    dialogue: ScriptedDialogueRunner,
    prompt: PromptState,
    gauge: GaugeState,
    report: SceneReport,
    load_error: Option<String>,
}

impl StudyScene {
    pub(crate) fn new(def: SceneDef) -> Self {
        let dialogue = def.dialogue_runner();
        Self {
            def,
            session: None,
            colliders: ColliderSet::default(),
            dialogue,
            prompt: PromptState::default(),
            gauge: GaugeState::default(),
            report: SceneReport::default(),
            load_error: None,
        }
    }

    pub(crate) fn report(&self) -> &SceneReport {
        &self.report
    }

    pub(crate) fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub(crate) fn dialogue(&self) -> &ScriptedDialogueRunner {
        &self.dialogue
    }

    fn pump_dialogue(&mut self, world: &mut SceneWorld) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for event in self.dialogue.poll_events() {
            if matches!(event, DialogueEvent::Line { .. }) {
                self.report.dialogue_lines += 1;
            }
            let selection = session.dispatch_dialogue_event(&event, world);
            if matches!(event, DialogueEvent::Options(_)) {
                self.dialogue.choose_option(selection);
            }
        }
    }

    fn record(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        self.report.ticks = session.tick_count();
        self.report.absorb(session.events().last_tick_counts());
        if let Ok(meter) = session.concentration() {
            self.report.concentration = Some(meter.value());
        }
        if let Ok(mode) = session.mode() {
            self.report.orientation_resyncs = mode.resync_count();
        }
    }
}

impl Scene for StudyScene {
    fn load(&mut self, world: &mut SceneWorld) {
        let built = match self.def.build(world) {
            Ok(built) => built,
            Err(err) => {
                error!(scene = %self.def.name(), error = %err, "scene_load_failed");
                self.load_error = Some(err.to_string());
                return;
            }
        };
        self.colliders = built.colliders;

        let mut session = GameSession::new(self.def.config(), built.rig);
        if let Err(err) =
            session.install_placed_managers(Vec::new(), self.def.placed_concentration_meters())
        {
            error!(error = %err, "placed_managers_rejected");
        }
        self.session = Some(session);
        info!(scene = %self.def.name(), "study_scene_loaded");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let Some(session) = self.session.as_mut() else {
            return SceneCommand::Quit;
        };
        let mut collaborators = Collaborators {
            ray_caster: &self.colliders,
            prompt: &mut self.prompt,
            gauge: Some(&mut self.gauge),
            dialogue: &mut self.dialogue,
        };
        session.tick(fixed_dt_seconds, input, world, &mut collaborators);
        let game_over = session.is_game_over();

        self.record();
        self.pump_dialogue(world);

        if game_over {
            info!(tick = self.report.ticks, "study_scene_game_over");
            SceneCommand::Quit
        } else {
            SceneCommand::None
        }
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        // Dialogue callbacks after the last tick never reached a rollover.
        for event in session.events().iter_emitted_so_far() {
            match event.kind() {
                SessionEventKind::DialogueStarted => self.report.dialogue_started += 1,
                SessionEventKind::DialogueCompleted => self.report.dialogue_completed += 1,
                _ => {}
            }
        }
        if let Ok(mode) = session.mode() {
            self.report.orientation_resyncs = mode.resync_count();
        }
        session.unload(world, &mut self.prompt);
        session.shutdown();
        self.report.gauge = self.gauge;
        self.report.prompt = self.prompt.clone();
        info!(
            ticks = self.report.ticks,
            interactions = self.report.interactions,
            dialogue_completed = self.report.dialogue_completed,
            concentration = self.report.concentration.unwrap_or(0.0),
            game_over = self.report.game_over,
            "study_scene_unloaded"
        );
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let concentration = self
            .session
            .as_ref()
            .and_then(|session| session.concentration().ok())
            .map(|meter| format!("{:.0}/{:.0}", meter.value(), meter.max()))
            .unwrap_or_else(|| "-".to_string());
        Some(format!(
            "{} | concentration {concentration}",
            self.def.name()
        ))
    }
}
