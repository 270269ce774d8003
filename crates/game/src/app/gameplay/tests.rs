    use std::time::Duration;

    use super::*;
    use serde_json::json;
    use vigil_engine::{run_headless, ClockMode, LoopConfig, StopReason};

    const DT: f32 = 1.0 / 60.0;

    fn simulated_config(max_ticks: u64) -> LoopConfig {
        LoopConfig {
            max_ticks: Some(max_ticks),
            clock: ClockMode::Simulated {
                frame_delta: Duration::from_secs_f64(1.0 / 60.0),
            },
            ..LoopConfig::default()
        }
    }

    fn embedded_def() -> SceneDef {
        load_scene_def(&SceneSource::Embedded).expect("embedded scene")
    }

    fn parse_value(value: serde_json::Value) -> SceneDefResult<SceneDef> {
        parse_scene_def(&value.to_string(), "<test>")
    }

    fn single_book_scene(config: serde_json::Value, script: serde_json::Value) -> serde_json::Value {
        json!({
            "name": "Single Book",
            "config": config,
            "materials": [{ "name": "paper" }],
            "player": { "position": [0.0, 0.0, 0.0] },
            "entities": [{
                "name": "book",
                "position": [0.0, 1.6, -1.5],
                "materials": ["paper"],
                "collider": { "shape": "sphere", "radius": 0.3 },
                "interactable": {
                    "highlight": { "kind": "emissive", "color": [1.0, 1.0, 1.0] },
                    "on_interact": [{ "effect": "drain_concentration" }]
                }
            }],
            "input_script": script
        })
    }

    fn three_step_runner(hold_ticks: u32) -> ScriptedDialogueRunner {
        let mut nodes = HashMap::new();
        nodes.insert(
            "intro".to_string(),
            (
                hold_ticks,
                vec![
                    DialogueStepDef::Line {
                        speaker: "Tutor".to_string(),
                        text: "Hello.".to_string(),
                    },
                    DialogueStepDef::Options {
                        choices: vec!["Stay".to_string(), "Leave".to_string()],
                    },
                    DialogueStepDef::Line {
                        speaker: "Tutor".to_string(),
                        text: "Good.".to_string(),
                    },
                ],
            ),
        );
        ScriptedDialogueRunner::new(nodes)
    }

    #[test]
    fn embedded_scene_parses_and_validates() {
        let def = embedded_def();
        assert_eq!(def.name(), "Study Room");
        assert_eq!(def.entities.len(), 4);
        assert_eq!(def.dialogue.len(), 1);
        assert_eq!(def.dialogue[0].steps.len(), 4);
        assert!((def.config().look.sensitivity - 100.0).abs() < f32::EPSILON);
        assert!(def.placed_concentration.is_empty());
    }

    #[test]
    fn parse_error_names_the_failing_field() {
        let err = parse_value(json!({
            "name": "Broken",
            "player": { "position": "up" }
        }))
        .expect_err("position must be a vector");

        match &err {
            SceneDefError::Parse { path, .. } => assert_eq!(path, "player.position"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("at player.position"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_value(json!({
            "name": "Typo",
            "player": { "position": [0.0, 0.0, 0.0] },
            "entites": []
        }))
        .expect_err("misspelled section");
        assert!(matches!(err, SceneDefError::Parse { .. }));
    }

    #[test]
    fn scene_file_loads_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("study.json");
        fs::write(&path, DEFAULT_SCENE_JSON).expect("write scene");

        let def = load_scene_def(&SceneSource::File(path)).expect("file scene");
        assert_eq!(def.name(), "Study Room");
    }

    #[test]
    fn missing_scene_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.json");

        let err = load_scene_def(&SceneSource::File(path.clone())).expect_err("missing file");
        assert!(matches!(err, SceneDefError::Read { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn validation_rejects_dangling_references() {
        let base = || {
            json!({
                "name": "Refs",
                "materials": [{ "name": "paper" }],
                "player": { "position": [0.0, 0.0, 0.0] },
                "entities": [{ "name": "desk", "position": [0.0, 0.0, -1.0] }]
            })
        };

        let mut unknown_material = base();
        unknown_material["entities"][0]["materials"] = json!(["velvet"]);
        let err = parse_value(unknown_material).expect_err("unknown material");
        assert!(err.to_string().contains("unknown material 'velvet'"));

        let mut unknown_parent = base();
        unknown_parent["entities"][0]["parent"] = json!("ceiling");
        let err = parse_value(unknown_parent).expect_err("unknown parent");
        assert!(err.to_string().contains("parent 'ceiling'"));

        let mut duplicate = base();
        duplicate["entities"] = json!([
            { "name": "desk", "position": [0.0, 0.0, -1.0] },
            { "name": "desk", "position": [1.0, 0.0, -1.0] }
        ]);
        let err = parse_value(duplicate).expect_err("duplicate entity");
        assert!(err.to_string().contains("duplicate entity name 'desk'"));

        let mut unknown_node = base();
        unknown_node["entities"][0]["interactable"] =
            json!({ "on_interact": [{ "effect": "start_dialogue", "node": "ghost" }] });
        let err = parse_value(unknown_node).expect_err("unknown node");
        assert!(err.to_string().contains("unknown dialogue node 'ghost'"));

        let mut unknown_character = base();
        unknown_character["characters"] = json!([{ "speaker": "Tutor", "entity": "tutor" }]);
        let err = parse_value(unknown_character).expect_err("unknown character entity");
        assert!(err.to_string().contains("character 'Tutor'"));
    }

    #[test]
    fn validation_rejects_invalid_config() {
        let err = parse_value(single_book_scene(
            json!({ "concentration": { "max": 0.0 } }),
            json!([]),
        ))
        .expect_err("zero max");
        assert!(matches!(err, SceneDefError::Invalid(_)));
        assert!(err.to_string().contains("concentration.max"));
    }

    #[test]
    fn validation_rejects_invalid_placed_concentration() {
        let mut raw = single_book_scene(json!({}), json!([]));
        raw["placed_concentration"] = json!([{ "max": 50.0 }, { "max": -1.0 }]);
        let err = parse_value(raw).expect_err("negative placed max");
        assert!(matches!(err, SceneDefError::Invalid(_)));
        let message = err.to_string();
        assert!(message.contains("placed_concentration[1]"), "{message}");
        assert!(message.contains("concentration.max"), "{message}");

        let mut raw = single_book_scene(json!({}), json!([]));
        raw["placed_concentration"] = json!([{ "decrease_per_interaction": -5.0 }]);
        let err = parse_value(raw).expect_err("negative placed charge");
        assert!(err.to_string().contains("placed_concentration[0]"));
    }

    #[test]
    fn build_spawns_rig_colliders_and_interactables() {
        let def = embedded_def();
        let mut world = SceneWorld::default();
        let built = def.build(&mut world).expect("build");

        // Player body and camera plus the four declared entities.
        assert_eq!(world.entity_count(), 6);
        assert_eq!(built.colliders.len(), 3);
        assert_eq!(built.rig.interactables.len(), 3);
        assert_eq!(built.rig.characters.len(), 1);
        assert!(world.layers().name_to_layer("Outlined Object").is_some());

        let camera = world.world_position(built.rig.viewpoint).expect("camera");
        assert!((camera - Vec3::new(0.0, 1.6, 0.0)).length() < 1e-5);

        let tutor = world.find_by_name("tutor").expect("tutor");
        let head = world.find_by_name("tutor_head").expect("head");
        assert_eq!(world.find_entity(head).and_then(|e| e.parent()), Some(tutor));
        let head_position = world.world_position(head).expect("head position");
        assert!((head_position - Vec3::new(2.5, 1.7, 0.0)).length() < 1e-4);

        let target = built.rig.characters.lookup("Tutor").expect("tutor target");
        assert_eq!(target.target, tutor);
    }

    #[test]
    fn scripted_runner_walks_lines_options_and_completion() {
        let mut runner = three_step_runner(2);
        assert!(!runner.is_running());
        runner.start_dialogue("intro").expect("start");
        assert!(runner.is_running());
        assert_eq!(runner.active_node(), Some("intro"));

        let first = runner.poll_events();
        assert_eq!(
            first,
            vec![
                DialogueEvent::Started {
                    node: "intro".to_string()
                },
                DialogueEvent::Line {
                    speaker: "Tutor".to_string(),
                    text: "Hello.".to_string()
                },
            ]
        );
        assert!(runner.poll_events().is_empty());

        let options = runner.poll_events();
        assert!(matches!(options.as_slice(), [DialogueEvent::Options(list)] if list.len() == 2));
        // Options hold until a choice arrives.
        assert!(runner.poll_events().is_empty());
        runner.choose_option(None);
        assert_eq!(runner.choices(), &[("intro".to_string(), 0)]);

        let last_line = runner.poll_events();
        assert!(matches!(last_line.as_slice(), [DialogueEvent::Line { text, .. }] if text == "Good."));
        assert!(runner.poll_events().is_empty());
        assert_eq!(runner.poll_events(), vec![DialogueEvent::Completed]);
        assert!(!runner.is_running());
        assert!(runner.poll_events().is_empty());
    }

    #[test]
    fn scripted_runner_honours_explicit_choice() {
        let mut runner = three_step_runner(1);
        runner.start_dialogue("intro").expect("start");
        runner.poll_events();
        runner.poll_events();
        runner.choose_option(Some(1));
        assert_eq!(runner.choices(), &[("intro".to_string(), 1)]);
    }

    #[test]
    fn scripted_runner_refuses_unknown_and_concurrent_nodes() {
        let mut runner = three_step_runner(1);
        assert_eq!(
            runner.start_dialogue("outro"),
            Err(DialogueError::UnknownNode("outro".to_string()))
        );
        runner.start_dialogue("intro").expect("start");
        assert_eq!(
            runner.start_dialogue("intro"),
            Err(DialogueError::AlreadyRunning {
                requested: "intro".to_string()
            })
        );
    }

    #[test]
    fn scripted_input_holds_look_and_edges_interact() {
        let mut input = ScriptedInput::new(vec![
            ScriptStepDef {
                tick: 2,
                look: Some(Vec2::ZERO),
                interact: Some(false),
                quit: false,
            },
            ScriptStepDef {
                tick: 0,
                look: Some(Vec2::new(1.0, 0.0)),
                interact: Some(true),
                quit: false,
            },
            ScriptStepDef {
                tick: 3,
                look: None,
                interact: None,
                quit: true,
            },
        ]);
        let mut collector = InputCollector::new();

        input.pump(0, &mut collector);
        let snapshot = collector.snapshot_for_tick();
        assert!(snapshot.interact_pressed());
        assert_eq!(snapshot.look_delta(), Vec2::new(1.0, 0.0));

        input.pump(1, &mut collector);
        let snapshot = collector.snapshot_for_tick();
        assert!(!snapshot.interact_pressed());
        assert_eq!(snapshot.look_delta(), Vec2::new(1.0, 0.0));

        input.pump(2, &mut collector);
        let snapshot = collector.snapshot_for_tick();
        assert_eq!(snapshot.look_delta(), Vec2::ZERO);
        assert!(!snapshot.quit_requested());
        assert_eq!(input.remaining_steps(), 1);

        input.pump(3, &mut collector);
        assert!(collector.snapshot_for_tick().quit_requested());
        assert_eq!(input.remaining_steps(), 0);
    }

    #[test]
    fn study_scene_demo_runs_to_scripted_quit() {
        let def = embedded_def();
        let mut input = def.input_script();
        let mut scene = StudyScene::new(def);

        let summary = run_headless(simulated_config(2_000), &mut scene, &mut input).expect("run");
        assert_eq!(summary.stop_reason, StopReason::QuitRequested);
        assert_eq!(summary.ticks, 600);
        assert!(scene.load_error().is_none());

        let report = scene.report();
        assert_eq!(report.ticks, 600);
        // Textbook, tutor, window.
        assert_eq!(report.interactions, 3);
        assert_eq!(report.notes, 2);
        assert_eq!(report.dialogue_requested, 1);
        assert_eq!(report.dialogue_refused, 0);
        assert_eq!(report.dialogue_started, 1);
        assert_eq!(report.dialogue_completed, 1);
        assert_eq!(report.dialogue_lines, 3);
        // Narration after the tutor spoke, then the unlock.
        assert_eq!(report.orientation_resyncs, 2);
        assert!(report.target_changes >= 3);
        assert!(!report.game_over);

        // Three interaction charges plus ten seconds of drain.
        let concentration = report.concentration.expect("concentration");
        assert!((concentration - 80.0).abs() < 0.01, "{concentration}");
        assert!((report.gauge.max - 100.0).abs() < f32::EPSILON);
        assert!((report.gauge.value - concentration).abs() < 1e-4);
        assert!(!report.prompt.is_visible());
        assert!(report.prompt.show_count() >= 3);

        assert_eq!(scene.dialogue().choices(), &[("tutor_intro".to_string(), 0)]);
        assert!(!scene.dialogue().is_running());
    }

    #[test]
    fn depleted_concentration_quits_the_scene() {
        let raw = single_book_scene(
            json!({
                "concentration": {
                    "max": 10.0,
                    "decrease_per_second": 0.0,
                    "decrease_per_interaction": 6.0
                }
            }),
            json!([
                { "tick": 1, "interact": true },
                { "tick": 2, "interact": false },
                { "tick": 3, "interact": true },
                { "tick": 4, "interact": false },
                { "tick": 50, "quit": true }
            ]),
        );
        let def = parse_value(raw).expect("scene");
        let mut input = def.input_script();
        let mut scene = StudyScene::new(def);

        let summary = run_headless(simulated_config(100), &mut scene, &mut input).expect("run");
        assert_eq!(summary.stop_reason, StopReason::SceneQuit);
        assert_eq!(summary.ticks, 4);

        let report = scene.report();
        assert!(report.game_over);
        assert_eq!(report.interactions, 2);
        assert_eq!(report.concentration, Some(0.0));
    }

    #[test]
    fn placed_concentration_manager_wins_over_config() {
        let mut raw = single_book_scene(json!({}), json!([]));
        raw["placed_concentration"] = json!([{ "max": 50.0, "decrease_per_second": 0.0 }]);
        let def = parse_value(raw).expect("scene");
        let mut input = def.input_script();
        let mut scene = StudyScene::new(def);

        let summary = run_headless(simulated_config(3), &mut scene, &mut input).expect("run");
        assert_eq!(summary.stop_reason, StopReason::TickLimit);
        assert_eq!(scene.report().concentration, Some(50.0));
        assert!((scene.report().gauge.max - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn debug_title_reports_concentration_once_ticking() {
        let mut world = SceneWorld::default();
        let mut scene = StudyScene::new(embedded_def());
        scene.load(&mut world);
        assert_eq!(
            scene.debug_title(&world).as_deref(),
            Some("Study Room | concentration -")
        );

        scene.update(DT, &InputSnapshot::empty(), &mut world);
        assert_eq!(
            scene.debug_title(&world).as_deref(),
            Some("Study Room | concentration 100/100")
        );
    }

    #[test]
    fn yaw_rotation_turns_right_for_positive_degrees() {
        let forward = yaw_rotation(90.0) * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-5);
        assert_eq!(yaw_rotation(0.0), Quat::IDENTITY);
    }
