use super::*;
use crate::role::{CurtainState, MuralState, RoleState};
use crate::step_kind::PauseKind;

fn stage_script() -> Script {
    let mut script = Script::new();
    script.add_role(Role::stage("stage")).unwrap();
    script
}

fn push(script: &mut Script, role: &str, kind: &str, args: Vec<ArgValue>) {
    let step = script.make_step(role, kind, args).unwrap();
    script.push_step(step).unwrap();
}

/// 舞台、幕布、壁画、对话框和一个角色组成的剧本
fn theatre() -> Script {
    let mut script = Script::new();
    script.add_role(Role::stage("stage")).unwrap();
    script.add_role(Role::curtain("curtain")).unwrap();
    script.add_role(Role::mural("mural")).unwrap();
    let dialogue = script.add_role(Role::dialogue_box("box")).unwrap();
    script
        .add_role(Role::character("alice", "Alice", Some(dialogue)))
        .unwrap();

    push(&mut script, "stage", "bookmark", vec!["开场".into()]);
    push(&mut script, "mural", "show", vec!["第一章".into()]);
    push(&mut script, "stage", "pause", vec![]);
    push(&mut script, "curtain", "set_color", vec!["#202020".into()]);
    push(&mut script, "curtain", "lower", vec![]);
    push(&mut script, "alice", "say", vec!["早上好".into()]);
    push(&mut script, "stage", "bookmark", vec!["午后".into()]);
    push(&mut script, "box", "say", vec!["天色渐暗".into()]);
    push(&mut script, "stage", "wait", vec![ArgValue::from(1.5)]);
    push(&mut script, "mural", "show", vec!["终".into()]);
    script
}

fn spans(script: &Script) -> Vec<(usize, usize, PauseKind)> {
    script
        .beats()
        .iter()
        .map(|b| (b.first_step_index(), b.last_step_index(), b.pause()))
        .collect()
}

fn fresh_rebuild(script: &Script) -> Script {
    let mut fresh = script.clone();
    fresh.rebuild().unwrap();
    fresh
}

fn assert_same_compilation(left: &Script, right: &Script) {
    assert_eq!(left.beats(), right.beats());
    assert_eq!(left.bookmarks(), right.bookmarks());
    assert_eq!(left.steps(), right.steps());
}

#[test]
fn test_worked_example() {
    let mut script = stage_script();
    push(&mut script, "stage", "pause", vec![]);
    push(&mut script, "stage", "bookmark", vec!["chapter1".into()]);
    push(&mut script, "stage", "pause", vec![]);

    assert_eq!(
        spans(&script),
        vec![(0, 0, PauseKind::Hold), (1, 2, PauseKind::Hold)]
    );
    assert_eq!(
        script.bookmarks(),
        &[Bookmark {
            beat_index: 1,
            label: "chapter1".to_string(),
        }]
    );
    let beat_indices: Vec<_> = script.steps().iter().map(Step::beat_index).collect();
    assert_eq!(beat_indices, vec![Some(0), Some(1), Some(1)]);
    assert_eq!(script.find_bookmark("chapter1").unwrap().beat_index, 1);
    assert_eq!(script.beat_of_step(2), Some(1));
}

#[test]
fn test_empty_script_has_no_beats() {
    let mut script = stage_script();
    assert!(script.beats().is_empty());
    assert!(script.bookmarks().is_empty());

    push(&mut script, "stage", "pause", vec![]);
    let step = script.step(0).cloned().unwrap();
    script.delete_step(&step).unwrap();
    assert!(script.is_empty());
    assert!(script.beats().is_empty());
}

#[test]
fn test_trailing_beat_without_pause() {
    let mut script = stage_script();
    push(&mut script, "stage", "bookmark", vec!["a".into()]);
    assert_eq!(spans(&script), vec![(0, 0, PauseKind::None)]);

    push(&mut script, "stage", "pause", vec![]);
    push(&mut script, "stage", "bookmark", vec!["b".into()]);
    assert_eq!(
        spans(&script),
        vec![(0, 1, PauseKind::Hold), (2, 2, PauseKind::None)]
    );
}

#[test]
fn test_beat_count_matches_pauses() {
    let script = theatre();
    let pauses = script
        .steps()
        .iter()
        .filter(|s| s.pause().is_pause())
        .count();
    let last_pauses = script.steps().last().is_some_and(|s| s.pause().is_pause());
    let expected = pauses + usize::from(!last_pauses);
    assert_eq!(script.beats().len(), expected);

    // Beat 区间首尾相接并覆盖全部步骤
    let mut next = 0;
    for beat in script.beats() {
        assert_eq!(beat.first_step_index(), next);
        assert!(beat.last_step_index() >= beat.first_step_index());
        next = beat.last_step_index() + 1;
    }
    assert_eq!(next, script.len());

    for (index, step) in script.steps().iter().enumerate() {
        assert_eq!(step.index(), Some(index));
        let beat = &script.beats()[step.beat_index().unwrap()];
        assert!(beat.step_range().contains(&index));
    }
}

#[test]
fn test_compiled_spans_snapshot() {
    let script = theatre();
    insta::assert_debug_snapshot!(spans(&script), @r"
    [
        (
            0,
            2,
            Hold,
        ),
        (
            3,
            4,
            AutoWait,
        ),
        (
            5,
            5,
            Hold,
        ),
        (
            6,
            7,
            Hold,
        ),
        (
            8,
            8,
            AutoWait,
        ),
        (
            9,
            9,
            None,
        ),
    ]
    ");
}

#[test]
fn test_rebuild_is_idempotent() {
    let mut script = theatre();
    let before = script.clone();
    script.rebuild().unwrap();
    assert_same_compilation(&script, &before);
    script.rebuild().unwrap();
    assert_same_compilation(&script, &before);
}

#[test]
fn test_resume_from_any_step_matches_full_rebuild() {
    let script = theatre();
    for from_step in 0..=script.len() + 1 {
        let mut resumed = script.clone();
        resumed.refresh_beats(from_step).unwrap();
        assert_same_compilation(&resumed, &script);
    }
}

#[test]
fn test_reset_and_persist_rules() {
    let script = theatre();
    let curtain = script.role_id("curtain").unwrap();
    let mural = script.role_id("mural").unwrap();
    let dialogue = script.role_id("box").unwrap();

    // Beat 1 放下幕布并设置颜色
    assert_eq!(
        script.beats()[1].state(curtain),
        Some(&RoleState::Curtain(CurtainState {
            lowered: true,
            color: "#202020".to_string(),
        }))
    );
    // 放下状态不跨 Beat，颜色保留
    assert_eq!(
        script.beats()[2].state(curtain),
        Some(&RoleState::Curtain(CurtainState {
            lowered: false,
            color: "#202020".to_string(),
        }))
    );
    // 壁画的可见性在下一个 Beat 被重置，文字保留
    assert_eq!(
        script.beats()[1].state(mural),
        Some(&RoleState::Mural(MuralState {
            visible: false,
            text: "第一章".to_string(),
        }))
    );

    let RoleState::DialogueBox(spoken) = &script.beats()[2].states()[dialogue.index()] else {
        panic!("expected dialogue box state");
    };
    assert_eq!(spoken.speaker.as_deref(), Some("Alice"));
    assert_eq!(spoken.phrase, "早上好");

    let Some(RoleState::DialogueBox(later)) = script.beats()[3].state(dialogue) else {
        panic!("expected dialogue box state");
    };
    assert_eq!(later.speaker, None);
    assert_eq!(later.phrase, "天色渐暗");
}

#[test]
fn test_unknown_step_kind() {
    let script = stage_script();
    let err = script.make_step("stage", "lower", vec![]).unwrap_err();
    assert_eq!(
        err,
        ScriptError::UnknownStepKind {
            role_type: RoleType::Stage,
            kind: "lower".to_string(),
        }
    );
    assert!(matches!(
        script.make_step("nobody", "pause", vec![]),
        Err(ScriptError::UnknownRole { .. })
    ));
}

#[test]
fn test_stale_and_foreign_steps_are_rejected() {
    let mut script = theatre();
    let mut other = theatre();

    // 未插入的步骤
    let detached = script.make_step("stage", "pause", vec![]).unwrap();
    assert_eq!(
        script.delete_step(&detached),
        Err(ScriptError::OwnershipViolation { index: None })
    );

    // 另一个剧本中位置相同但内容不同的步骤
    let replacement = other
        .make_step("mural", "show", vec![ArgValue::text("别处")])
        .unwrap();
    let target = other.step(1).cloned().unwrap();
    other.update_step(&target, replacement).unwrap();
    let foreign = other.step(1).cloned().unwrap();
    assert_eq!(
        script.delete_step(&foreign),
        Err(ScriptError::OwnershipViolation { index: Some(1) })
    );

    // 删除后失效的旧副本
    let stale = script.step(2).cloned().unwrap();
    script.delete_step(&stale).unwrap();
    let stale_again = stale.clone();
    assert!(matches!(
        script.delete_step(&stale_again),
        Err(ScriptError::OwnershipViolation { .. })
    ));
}

#[test]
fn test_insert_step_matches_fresh_rebuild() {
    let mut script = theatre();
    let step = script.make_step("stage", "pause", vec![]).unwrap();
    script.insert_step(4, step).unwrap();

    assert_eq!(script.len(), 11);
    assert_eq!(script.step(4).map(Step::kind_name), Some("pause"));
    assert_same_compilation(&script, &fresh_rebuild(&script));

    let step = script.make_step("stage", "pause", vec![]).unwrap();
    assert_eq!(
        script.insert_step(99, step),
        Err(ScriptError::InvalidIndex { index: 99, len: 11 })
    );
}

#[test]
fn test_delete_step_matches_fresh_rebuild() {
    let mut script = theatre();
    let target = script.step(5).cloned().unwrap();
    let removed = script.delete_step(&target).unwrap();

    assert_eq!(removed.kind_name(), "say");
    assert_eq!(removed.index(), None);
    assert_eq!(removed.beat_index(), None);
    assert_eq!(script.len(), 9);
    assert_same_compilation(&script, &fresh_rebuild(&script));
}

#[test]
fn test_update_steps_matches_fresh_rebuild() {
    let mut script = theatre();
    let first = script.step(7).cloned().unwrap();
    let second = script.step(2).cloned().unwrap();
    let updates = vec![
        (first, script.make_step("stage", "pause", vec![]).unwrap()),
        (
            second,
            script
                .make_step("stage", "bookmark", vec![ArgValue::text("中途")])
                .unwrap(),
        ),
    ];
    script.update_steps(updates).unwrap();

    assert_eq!(script.step(2).and_then(Step::bookmark_label), Some("中途"));
    assert_eq!(script.step(7).map(Step::pause), Some(PauseKind::Hold));
    assert_same_compilation(&script, &fresh_rebuild(&script));
    assert_eq!(script.bookmarks().len(), 3);
}

#[test]
fn test_failed_compilation_rolls_back() {
    let mut script = stage_script();
    script
        .add_role(Role::character("bob", "Bob", None))
        .unwrap();
    push(&mut script, "stage", "pause", vec![]);
    let before = script.clone();

    let step = script
        .make_step("bob", "say", vec![ArgValue::text("……")])
        .unwrap();
    let err = script.push_step(step).unwrap_err();
    assert!(matches!(err, ScriptError::Compilation { step_index: 1, .. }));
    assert_same_compilation(&script, &before);
    assert_eq!(script.len(), 1);
}

#[test]
fn test_add_role_mid_script() {
    let mut script = theatre();
    let id = script.add_role(Role::curtain("fade")).unwrap();

    for beat in script.beats() {
        assert_eq!(beat.states().len(), script.roles().len());
        assert_eq!(
            beat.state(id),
            Some(&script.roles()[id.index()].generate_initial_state())
        );
    }

    assert_eq!(
        script.add_role(Role::mural("fade")),
        Err(ScriptError::DuplicateRole {
            name: "fade".to_string(),
        })
    );
    let stage = script.role_id("stage").unwrap();
    assert!(matches!(
        script.add_role(Role::character("carol", "Carol", Some(stage))),
        Err(ScriptError::InvalidRoleReference { .. })
    ));
}

#[test]
fn test_step_for_replaced_role_is_rejected() {
    let mut script = stage_script();
    let mut other = Script::new();
    other.add_role(Role::mural("stage")).unwrap();
    let step = other
        .make_step("stage", "show", vec![ArgValue::text("x")])
        .unwrap();

    assert_eq!(
        script.push_step(step),
        Err(ScriptError::UnknownRole {
            name: "stage".to_string(),
        })
    );
}
