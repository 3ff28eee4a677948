use storyloom_core::{
    EditError, Engine, EngineError, Milestone, MilestoneError, MilestonePatch, TimeslotId,
};
use uuid::Uuid;

fn engine_with_timeslots(count: usize) -> (Engine, Vec<TimeslotId>) {
    let mut engine = Engine::default();
    let ids = (0..count)
        .map(|_| engine.append_timeslot().unwrap())
        .collect();
    (engine, ids)
}

fn ordered_names(engine: &Engine) -> Vec<String> {
    let project = engine.project();
    project
        .milestones()
        .ordered(project.timeslots())
        .into_iter()
        .map(|milestone| milestone.name.clone())
        .collect()
}

#[test]
fn milestones_order_by_the_timeslot_they_precede() {
    let (mut engine, slots) = engine_with_timeslots(4);
    engine
        .create_milestone(Milestone::new("Chapter 3", Some(slots[3])))
        .unwrap();
    engine
        .create_milestone(Milestone::new("Chapter 2", Some(slots[1])))
        .unwrap();
    engine.create_milestone(Milestone::new("Prologue", None)).unwrap();

    assert_eq!(
        ordered_names(&engine),
        vec!["Prologue", "Chapter 2", "Chapter 3"]
    );

    engine.move_timeslot(slots[3], 0).unwrap();
    assert_eq!(
        ordered_names(&engine),
        vec!["Prologue", "Chapter 3", "Chapter 2"]
    );
}

#[test]
fn section_lookup_returns_latest_milestone_at_or_before() {
    let (mut engine, slots) = engine_with_timeslots(4);
    engine.create_milestone(Milestone::new("Part I", None)).unwrap();
    engine
        .create_milestone(Milestone::new("Part II", Some(slots[2])))
        .unwrap();

    let project = engine.project();
    let name_at = |index| {
        project
            .milestones()
            .milestone_for_index(index, project.timeslots())
            .map(|milestone| milestone.name.as_str())
    };
    assert_eq!(name_at(0), Some("Part I"));
    assert_eq!(name_at(1), Some("Part I"));
    assert_eq!(name_at(2), Some("Part II"));
    assert_eq!(name_at(3), Some("Part II"));
}

#[test]
fn removing_a_timeslot_moves_milestones_to_its_successor() {
    let (mut engine, slots) = engine_with_timeslots(3);
    let interlude = engine
        .create_milestone(Milestone::new("Interlude", Some(slots[1])))
        .unwrap();

    engine.remove_timeslot(slots[1]).unwrap();
    let milestone = engine.project().milestones().get(interlude).unwrap();
    assert_eq!(milestone.timeslot_id, Some(slots[2]));

    assert!(engine.undo());
    let milestone = engine.project().milestones().get(interlude).unwrap();
    assert_eq!(milestone.timeslot_id, Some(slots[1]));
    assert_eq!(engine.project().timeslots().index_of(slots[1]), Some(1));
}

#[test]
fn removing_the_last_timeslot_leaves_its_milestone_last() {
    let (mut engine, slots) = engine_with_timeslots(2);
    let epilogue = engine
        .create_milestone(Milestone::new("Epilogue", Some(slots[1])))
        .unwrap();
    engine.create_milestone(Milestone::new("Opening", None)).unwrap();

    engine.remove_timeslot(slots[1]).unwrap();
    let project = engine.project();
    let milestone = project.milestones().get(epilogue).unwrap();
    assert_eq!(project.milestones().rank_of(milestone, project.timeslots()), None);
    assert_eq!(ordered_names(&engine), vec!["Opening", "Epilogue"]);
}

#[test]
fn edits_validate_names_and_anchors() {
    let (mut engine, slots) = engine_with_timeslots(1);
    let err = engine
        .create_milestone(Milestone::new("   ", None))
        .unwrap_err();
    assert_eq!(err, EngineError::Edit(EditError::Milestone(MilestoneError::BlankName)));

    let act = engine
        .create_milestone(Milestone::new("Act One", Some(slots[0])))
        .unwrap();
    let ghost = Uuid::new_v4();
    let err = engine
        .update_milestone(
            act,
            MilestonePatch {
                timeslot_id: Some(Some(ghost)),
                ..MilestonePatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Edit(EditError::Milestone(MilestoneError::UnknownTimeslot(ghost)))
    );

    engine
        .update_milestone(
            act,
            MilestonePatch {
                color: Some(Some("#224488".to_string())),
                export_as: Some(Some("part".to_string())),
                ..MilestonePatch::default()
            },
        )
        .unwrap();
    let milestone = engine.project().milestones().get(act).unwrap();
    assert_eq!(milestone.color.as_deref(), Some("#224488"));
    assert_eq!(milestone.export_as.as_deref(), Some("part"));
}

#[test]
fn delete_and_undo_keep_listing_position() {
    let (mut engine, slots) = engine_with_timeslots(2);
    let first = engine
        .create_milestone(Milestone::new("One", Some(slots[0])))
        .unwrap();
    engine
        .create_milestone(Milestone::new("Two", Some(slots[1])))
        .unwrap();

    engine.remove_milestone(first).unwrap();
    assert_eq!(engine.project().milestones().len(), 1);

    assert!(engine.undo());
    assert_eq!(engine.project().milestones().list()[0].id, first);
    assert_eq!(ordered_names(&engine), vec!["One", "Two"]);
}
