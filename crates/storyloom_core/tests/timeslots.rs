use serde_json::json;
use std::collections::HashSet;
use storyloom_core::{
    MutationPayload, Placement, PlacementLog, TimeslotId, TimeslotReferences, TimeslotRegistry,
};
use uuid::Uuid;

fn assert_consistent(registry: &TimeslotRegistry, expected: &[TimeslotId]) {
    assert_eq!(registry.order(), expected);
    assert_eq!(registry.len(), expected.len());
    let unique: HashSet<TimeslotId> = registry.order().iter().copied().collect();
    assert_eq!(unique.len(), expected.len());
    for (index, id) in expected.iter().enumerate() {
        assert_eq!(registry.index_of(*id), Some(index));
        assert_eq!(registry.id_at(index), Some(*id));
    }
}

#[test]
fn order_stays_consistent_through_mixed_edits() {
    let mut registry = TimeslotRegistry::new();
    let mut expected: Vec<TimeslotId> = Vec::new();

    for step in 0..60usize {
        let len = expected.len();
        match step % 3 {
            0 => {
                let index = if len == 0 { 0 } else { (step * 7) % len };
                let id = registry.create_after(index);
                let rank = (index + 1).min(len);
                expected.insert(rank, id);
            }
            1 => {
                let index = if len == 0 { 0 } else { (step * 5) % len };
                let id = registry.create_before(index);
                expected.insert(index.min(len), id);
            }
            _ => {
                let from = (step * 11) % len;
                let to = (step * 3) % len;
                let id = expected[from];
                let moved = registry.move_to_index(id, to);
                assert_eq!(moved, from != to);
                let id = expected.remove(from);
                expected.insert(to, id);
            }
        }
        assert_consistent(&registry, &expected);
    }
}

#[test]
fn create_after_first_shifts_later_timeslots() {
    let mut registry = TimeslotRegistry::new();
    let t1 = registry.create_at_end();
    let t2 = registry.create_at_end();
    let t3 = registry.create_at_end();

    let mut log = PlacementLog::new();
    let object_id = Uuid::new_v4();
    log.add(Placement::creation(object_id, t2)).unwrap();

    let inserted = registry.create_after(0);

    assert_eq!(registry.index_of(inserted), Some(1));
    assert_eq!(registry.index_of(t1), Some(0));
    assert_eq!(registry.index_of(t2), Some(2));
    assert_eq!(registry.index_of(t3), Some(3));
    let card = log.creation_for(object_id).unwrap();
    assert!(registry.contains(card.timeslot_id));
    assert_eq!(registry.index_of(card.timeslot_id), Some(2));
}

#[test]
fn move_keeps_identity_and_clamps() {
    let mut registry = TimeslotRegistry::new();
    let t1 = registry.create_at_end();
    let t2 = registry.create_at_end();
    let t3 = registry.create_at_end();

    assert!(registry.move_to_index(t1, 99));
    assert_eq!(registry.order(), &[t2, t3, t1]);
    assert!(!registry.move_to_index(t1, 2));
    assert!(!registry.move_to_index(Uuid::new_v4(), 0));
    assert!(registry.get(t1).is_some());
}

#[test]
fn remove_if_empty_refuses_referenced_timeslots() {
    let mut registry = TimeslotRegistry::new();
    let t1 = registry.create_at_end();
    let t2 = registry.create_at_end();
    let t3 = registry.create_at_end();

    let mut log = PlacementLog::new();
    let object_id = Uuid::new_v4();
    log.add(Placement::creation(object_id, t1)).unwrap();
    let mutation = log
        .add(Placement::mutation(
            object_id,
            t2,
            MutationPayload::new("status").with_change("status", json!("grey"), json!("white")),
        ))
        .unwrap();

    let refs: [&dyn TimeslotReferences; 1] = [&log];
    assert!(!registry.remove_if_empty(t1, &refs));
    assert!(!registry.remove_if_empty(t2, &refs));
    assert!(registry.remove_if_empty(t3, &refs));
    assert_eq!(registry.index_of(t3), None);

    log.remove(mutation.id).unwrap();
    let refs: [&dyn TimeslotReferences; 1] = [&log];
    assert!(registry.remove_if_empty(t2, &refs));
    assert_eq!(registry.index_of(t2), None);
    assert_eq!(registry.order(), &[t1]);
}

#[test]
fn removing_unknown_timeslot_is_refused() {
    let mut registry = TimeslotRegistry::new();
    registry.create_at_end();
    assert!(!registry.remove_if_empty(Uuid::new_v4(), &[]));
    assert_eq!(registry.len(), 1);
}
