// Registration table semantics: identity keys, no-op duplicates, ordering.

use projcast_core::{RegistrationTable, SurfaceId};

#[test]
fn fresh_ids_are_unique() {
    let a = SurfaceId::fresh();
    let b = SurfaceId::fresh();
    let c = SurfaceId::fresh();
    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_ne!(a, c);
}

#[test]
fn insert_then_remove_round_trips_the_record() {
    let mut table: RegistrationTable<&'static str> = RegistrationTable::new();
    let id = SurfaceId::fresh();
    assert!(table.insert(id, "wall"));
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(id), Some(&"wall"));
    assert_eq!(table.remove(id), Some("wall"));
    assert!(table.is_empty());
}

#[test]
fn duplicate_insert_is_a_noop() {
    let mut table = RegistrationTable::new();
    let id = SurfaceId::fresh();
    assert!(table.insert(id, 1u32));
    assert!(!table.insert(id, 2u32));
    assert_eq!(table.len(), 1);
    // The original record survives; the duplicate was dropped.
    assert_eq!(table.get(id), Some(&1));
}

#[test]
fn removing_unknown_id_is_a_noop() {
    let mut table: RegistrationTable<u32> = RegistrationTable::new();
    let registered = SurfaceId::fresh();
    let stranger = SurfaceId::fresh();
    table.insert(registered, 7);
    assert_eq!(table.remove(stranger), None);
    assert_eq!(table.len(), 1);
}

#[test]
fn removal_preserves_insertion_order_of_the_rest() {
    let mut table = RegistrationTable::new();
    let ids: Vec<SurfaceId> = (0..4).map(|_| SurfaceId::fresh()).collect();
    for (i, id) in ids.iter().enumerate() {
        table.insert(*id, i);
    }
    table.remove(ids[1]);
    let remaining: Vec<usize> = table.iter().map(|(_, v)| *v).collect();
    assert_eq!(remaining, vec![0, 2, 3]);
}

#[test]
fn drain_empties_the_table() {
    let mut table = RegistrationTable::new();
    for i in 0..3 {
        table.insert(SurfaceId::fresh(), i);
    }
    let drained: Vec<i32> = table.drain().map(|(_, v)| v).collect();
    assert_eq!(drained, vec![0, 1, 2]);
    assert!(table.is_empty());
}
