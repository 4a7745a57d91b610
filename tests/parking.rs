//! Two unrelated record kinds indexed side by side: integer-keyed parking
//! slots and string-keyed vehicles.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::TryReserveError;
use std::rc::Rc;

use bplus_index::{BPlusIndex, Capabilities, IndexError, Keyed, NaturalOrder};
use pretty_assertions::assert_eq;

// ─── Record kinds ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
struct Slot {
    id: u32,
    vacant: bool,
    occupancies: u32,
    revenue: u32,
}

impl Slot {
    fn new(id: u32) -> Self {
        Slot {
            id,
            vacant: true,
            occupancies: 0,
            revenue: 0,
        }
    }
}

impl Keyed for Slot {
    type Key = u32;

    fn key(&self) -> &u32 {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Vehicle {
    plate: String,
    owner: String,
    visits: u32,
    slot: Option<u32>,
}

impl Vehicle {
    fn new(plate: &str, owner: &str) -> Self {
        Vehicle {
            plate: plate.to_owned(),
            owner: owner.to_owned(),
            visits: 0,
            slot: None,
        }
    }
}

/// Vehicles keyed by plate, compared without regard to ASCII case, with
/// release counters.
#[derive(Clone, Default)]
struct ByPlate {
    released_records: Rc<Cell<usize>>,
    released_keys: Rc<Cell<usize>>,
    copies: Rc<Cell<usize>>,
}

fn fold(plate: &str) -> impl Iterator<Item = u8> + '_ {
    plate.bytes().map(|b| b.to_ascii_uppercase())
}

impl Capabilities for ByPlate {
    type Key = String;
    type Record = Vehicle;

    fn compare_key_to_record(&self, key: &String, record: &Vehicle) -> Ordering {
        fold(key).cmp(fold(&record.plate))
    }

    fn compare_keys(&self, a: &String, b: &String) -> Ordering {
        fold(a).cmp(fold(b))
    }

    fn key_of<'r>(&self, record: &'r Vehicle) -> &'r String {
        &record.plate
    }

    fn duplicate_key(&self, key: &String) -> Result<String, TryReserveError> {
        let mut copy = String::new();
        copy.try_reserve_exact(key.len())?;
        copy.push_str(key);
        self.copies.set(self.copies.get() + 1);
        Ok(copy)
    }

    fn release_key(&self, _key: String) {
        self.released_keys.set(self.released_keys.get() + 1);
    }

    fn release_record(&self, _record: Vehicle) {
        self.released_records.set(self.released_records.get() + 1);
    }
}

type Slots = BPlusIndex<NaturalOrder<Slot>>;
type Vehicles = BPlusIndex<ByPlate>;

fn slots(count: u32) -> Slots {
    let mut slots = Slots::default();
    slots.try_extend((1..=count).map(Slot::new)).unwrap();
    slots
}

/// Claims the first vacant slot in `range`, the way a parking allocation
/// policy would.
fn claim(slots: &mut Slots, range: std::ops::RangeInclusive<u32>) -> Option<u32> {
    let slot = slots.first_match_mut(range, |s| s.vacant)?;
    slot.vacant = false;
    slot.occupancies += 1;
    Some(slot.id)
}

// ─── Insert / search ────────────────────────────────────────────────────────

#[test]
fn one_through_five_split_into_two_leaves() {
    let mut slots = Slots::default();
    for id in 1..=4 {
        slots.insert(Slot::new(id)).unwrap();
    }
    assert_eq!(slots.height(), 1);

    slots.insert(Slot::new(5)).unwrap();

    assert_eq!(slots.height(), 2);
    assert_eq!(slots.iter().map(|s| s.id).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
}

#[test]
fn search_finds_every_inserted_record_and_nothing_else() {
    let ids: Vec<u32> = (0..500).map(|i| (i * 7919) % 1009).collect();
    let mut slots = Slots::default();
    for &id in &ids {
        slots.insert(Slot::new(id)).unwrap();
    }

    for &id in &ids {
        assert_eq!(slots.get(&id).map(|s| s.id), Some(id));
    }
    let absent = (0..1009).filter(|id| !ids.contains(id));
    for id in absent {
        assert!(slots.get(&id).is_none(), "{id} was never inserted");
        assert!(!slots.contains_key(&id));
    }
}

#[test]
fn duplicate_insert_leaves_traversal_unchanged() {
    let mut slots = slots(40);
    slots.get_mut(&17).unwrap().revenue = 250;
    let before = format!("{slots:?}");

    let mut duplicate = Slot::new(17);
    duplicate.revenue = 1;
    let err = slots.insert(duplicate.clone()).unwrap_err();

    assert_eq!(err.error(), &IndexError::DuplicateKey);
    assert_eq!(err.into_record(), duplicate);
    assert_eq!(format!("{slots:?}"), before);
    assert_eq!(slots.len(), 40);
}

#[test]
fn first_and_last() {
    let mut slots = Slots::default();
    assert!(slots.first().is_none());
    assert!(slots.last().is_none());

    slots.try_extend([30, 10, 50, 20, 40, 60, 5].map(Slot::new)).unwrap();
    assert_eq!(slots.first().map(|s| s.id), Some(5));
    assert_eq!(slots.last().map(|s| s.id), Some(60));
}

// ─── Scans ──────────────────────────────────────────────────────────────────

#[test]
fn allocation_scans_within_tier_ranges() {
    let mut slots = slots(50);

    // Lowest tier gets slots 1..=10, the next tier 11..=20.
    assert_eq!(claim(&mut slots, 1..=10), Some(1));
    assert_eq!(claim(&mut slots, 1..=10), Some(2));
    assert_eq!(claim(&mut slots, 11..=20), Some(11));

    for _ in 3..=10 {
        claim(&mut slots, 1..=10).unwrap();
    }
    assert_eq!(claim(&mut slots, 1..=10), None);

    let occupied: Vec<u32> = slots.iter().filter(|s| !s.vacant).map(|s| s.id).collect();
    assert_eq!(occupied, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);

    // Releasing a slot in place makes it the next one handed out.
    slots.get_mut(&4).unwrap().vacant = true;
    assert_eq!(claim(&mut slots, 1..=10), Some(4));
    assert_eq!(slots.get(&4).unwrap().occupancies, 2);
}

#[test]
fn range_scan_respects_bounds_on_sparse_keys() {
    let mut slots = Slots::default();
    slots.try_extend((0..100).map(|i| Slot::new(i * 10))).unwrap();

    fn ids<'a>(it: impl Iterator<Item = &'a Slot>) -> Vec<u32> {
        it.map(|s| s.id).collect()
    }
    assert_eq!(ids(slots.range(95..=131)), [100, 110, 120, 130]);
    assert_eq!(ids(slots.range(100..130)), [100, 110, 120]);
    assert_eq!(ids(slots.range(985..)), [990]);
    assert_eq!(ids(slots.range(..=15)), [0, 10]);
    assert_eq!(ids(slots.range(500..=400)), Vec::<u32>::new());
    assert_eq!(ids(slots.range(991..)), Vec::<u32>::new());
    assert_eq!(slots.range(..).count(), 100);
}

#[test]
fn traverse_reports_in_key_order() {
    let mut slots = Slots::default();
    slots.try_extend([9, 3, 7, 1, 5, 8, 2, 6, 4].map(Slot::new)).unwrap();

    slots.traverse_mut(|s| s.revenue = s.id * 100);

    let mut lines = Vec::new();
    slots.traverse(|s| lines.push(format!("{},{}", s.id, s.revenue)));
    assert_eq!(lines, (1..=9).map(|i| format!("{i},{}", i * 100)).collect::<Vec<_>>());
}

// ─── Custom capability set ──────────────────────────────────────────────────

#[test]
fn vehicles_use_case_insensitive_plates() {
    let mut vehicles = Vehicles::default();
    vehicles.insert(Vehicle::new("KA01AB1234", "Ravi")).unwrap();
    vehicles.insert(Vehicle::new("MH12XY0001", "Meera")).unwrap();

    let err = vehicles.insert(Vehicle::new("ka01ab1234", "Impostor")).unwrap_err();
    assert!(err.is_duplicate());

    let found = vehicles.get(&"mh12xy0001".to_owned()).unwrap();
    assert_eq!(found.owner, "Meera");

    let visitor = vehicles.get_mut(&"KA01AB1234".to_owned()).unwrap();
    visitor.visits += 1;
    visitor.slot = Some(3);
    assert_eq!(vehicles.get(&"ka01ab1234".to_owned()).unwrap().slot, Some(3));
}

#[test]
fn vehicles_traverse_in_plate_order() {
    let mut vehicles = Vehicles::default();
    let plates = ["TN09", "dl03", "KA05", "ap01", "GJ02", "mh04", "RJ07", "up08", "BR06", "hr10"];
    for (i, plate) in plates.iter().enumerate() {
        vehicles.insert(Vehicle::new(plate, &format!("owner{i}"))).unwrap();
    }

    let order: Vec<String> = vehicles.iter().map(|v| v.plate.to_ascii_uppercase()).collect();
    let mut expected: Vec<String> = plates.iter().map(|p| p.to_ascii_uppercase()).collect();
    expected.sort();
    assert_eq!(order, expected);
}

#[test]
fn destroy_releases_each_vehicle_and_separator_once() {
    let caps = ByPlate::default();
    let released_records = Rc::clone(&caps.released_records);
    let released_keys = Rc::clone(&caps.released_keys);
    let copies = Rc::clone(&caps.copies);

    let mut vehicles = BPlusIndex::new(caps);
    for i in 0..300 {
        vehicles.insert(Vehicle::new(&format!("PL{i:05}"), "owner")).unwrap();
    }
    assert!(copies.get() > 0);

    vehicles.destroy();
    assert_eq!(released_records.get(), 300);
    assert_eq!(released_keys.get(), copies.get());
    assert!(vehicles.is_empty());
    assert_eq!(vehicles.height(), 0);

    // The emptied index takes a fresh load.
    vehicles.insert(Vehicle::new("NEW1", "owner")).unwrap();
    assert_eq!(vehicles.len(), 1);
}

#[test]
fn drop_releases_through_capabilities() {
    let caps = ByPlate::default();
    let released_records = Rc::clone(&caps.released_records);
    let released_keys = Rc::clone(&caps.released_keys);
    let copies = Rc::clone(&caps.copies);

    {
        let mut vehicles = BPlusIndex::new(caps);
        for i in 0..64 {
            vehicles.insert(Vehicle::new(&format!("V{i:03}"), "owner")).unwrap();
        }
    }

    assert_eq!(released_records.get(), 64);
    assert_eq!(released_keys.get(), copies.get());
}

#[test]
fn rejected_records_are_not_released() {
    let caps = ByPlate::default();
    let released_records = Rc::clone(&caps.released_records);

    let mut vehicles = BPlusIndex::new(caps);
    vehicles.insert(Vehicle::new("A1", "first")).unwrap();
    let rejected = vehicles.insert(Vehicle::new("a1", "second")).unwrap_err().into_record();
    assert_eq!(rejected.owner, "second");

    drop(vehicles);
    assert_eq!(released_records.get(), 1);
}

// ─── Capacity ───────────────────────────────────────────────────────────────

#[test]
fn with_capacity_reserves_records() {
    let slots = Slots::with_capacity(NaturalOrder::new(), 128).unwrap();
    assert!(slots.capacity() >= 128);
    assert!(slots.is_empty());
}

#[test]
fn impossible_reservation_is_an_error() {
    let mut slots = slots(3);
    let err = slots.try_reserve(usize::MAX).unwrap_err();
    assert!(matches!(
        err,
        IndexError::CapacityExceeded { .. } | IndexError::AllocationFailure(_)
    ));
    assert_eq!(slots.len(), 3);
}
