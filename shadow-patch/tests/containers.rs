use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use facet::Facet;
use shadow_patch::{PatchErrorKind, patch};

// =============================================================================
// Same-type container fields are copied wholesale
// =============================================================================

#[derive(Debug, PartialEq, Facet)]
struct Label {
    text: Option<String>,
}

#[test]
fn option_field_is_copied_including_none() {
    let mut target = Label {
        text: Some("old".to_string()),
    };
    patch(&mut target, &Label { text: None }).unwrap();
    assert_eq!(target, Label { text: None });

    let shadow = Label {
        text: Some("new".to_string()),
    };
    patch(&mut target, &shadow).unwrap();
    assert_eq!(target.text.as_deref(), Some("new"));
}

#[derive(Debug, PartialEq, Facet)]
struct Tags {
    tags: Vec<String>,
}

#[test]
fn vec_field_is_copied_regardless_of_length() {
    let mut target = Tags {
        tags: vec!["a".to_string()],
    };
    let mut shadow = Tags {
        tags: vec!["b".to_string(), "c".to_string()],
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target.tags, ["b", "c"]);

    shadow.tags.push("d".to_string());
    shadow.tags[0].push('!');
    assert_eq!(target.tags, ["b", "c"]);
}

#[derive(Debug, PartialEq, Facet)]
struct Boxed {
    counts: Box<Vec<u32>>,
}

#[test]
fn box_field_gets_its_own_allocation() {
    let mut target = Boxed {
        counts: Box::new(vec![1]),
    };
    let mut shadow = Boxed {
        counts: Box::new(vec![2, 3]),
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(*target.counts, [2, 3]);

    shadow.counts.clear();
    assert_eq!(*target.counts, [2, 3]);
}

#[derive(Debug, PartialEq, Facet)]
struct Limits {
    per_user: HashMap<String, Vec<u32>>,
}

#[test]
fn map_field_is_copied_entry_by_entry() {
    let mut target = Limits {
        per_user: HashMap::from([("gone".to_string(), vec![1])]),
    };
    let mut shadow = Limits {
        per_user: HashMap::from([
            ("ada".to_string(), vec![3, 4]),
            ("bob".to_string(), Vec::new()),
        ]),
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target, shadow);

    shadow.per_user.get_mut("ada").unwrap().push(5);
    assert_eq!(target.per_user["ada"], [3, 4]);
}

#[derive(Debug, PartialEq, Facet)]
struct Ports {
    open: BTreeSet<u16>,
}

#[test]
fn set_field_is_copied() {
    let mut target = Ports {
        open: BTreeSet::from([22]),
    };
    let shadow = Ports {
        open: BTreeSet::from([80, 443]),
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target.open, BTreeSet::from([80, 443]));
}

#[derive(Debug, PartialEq, Facet)]
struct Shared {
    name: Rc<String>,
    bytes: Arc<Vec<u8>>,
}

#[test]
fn shared_pointers_are_copied_into_fresh_allocations() {
    let mut target = Shared {
        name: Rc::new("old".to_string()),
        bytes: Arc::new(vec![0]),
    };
    let shadow = Shared {
        name: Rc::new("new".to_string()),
        bytes: Arc::new(vec![1, 2]),
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target, shadow);
    assert!(!Rc::ptr_eq(&target.name, &shadow.name));
    assert!(!Arc::ptr_eq(&target.bytes, &shadow.bytes));
    assert_eq!(Rc::strong_count(&shadow.name), 1);
    assert_eq!(Arc::strong_count(&shadow.bytes), 1);
}

#[derive(Debug, PartialEq, Facet)]
struct Pair {
    pair: (u8, String),
}

#[test]
fn tuple_field_is_copied() {
    let mut target = Pair {
        pair: (1, "one".to_string()),
    };
    patch(
        &mut target,
        &Pair {
            pair: (2, "two".to_string()),
        },
    )
    .unwrap();
    assert_eq!(target.pair, (2, "two".to_string()));
}

#[derive(Debug, PartialEq, Facet)]
struct Outcome {
    last: Result<u32, String>,
}

#[test]
fn result_field_is_copied_on_either_side() {
    let mut target = Outcome { last: Ok(1) };
    patch(
        &mut target,
        &Outcome {
            last: Err("timed out".to_string()),
        },
    )
    .unwrap();
    assert_eq!(target.last, Err("timed out".to_string()));

    patch(&mut target, &Outcome { last: Ok(7) }).unwrap();
    assert_eq!(target.last, Ok(7));
}

#[derive(Debug, PartialEq, Facet)]
struct Buffers {
    halves: [Vec<u8>; 2],
}

#[test]
fn array_of_lists_field_is_copied() {
    let mut target = Buffers {
        halves: [vec![0], vec![0]],
    };
    let shadow = Buffers {
        halves: [vec![1, 2], Vec::new()],
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target, shadow);
}

#[derive(Debug, PartialEq, Facet)]
struct Nested {
    chain: Option<Vec<Box<String>>>,
}

#[test]
fn nested_containers_are_copied_all_the_way_down() {
    let mut target = Nested { chain: None };
    let shadow = Nested {
        chain: Some(vec![Box::new("x".to_string()), Box::new("y".to_string())]),
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target, shadow);
}

// =============================================================================
// Snapshots into absent targets
// =============================================================================

#[derive(Debug, PartialEq, Facet)]
struct Pending {
    queue: Option<Vec<String>>,
}

#[derive(Facet)]
struct QueueShadow {
    queue: Box<Vec<String>>,
}

#[test]
fn absent_target_attaches_a_copy_of_the_shadow_list() {
    let mut target = Pending { queue: None };
    let mut shadow = QueueShadow {
        queue: Box::new(vec!["job".to_string()]),
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target.queue, Some(vec!["job".to_string()]));

    shadow.queue.clear();
    assert_eq!(target.queue, Some(vec!["job".to_string()]));
}

// =============================================================================
// Lists of another element type, read through a shared shadow
// =============================================================================

#[derive(Debug, PartialEq, Facet)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Debug, PartialEq, Facet)]
struct X {
    x: i32,
}

#[derive(Debug, PartialEq, Facet)]
struct Route {
    points: Vec<Point>,
}

#[derive(Debug, PartialEq, Facet)]
struct RouteShadow {
    points: Vec<X>,
}

#[test]
fn list_field_of_other_element_type_is_patched_from_shared_shadow() {
    let mut target = Route {
        points: vec![Point { x: 0, y: 1 }, Point { x: 0, y: 2 }],
    };
    let shadow = RouteShadow {
        points: vec![X { x: 10 }, X { x: 20 }],
    };

    patch(&mut target, &shadow).unwrap();
    assert_eq!(target.points, [Point { x: 10, y: 1 }, Point { x: 20, y: 2 }]);
    assert_eq!(shadow.points, [X { x: 10 }, X { x: 20 }]);
}

// =============================================================================
// Failures
// =============================================================================

#[derive(Debug, PartialEq, Facet)]
struct Opaque {
    id: u32,
}

#[derive(Debug, PartialEq, Facet)]
struct Registry {
    entries: Vec<Opaque>,
}

#[test]
fn list_of_uncloneable_elements_fails_and_leaves_target_alone() {
    let mut target = Registry {
        entries: vec![Opaque { id: 1 }],
    };
    let shadow = Registry {
        entries: vec![Opaque { id: 2 }, Opaque { id: 3 }],
    };

    let err = patch(&mut target, &shadow).unwrap_err();
    assert!(matches!(err.kind, PatchErrorKind::NotCloneable { .. }));
    assert_eq!(err.path.to_string(), "entries");
    assert_eq!(target.entries, [Opaque { id: 1 }]);
}

#[derive(Debug, PartialEq, Facet)]
struct MixedPair {
    pair: (String, Opaque),
}

#[test]
fn tuple_with_uncloneable_part_fails_and_leaves_target_alone() {
    let mut target = MixedPair {
        pair: ("kept".to_string(), Opaque { id: 1 }),
    };
    let shadow = MixedPair {
        pair: ("dropped".to_string(), Opaque { id: 2 }),
    };

    let err = patch(&mut target, &shadow).unwrap_err();
    assert!(matches!(err.kind, PatchErrorKind::NotCloneable { .. }));
    assert_eq!(err.path.to_string(), "pair");
    assert_eq!(target.pair, ("kept".to_string(), Opaque { id: 1 }));
}
