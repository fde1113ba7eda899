use std::collections::HashMap;

use facet::Facet;
use shadow_patch::{PatchErrorKind, PathSegment, patch};

#[derive(Debug, Clone, PartialEq, Facet)]
struct Settings {
    host: String,
    port: u16,
    debug: bool,
}

#[derive(Facet)]
struct PortAndDebug {
    port: u16,
    debug: bool,
}

#[derive(Facet)]
struct Unrelated {
    colour: String,
}

// =============================================================================
// Matching by name
// =============================================================================

#[test]
fn fields_missing_from_shadow_are_untouched() {
    let mut target = Settings {
        host: "localhost".into(),
        port: 80,
        debug: false,
    };
    patch(
        &mut target,
        &PortAndDebug {
            port: 8080,
            debug: true,
        },
    )
    .unwrap();
    assert_eq!(
        target,
        Settings {
            host: "localhost".into(),
            port: 8080,
            debug: true
        }
    );
}

#[test]
fn every_matching_field_is_patched_after_a_direct_overwrite() {
    #[derive(Facet)]
    struct AllThree {
        host: String,
        port: u16,
        debug: bool,
    }

    let mut target = Settings {
        host: "a".into(),
        port: 1,
        debug: false,
    };
    patch(
        &mut target,
        &AllThree {
            host: "b".into(),
            port: 2,
            debug: true,
        },
    )
    .unwrap();
    assert_eq!(
        target,
        Settings {
            host: "b".into(),
            port: 2,
            debug: true
        }
    );
}

#[test]
fn shadow_without_matching_fields_is_a_no_op() {
    let mut target = Settings {
        host: "localhost".into(),
        port: 80,
        debug: false,
    };
    let before = target.clone();
    patch(
        &mut target,
        &Unrelated {
            colour: "red".into(),
        },
    )
    .unwrap();
    assert_eq!(target, before);
}

#[derive(Debug, PartialEq, Facet)]
struct Pair(u8, String);

#[derive(Facet)]
struct FirstOnly(u8);

#[test]
fn tuple_fields_match_by_position_name() {
    let mut target = Pair(1, "kept".into());
    patch(&mut target, &FirstOnly(9)).unwrap();
    assert_eq!(target, Pair(9, "kept".into()));
}

#[test]
fn field_of_other_scalar_type_is_rejected() {
    #[derive(Facet)]
    struct PortAsText {
        port: String,
    }

    let mut target = Settings {
        host: "localhost".into(),
        port: 80,
        debug: false,
    };
    let err = patch(
        &mut target,
        &PortAsText {
            port: "8080".into(),
        },
    )
    .unwrap_err();
    assert!(matches!(err.kind, PatchErrorKind::TypeMismatch { .. }));
    assert_eq!(
        err.path.segments().collect::<Vec<_>>(),
        [&PathSegment::Field("port")]
    );
    assert_eq!(target.port, 80);
}

// =============================================================================
// Nesting and breadcrumbs
// =============================================================================

#[derive(Debug, PartialEq, Facet)]
struct Layer {
    values: Vec<u8>,
}

#[derive(Debug, PartialEq, Facet)]
struct Stack {
    layers: Vec<Layer>,
    name: String,
}

#[derive(Debug, PartialEq, Facet)]
struct Document {
    stack: Stack,
}

#[derive(Facet)]
struct LayerShadow {
    values: [u8; 2],
}

#[derive(Facet)]
struct StackShadow {
    layers: Vec<LayerShadow>,
}

#[derive(Facet)]
struct DocumentShadow {
    stack: StackShadow,
}

#[test]
fn nested_failure_reports_breadcrumb_and_keeps_earlier_writes() {
    let mut target = Document {
        stack: Stack {
            layers: vec![
                Layer { values: vec![1, 2] },
                Layer { values: vec![3, 4] },
                Layer {
                    values: vec![5, 6, 7],
                },
            ],
            name: "base".into(),
        },
    };
    let shadow = DocumentShadow {
        stack: StackShadow {
            layers: vec![
                LayerShadow { values: [10, 20] },
                LayerShadow { values: [30, 40] },
                LayerShadow { values: [50, 60] },
            ],
        },
    };

    let err = patch(&mut target, &shadow).unwrap_err();
    assert_eq!(
        err.to_string(),
        "stack.layers[2].values: cannot patch sequences of different length (target has 3, shadow has 2)"
    );
    assert_eq!(err.path.len(), 4);

    // No rollback: the layers before the failing one were already patched.
    assert_eq!(target.stack.layers[0].values, [10, 20]);
    assert_eq!(target.stack.layers[1].values, [30, 40]);
    assert_eq!(target.stack.layers[2].values, [5, 6, 7]);
}

// =============================================================================
// Maps are leaves
// =============================================================================

#[derive(Debug, PartialEq, Facet)]
struct Registry {
    entries: HashMap<String, u32>,
}

#[derive(Facet)]
struct RegistryShadow {
    entries: HashMap<String, u32>,
}

#[test]
fn map_is_overwritten_not_merged() {
    let mut target = Registry {
        entries: HashMap::from([("x".to_string(), 1), ("y".to_string(), 2)]),
    };
    patch(
        &mut target,
        &RegistryShadow {
            entries: HashMap::from([("z".to_string(), 3)]),
        },
    )
    .unwrap();
    assert_eq!(target.entries, HashMap::from([("z".to_string(), 3)]));
}
