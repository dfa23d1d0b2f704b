//! Tests for resource loading and tree building

use std::path::Path;

use normtree::builder::{BehaviorSpec, SubgoalSpec, TreeBuilder};
use normtree::errors::BuildError;

fn fixture() -> &'static Path {
    Path::new("tests/resources/robots/astro-resource-file.json")
}

#[test]
fn given_resource_file_when_building_then_one_subgoal_per_section() {
    let subgoals = TreeBuilder::new().build_from_file(fixture()).unwrap();

    assert_eq!(subgoals.len(), 2);
    let titles: Vec<_> = subgoals.iter().map(|s| s.title.as_str()).collect();
    assert!(titles.contains(&"Prepare breakfast"));
    assert!(titles.contains(&"Clean up the table"));
    // Subgoals come out in file order even where that is not sorted order
    assert_eq!(titles, vec!["Prepare breakfast", "Clean up the table"]);
}

#[test]
fn given_resource_file_when_building_then_children_resolve_in_order() {
    let subgoals = TreeBuilder::new().build_from_file(fixture()).unwrap();
    let breakfast = subgoals
        .iter()
        .find(|s| s.title == "Prepare breakfast")
        .unwrap();

    let child_names: Vec<_> = breakfast
        .tree
        .get(breakfast.root)
        .unwrap()
        .children
        .iter()
        .map(|&c| breakfast.tree.name_of(c).unwrap().to_string())
        .collect();

    assert_eq!(
        child_names,
        vec!["walk to the kitchen", "crack two eggs", "serve the plate"]
    );
    assert_eq!(breakfast.child_ids(), vec!["b1", "b2", "b3"]);
}

#[test]
fn given_resource_file_when_building_then_bank_holds_flagged_detached_leaves() {
    let subgoals = TreeBuilder::new().build_from_file(fixture()).unwrap();
    let breakfast = subgoals
        .iter()
        .find(|s| s.title == "Prepare breakfast")
        .unwrap();

    let bank_names: Vec<_> = breakfast
        .bank
        .iter()
        .map(|&c| breakfast.tree.name_of(c).unwrap().to_string())
        .collect();
    assert_eq!(bank_names, vec!["wash hands first", "toast a slice of bread"]);

    for &candidate in &breakfast.bank {
        assert_eq!(breakfast.tree.get(candidate).unwrap().parent, None);
    }
}

#[test]
fn given_missing_file_when_building_then_file_not_found() {
    let err = TreeBuilder::new()
        .build_from_file(Path::new("tests/resources/robots/nope.json"))
        .unwrap_err();
    assert!(matches!(err, BuildError::FileNotFound(_)));
}

#[test]
fn given_unknown_child_id_when_building_subgoal_then_error_names_the_id() {
    let spec = SubgoalSpec {
        context: String::new(),
        children: vec!["missing".into()],
        behavior_library: vec![BehaviorSpec {
            id: "b1".into(),
            name: "wave".into(),
            in_behavior_bank: false,
        }],
    };

    let err = TreeBuilder::new()
        .build_subgoal("greet".into(), spec)
        .unwrap_err();

    match err {
        BuildError::UnknownBehavior { subgoal, id } => {
            assert_eq!(subgoal, "greet");
            assert_eq!(id, "missing");
        }
        other => panic!("expected UnknownBehavior, got {other:?}"),
    }
}

#[test]
fn given_duplicate_behavior_id_when_building_subgoal_then_error() {
    let spec = SubgoalSpec {
        context: String::new(),
        children: vec![],
        behavior_library: vec![
            BehaviorSpec {
                id: "b1".into(),
                name: "wave".into(),
                in_behavior_bank: false,
            },
            BehaviorSpec {
                id: "b1".into(),
                name: "bow".into(),
                in_behavior_bank: false,
            },
        ],
    };

    let err = TreeBuilder::new()
        .build_subgoal("greet".into(), spec)
        .unwrap_err();
    assert!(matches!(err, BuildError::DuplicateBehavior { .. }));
}

#[test]
fn given_malformed_json_when_building_then_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken-resource-file.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = TreeBuilder::new().build_from_file(&path).unwrap_err();
    assert!(matches!(err, BuildError::InvalidFormat { .. }));
}
