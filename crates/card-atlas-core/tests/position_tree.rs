use card_atlas_core::error::AtlasError;
use card_atlas_core::prelude::*;
use std::path::PathBuf;

fn record(item: &str, variant: Option<&str>) -> ImageRecord {
    let path = match variant {
        Some(v) => PathBuf::from(format!("Jokers/{item}/{item}/{v}.png")),
        None => PathBuf::from(format!("Jokers/{item}/{item}.png")),
    };
    ImageRecord {
        atlas_name: "Jokers".into(),
        item_name: item.into(),
        variant_name: variant.map(str::to_string),
        path,
        scale: 1,
        prescaled: false,
        pattern: if variant.is_some() {
            MatchPattern::Variants
        } else {
            MatchPattern::Plain
        },
    }
}

#[test]
fn plain_item_and_variants() {
    let records = vec![
        record("Joker", None),
        record("Wildcard", Some("red")),
        record("Wildcard", Some("blue")),
    ];
    let layout = GridLayout::new(records.len() as u32, 8);
    assert_eq!((layout.columns, layout.rows), (3, 1));

    let tree = PositionTree::from_records("Jokers", &records, &layout).expect("tree");
    assert_eq!(tree.len(), 2);
    assert_eq!(
        tree.get("Joker"),
        Some(&PositionNode::Leaf(GridCoordinate::new(0, 0)))
    );
    let wild = tree
        .get("Wildcard")
        .and_then(PositionNode::as_branch)
        .expect("branch");
    let variants: Vec<(&str, Option<GridCoordinate>)> =
        wild.iter().map(|(k, v)| (k, v.as_leaf())).collect();
    assert_eq!(
        variants,
        vec![
            ("red", Some(GridCoordinate::new(1, 0))),
            ("blue", Some(GridCoordinate::new(2, 0))),
        ]
    );
    assert_eq!(
        tree.lookup("Wildcard", Some("blue")),
        Some(GridCoordinate::new(2, 0))
    );
    assert_eq!(tree.lookup("Wildcard", None), None);
}

#[test]
fn serializes_in_insertion_order() {
    let records = vec![
        record("Zeta", None),
        record("Alpha", Some("b")),
        record("Alpha", Some("a")),
    ];
    let layout = GridLayout::new(3, 8);
    let tree = PositionTree::from_records("Jokers", &records, &layout).expect("tree");
    let json = serde_json::to_string(&tree).expect("json");
    assert_eq!(
        json,
        r#"{"Zeta":{"x":0,"y":0},"Alpha":{"b":{"x":1,"y":0},"a":{"x":2,"y":0}}}"#
    );
}

#[test]
fn plain_and_variant_with_same_name_is_rejected() {
    let records = vec![record("Joker", None), record("Joker", Some("red"))];
    let layout = GridLayout::new(2, 8);
    match PositionTree::from_records("Jokers", &records, &layout) {
        Err(AtlasError::TreeConflict { atlas, name }) => {
            assert_eq!(atlas, "Jokers");
            assert_eq!(name, "Joker");
        }
        other => panic!("expected TreeConflict, got {:?}", other),
    }
}

#[test]
fn duplicate_plain_match_keeps_later_cell() {
    let mut prescaled = record("Joker", None);
    prescaled.prescaled = true;
    prescaled.pattern = MatchPattern::PrescaledPlain;
    let records = vec![record("Joker", None), record("Mime", None), prescaled];
    let layout = GridLayout::new(3, 8);
    let tree = PositionTree::from_records("Jokers", &records, &layout).expect("tree");
    let names: Vec<&str> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(names, ["Joker", "Mime"]);
    assert_eq!(tree.lookup("Joker", None), Some(GridCoordinate::new(2, 0)));
}

#[test]
fn leaves_visit_depth_first() {
    let records = vec![
        record("Joker", None),
        record("Wildcard", Some("red")),
        record("Wildcard", Some("blue")),
    ];
    let layout = GridLayout::new(3, 8);
    let tree = PositionTree::from_records("Jokers", &records, &layout).expect("tree");
    let mut seen = Vec::new();
    tree.for_each_leaf(|path, cell| seen.push((path.join("/"), cell.column)));
    assert_eq!(
        seen,
        vec![
            ("Joker".to_string(), 0),
            ("Wildcard/red".to_string(), 1),
            ("Wildcard/blue".to_string(), 2),
        ]
    );
}
