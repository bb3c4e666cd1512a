use card_atlas_core::prelude::*;
use serde_json::{Value, json};

#[test]
fn json_document_shape() {
    let mut positions = PositionTree::new();
    positions.insert_leaf("Joker", GridCoordinate::new(0, 0)).unwrap();
    positions
        .insert_variant("Wildcard", "red", GridCoordinate::new(1, 0))
        .unwrap();
    let desc = AtlasDescriptor {
        metadata: AtlasMetadata::new("Jokers", (71, 95)),
        grid: (2, 1),
        positions,
    };

    let text = to_json("card-atlas generate", &[desc]).expect("json");
    let doc: Value = serde_json::from_str(&text).expect("parse");
    assert_eq!(
        doc["atlases"][0],
        json!({
            "key": "atlas_Jokers",
            "name": "Jokers",
            "path": "atlas_Jokers.png",
            "cellSize": {"w": 71, "h": 95},
            "gridSize": {"w": 2, "h": 1},
            "positions": {
                "Joker": {"x": 0, "y": 0},
                "Wildcard": {"red": {"x": 1, "y": 0}}
            }
        })
    );
    assert_eq!(doc["meta"]["app"], "card-atlas");
    assert_eq!(doc["meta"]["generator"], "card-atlas generate");
    assert!(doc["meta"]["version"].is_string());
}

#[test]
fn empty_descriptor_list() {
    let text = to_json("gen", &[]).unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["atlases"], json!([]));
}
