use serde::Serialize;

use crate::error::Result;
use crate::model::AtlasDescriptor;
use crate::tree::PositionTree;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonAtlas<'a> {
    key: &'a str,
    name: &'a str,
    path: &'a str,
    cell_size: JsonSize,
    grid_size: JsonSize,
    positions: &'a PositionTree,
}

#[derive(Serialize)]
struct JsonSize {
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct JsonMeta {
    app: &'static str,
    version: &'static str,
    generator: String,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    atlases: Vec<JsonAtlas<'a>>,
    meta: JsonMeta,
}

/// Serialize all atlas descriptors as pretty JSON.
/// Shape: `{ atlases: [ { key, name, path, cellSize, gridSize, positions } ], meta }`, where
/// `positions` maps names to `{ x, y }` or to a nested object of variants, in discovery order.
pub fn to_json(generator_name: &str, descriptors: &[AtlasDescriptor]) -> Result<String> {
    let atlases = descriptors
        .iter()
        .map(|d| JsonAtlas {
            key: &d.metadata.key,
            name: &d.metadata.name,
            path: &d.metadata.output_filename,
            cell_size: JsonSize {
                w: d.metadata.cell_width,
                h: d.metadata.cell_height,
            },
            grid_size: JsonSize {
                w: d.grid.0,
                h: d.grid.1,
            },
            positions: &d.positions,
        })
        .collect();
    let doc = JsonDocument {
        atlases,
        meta: JsonMeta {
            app: "card-atlas",
            version: env!("CARGO_PKG_VERSION"),
            generator: generator_name.to_string(),
        },
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
