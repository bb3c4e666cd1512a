use std::fmt::Write as _;

use crate::model::AtlasDescriptor;
use crate::tree::{PositionNode, PositionTree};

const INDENT: &str = "    ";

/// Quote `s` as a Lua string literal.
pub fn lua_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_tree(out: &mut String, tree: &PositionTree, depth: usize) {
    let pad = INDENT.repeat(depth);
    for (name, node) in tree.iter() {
        match node {
            PositionNode::Leaf(c) => {
                let _ = writeln!(
                    out,
                    "{pad}[{}] = {{x={}, y={}}},",
                    lua_string(name),
                    c.column,
                    c.row
                );
            }
            PositionNode::Branch(branch) => {
                let _ = writeln!(out, "{pad}[{}] = {{", lua_string(name));
                write_tree(out, branch, depth + 1);
                let _ = writeln!(out, "{pad}}},");
            }
        }
    }
}

/// Body lines of a position table, one indent level per nesting depth starting at `depth`.
/// Leaves render as `["name"] = {x=<col>, y=<row>},`; branches as nested tables.
pub fn positions_table(tree: &PositionTree, depth: usize) -> String {
    let mut out = String::new();
    write_tree(&mut out, tree, depth);
    out
}

/// One atlas section: a `SMODS.Atlas` declaration followed by its position table.
pub fn to_lua_block(desc: &AtlasDescriptor) -> String {
    let meta = &desc.metadata;
    let mut out = String::new();
    let _ = writeln!(out, "--- {} ---", meta.name.to_uppercase());
    out.push('\n');
    let _ = writeln!(out, "{} = SMODS.Atlas {{", meta.key);
    let _ = writeln!(out, "{INDENT}key = {},", lua_string(&meta.key));
    let _ = writeln!(out, "{INDENT}path = {},", lua_string(&meta.output_filename));
    let _ = writeln!(out, "{INDENT}px = {},", meta.cell_width);
    let _ = writeln!(out, "{INDENT}py = {}", meta.cell_height);
    out.push_str("}\n\n");
    let _ = writeln!(out, "{}_positions = {{", meta.key);
    write_tree(&mut out, &desc.positions, 1);
    out.push('}');
    out
}

/// Do-not-edit banner naming the command that produced the file.
pub fn banner(generator_name: &str) -> String {
    format!(
        "-- This file is generated in its entirety by \"{generator_name}\"!\n\
         -- If you make any manual changes they're likely to be MINDLESSLY OVERWRITTEN!!\n\
         -- So don't do that."
    )
}

/// The whole descriptor file: banner, then every atlas block, separated by blank lines.
pub fn to_lua_file(generator_name: &str, descriptors: &[AtlasDescriptor]) -> String {
    let mut parts = Vec::with_capacity(descriptors.len() + 1);
    parts.push(banner(generator_name));
    parts.extend(descriptors.iter().map(to_lua_block));
    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}
